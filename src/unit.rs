//! The tagged [`Unit`] type composed by the combinators.
//!
//! A combinator accepts a sequence of units, each of which is either a
//! middleware stage or a boolean condition. The kind is an explicit tag:
//! callers say which shape they are passing instead of the combinator
//! inferring it from runtime return values, so a middleware stage that
//! happens to produce a boolean somewhere can never be mistaken for a
//! condition.

use crate::context::Context;
use crate::error::PipelineError;
use crate::middleware::{BoxFuture, Middleware};
use std::sync::Arc;

/// A boolean predicate over the request context.
///
/// Conditions communicate pass/fail through their return value instead of
/// driving the continuation themselves. They receive the context by shared
/// reference: predicates read, middleware mutates.
pub trait Condition: Send + Sync + 'static {
    /// Returns the name of this condition, used in logs and failure messages.
    fn name(&self) -> &'static str;

    /// Evaluates the condition against the context.
    fn evaluate<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<bool, PipelineError>>;
}

/// A single composable pipeline unit: a middleware stage or a condition.
///
/// # Example
///
/// ```ignore
/// let units = [
///     Unit::condition(FnCondition::new("is_internal", |ctx| { /* ... */ })),
///     Unit::middleware(AuthMiddleware::new()),
/// ];
/// let combined = some(units);
/// ```
#[derive(Clone)]
pub enum Unit {
    /// A stage that drives its own continuation.
    Middleware(Arc<dyn Middleware>),
    /// A predicate that signals pass/fail via its return value.
    Condition(Arc<dyn Condition>),
}

impl Unit {
    /// Wraps a middleware stage as a unit.
    pub fn middleware<M: Middleware>(middleware: M) -> Self {
        Self::Middleware(Arc::new(middleware))
    }

    /// Wraps a condition as a unit.
    pub fn condition<C: Condition>(condition: C) -> Self {
        Self::Condition(Arc::new(condition))
    }

    /// Returns the name of the wrapped unit.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Middleware(mw) => mw.name(),
            Self::Condition(cond) => cond.name(),
        }
    }
}

impl From<Arc<dyn Middleware>> for Unit {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        Self::Middleware(middleware)
    }
}

impl From<Arc<dyn Condition>> for Unit {
    fn from(condition: Arc<dyn Condition>) -> Self {
        Self::Condition(condition)
    }
}

/// A condition created from an async closure.
///
/// # Example
///
/// ```ignore
/// let is_health_check = FnCondition::new("is_health_check", |ctx| {
///     let probe = ctx.has_extension::<HealthProbe>();
///     Box::pin(async move { Ok(probe) })
/// });
/// ```
pub struct FnCondition<F> {
    name: &'static str,
    func: F,
}

impl<F> FnCondition<F>
where
    F: for<'a> Fn(&'a Context) -> BoxFuture<'a, Result<bool, PipelineError>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based condition.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Condition for FnCondition<F>
where
    F: for<'a> Fn(&'a Context) -> BoxFuture<'a, Result<bool, PipelineError>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn evaluate<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<bool, PipelineError>> {
        (self.func)(ctx)
    }
}

/// Conversion into the condition list accepted by
/// [`except()`](crate::combinators::except()).
///
/// Implemented for a single condition value, a boxed condition, and a list
/// of boxed conditions, so callers can guard units behind one predicate or
/// an OR of several.
pub trait IntoConditions {
    /// Converts `self` into an ordered list of conditions.
    fn into_conditions(self) -> Vec<Arc<dyn Condition>>;
}

impl<C: Condition> IntoConditions for C {
    fn into_conditions(self) -> Vec<Arc<dyn Condition>> {
        vec![Arc::new(self)]
    }
}

impl IntoConditions for Arc<dyn Condition> {
    fn into_conditions(self) -> Vec<Arc<dyn Condition>> {
        vec![self]
    }
}

impl IntoConditions for Vec<Arc<dyn Condition>> {
    fn into_conditions(self) -> Vec<Arc<dyn Condition>> {
        self
    }
}
