//! The unit calling convention: [`Middleware`], [`Handler`], and the
//! [`Next`] continuation.
//!
//! Every pipeline stage implements [`Middleware`]: it receives a mutable
//! [`Context`] and a [`Next`] continuation, and decides whether (and when)
//! to advance the pipeline by running the continuation. A stage that never
//! runs its continuation short-circuits everything downstream of it.
//!
//! [`Next`] is a cheap, cloneable handle over the remaining chain. The
//! combinators rely on that: `some` hands the same continuation to several
//! candidate units in turn, so the continuation cannot be a consume-once
//! value.
//!
//! # Example
//!
//! ```ignore
//! use daedalus::{BoxFuture, Context, Middleware, Next, PipelineError};
//!
//! struct Logging;
//!
//! impl Middleware for Logging {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         ctx: &'a mut Context,
//!         next: Next,
//!     ) -> BoxFuture<'a, Result<(), PipelineError>> {
//!         Box::pin(async move {
//!             tracing::info!(request_id = %ctx.request_id(), "request started");
//!             let result = next.run(ctx).await;
//!             tracing::info!(elapsed = ?ctx.elapsed(), "request finished");
//!             result
//!         })
//!     }
//! }
//! ```

use crate::context::Context;
use crate::error::PipelineError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A boxed future, the return type of every unit invocation.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core middleware trait.
///
/// All pipeline stages implement this trait. A stage receives a mutable
/// context and a [`Next`] continuation representing everything that follows
/// it in the enclosing pipeline.
///
/// # Invariants
///
/// - A stage that completes with `Ok(())` without running `next` has
///   short-circuited the pipeline: nothing downstream runs.
/// - Errors from downstream (raised inside `next.run`) should be propagated,
///   not suppressed.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs and failure messages.
    fn name(&self) -> &'static str;

    /// Processes the request, optionally advancing the pipeline via `next`.
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next,
    ) -> BoxFuture<'a, Result<(), PipelineError>>;
}

/// The terminal stage of a pipeline.
///
/// A handler receives the context after every middleware stage has run. It
/// has no continuation; it is the end of the line.
pub trait Handler: Send + Sync + 'static {
    /// Returns the name of this handler.
    fn name(&self) -> &'static str;

    /// Handles the request.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), PipelineError>>;
}

/// Continuation that advances the enclosing pipeline.
///
/// Running a `Next` invokes whatever follows the current stage: the rest of
/// the middleware chain, then the terminal handler. Cloning is cheap (the
/// chain is shared behind `Arc`s), which lets a combinator offer the same
/// continuation to several candidate units.
///
/// Whether a stage runs its continuation more than once per logical pass is
/// the caller's concern; this crate only tracks *whether* it ran (see
/// [`Next::tracked`]).
#[derive(Clone)]
pub struct Next {
    inner: NextInner,
}

/// Internal representation of the remaining chain.
#[derive(Clone)]
enum NextInner {
    /// Remaining middleware stages followed by a tail continuation.
    Chain {
        stages: Arc<[Arc<dyn Middleware>]>,
        index: usize,
        tail: Box<Next>,
    },
    /// Records that the continuation ran, then delegates.
    Tracking {
        invoked: Arc<AtomicBool>,
        next: Box<Next>,
    },
    /// End of chain: invoke the handler.
    Handler(Arc<dyn Handler>),
    /// Nothing follows; running this is a no-op.
    End,
}

impl Next {
    /// Creates a continuation that does nothing when run.
    #[must_use]
    pub fn end() -> Self {
        Self {
            inner: NextInner::End,
        }
    }

    /// Creates a terminal continuation that invokes the given handler.
    pub fn handler<H: Handler>(handler: H) -> Self {
        Self {
            inner: NextInner::Handler(Arc::new(handler)),
        }
    }

    /// Creates a continuation over a middleware chain ending in `tail`.
    pub(crate) fn chain(stages: Arc<[Arc<dyn Middleware>]>, tail: Next) -> Self {
        Self {
            inner: NextInner::Chain {
                stages,
                index: 0,
                tail: Box::new(tail),
            },
        }
    }

    /// Wraps this continuation so that `invoked` is set before delegating.
    ///
    /// The flag is stored before the delegate runs, so it is accurate even
    /// when the downstream chain later fails.
    pub(crate) fn tracked(&self, invoked: Arc<AtomicBool>) -> Self {
        Self {
            inner: NextInner::Tracking {
                invoked,
                next: Box::new(self.clone()),
            },
        }
    }

    /// Invokes the next stage (or handler) in the chain.
    pub fn run<'a>(self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            match self.inner {
                NextInner::Chain {
                    stages,
                    index,
                    tail,
                } => {
                    if let Some(stage) = stages.get(index).cloned() {
                        let next = Self {
                            inner: NextInner::Chain {
                                stages,
                                index: index + 1,
                                tail,
                            },
                        };
                        stage.handle(ctx, next).await
                    } else {
                        tail.run(ctx).await
                    }
                }
                NextInner::Tracking { invoked, next } => {
                    invoked.store(true, Ordering::SeqCst);
                    next.run(ctx).await
                }
                NextInner::Handler(handler) => handler.call(ctx).await,
                NextInner::End => Ok(()),
            }
        })
    }
}

/// A middleware stage created from an async closure.
///
/// # Example
///
/// ```ignore
/// let timing = FnMiddleware::new("timing", |ctx, next| {
///     Box::pin(async move {
///         let result = next.run(ctx).await;
///         tracing::debug!(elapsed = ?ctx.elapsed(), "stage finished");
///         result
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Next) -> BoxFuture<'a, Result<(), PipelineError>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based middleware stage.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Next) -> BoxFuture<'a, Result<(), PipelineError>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        (self.func)(ctx, next)
    }
}

/// A terminal handler created from an async closure.
pub struct FnHandler<F> {
    name: &'static str,
    func: F,
}

impl<F> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), PipelineError>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based handler.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), PipelineError>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), PipelineError>> {
        (self.func)(ctx)
    }
}
