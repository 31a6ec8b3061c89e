//! First-success-wins composition.

use crate::context::Context;
use crate::error::PipelineError;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::unit::Unit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Composes units so that the first one to succeed wins.
///
/// Units run strictly in order. A condition wins by evaluating to `true`
/// (the continuation is then run on its behalf); a middleware stage wins by
/// completing without an error, having driven the continuation itself. A
/// condition that evaluates to `false` is recorded as a failure and the
/// next unit is tried.
///
/// A unit that fails *before* the continuation ran is retried against the
/// next unit in sequence. A unit that fails *after* the continuation ran
/// aborts the whole group: downstream work has already executed, so trying
/// a later alternative would run it again.
///
/// Only the most recent failure survives; if no unit ultimately wins, that
/// failure is what the produced unit returns. Superseded failures are
/// logged at debug level and otherwise discarded.
///
/// Callers must supply at least one unit to guarantee forward progress: an
/// empty `some` completes successfully without ever running the
/// continuation, silently swallowing the rest of the pipeline.
pub fn some<I>(units: I) -> SomeMiddleware
where
    I: IntoIterator<Item = Unit>,
{
    SomeMiddleware {
        units: units.into_iter().collect(),
    }
}

/// The unit produced by [`some`].
pub struct SomeMiddleware {
    units: Vec<Unit>,
}

impl Middleware for SomeMiddleware {
    fn name(&self) -> &'static str {
        "some"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            if self.units.is_empty() {
                tracing::debug!("some invoked with no units; continuation not run");
                return Ok(());
            }

            // Fresh per invocation: no state outlives a single pass.
            let invoked = Arc::new(AtomicBool::new(false));
            let tracking = next.tracked(invoked.clone());
            let mut last_failure: Option<PipelineError> = None;

            for unit in &self.units {
                match unit {
                    Unit::Condition(cond) => match cond.evaluate(ctx).await {
                        Ok(true) => {
                            tracing::trace!(unit = cond.name(), "condition passed; unit wins");
                            tracking.clone().run(ctx).await?;
                            last_failure = None;
                            break;
                        }
                        Ok(false) => {
                            if let Some(superseded) = last_failure.take() {
                                tracing::debug!(error = %superseded, "failure superseded");
                            }
                            tracing::debug!(unit = cond.name(), "condition rejected");
                            last_failure =
                                Some(PipelineError::ConditionFailed { name: cond.name() });
                        }
                        Err(err) => {
                            if let Some(superseded) = last_failure.take() {
                                tracing::debug!(error = %superseded, "failure superseded");
                            }
                            tracing::debug!(unit = cond.name(), error = %err, "condition errored");
                            last_failure = Some(err);
                            if invoked.load(Ordering::SeqCst) {
                                break;
                            }
                        }
                    },
                    Unit::Middleware(mw) => match mw.handle(ctx, tracking.clone()).await {
                        Ok(()) => {
                            if let Some(superseded) = last_failure.take() {
                                tracing::debug!(error = %superseded, "failure superseded");
                            }
                            tracing::trace!(unit = mw.name(), "unit completed; unit wins");
                            break;
                        }
                        Err(err) => {
                            if let Some(superseded) = last_failure.take() {
                                tracing::debug!(error = %superseded, "failure superseded");
                            }
                            tracing::debug!(unit = mw.name(), error = %err, "unit failed");
                            last_failure = Some(err);
                            // The continuation already ran during this
                            // attempt: downstream side effects exist, so a
                            // later alternative must not run.
                            if invoked.load(Ordering::SeqCst) {
                                break;
                            }
                        }
                    },
                }
            }

            match last_failure {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}
