//! All-must-pass composition.

use crate::context::Context;
use crate::error::PipelineError;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::unit::Unit;
use std::sync::Arc;

/// Composes units so that all of them must pass, in order.
///
/// Each unit is wrapped in a chain stage and the stages are sequenced
/// through the standard composition facility (the same continuation chain
/// [`Pipeline`](crate::pipeline::Pipeline) runs on). A condition
/// stage advances the chain when it evaluates to `true` and aborts with a
/// [`PipelineError::ConditionFailed`] when it evaluates to `false`; a
/// middleware stage advances the chain itself. The first failure aborts the
/// remaining stages and propagates to the caller unchanged.
///
/// When every unit passes, the final stage's continuation reaches whatever
/// follows the produced unit in the enclosing pipeline, exactly once. An
/// empty `every` runs that continuation directly.
pub fn every<I>(units: I) -> EveryMiddleware
where
    I: IntoIterator<Item = Unit>,
{
    let stages: Vec<Arc<dyn Middleware>> = units
        .into_iter()
        .map(|unit| Arc::new(EveryStage { unit }) as Arc<dyn Middleware>)
        .collect();

    EveryMiddleware {
        stages: Arc::from(stages),
    }
}

/// The unit produced by [`every`].
pub struct EveryMiddleware {
    stages: Arc<[Arc<dyn Middleware>]>,
}

impl Middleware for EveryMiddleware {
    fn name(&self) -> &'static str {
        "every"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Next::chain(self.stages.clone(), next).run(ctx)
    }
}

/// Adapts one unit to the sequential chain.
struct EveryStage {
    unit: Unit,
}

impl Middleware for EveryStage {
    fn name(&self) -> &'static str {
        self.unit.name()
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        Box::pin(async move {
            match &self.unit {
                Unit::Condition(cond) => {
                    if cond.evaluate(ctx).await? {
                        next.run(ctx).await
                    } else {
                        tracing::debug!(unit = cond.name(), "condition rejected; aborting chain");
                        Err(PipelineError::ConditionFailed { name: cond.name() })
                    }
                }
                Unit::Middleware(mw) => mw.handle(ctx, next).await,
            }
        })
    }
}
