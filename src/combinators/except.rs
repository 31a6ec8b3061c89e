//! Conditional bypass composition.

use crate::combinators::every::every;
use crate::combinators::some::{some, SomeMiddleware};
use crate::context::Context;
use crate::error::PipelineError;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::unit::{Condition, IntoConditions, Unit};
use std::sync::Arc;

/// Runs the guarded units unless any bypass condition matches.
///
/// `conditions` is a single predicate or a list of predicates combined with
/// logical OR. When any of them evaluates to `true`, the guarded units are
/// skipped entirely and the enclosing pipeline continues directly. When all
/// of them evaluate to `false`, the guarded units run under
/// [`every()`](crate::combinators::every()) semantics.
///
/// Sugar over the other two combinators: the produced unit is exactly
/// `some([any(conditions), every(units)])`. Their semantics carry
/// over, including the fall-through on a predicate error: an erroring
/// predicate does not bypass, the guarded units still run.
///
/// All predicates are evaluated on every pass; a match does not
/// short-circuit the remaining predicates.
pub fn except<C, I>(conditions: C, units: I) -> ExceptMiddleware
where
    C: IntoConditions,
    I: IntoIterator<Item = Unit>,
{
    let bypass = AnyCondition {
        conditions: conditions.into_conditions(),
    };

    ExceptMiddleware {
        inner: some([
            Unit::condition(bypass),
            Unit::middleware(every(units)),
        ]),
    }
}

/// The unit produced by [`except`].
pub struct ExceptMiddleware {
    inner: SomeMiddleware,
}

impl Middleware for ExceptMiddleware {
    fn name(&self) -> &'static str {
        "except"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        next: Next,
    ) -> BoxFuture<'a, Result<(), PipelineError>> {
        self.inner.handle(ctx, next)
    }
}

/// Logical OR over the supplied predicates.
struct AnyCondition {
    conditions: Vec<Arc<dyn Condition>>,
}

impl Condition for AnyCondition {
    fn name(&self) -> &'static str {
        "any"
    }

    fn evaluate<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<bool, PipelineError>> {
        Box::pin(async move {
            let mut matched = false;
            for condition in &self.conditions {
                if condition.evaluate(ctx).await? {
                    matched = true;
                }
            }
            if matched {
                tracing::debug!("bypass condition matched; guarded units skipped");
            }
            Ok(matched)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Handler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedCondition {
        name: &'static str,
        result: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Condition for ScriptedCondition {
        fn name(&self) -> &'static str {
            self.name
        }

        fn evaluate<'a>(&'a self, _ctx: &'a Context) -> BoxFuture<'a, Result<bool, PipelineError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.result)
            })
        }
    }

    struct ErroringCondition {
        calls: Arc<AtomicUsize>,
    }

    impl Condition for ErroringCondition {
        fn name(&self) -> &'static str {
            "erroring"
        }

        fn evaluate<'a>(&'a self, _ctx: &'a Context) -> BoxFuture<'a, Result<bool, PipelineError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(PipelineError::message("predicate store unreachable"))
            })
        }
    }

    struct GuardedMiddleware {
        calls: Arc<AtomicUsize>,
    }

    impl Middleware for GuardedMiddleware {
        fn name(&self) -> &'static str {
            "guarded"
        }

        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            next: Next,
        ) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                next.run(ctx).await
            })
        }
    }

    struct ReachedHandler {
        reached: Arc<AtomicUsize>,
    }

    impl Handler for ReachedHandler {
        fn name(&self) -> &'static str {
            "handler"
        }

        fn call<'a>(&'a self, _ctx: &'a mut Context) -> BoxFuture<'a, Result<(), PipelineError>> {
            Box::pin(async move {
                self.reached.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[tokio::test]
    async fn test_matching_condition_skips_guarded_units() {
        let reached = counter();
        let (cond, guarded) = (counter(), counter());

        let combined = except(
            ScriptedCondition {
                name: "bypass",
                result: true,
                calls: cond.clone(),
            },
            [Unit::middleware(GuardedMiddleware {
                calls: guarded.clone(),
            })],
        );

        let mut ctx = Context::new();
        let next = Next::handler(ReachedHandler {
            reached: reached.clone(),
        });
        combined.handle(&mut ctx, next).await.unwrap();

        assert_eq!(cond.load(Ordering::SeqCst), 1);
        assert_eq!(guarded.load(Ordering::SeqCst), 0);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_matching_condition_runs_guarded_units() {
        let reached = counter();
        let (cond, guarded) = (counter(), counter());

        let combined = except(
            ScriptedCondition {
                name: "bypass",
                result: false,
                calls: cond.clone(),
            },
            [Unit::middleware(GuardedMiddleware {
                calls: guarded.clone(),
            })],
        );

        let mut ctx = Context::new();
        let next = Next::handler(ReachedHandler {
            reached: reached.clone(),
        });
        combined.handle(&mut ctx, next).await.unwrap();

        assert_eq!(cond.load(Ordering::SeqCst), 1);
        assert_eq!(guarded.load(Ordering::SeqCst), 1);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_conditions_evaluated_even_after_match() {
        let reached = counter();
        let (c1, c2, guarded) = (counter(), counter(), counter());

        let conditions: Vec<Arc<dyn Condition>> = vec![
            Arc::new(ScriptedCondition {
                name: "c1",
                result: true,
                calls: c1.clone(),
            }),
            Arc::new(ScriptedCondition {
                name: "c2",
                result: false,
                calls: c2.clone(),
            }),
        ];

        let combined = except(
            conditions,
            [Unit::middleware(GuardedMiddleware {
                calls: guarded.clone(),
            })],
        );

        let mut ctx = Context::new();
        let next = Next::handler(ReachedHandler {
            reached: reached.clone(),
        });
        combined.handle(&mut ctx, next).await.unwrap();

        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
        assert_eq!(guarded.load(Ordering::SeqCst), 0);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_erroring_predicate_falls_through_to_guarded_units() {
        let reached = counter();
        let (cond, guarded) = (counter(), counter());

        let combined = except(
            ErroringCondition { calls: cond.clone() },
            [Unit::middleware(GuardedMiddleware {
                calls: guarded.clone(),
            })],
        );

        let mut ctx = Context::new();
        let next = Next::handler(ReachedHandler {
            reached: reached.clone(),
        });
        combined.handle(&mut ctx, next).await.unwrap();

        assert_eq!(cond.load(Ordering::SeqCst), 1);
        assert_eq!(guarded.load(Ordering::SeqCst), 1);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_guarded_unit_failure_propagates() {
        let reached = counter();

        let combined = except(
            ScriptedCondition {
                name: "bypass",
                result: false,
                calls: counter(),
            },
            [Unit::condition(ScriptedCondition {
                name: "must_hold",
                result: false,
                calls: counter(),
            })],
        );

        let mut ctx = Context::new();
        let next = Next::handler(ReachedHandler {
            reached: reached.clone(),
        });
        let err = combined.handle(&mut ctx, next).await.unwrap_err();

        assert_eq!(reached.load(Ordering::SeqCst), 0);
        assert!(err.is_condition_failure());
        assert_eq!(err.to_string(), "condition `must_hold` evaluated to false");
    }
}
