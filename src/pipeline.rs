//! Sequential composition of middleware stages.
//!
//! [`Pipeline`] is the facility that chains an ordered list of stages: each
//! stage receives a continuation pointing at the next stage in the
//! sequence, and must run it to proceed. Errors propagate outward and abort
//! the remaining stages. [`every()`](crate::combinators::every()) composes
//! through this facility rather than reimplementing sequencing.
//!
//! # Example
//!
//! ```ignore
//! let pipeline = Pipeline::builder()
//!     .stage(RequestIdMiddleware)
//!     .stage(some([Unit::condition(is_internal), Unit::middleware(auth)]))
//!     .build();
//!
//! let mut ctx = Context::new();
//! pipeline.run(&mut ctx, my_handler).await?;
//! ```

use crate::context::Context;
use crate::error::PipelineError;
use crate::middleware::{Handler, Middleware, Next};
use std::sync::Arc;

/// A type-erased middleware stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered chain of middleware stages.
///
/// The stage order is fixed at construction. Each run builds a fresh
/// continuation chain over the shared stage list, so a pipeline can serve
/// any number of concurrent requests without shared mutable state.
pub struct Pipeline {
    stages: Arc<[BoxedMiddleware]>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs the context through every stage, ending at `handler`.
    ///
    /// Each stage decides whether to advance by running its continuation;
    /// the handler runs only if every stage advanced.
    pub async fn run<H>(&self, ctx: &mut Context, handler: H) -> Result<(), PipelineError>
    where
        H: Handler,
    {
        self.run_with(ctx, Next::handler(handler)).await
    }

    /// Runs the context through every stage, ending at an arbitrary
    /// continuation.
    ///
    /// Useful for splicing this pipeline into a larger one.
    pub async fn run_with(&self, ctx: &mut Context, next: Next) -> Result<(), PipelineError> {
        Next::chain(self.stages.clone(), next).run(ctx).await
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty pipeline builder.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a middleware stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already type-erased middleware stage.
    #[must_use]
    pub fn stage_arc(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: Arc::from(self.stages),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
