//! # Daedalus
//!
//! Control-flow combinators for async middleware pipelines.
//!
//! A pipeline is an ordered chain of units. Each unit receives a mutable
//! [`Context`] and a [`Next`] continuation and decides whether to advance
//! the chain. This crate provides three combinators that take a sequence of
//! units and produce a single unit with altered control flow:
//!
//! ```text
//! some(u1, u2, u3):   u1 ──fail──▶ u2 ──fail──▶ u3 ──fail──▶ error
//!                      │ win        │ win        │ win
//!                      ▼            ▼            ▼
//!                            rest of pipeline
//!
//! every(u1, u2, u3):  u1 ──pass──▶ u2 ──pass──▶ u3 ──pass──▶ rest
//!                      │ fail       │ fail       │ fail
//!                      ▼            ▼            ▼
//!                                 error
//!
//! except(c, u1, u2):  c matches ───────────────────────────▶ rest
//!                     c rejects ──▶ every(u1, u2)
//! ```
//!
//! Units come in two explicitly tagged shapes (see [`Unit`]): *middleware*,
//! which drives its own continuation, and *conditions*, boolean predicates
//! over the context. Evaluation is strictly sequential: sibling units are
//! never run in parallel, and all combinator state (the "continuation ran"
//! flag, the last recorded failure) is allocated per invocation, so one
//! composed unit serves any number of concurrent requests.
//!
//! ## Example
//!
//! ```ignore
//! use daedalus::{except, some, Pipeline, Unit};
//!
//! // Authenticate via the first mechanism that works, unless the request
//! // is an internal health probe.
//! let auth = except(
//!     is_health_probe,
//!     [Unit::middleware(some([
//!         Unit::middleware(bearer_auth),
//!         Unit::middleware(mtls_auth),
//!     ]))],
//! );
//!
//! let pipeline = Pipeline::builder().stage(auth).build();
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod combinators;
pub mod context;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod unit;

// Re-export main types at crate root
pub use combinators::{every, except, some, EveryMiddleware, ExceptMiddleware, SomeMiddleware};
pub use context::{Context, RequestId};
pub use error::{PipelineError, PipelineResult};
pub use middleware::{BoxFuture, FnHandler, FnMiddleware, Handler, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use unit::{Condition, FnCondition, IntoConditions, Unit};
