//! Control-flow combinators over pipeline units.
//!
//! Three combinators, each producing a single unit that installs anywhere a
//! unit is expected (including inside another combinator call):
//!
//! - [`some()`] — first success wins; failures fall through to the next
//!   candidate unless the continuation already ran.
//! - [`every()`] — all units must pass; the first rejection or error aborts
//!   the chain.
//! - [`except()`] — runs the guarded units unless any bypass condition
//!   matches; sugar over `some` and `every`.

mod every;
mod except;
mod some;

pub use every::{every, EveryMiddleware};
pub use except::{except, ExceptMiddleware};
pub use some::{some, SomeMiddleware};
