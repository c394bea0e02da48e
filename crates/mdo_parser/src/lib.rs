//! TypeScript parser front-end for mdo.
//!
//! Do blocks are written in plain TypeScript syntax, so the standard SWC
//! parser handles them unchanged. The only extra information the transform
//! needs is where the bind arrows are:
//!
//! - `x <- m` parses as `x < (-m)`
//! - `x < -m` parses identically but is an ordinary comparison
//!
//! The scanner records every parsed unary minus written directly after a `<`
//! so the desugarer can tell the two apart.

pub mod parse;
pub mod scan;

pub use parse::{parse_mdo, ParseResult};
