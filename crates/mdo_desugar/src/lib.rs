//! Desugaring pass that expands `$do` blocks into nested monadic calls.
//!
//! Transforms:
//! - `x <- m; rest`      → `M.bind(m, (x) => rest)`
//! - `e; rest`           → `M.bind(e, () => rest)`
//! - `$let(x = 1); rest` → `const x = 1; rest`
//! - last statement      → emitted as written
//! - `pure(v)`           → `M.return(v)` in modules with `$inject_return()`

pub mod abstraction;
pub mod capture;
pub mod desugar;
pub mod error;
pub mod expand;
pub mod inject;
pub mod pattern;

#[cfg(test)]
mod test_util;

pub use abstraction::{Abstraction, MethodAbstraction};
pub use desugar::{desugar_module, expand_block};
pub use error::{DesugarError, DesugarErrors};
pub use expand::expand;
