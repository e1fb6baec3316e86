//! Parser for toolchain template strings.
//!
//! Flag values, env values, and artifact name patterns all share one
//! micro-syntax: literal text with embedded `%{variable}` references, and
//! `%%` as the escape for a literal percent sign.

#[macro_use]
mod macros;

mod template;
pub use template::{parse, Chunk, Error, Template};
