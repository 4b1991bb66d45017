pub mod ast;
pub mod combinator;
pub mod engine;
pub mod scoring;

pub use ast::{Composition, Query};
pub use combinator::{combine, ResultMap, TermResult};
pub use engine::{validate_fields, QueryEngine};
