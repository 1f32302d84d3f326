//! Small shared utilities.

mod case_insensitive;

pub use case_insensitive::CaseInsensitiveMap;
