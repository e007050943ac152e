pub mod path_utils;
pub mod pattern;

pub use pattern::{Pattern, PatternCaptures, PatternError, PatternFlags};
