//! Output formatter implementations

pub mod concise;
pub mod json;
pub mod json_lines;
pub mod text;

pub use concise::ConciseFormatter;
pub use json::JsonFormatter;
pub use json_lines::JsonLinesFormatter;
pub use text::TextFormatter;
