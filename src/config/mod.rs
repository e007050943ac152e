//! Configuration for eredmel.
//!
//! Two layers exist: the scoped settings a source file declares with `config:` lines
//! ([`Configuration`]), and the project file `.eredmel.toml` read by the command-line
//! driver ([`ProjectConfig`]), which seeds the session settings of every root file.

pub mod types;
pub use types::*;

mod loading;
pub use loading::{CONFIG_FILE_NAME, ConfigError, GlobalConfig, IndentStyle, ProjectConfig};
