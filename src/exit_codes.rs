/// Exit codes for eredmel
///
/// These exit codes allow scripts and build systems to distinguish between
/// a preprocessing failure in the input and a failure of the tool itself.
/// Success - Every root was preprocessed (diagnostics below FATAL may have been reported)
pub const SUCCESS: i32 = 0;

/// Preprocessing aborted - A FATAL diagnostic occurred or `--abort-on` stopped the run
pub const ABORTED: i32 = 1;

/// Tool error - Configuration error, unreadable arguments, or output write failure
pub const TOOL_ERROR: i32 = 2;

/// Helper functions for consistent exit behavior
pub mod exit {
    use super::{ABORTED, SUCCESS, TOOL_ERROR};

    /// Exit with success code (0)
    pub fn success() -> ! {
        std::process::exit(SUCCESS);
    }

    /// Exit with aborted code (1)
    pub fn aborted() -> ! {
        std::process::exit(ABORTED);
    }

    /// Exit with tool error code (2)
    pub fn tool_error() -> ! {
        std::process::exit(TOOL_ERROR);
    }
}
