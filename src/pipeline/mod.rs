//! Shared input/output plumbing for CLI command handlers.

mod output;
mod parse;

pub use output::{render_json, write_output, OutputTarget};
pub use parse::{load_json, load_sbom, load_text};

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// An error occurred
    pub const ERROR: i32 = 3;
}
