//! Exit codes for `graphql-watch`.
//!
//! Distinct codes let scripts and CI systems tell a project with errors
//! apart from a run that couldn't analyze the project at all.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// No errors
    Success = 0,
    /// The one-shot run found error diagnostics
    ValidationError = 1,
    /// Missing or invalid config, unknown preset, bad preset options
    ConfigError = 2,
    /// The project root couldn't be read
    IoError = 4,
}

impl ExitCode {
    /// Exit the process with this exit code.
    pub fn exit(self) -> ! {
        std::process::exit(self as i32)
    }
}
