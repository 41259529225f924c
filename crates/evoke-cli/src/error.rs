//! CLI exit codes.
//!
//! - 0: Success
//! - 1: Runtime failure (bad input, unavailable collaborator, timeout)
//! - 2: Startup failure (configuration or static data unusable)

use evoke_core::EvokeError;

/// Exit codes for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CliExitCode {
    /// Command completed
    Success = 0,
    /// Request-time failure; the same invocation may succeed later
    Failure = 1,
    /// Configuration or data failure; nothing will succeed until it is fixed
    Startup = 2,
}

impl From<CliExitCode> for i32 {
    fn from(code: CliExitCode) -> Self {
        code as i32
    }
}

impl From<&EvokeError> for CliExitCode {
    fn from(err: &EvokeError) -> Self {
        if err.is_startup_fatal() {
            CliExitCode::Startup
        } else {
            CliExitCode::Failure
        }
    }
}

/// Determine the exit code for an error chain.
///
/// The first [`EvokeError`] in the chain decides; anything else (unreadable
/// input files, malformed arguments) is a plain failure.
pub fn exit_code_for_error(err: &anyhow::Error) -> CliExitCode {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<EvokeError>())
        .map(CliExitCode::from)
        .unwrap_or(CliExitCode::Failure)
}
