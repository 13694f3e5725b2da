//! Exit codes and errors raised at the CLI boundary.

use index_config_ports::schema_codes;
use index_config_shared::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    Internal = 1,
    InvalidInput = 2,
    Io = 3,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Exit code for a failed use case or config load.
///
/// Verification failures count as invalid input, transport and remote
/// failures as I/O. An interrupted run exits as internal.
#[must_use]
pub fn exit_code_for(error: &ErrorEnvelope) -> ExitCode {
    if error.kind == ErrorKind::Invariant
        || error.code == ErrorCode::internal()
        || error.is_cancelled()
    {
        return ExitCode::Internal;
    }
    let remote = [
        schema_codes::auth(),
        schema_codes::not_found(),
        schema_codes::timeout(),
        schema_codes::connection(),
        schema_codes::server(),
        schema_codes::unknown(),
        schema_codes::invalid_response(),
        ErrorCode::io(),
        ErrorCode::timeout(),
        ErrorCode::not_found(),
        ErrorCode::permission_denied(),
    ];
    if remote.contains(&error.code) || error.class == ErrorClass::Retriable {
        return ExitCode::Io;
    }
    match error.kind {
        ErrorKind::Expected => ExitCode::InvalidInput,
        ErrorKind::Invariant | ErrorKind::Unexpected => ExitCode::Internal,
    }
}

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_failures_are_invalid_input() {
        let error = ErrorEnvelope::expected(schema_codes::wrong_index_type(), "Wrong index type");
        assert_eq!(exit_code_for(&error), ExitCode::InvalidInput);
        let error = ErrorEnvelope::expected(ErrorCode::new("config", "invalid_url"), "bad url");
        assert_eq!(exit_code_for(&error), ExitCode::InvalidInput);
    }

    #[test]
    fn remote_failures_are_io() {
        let error = ErrorEnvelope::expected(schema_codes::auth(), "unauthorized");
        assert_eq!(exit_code_for(&error), ExitCode::Io);
        let error = ErrorEnvelope::unexpected(
            schema_codes::server(),
            "bad gateway",
            ErrorClass::Retriable,
        );
        assert_eq!(exit_code_for(&error), ExitCode::Io);
    }

    #[test]
    fn invariants_are_internal() {
        let error = ErrorEnvelope::invariant(ErrorCode::new("domain", "invalid_hnsw"), "broken");
        assert_eq!(exit_code_for(&error), ExitCode::Internal);
        assert_eq!(ExitCode::Io.as_u8(), 3);
    }
}
