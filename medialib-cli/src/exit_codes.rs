//! Exit codes following sysexits.h conventions.

use medialib_core::{MediaError, StoreError};
use thiserror::Error;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (bad filter value, wrong kind, malformed snapshot).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Library file or asset not found.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Store refused access or needs the network.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// I/O error (cannot write the library file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// CLI-level failure carrying its own exit code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        let code = err
            .chain()
            .find_map(classify)
            .unwrap_or(GENERAL_ERROR);

        Self {
            code,
            message: Some(message),
        }
    }
}

/// Classify one link of the error chain; the outermost match wins.
fn classify(err: &(dyn std::error::Error + 'static)) -> Option<i32> {
    if let Some(err) = err.downcast_ref::<CliError>() {
        return Some(err.code);
    }
    if let Some(err) = err.downcast_ref::<MediaError>() {
        return Some(match err {
            MediaError::Store(store) => store_code(store),
            MediaError::InvalidArgument(_)
            | MediaError::UnexpectedKind { .. }
            | MediaError::NoRepresentation
            | MediaError::SerializationError(_) => DATA_ERROR,
        });
    }
    if let Some(err) = err.downcast_ref::<StoreError>() {
        return Some(store_code(err));
    }
    if let Some(err) = err.downcast_ref::<std::io::Error>() {
        return Some(match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => INPUT_ERROR,
            _ => IO_ERROR,
        });
    }
    None
}

fn store_code(err: &StoreError) -> i32 {
    match err {
        StoreError::PermissionDenied | StoreError::Network(_) => UNAVAILABLE,
        StoreError::NotFound(_) => INPUT_ERROR,
        StoreError::Conflict(_) | StoreError::Other(_) => GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn code_of(err: anyhow::Error) -> i32 {
        ExitCode::from_anyhow(&err).code
    }

    #[test]
    fn test_media_errors() {
        assert_eq!(
            code_of(MediaError::InvalidArgument("bad".into()).into()),
            DATA_ERROR
        );
        assert_eq!(
            code_of(MediaError::Store(StoreError::Network("offline".into())).into()),
            UNAVAILABLE
        );
        assert_eq!(
            code_of(MediaError::Store(StoreError::NotFound("x".into())).into()),
            INPUT_ERROR
        );
    }

    #[test]
    fn test_context_keeps_classification() {
        let err: anyhow::Result<()> = Err(MediaError::Store(StoreError::PermissionDenied).into());
        let err = err.context("Favorite failed").unwrap_err();
        assert_eq!(code_of(err), UNAVAILABLE);
    }

    #[test]
    fn test_io_errors() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(code_of(missing.into()), INPUT_ERROR);

        let full = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(code_of(full.into()), IO_ERROR);
    }

    #[test]
    fn test_cli_error_and_fallback() {
        assert_eq!(code_of(CliError::new(IO_ERROR, "write").into()), IO_ERROR);
        assert_eq!(code_of(anyhow::anyhow!("something else")), GENERAL_ERROR);
    }

    #[test]
    fn test_cli_error_displays_message_only() {
        let err = CliError::new(USAGE_ERROR, "Unknown album type: folder");
        assert_eq!(err.to_string(), "Unknown album type: folder");
        assert!(std::error::Error::source(&err).is_none());

        let exit = ExitCode::from_anyhow(&anyhow::Error::new(err).context("albums"));
        assert_eq!(exit.code, USAGE_ERROR);
        assert_eq!(exit.message.as_deref(), Some("albums: Unknown album type: folder"));
    }
}
