//! Project-wide constants.

use std::time::Duration;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Port the relay listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 4000;

/// Fixed acknowledgement returned by `GET /ping`.
pub const PING_MESSAGE: &str = "teste ping ok";

/// Interpreter used for both collaborators in the stock deployment.
pub const DEFAULT_INTERPRETER: &str = "python";

/// Image-to-grid script, resolved against the collaborator's working directory.
pub const DEFAULT_EXTRACTOR_SCRIPT: &str = "./elements_board_extractor.py";

/// Solver script, resolved against the collaborator's working directory.
pub const DEFAULT_SOLVER_SCRIPT: &str = "./sudoku_genetic_python.py";

/// Prefix the extractor expects in front of the image path.
pub const PATH_IMAGE_PREFIX: &str = "--pathImage=";

/// The genetic solver can take a while on hard boards.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Maximum stdout captured from a collaborator.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Maximum stderr kept for error reporting.
pub const MAX_STDERR_BYTES: usize = 4096;

/// Longest path or board accepted from a client.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 4096;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "sudoku_relay=info,tower_http=info";

/// Format a byte count with a binary unit suffix (e.g. 1.5 KiB).
pub fn format_bytes(n: usize) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB"];
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", n, UNITS[0])
    } else if value.fract() == 0.0 {
        format!("{} {}", value as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consts_are_non_empty() {
        assert!(!PING_MESSAGE.is_empty());
        assert!(!DEFAULT_INTERPRETER.is_empty());
        assert!(!DEFAULT_EXTRACTOR_SCRIPT.is_empty());
        assert!(!DEFAULT_SOLVER_SCRIPT.is_empty());
    }

    #[test]
    fn ping_message_is_fixed() {
        assert_eq!(PING_MESSAGE, "teste ping ok");
    }

    #[test]
    fn limits_are_positive() {
        assert!(DEFAULT_TIMEOUT > Duration::ZERO);
        assert!(DEFAULT_MAX_OUTPUT_BYTES > 0);
        assert!(DEFAULT_MAX_INPUT_BYTES > 0);
        assert!(MAX_STDERR_BYTES > 0);
    }

    #[test]
    fn format_bytes_small() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
    }

    #[test]
    fn format_bytes_whole_units() {
        assert_eq!(format_bytes(1024), "1 KiB");
        assert_eq!(format_bytes(DEFAULT_MAX_OUTPUT_BYTES), "1 MiB");
    }

    #[test]
    fn format_bytes_fractional() {
        assert_eq!(format_bytes(1536), "1.5 KiB");
    }
}
