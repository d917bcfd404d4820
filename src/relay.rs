//! The relay operations: validate, hand off to a collaborator, shape the answer.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::collaborator::Collaborator;
use crate::collaborator::process::ProcessCollaborator;
use crate::config::{InputLimits, RelayConfig};
use crate::consts::PING_MESSAGE;
use crate::error::{RelayError, Result};
use crate::grid;

/// Reject values that cannot or should not be handed to an external program.
fn validate(field: &'static str, value: &str, max_bytes: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelayError::invalid(field, "must not be empty"));
    }
    if value.len() > max_bytes {
        return Err(RelayError::invalid(
            field,
            format!("{} bytes exceeds the {max_bytes} byte limit", value.len()),
        ));
    }
    if value.contains('\0') {
        return Err(RelayError::invalid(field, "must not contain NUL bytes"));
    }
    Ok(())
}

/// Wires the extractor and solver together behind the three public operations.
/// Holds no per-request state; share it behind an `Arc`.
pub struct Relay {
    extractor: Arc<dyn Collaborator>,
    solver: Arc<dyn Collaborator>,
    limits: InputLimits,
}

impl Relay {
    pub fn new(
        extractor: Arc<dyn Collaborator>,
        solver: Arc<dyn Collaborator>,
        limits: InputLimits,
    ) -> Self {
        Self {
            extractor,
            solver,
            limits,
        }
    }

    /// Build a relay that runs real OS processes as described by `config`.
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            Arc::new(ProcessCollaborator::new("extractor", config.extractor.clone())),
            Arc::new(ProcessCollaborator::new("solver", config.solver.clone())),
            config.limits,
        )
    }

    /// Turn an image path into a flattened board string.
    pub async fn extract(&self, path: &str) -> Result<String> {
        validate("path", path, self.limits.max_path_bytes)?;
        debug!(collaborator = self.extractor.name(), %path, "extracting grid");

        let raw = self.extractor.invoke(path).await.inspect_err(|e| {
            warn!(collaborator = self.extractor.name(), error = %e, "extraction failed");
        })?;
        let board = grid::flatten(&raw);

        info!(raw_bytes = raw.len(), board_bytes = board.len(), "grid extracted");
        Ok(board)
    }

    /// Hand a board to the solver and return its output untouched.
    pub async fn resolve(&self, board: &str) -> Result<String> {
        validate("board", board, self.limits.max_board_bytes)?;
        debug!(collaborator = self.solver.name(), %board, "resolving board");

        let resolution = self.solver.invoke(board).await.inspect_err(|e| {
            warn!(collaborator = self.solver.name(), error = %e, "resolution failed");
        })?;

        info!(bytes = resolution.len(), "board resolved");
        Ok(resolution)
    }

    pub fn ping(&self) -> &'static str {
        PING_MESSAGE
    }
}
