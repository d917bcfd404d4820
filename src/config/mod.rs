//! Runtime configuration for the relay and its external collaborators.
//!
//! `main.rs` builds a [`RelayConfig`] from command-line flags and environment
//! variables; everything else only sees the validated struct.

use anyhow::{Result, bail};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::consts::{
    DEFAULT_EXTRACTOR_SCRIPT, DEFAULT_INTERPRETER, DEFAULT_MAX_INPUT_BYTES,
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_PORT, DEFAULT_SOLVER_SCRIPT, DEFAULT_TIMEOUT,
    PATH_IMAGE_PREFIX,
};

/// How to launch one external program.
#[derive(Debug, Clone, PartialEq)]
pub struct CollaboratorConfig {
    /// Executable, looked up on `PATH` when not absolute.
    pub program: String,
    /// Fixed leading arguments (typically the script path).
    pub args: Vec<String>,
    /// Prepended to the caller's value to form the final argument.
    pub argument_prefix: String,
    /// Working directory for the child; inherits ours when `None`.
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl CollaboratorConfig {
    /// The image-to-grid extractor: `python ./elements_board_extractor.py --pathImage=<path>`.
    pub fn extractor() -> Self {
        Self {
            program: DEFAULT_INTERPRETER.to_string(),
            args: vec![DEFAULT_EXTRACTOR_SCRIPT.to_string()],
            argument_prefix: PATH_IMAGE_PREFIX.to_string(),
            working_dir: None,
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// The puzzle solver: `python ./sudoku_genetic_python.py <board>`.
    pub fn solver() -> Self {
        Self {
            program: DEFAULT_INTERPRETER.to_string(),
            args: vec![DEFAULT_SOLVER_SCRIPT.to_string()],
            argument_prefix: String::new(),
            working_dir: None,
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Full argument vector for one invocation with the caller's value.
    pub fn argv(&self, value: &str) -> Vec<String> {
        let mut argv = self.args.clone();
        argv.push(format!("{}{}", self.argument_prefix, value));
        argv
    }

    /// Human-readable command line for banners and logs.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.as_str()];
        parts.extend(self.args.iter().map(String::as_str));
        parts.join(" ")
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.program.trim().is_empty() {
            bail!("{name}: program must not be empty");
        }
        if self.timeout.is_zero() {
            bail!("{name}: timeout must be greater than zero");
        }
        if self.max_output_bytes == 0 {
            bail!("{name}: max output bytes must be greater than zero");
        }
        if let Some(dir) = &self.working_dir {
            if !dir.is_dir() {
                bail!("{name}: working directory {} does not exist", dir.display());
            }
        }
        Ok(())
    }
}

/// Bounds on caller-supplied values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputLimits {
    pub max_path_bytes: usize,
    pub max_board_bytes: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_path_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_board_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// Everything the relay needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub listen: SocketAddr,
    pub extractor: CollaboratorConfig,
    pub solver: CollaboratorConfig,
    pub limits: InputLimits,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            extractor: CollaboratorConfig::extractor(),
            solver: CollaboratorConfig::solver(),
            limits: InputLimits::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate("extractor")?;
        self.solver.validate("solver")?;
        if self.limits.max_path_bytes == 0 || self.limits.max_board_bytes == 0 {
            bail!("input limits must be greater than zero");
        }
        Ok(())
    }
}
