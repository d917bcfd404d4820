use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::Collaborator;
use crate::config::CollaboratorConfig;
use crate::consts::MAX_STDERR_BYTES;
use crate::error::{RelayError, Result};

/// Safe environment variables to pass through. Everything else is stripped.
const SAFE_ENV_VARS: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LANG",
    "LC_ALL",
    "TZ",
    "TMPDIR",
    "PYTHONPATH",
    "PYTHONHOME",
    "VIRTUAL_ENV",
    "CONDA_PREFIX",
];

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Bytes kept from a stream plus how many were actually written.
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    total: usize,
}

impl Captured {
    fn overflowed(&self) -> bool {
        self.total > self.bytes.len()
    }
}

/// Read a stream to EOF, keeping at most `limit` bytes.
///
/// The rest is still consumed so the child never blocks on a full pipe.
async fn drain<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> std::io::Result<Captured> {
    let mut captured = Captured::default();
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        captured.total += n;
        let room = limit.saturating_sub(captured.bytes.len());
        captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
    }
    Ok(captured)
}

/// Runs an external program per call: discrete argv, sanitized environment,
/// complete stdout buffered until exit, bounded by a deadline.
pub struct ProcessCollaborator {
    name: String,
    config: CollaboratorConfig,
}

impl ProcessCollaborator {
    pub fn new(name: impl Into<String>, config: CollaboratorConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    fn filtered_env() -> Vec<(String, String)> {
        SAFE_ENV_VARS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|val| (key.to_string(), val)))
            .collect()
    }

    fn stderr_excerpt(captured: &Captured) -> String {
        let text = String::from_utf8_lossy(&captured.bytes);
        let text = text.trim();
        if captured.overflowed() {
            format!("{text} [truncated]")
        } else {
            text.to_string()
        }
    }

    fn command(&self, value: &str) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(self.config.argv(value))
            .env_clear()
            .envs(Self::filtered_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl Collaborator for ProcessCollaborator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, value: &str) -> Result<String> {
        let program = &self.config.program;
        let started = Instant::now();

        let mut child = self
            .command(value)
            .spawn()
            .map_err(|source| RelayError::Spawn {
                program: program.clone(),
                source,
            })?;
        debug!(collaborator = %self.name, pid = ?child.id(), "spawned");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("child stderr was not piped"))?;

        let limit = self.config.max_output_bytes;
        let collect = async {
            tokio::try_join!(
                drain(stdout, limit),
                drain(stderr, MAX_STDERR_BYTES),
                child.wait()
            )
        };

        let (out, err, status) = match tokio::time::timeout(self.config.timeout, collect).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    collaborator = %self.name,
                    timeout = ?self.config.timeout,
                    "deadline exceeded, killing child"
                );
                if let Err(e) = child.kill().await {
                    warn!(collaborator = %self.name, error = %e, "failed to kill child");
                }
                return Err(RelayError::Timeout {
                    program: program.clone(),
                    after: self.config.timeout,
                });
            }
        };

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            let stderr = Self::stderr_excerpt(&err);
            warn!(collaborator = %self.name, code, %stderr, "child exited unsuccessfully");
            return Err(RelayError::Failed {
                program: program.clone(),
                code,
                stderr,
            });
        }

        if out.overflowed() {
            return Err(RelayError::OutputTooLarge {
                program: program.clone(),
                limit,
            });
        }

        info!(
            collaborator = %self.name,
            bytes = out.total,
            elapsed = ?started.elapsed(),
            "child finished"
        );
        Ok(String::from_utf8_lossy(&out.bytes).into_owned())
    }
}
