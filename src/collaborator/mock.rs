use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Collaborator;
use crate::error::{RelayError, Result};

/// What a scripted collaborator does on one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Output(String),
    Timeout(Duration),
    Failed { code: i32, stderr: String },
    SpawnError,
}

/// A scripted collaborator for tests. Returns pre-defined replies in order
/// and records every value it was given.
pub struct MockCollaborator {
    name: String,
    replies: Vec<Reply>,
    index: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl MockCollaborator {
    pub fn new(name: &str, replies: Vec<Reply>) -> Self {
        Self {
            name: name.to_string(),
            replies,
            index: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a collaborator that prints `output` once.
    pub fn printing(name: &str, output: &str) -> Self {
        Self::new(name, vec![Reply::Output(output.to_string())])
    }

    /// Values received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Collaborator for MockCollaborator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, value: &str) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(value.to_string());
        }
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.get(i).ok_or_else(|| {
            std::io::Error::other(format!(
                "MockCollaborator: no more replies (called {} times)",
                i + 1
            ))
        })?;

        match reply {
            Reply::Output(text) => Ok(text.clone()),
            Reply::Timeout(after) => Err(RelayError::Timeout {
                program: self.name.clone(),
                after: *after,
            }),
            Reply::Failed { code, stderr } => Err(RelayError::Failed {
                program: self.name.clone(),
                code: *code,
                stderr: stderr.clone(),
            }),
            Reply::SpawnError => Err(RelayError::Spawn {
                program: self.name.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}
