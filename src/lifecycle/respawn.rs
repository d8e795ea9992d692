//! Re-exec on reload.
//!
//! A hangup drains this process and starts a fresh instance of the same
//! executable. The child is detached: it is not waited on, gets no
//! arguments and binds its own listener. It inherits the environment, so
//! `GATED_SERVER_CONFIG` carries configuration across the reload.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Failure to start the replacement process. Logged, never fatal.
#[derive(Debug, Error)]
pub enum RespawnError {
    #[error("could not resolve current executable: {0}")]
    Executable(#[source] std::io::Error),

    #[error("failed to start {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Starts a new instance of the program.
pub trait Respawn {
    /// Start the instance and return its process id without waiting for it.
    fn respawn(&self) -> Result<u32, RespawnError>;
}

/// Spawns a real OS process.
#[derive(Debug, Clone, Default)]
pub struct ProcessRespawner {
    executable: Option<PathBuf>,
}

impl ProcessRespawner {
    /// `None` means the currently running executable.
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn executable(&self) -> Result<PathBuf, RespawnError> {
        match &self.executable {
            Some(path) => Ok(path.clone()),
            None => std::env::current_exe().map_err(RespawnError::Executable),
        }
    }
}

impl Respawn for ProcessRespawner {
    fn respawn(&self) -> Result<u32, RespawnError> {
        let path = self.executable()?;
        let child = Command::new(&path)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| RespawnError::Spawn {
                path: path.clone(),
                source,
            })?;

        // Dropping `Child` neither waits for nor kills the process.
        Ok(child.id())
    }
}
