//! Clip players
//!
//! A player turns one clip file into sound and returns only when playback has
//! finished. Players are blocking; the announcer runs them on the blocking
//! thread pool.

use crate::{Error, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Blocking playback of a single clip
pub trait ClipPlayer: Send + Sync {
    fn play(&self, path: &Path) -> Result<()>;
}

/// Plays clips with an external program, e.g. `mpg123 -q <clip>`
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    /// Build from a command line; the clip path is appended on each run
    pub fn from_command_line(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Config("empty player command".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl ClipPlayer for CommandPlayer {
    fn play(&self, path: &Path) -> Result<()> {
        debug!(program = %self.program, clip = %path.display(), "Playing clip");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| Error::Audio(format!("failed to run {}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Audio(format!(
                "{} exited with {} for {}",
                self.program,
                status,
                path.display()
            )))
        }
    }
}
