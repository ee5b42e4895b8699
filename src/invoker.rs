// src/invoker.rs

use std::process::Command;

use crate::config::SourceCommand;
use crate::error::ExporterError;

/// Runs an external sampler and hands back its stdout.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<String, ExporterError>;

    fn run_source(&self, source: &SourceCommand) -> Result<String, ExporterError> {
        self.run(&source.program, &source.args)
    }
}

/// Blocking `std::process::Command` runner. No timeout, no retry.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, ExporterError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ExporterError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExporterError::CommandFailed {
                program: program.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
