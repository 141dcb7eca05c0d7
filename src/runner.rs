//! External tool invocation
//!
//! Every backend operation spawns an external process and blocks until
//! it finishes. The `CommandRunner` trait is the seam that lets tests
//! replay canned outputs instead of touching host state.

use std::process::Command;

use crate::error::Result;

/// Captured output of one external tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code with signal termination collapsed to -1
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

/// Executes an external tool and captures its output
pub trait CommandRunner: Send + Sync {
    fn run(&self, tool: &str, args: &[&str]) -> Result<ToolOutput>;
}

/// Runs tools on the host, optionally through sudo
pub struct HostRunner {
    sudo: bool,
    verbose: bool,
}

impl HostRunner {
    pub fn new(sudo: bool) -> Self {
        Self {
            sudo,
            verbose: false,
        }
    }

    /// Echo each invocation to stderr before running it
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the NETRIG_SUDO environment toggle
    ///
    /// Privilege escalation only happens when this toggle or the
    /// `--sudo` flag is set, never implicitly.
    pub fn sudo_from_env() -> bool {
        std::env::var("NETRIG_SUDO").map(|v| v == "1").unwrap_or(false)
    }
}

impl CommandRunner for HostRunner {
    fn run(&self, tool: &str, args: &[&str]) -> Result<ToolOutput> {
        if self.verbose {
            eprintln!("+ {} {}", tool, args.join(" "));
        }

        let mut cmd = if self.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(tool);
            cmd
        } else {
            Command::new(tool)
        };

        let output = cmd.args(args).output()?;

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_signal_collapses() {
        let out = ToolOutput {
            stdout: String::new(),
            stderr: String::new(),
            code: None,
        };
        assert!(!out.success());
        assert_eq!(out.exit_code(), -1);
    }

    #[test]
    fn test_sudo_toggle_off_by_default() {
        // The toggle must be explicit; an unset variable means no escalation
        if std::env::var("NETRIG_SUDO").is_err() {
            assert!(!HostRunner::sudo_from_env());
        }
    }
}
