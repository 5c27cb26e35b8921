//! Formatters that run as child processes reading source from stdin

use super::FormatError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Longest a formatter process may run before it is killed
pub const DEFAULT_FORMAT_TIMEOUT: Duration = Duration::from_secs(10);

/// A formatter implemented outside this process
#[async_trait]
pub trait ExternalFormatter: Send + Sync {
    fn name(&self) -> &str;

    async fn format(&self, content: &str) -> Result<String, FormatError>;
}

/// Runs `program args...`, writes the source to stdin and reads the result
/// from stdout
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandFormatter {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout: DEFAULT_FORMAT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ExternalFormatter for CommandFormatter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn format(&self, content: &str) -> Result<String, FormatError> {
        let unavailable = |source| FormatError::ToolUnavailable {
            tool: self.program.clone(),
            source,
        };

        // Dropping the child on any early return or timeout kills it
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(unavailable)?;

        let stdin = child.stdin.take();
        let feed = async move {
            match stdin {
                Some(mut stdin) => stdin.write_all(content.as_bytes()).await,
                None => Ok(()),
            }
        };

        let exchange = async { tokio::join!(feed, child.wait_with_output()) };
        let (written, output) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FormatError::TimedOut {
                tool: self.program.clone(),
                timeout: self.timeout,
            })?;

        let output = output.map_err(unavailable)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FormatError::ToolFailed {
                tool: self.program.clone(),
                message: crate::utils::text::truncate(stderr.trim(), 200),
            });
        }
        written.map_err(unavailable)?;

        String::from_utf8(output.stdout).map_err(|e| FormatError::ToolFailed {
            tool: self.program.clone(),
            message: format!("non UTF-8 output: {}", e),
        })
    }
}
