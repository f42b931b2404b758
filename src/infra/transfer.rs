// ============================================================
// Layer 6 — Cloud Transfer
// ============================================================
// Cloud destinations are handed to the provider's own copy tool:
//
//   gs://...  → gsutil cp <src> <dst>
//   s3://...  → aws s3 cp <src> <dst>
//
// A non-zero exit is retried with exponential backoff. A copy
// tool that is not installed fails immediately.

use std::{process::Command, thread, time::Duration};

use crate::domain::error::{BodaError, Result};

/// Recognised cloud URI schemes and the command that copies them
const CLOUD_TOOLS: &[(&str, &[&str])] = &[
    ("gs://", &["gsutil", "cp"]),
    ("s3://", &["aws", "s3", "cp"]),
];

pub fn is_cloud_uri(path: &str) -> bool {
    CLOUD_TOOLS.iter().any(|(scheme, _)| path.starts_with(scheme))
}

/// Retry schedule for external copies
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay:   Duration,
    pub max_delay:    Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay:   Duration::from_secs(1),
            max_delay:    Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(retry));
        delay.min(self.max_delay)
    }
}

/// Runs the copy command for one cloud scheme
#[derive(Debug, Clone)]
pub struct CloudCopier {
    program: String,
    args:    Vec<String>,
    retry:   RetryPolicy,
}

impl CloudCopier {
    /// Copier for whichever side of the copy is a cloud URI
    pub fn for_uri(uri: &str) -> Option<Self> {
        CLOUD_TOOLS
            .iter()
            .find(|(scheme, _)| uri.starts_with(scheme))
            .map(|(_, cmd)| Self {
                program: cmd[0].to_string(),
                args:    cmd[1..].iter().map(|s| s.to_string()).collect(),
                retry:   RetryPolicy::default(),
            })
    }

    /// A copier running an arbitrary program
    #[cfg(test)]
    pub fn with_program(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args, retry: RetryPolicy::default() }
    }

    #[cfg(test)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Copy `src` to `dst`. Errors name `dst` as the destination.
    pub fn copy(&self, src: &str, dst: &str) -> Result<()> {
        let fail = |cause: String| BodaError::TransferFailed {
            destination: dst.to_string(),
            cause,
        };

        let attempts = self.retry.max_attempts.max(1);
        let mut last_cause = String::new();

        for attempt in 1..=attempts {
            tracing::info!("{} {} {} {} (attempt {}/{})", self.program, self.args.join(" "), src, dst, attempt, attempts);

            let status = Command::new(&self.program)
                .args(&self.args)
                .arg(src)
                .arg(dst)
                .status();

            match status {
                Ok(s) if s.success() => return Ok(()),
                Ok(s) => {
                    last_cause = format!("'{}' exited with {}", self.program, s);
                    tracing::warn!("Copy attempt {} failed: {}", attempt, last_cause);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(fail(format!("copy command '{}' not found", self.program)));
                }
                Err(e) => {
                    last_cause = format!("could not run '{}': {e}", self.program);
                    tracing::warn!("Copy attempt {} failed: {}", attempt, last_cause);
                }
            }

            if attempt < attempts {
                thread::sleep(self.retry.backoff(attempt - 1));
            }
        }

        Err(fail(format!("{last_cause} after {attempts} attempts")))
    }
}
