//! Retry classification and the port power state machine
//!
//! ```text
//! Idle -> Attempting -> Success
//!              |
//!              +-> Retrying -> Attempting
//!              +-> Exhausted
//! ```

use std::fmt;

/// Classification of one transfer attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Success,
    Retryable(String),
    Fatal(String),
}

/// Maps a raw control transfer result to a [`RetryOutcome`]
pub type Classifier = fn(&Result<usize, rusb::Error>) -> RetryOutcome;

/// Default classifier for port power requests
///
/// Interrupted, timed-out and I/O failures are worth another try. A missing
/// device will not come back by itself. Anything else is terminal too, which
/// keeps the retry loop bounded for error codes nobody anticipated.
pub fn classify_transfer(result: &Result<usize, rusb::Error>) -> RetryOutcome {
    match result {
        Ok(_) => RetryOutcome::Success,
        Err(rusb::Error::Interrupted) => RetryOutcome::Retryable("interrupt".to_string()),
        Err(rusb::Error::Timeout) => {
            RetryOutcome::Retryable("control transfer timeout".to_string())
        }
        Err(rusb::Error::Io) => RetryOutcome::Retryable("IO error in libusb".to_string()),
        Err(rusb::Error::NoDevice) => RetryOutcome::Fatal("device not present".to_string()),
        Err(e) => RetryOutcome::Fatal(format!("unexpected transfer error: {}", e)),
    }
}

/// Progress of one port power request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerState {
    Idle,
    /// Transfer number `attempt` (1-based) is about to be issued
    Attempting { attempt: u32 },
    /// Transfer number `attempt` failed in a retryable way
    Retrying { attempt: u32, reason: String },
    Success { attempts: u32 },
    Exhausted { attempts: u32, reason: String },
}

impl PowerState {
    /// Move from `Idle` or `Retrying` to the next `Attempting`
    pub fn begin(self) -> Self {
        match self {
            PowerState::Idle => PowerState::Attempting { attempt: 1 },
            PowerState::Retrying { attempt, .. } => PowerState::Attempting {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    /// Apply the outcome of the transfer issued in `Attempting`
    pub fn record(self, outcome: RetryOutcome, max_attempts: u32) -> Self {
        let PowerState::Attempting { attempt } = self else {
            return self;
        };

        match outcome {
            RetryOutcome::Success => PowerState::Success { attempts: attempt },
            RetryOutcome::Retryable(reason) if attempt < max_attempts => {
                PowerState::Retrying { attempt, reason }
            }
            RetryOutcome::Retryable(reason) | RetryOutcome::Fatal(reason) => {
                PowerState::Exhausted {
                    attempts: attempt,
                    reason,
                }
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PowerState::Success { .. } | PowerState::Exhausted { .. }
        )
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::Idle => write!(f, "idle"),
            PowerState::Attempting { attempt } => write!(f, "attempting #{}", attempt),
            PowerState::Retrying { attempt, reason } => {
                write!(f, "retrying after #{} ({})", attempt, reason)
            }
            PowerState::Success { attempts } => write!(f, "success after {}", attempts),
            PowerState::Exhausted { attempts, reason } => {
                write!(f, "exhausted after {} ({})", attempts, reason)
            }
        }
    }
}
