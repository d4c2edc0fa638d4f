//! Completion token returned by the asynchronous path

use super::error::{LoggerError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

enum HandleState {
    Completed,
    Failed(Option<LoggerError>),
    Pending(JoinHandle<Result<()>>),
}

/// Resolves when an offloaded write has finished
///
/// Awaiting is optional: dropping the handle does not cancel the write.
/// Suppressed calls get the constant [`LogHandle::completed`] handle, which
/// carries no allocation.
///
/// ```
/// use janus_logging::LogHandle;
///
/// let handle = LogHandle::completed();
/// assert!(handle.is_finished());
/// assert!(tokio_test::block_on(handle).is_ok());
/// ```
#[must_use = "a LogHandle reports the write result only when awaited"]
pub struct LogHandle {
    state: HandleState,
}

impl LogHandle {
    /// Already resolved, successful handle
    pub const fn completed() -> Self {
        Self {
            state: HandleState::Completed,
        }
    }

    pub(crate) fn failed(error: LoggerError) -> Self {
        Self {
            state: HandleState::Failed(Some(error)),
        }
    }

    pub(crate) fn pending(join: JoinHandle<Result<()>>) -> Self {
        Self {
            state: HandleState::Pending(join),
        }
    }

    /// True for a handle that never scheduled any work
    pub fn is_noop(&self) -> bool {
        matches!(self.state, HandleState::Completed)
    }

    pub fn is_finished(&self) -> bool {
        match &self.state {
            HandleState::Completed | HandleState::Failed(_) => true,
            HandleState::Pending(join) => join.is_finished(),
        }
    }
}

impl Future for LogHandle {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let outcome = match &mut this.state {
            HandleState::Completed => return Poll::Ready(Ok(())),
            HandleState::Failed(error) => {
                return Poll::Ready(Err(error
                    .take()
                    .unwrap_or_else(|| LoggerError::other("log handle polled after completion"))));
            }
            HandleState::Pending(join) => match Pin::new(join).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(result)) => result,
                Poll::Ready(Err(join_error)) => Err(LoggerError::worker(format!(
                    "offloaded write did not complete: {}",
                    join_error
                ))),
            },
        };

        this.state = match outcome {
            Ok(()) => HandleState::Completed,
            Err(_) => HandleState::Failed(None),
        };
        Poll::Ready(outcome)
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            HandleState::Completed => "completed",
            HandleState::Failed(_) => "failed",
            HandleState::Pending(_) => "pending",
        };
        f.debug_struct("LogHandle").field("state", &state).finish()
    }
}
