//! # Debounced Push
//!
//! A trailing-edge debouncer running as its own task. Every trigger pushes
//! the deadline out by one period; the action runs once the triggers stop.
//!
//! ```text
//!  trigger  trigger      trigger
//!     │        │            │
//!     ▼        ▼            ▼
//! ────┬────────┬────────────┬──────────────────┬──────►  time
//!     └─ period ┘ (reset)   └──── period ──────┘
//!                                              action()
//! ```
//!
//! The action runs inside the task, so triggers that arrive while it is
//! running queue up and start a fresh window afterwards. `flush()` runs a
//! pending action immediately and waits for it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

/// The debounced action.
pub type DebouncedAction =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

// Far enough out that the disabled timer branch never matters.
const IDLE_SLEEP: Duration = Duration::from_secs(60 * 60 * 24 * 365);

enum Command {
    Trigger,
    SetPeriod(Duration),
    Cancel,
    Flush(oneshot::Sender<bool>),
    IsPending(oneshot::Sender<bool>),
    Shutdown,
}

/// Handle to a running debouncer.
///
/// Cheap to clone. The task stops on `shutdown()` or when the last handle
/// is dropped.
#[derive(Clone)]
pub struct DebounceHandle {
    tx: mpsc::Sender<Command>,
}

impl DebounceHandle {
    /// Starts the debouncer task.
    pub fn spawn(period: Duration, action: DebouncedAction) -> Self {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run(period, action, rx));
        DebounceHandle { tx }
    }

    /// Schedules the action, restarting the window.
    pub async fn trigger(&self) {
        self.send(Command::Trigger).await;
    }

    /// Changes the window. A pending action is rescheduled with it.
    pub async fn set_period(&self, period: Duration) {
        self.send(Command::SetPeriod(period)).await;
    }

    /// Drops a pending action.
    pub async fn cancel(&self) {
        self.send(Command::Cancel).await;
    }

    /// Runs a pending action now. Returns whether one was pending.
    pub async fn flush(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Flush(reply)).await;
        rx.await.unwrap_or(false)
    }

    /// Whether an action is scheduled.
    pub async fn is_pending(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        self.send(Command::IsPending(reply)).await;
        rx.await.unwrap_or(false)
    }

    /// Stops the task. A pending action is dropped.
    pub async fn shutdown(&self) {
        self.send(Command::Shutdown).await;
    }

    async fn send(&self, command: Command) {
        if self.tx.send(command).await.is_err() {
            debug!("Debouncer already stopped");
        }
    }
}

async fn run(mut period: Duration, action: DebouncedAction, mut rx: mpsc::Receiver<Command>) {
    debug!(period_ms = period.as_millis() as u64, "Debouncer started");
    let mut deadline: Option<Instant> = None;

    loop {
        let wake_at = deadline.unwrap_or_else(|| Instant::now() + IDLE_SLEEP);

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Trigger) => {
                    deadline = Some(Instant::now() + period);
                }
                Some(Command::SetPeriod(new_period)) => {
                    period = new_period;
                    if deadline.is_some() {
                        deadline = Some(Instant::now() + period);
                    }
                }
                Some(Command::Cancel) => {
                    deadline = None;
                }
                Some(Command::Flush(reply)) => {
                    let pending = deadline.take().is_some();
                    if pending {
                        action().await;
                    }
                    let _ = reply.send(pending);
                }
                Some(Command::IsPending(reply)) => {
                    let _ = reply.send(deadline.is_some());
                }
                Some(Command::Shutdown) | None => break,
            },

            _ = sleep_until(wake_at), if deadline.is_some() => {
                deadline = None;
                action().await;
            }
        }
    }

    info!("Debouncer stopped");
}
