//! The ambient single-threaded cooperative runtime that turns the
//! coordinator/driver's queued side effects into real `tokio::time`
//! timers and wires up structured logging, modeled on host-side
//! Bluetooth daemons rather than an embedded executor (there is no
//! embassy runtime on a host binary).

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::backend::{AvdtpBackend, HidReportInjector, L2capBackend, SdpPublisher};
use crate::context::{Daemon, TimerAction};
use crate::ids::{SepHandle, TimerToken};

/// Initializes a `tracing` subscriber from `RUST_LOG`, falling back to
/// `warn` for this crate if unset.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV)
        .map(tracing_subscriber::EnvFilter::new)
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                tracing::Level::WARN
            ))
        });
    tracing_subscriber::fmt().with_env_filter(env_filter).try_init()?;
    Ok(())
}

/// A timer that fired: the event loop hands this straight to
/// [`Daemon::on_suspend_timeout`], which itself discards stale fires
/// whose token no longer matches the SEP's armed one.
type TimerFire = (SepHandle, TimerToken);

/// Spawns a `tokio::time::sleep` task for every [`TimerAction::Arm`] in
/// `actions`, each reporting back on `tx` once it elapses.
/// [`TimerAction::Disarm`] needs no task of its own: the SEP's token
/// already changed, so any previously spawned sleep for it becomes
/// stale and `on_suspend_timeout` drops it silently.
pub fn spawn_timer_actions(actions: Vec<TimerAction>, tx: mpsc::Sender<TimerFire>) {
    for action in actions {
        if let TimerAction::Arm { sep, token, timeout } = action {
            let tx = tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                let _ = tx.send((sep, token)).await;
            });
        }
    }
}

/// Drains `daemon`'s timer actions, spawning tasks for any newly armed
/// ones, then awaits the next fire and feeds it back into
/// `on_suspend_timeout`, repeating until `rx` closes.
pub async fn run_timer_loop<B, L, P, R>(daemon: Arc<Mutex<Daemon<B, L, P, R>>>, mut rx: mpsc::Receiver<TimerFire>, tx: mpsc::Sender<TimerFire>)
where
    B: AvdtpBackend + Send + 'static,
    L: L2capBackend + Send + 'static,
    P: SdpPublisher + Send + 'static,
    R: HidReportInjector + Send + 'static,
{
    {
        let mut guard = daemon.lock().await;
        let actions = guard.drain_timer_actions();
        drop(guard);
        spawn_timer_actions(actions, tx.clone());
    }

    while let Some((sep, token)) = rx.recv().await {
        let mut guard = daemon.lock().await;
        guard.on_suspend_timeout(sep, token);
        let actions = guard.drain_timer_actions();
        drop(guard);
        spawn_timer_actions(actions, tx.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn armed_timer_fires_after_its_timeout() {
        let (tx, mut rx) = mpsc::channel(4);
        spawn_timer_actions(
            vec![TimerAction::Arm {
                sep: SepHandle(1),
                token: TimerToken(1),
                timeout: Duration::from_millis(50),
            }],
            tx,
        );
        tokio::time::advance(Duration::from_millis(60)).await;
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, (SepHandle(1), TimerToken(1)));
    }
}
