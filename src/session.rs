//! Operator session with an online-presence ticker.
//!
//! Session state is an explicit object rather than process-global state: the
//! ticker task is owned by the `Session`, stops through a watch channel, and
//! `sign_out` awaits the task so teardown is deterministic. If a `Session` is
//! dropped without signing out, the sender side of the channel drops and the
//! ticker exits on its next wakeup.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::store::RecordStore;
use crate::types::Identity;

pub struct Session {
    operator: Identity,
    last_activity: Arc<Mutex<Instant>>,
    idle_timeout: Duration,
    shutdown: watch::Sender<bool>,
    ticker: Option<JoinHandle<()>>,
}

impl Session {
    /// Sign the operator in and start the presence ticker. Every `heartbeat`
    /// the ticker writes a presence ping; a failed ping is logged and the
    /// ticker keeps going.
    pub fn sign_in(
        store: Arc<dyn RecordStore>,
        operator: Identity,
        heartbeat: Duration,
        idle_timeout: Duration,
    ) -> Self {
        let (shutdown, mut rx) = watch::channel(false);
        let operator_id = operator.id.clone();

        let ticker = tokio::spawn(async move {
            log::debug!("presence ticker started for {}", operator_id);
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(heartbeat) => {
                        if let Err(e) = store.record_presence(&operator_id).await {
                            log::warn!("presence heartbeat failed: {}", e);
                        }
                    }
                    _ = rx.changed() => {
                        log::debug!("presence ticker stopped for {}", operator_id);
                        break;
                    }
                }
            }
        });

        Self {
            operator,
            last_activity: Arc::new(Mutex::new(Instant::now())),
            idle_timeout,
            shutdown,
            ticker: Some(ticker),
        }
    }

    pub fn operator(&self) -> &Identity {
        &self.operator
    }

    /// Mark operator activity, resetting the idle clock.
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// True once the idle timeout has elapsed since the last `touch`.
    pub fn is_expired(&self) -> bool {
        self.last_activity.lock().elapsed() >= self.idle_timeout
    }

    /// Stop the ticker and wait for it to finish.
    pub async fn sign_out(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.ticker.take() {
            if let Err(e) = handle.await {
                log::warn!("presence ticker ended abnormally: {}", e);
            }
        }
        log::info!("operator {} signed out", self.operator.id);
    }
}
