//! Background reclamation of idle sessions.
//!
//! One task per manager. Each wake-up drains every session whose idle
//! deadline has passed, then sleeps until the next-oldest session falls
//! due. With no sessions left it parks until the manager signals that one
//! was inserted. The task holds only a weak reference to the manager state
//! and never sleeps with a lock held.

use std::sync::{Arc, Weak};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::manager::{ManagerInner, SessionManager};

pub(crate) async fn run(
    inner: Weak<ManagerInner>,
    wake: Arc<Notify>,
    shutdown: CancellationToken,
) {
    debug!("Session reclamation loop started");

    loop {
        let next = match inner.upgrade() {
            Some(inner) => SessionManager::from_inner(inner).reap_expired(),
            None => break,
        };

        match next {
            Some(delay) => {
                trace!(delay_ms = delay.as_millis() as u64, "Sleeping until next session deadline");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                    _ = wake.notified() => {}
                }
            }
            None => {
                trace!("No live sessions, reclamation loop dormant");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = wake.notified() => {}
                }
            }
        }
    }

    debug!("Session reclamation loop stopped");
}
