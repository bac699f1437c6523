//! One-slot registry for the active simulated publication.

use crate::media::SyntheticSource;
use crate::room::{RoomHandle, TrackPublication};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct ActivePublication {
    publication: TrackPublication,
    source: Arc<SyntheticSource>,
}

/// Tracks the one simulated publication a session may have and guarantees
/// the transport is clean before a new send and after every send.
///
/// Unpublish failures are logged, never fatal: a stale track the transport
/// refuses to release must not block the next send.
pub struct TrackLifecycle {
    room: Arc<dyn RoomHandle>,
    active: Mutex<Option<ActivePublication>>,
}

impl TrackLifecycle {
    pub fn new(room: Arc<dyn RoomHandle>) -> Self {
        Self {
            room,
            active: Mutex::new(None),
        }
    }

    /// Retires whatever the previous send left behind, so the new publish
    /// starts with zero simulated publications outstanding.
    pub async fn retire_active(&self) {
        if self.release().await {
            debug!("previous simulated publication retired before new send");
        }
    }

    /// Records the publication produced by a fresh send operation.
    pub async fn register(&self, publication: TrackPublication, source: Arc<SyntheticSource>) {
        let mut active = self.active.lock().await;
        if let Some(stale) = active.take() {
            // Should not happen when sends are serialized as documented,
            // but never leave an orphaned track on the transport.
            warn!(track = %stale.publication.name, "replacing a publication that was never retired");
            stale.source.detach().await;
            if let Err(error) = self.room.unpublish_track(&stale.publication.sid).await {
                warn!(track = %stale.publication.name, %error, "failed to unpublish stale track");
            }
        }
        *active = Some(ActivePublication {
            publication,
            source,
        });
    }

    /// Detaches and unpublishes the active publication, if any. Callable any
    /// number of times; every send funnels through here on success, error,
    /// and timeout alike.
    pub async fn teardown(&self) {
        self.release().await;
    }

    async fn release(&self) -> bool {
        let taken = self.active.lock().await.take();
        let Some(active) = taken else {
            return false;
        };
        active.source.detach().await;
        if let Err(error) = self.room.unpublish_track(&active.publication.sid).await {
            warn!(track = %active.publication.name, %error, "failed to unpublish simulated track");
        }
        debug!(track = %active.publication.name, "simulated track released");
        true
    }
}
