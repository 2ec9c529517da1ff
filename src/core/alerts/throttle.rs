// Global cooldown gate for alert sounds.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use lazy_static::lazy_static;

/// Minimum spacing between two accepted playback requests.
pub const COOLDOWN: Duration = Duration::from_millis(250);

lazy_static! {
    static ref SHARED: Arc<NotificationThrottle> = Arc::new(NotificationThrottle::new(COOLDOWN));
}

pub struct NotificationThrottle {
    cooldown: Duration,
    last_fired: Mutex<Option<Instant>>,
}

impl NotificationThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: Mutex::new(None),
        }
    }

    /// The process-wide throttle every engine uses unless told otherwise.
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    pub fn try_play(&self, sound: &str) -> bool {
        self.try_play_at(sound, Instant::now())
    }

    /// Accept a playback request made at `now`.
    ///
    /// An empty sound id is rejected without touching the cooldown slot.
    pub fn try_play_at(&self, sound: &str, now: Instant) -> bool {
        if sound.is_empty() {
            return false;
        }

        let mut last = self.last_fired.lock().unwrap_or_else(PoisonError::into_inner);
        let ready = match *last {
            Some(prev) => now.saturating_duration_since(prev) >= self.cooldown,
            None => true,
        };
        if ready {
            *last = Some(now);
        }
        ready
    }
}

impl Default for NotificationThrottle {
    fn default() -> Self {
        Self::new(COOLDOWN)
    }
}
