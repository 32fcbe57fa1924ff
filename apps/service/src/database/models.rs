use std::time::{Duration, SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Chat/thread pair a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub chat_id: i64,
    pub thread_id: Option<i64>,
}

/// A monitored site registered by a chat member.
///
/// Removal never deletes the row; `is_active` is flipped off so history
/// and the no-op-on-missing contract stay intact.
#[derive(Debug, Clone)]
pub struct Site {
    pub id: Option<i64>,
    pub uuid: Uuid,
    pub url: String,
    pub user_id: i64,
    pub chat_id: i64,
    pub thread_id: Option<i64>,
    /// Check cadence; always within 5..=10080 by construction.
    pub interval_minutes: u32,
    /// Time of the most recent probe attempt, successful or not.
    pub last_check: SystemTime,
    pub is_active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Site {
    /// A freshly registered site. `last_check` starts at registration
    /// time, so the first probe lands one interval later.
    pub fn new(url: String, user_id: i64, destination: Destination, interval_minutes: u32) -> Self {
        let now = SystemTime::now();
        Self {
            id: None,
            uuid: Uuid::new_v4(),
            url,
            user_id,
            chat_id: destination.chat_id,
            thread_id: destination.thread_id,
            interval_minutes,
            last_check: now,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn destination(&self) -> Destination {
        Destination { chat_id: self.chat_id, thread_id: self.thread_id }
    }
}

/// A principal known from a `/start` interaction; carries the daily
/// digest preference.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Option<i64>,
    pub user_id: i64,
    pub chat_id: i64,
    pub thread_id: Option<i64>,
    pub is_active: bool,
    pub daily_digest: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Principal {
    pub fn new(user_id: i64, destination: Destination) -> Self {
        let now = SystemTime::now();
        Self {
            id: None,
            user_id,
            chat_id: destination.chat_id,
            thread_id: destination.thread_id,
            is_active: true,
            daily_digest: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn destination(&self) -> Destination {
        Destination { chat_id: self.chat_id, thread_id: self.thread_id }
    }
}

/// Convert SystemTime to Unix-epoch milliseconds for storage.
///
/// Millisecond precision matters: due-ness compares elapsed time against
/// the interval at millisecond resolution.
pub fn timestamp_to_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

/// Convert stored Unix-epoch milliseconds back to SystemTime.
pub fn millis_to_timestamp(millis: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(millis.max(0) as u64)
}
