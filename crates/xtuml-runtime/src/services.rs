//! Runtime services: the message log, timers and the clock.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::instance::{InstanceId, Payload};

/// Handle returned by `Runtime::start_timer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// A message sent to an instance that is recorded rather than dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub target: InstanceId,
    pub name: String,
    pub payload: Payload,
    pub sent_at: DateTime<Utc>,
}

/// Dropping the sender wakes the timer thread with `Disconnected`.
#[derive(Debug)]
struct PendingTimer {
    _cancel: mpsc::Sender<()>,
}

#[derive(Debug)]
pub struct Services {
    messages: Mutex<Vec<Message>>,
    timers: Mutex<HashMap<TimerId, PendingTimer>>,
    next_timer: AtomicU64,
    frozen: Mutex<Option<DateTime<Utc>>>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            timers: Mutex::new(HashMap::new()),
            next_timer: AtomicU64::new(1),
            frozen: Mutex::new(None),
        }
    }
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send_message(&self, target: InstanceId, name: &str, payload: Payload) {
        let message = Message {
            target,
            name: name.to_string(),
            payload,
            sent_at: self.current_timestamp(),
        };
        lock(&self.messages).push(message);
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.messages).clone()
    }

    pub(crate) fn next_timer_id(&self) -> TimerId {
        TimerId(self.next_timer.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn register_timer(&self, id: TimerId, cancel: mpsc::Sender<()>) {
        lock(&self.timers).insert(id, PendingTimer { _cancel: cancel });
    }

    /// Removes the registration of a timer that is about to fire. False when
    /// it was cancelled first.
    pub(crate) fn claim_timer(&self, id: TimerId) -> bool {
        lock(&self.timers).remove(&id).is_some()
    }

    /// False when the timer already fired or was cancelled.
    pub fn cancel_timer(&self, id: TimerId) -> bool {
        lock(&self.timers).remove(&id).is_some()
    }

    pub fn active_timers(&self) -> Vec<TimerId> {
        let mut ids: Vec<TimerId> = lock(&self.timers).keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn cancel_all_timers(&self) -> usize {
        let mut timers = lock(&self.timers);
        let count = timers.len();
        timers.clear();
        count
    }

    /// Pins the clock to `at`, or releases it with `None`.
    pub fn freeze_clock(&self, at: Option<DateTime<Utc>>) {
        *lock(&self.frozen) = at;
    }

    pub fn current_timestamp(&self) -> DateTime<Utc> {
        let frozen = *lock(&self.frozen);
        frozen.unwrap_or_else(Utc::now)
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_timestamp().date_naive()
    }

    pub fn current_time(&self) -> NaiveTime {
        self.current_timestamp().time()
    }

    pub(crate) fn clear(&self) {
        self.cancel_all_timers();
        lock(&self.messages).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
