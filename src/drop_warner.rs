use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Rate limits warnings about evicted records.
///
/// A sustained outage can evict thousands of records per second; emitting
/// one warning per eviction would drown the process log. The caller counts
/// evictions via [`record_drop`] and the next [`warn_if_due`] call emits a
/// single aggregate warning once the interval has elapsed. [`flush`] emits
/// immediately if anything was dropped since the last emission.
///
/// [`record_drop`]: DropWarner::record_drop
/// [`warn_if_due`]: DropWarner::warn_if_due
/// [`flush`]: DropWarner::flush
pub(crate) struct DropWarner {
    interval_secs: u64,
    last_warn: AtomicU64,
    dropped: AtomicU64,
}

impl DropWarner {
    /// Create a warner. The first warning can be emitted immediately.
    pub(crate) fn new(interval: Duration) -> Self {
        let interval_secs = interval.as_secs();
        Self {
            interval_secs,
            last_warn: AtomicU64::new(now_secs().saturating_sub(interval_secs)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Count one evicted record.
    pub(crate) fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit an aggregate warning if the interval has elapsed.
    pub(crate) fn warn_if_due(&self, mut warn: impl FnMut(u64)) {
        let now = now_secs();
        let prev = self.last_warn.load(Ordering::Relaxed);
        if now.saturating_sub(prev) >= self.interval_secs {
            let count = self.dropped.swap(0, Ordering::Relaxed);
            if count > 0 {
                warn(count);
            }
            self.last_warn.store(now, Ordering::Relaxed);
        }
    }

    /// Immediately warn about any pending drops.
    pub(crate) fn flush(&self, mut warn: impl FnMut(u64)) {
        let count = self.dropped.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn.store(now_secs(), Ordering::Relaxed);
        }
    }
}
