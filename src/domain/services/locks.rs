use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;
use crate::error::AppError;

type Registry = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Per-booking single-writer registry. Bookings never share a lock, and an
/// entry only lives while someone holds or waits on it.
#[derive(Clone, Default)]
pub struct BookingLocks {
    registry: Registry,
}

pub struct BookingLockGuard {
    booking_id: String,
    registry: Registry,
    guard: Option<OwnedMutexGuard<()>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, booking_id: &str) -> BookingLockGuard {
        let mutex = {
            let mut map = self.registry.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(booking_id.to_string()).or_default().clone()
        };

        let guard = mutex.lock_owned().await;
        BookingLockGuard {
            booking_id: booking_id.to_string(),
            registry: self.registry.clone(),
            guard: Some(guard),
        }
    }

    /// Number of bookings with a live lock entry.
    pub fn len(&self) -> usize {
        self.registry.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for BookingLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut map = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        // Waiters clone the Arc under this same lock, so a count of one means nobody is queued.
        if map.get(&self.booking_id).is_some_and(|m| Arc::strong_count(m) == 1) {
            map.remove(&self.booking_id);
        }
    }
}

/// A held booking lock plus the deadline for the work that precedes the write.
/// The lock is released when this is dropped.
pub struct Exclusive {
    _guard: BookingLockGuard,
    deadline: Instant,
}

impl Exclusive {
    /// Runs a read or check against the deadline. Nothing passed here may
    /// write: a timed-out future is dropped part way through.
    pub async fn bounded<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        tokio::time::timeout_at(self.deadline, op)
            .await
            .map_err(|_| AppError::OperationTimedOut)?
    }
}

/// Takes the booking's lock, waiting at most `timeout`. The same deadline
/// then bounds `Exclusive::bounded`; the conditional write itself is never cut short.
pub async fn exclusive(locks: &BookingLocks, booking_id: &str, timeout: Duration) -> Result<Exclusive, AppError> {
    let deadline = Instant::now() + timeout;
    let guard = tokio::time::timeout_at(deadline, locks.acquire(booking_id))
        .await
        .map_err(|_| AppError::OperationTimedOut)?;
    Ok(Exclusive { _guard: guard, deadline })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_same_booking_is_serialized() {
        let locks = BookingLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _g = locks.acquire("b-1").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty(), "lock entries should be dropped once uncontended");
    }

    #[tokio::test]
    async fn test_different_bookings_do_not_block() {
        let locks = BookingLocks::new();
        let _a = locks.acquire("b-1").await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("b-2")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_exclusive_times_out_while_held() {
        let locks = BookingLocks::new();
        let _held = locks.acquire("b-1").await;

        let result = exclusive(&locks, "b-1", Duration::from_millis(20)).await;
        assert!(matches!(result, Err(AppError::OperationTimedOut)));
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_bounds_reads_only() {
        let locks = BookingLocks::new();
        let lane = exclusive(&locks, "b-1", Duration::from_millis(20)).await.unwrap();

        let read: Result<(), AppError> = lane.bounded(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        }).await;
        assert!(matches!(read, Err(AppError::OperationTimedOut)));

        // Still held after the deadline until dropped.
        let other = tokio::time::timeout(Duration::from_millis(20), locks.acquire("b-1")).await;
        assert!(other.is_err());
        drop(lane);
        assert!(locks.is_empty());
    }
}
