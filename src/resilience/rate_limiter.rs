//! Per-bucket locks and the global pause gate.
//!
//! Every route maps to a bucket. A bucket admits one request at a time, and a
//! request that learns the bucket is exhausted can keep it locked for the rest
//! of the rate-limit window after it has returned. Independently, a global
//! rate limit closes a gate that every bucket waits on.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::debug;

type BucketLock = Arc<AsyncMutex<()>>;

struct Shared {
    /// Lazily created locks. An entry only the map references is idle.
    buckets: Mutex<HashMap<String, BucketLock>>,
    /// Number of active global pauses. The gate is open at zero.
    global: watch::Sender<u32>,
}

impl Shared {
    fn release(&self, bucket: &str, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut buckets = self.buckets.lock();
        if let Some(lock) = buckets.get(bucket) {
            if Arc::strong_count(lock) == 1 {
                buckets.remove(bucket);
            }
        }
    }
}

/// Rate limit tracker owned by one client.
#[derive(Clone)]
pub struct RateLimiter {
    shared: Arc<Shared>,
}

impl RateLimiter {
    /// Creates a tracker with no buckets and the global gate open.
    pub fn new() -> Self {
        let (global, _) = watch::channel(0u32);
        Self {
            shared: Arc::new(Shared {
                buckets: Mutex::new(HashMap::new()),
                global,
            }),
        }
    }

    /// Waits for the global gate, then takes the bucket's lock.
    pub async fn acquire(&self, bucket: &str) -> BucketGuard {
        self.wait_global().await;

        let lock = {
            let mut buckets = self.shared.buckets.lock();
            buckets
                .entry(bucket.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let guard = lock.lock_owned().await;

        BucketGuard {
            bucket: bucket.to_string(),
            guard: Some(guard),
            release_at: None,
            shared: self.shared.clone(),
        }
    }

    /// Suspends until no global pause is active.
    pub async fn wait_global(&self) {
        let mut rx = self.shared.global.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|pauses| *pauses == 0).await;
    }

    /// Closes the global gate until the returned guard is dropped.
    pub fn pause_global(&self) -> GlobalPause {
        self.shared.global.send_modify(|pauses| *pauses += 1);
        GlobalPause {
            shared: self.shared.clone(),
        }
    }

    /// Returns true while any global pause is active.
    pub fn is_globally_paused(&self) -> bool {
        *self.shared.global.borrow() > 0
    }

    /// Number of buckets currently tracked.
    pub fn bucket_count(&self) -> usize {
        self.shared.buckets.lock().len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("buckets", &self.bucket_count())
            .field("globally_paused", &self.is_globally_paused())
            .finish()
    }
}

/// Exclusive hold on a bucket.
///
/// Dropping the guard releases the bucket, immediately or, after
/// [`BucketGuard::defer`], once the deferred deadline passes.
pub struct BucketGuard {
    bucket: String,
    guard: Option<OwnedMutexGuard<()>>,
    release_at: Option<Instant>,
    shared: Arc<Shared>,
}

impl BucketGuard {
    /// Gets the bucket key.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Keeps the bucket locked for `delay` after this guard is dropped.
    ///
    /// Repeated calls keep the later deadline.
    pub fn defer(&mut self, delay: Duration) {
        let at = Instant::now() + delay;
        self.release_at = Some(match self.release_at {
            Some(previous) if previous > at => previous,
            _ => at,
        });
    }

    /// Returns true if the release has been deferred.
    pub fn is_deferred(&self) -> bool {
        self.release_at.is_some()
    }
}

impl Drop for BucketGuard {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let bucket = std::mem::take(&mut self.bucket);

        if let Some(at) = self.release_at.filter(|at| *at > Instant::now()) {
            if let Ok(handle) = Handle::try_current() {
                let shared = self.shared.clone();
                debug!(bucket = %bucket, "Deferring bucket release");
                handle.spawn(async move {
                    tokio::time::sleep_until(at).await;
                    shared.release(&bucket, guard);
                    debug!(bucket = %bucket, "Deferred bucket release fired");
                });
                return;
            }
        }

        self.shared.release(&bucket, guard);
    }
}

impl std::fmt::Debug for BucketGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketGuard")
            .field("bucket", &self.bucket)
            .field("deferred", &self.is_deferred())
            .finish()
    }
}

/// An active global pause. Dropping it reopens the gate.
#[must_use = "the global gate reopens as soon as the pause is dropped"]
pub struct GlobalPause {
    shared: Arc<Shared>,
}

impl Drop for GlobalPause {
    fn drop(&mut self) {
        self.shared
            .global
            .send_modify(|pauses| *pauses = pauses.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn test_same_bucket_is_exclusive() {
        let limiter = RateLimiter::new();
        let first = limiter.acquire("v1/{page_id}/incidents").await;

        let acquired = Arc::new(AtomicBool::new(false));
        let task = {
            let limiter = limiter.clone();
            let acquired = acquired.clone();
            tokio::spawn(async move {
                let _second = limiter.acquire("v1/{page_id}/incidents").await;
                acquired.store(true, Ordering::SeqCst);
            })
        };

        sleep(Duration::from_millis(50)).await;
        assert!(!acquired.load(Ordering::SeqCst));

        drop(first);
        task.await.unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_different_buckets_do_not_block() {
        let limiter = RateLimiter::new();
        let _a = limiter.acquire("v1/{page_id}/components").await;

        let b = timeout(Duration::from_millis(100), limiter.acquire("v1/{page_id}/metrics")).await;
        assert!(b.is_ok());
        assert_eq!(limiter.bucket_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_release_holds_bucket() {
        let limiter = RateLimiter::new();

        let mut guard = limiter.acquire("bucket").await;
        guard.defer(Duration::from_secs(5));
        assert!(guard.is_deferred());
        drop(guard);

        let start = Instant::now();
        let _next = limiter.acquire("bucket").await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_defer_keeps_latest_deadline() {
        let limiter = RateLimiter::new();

        let mut guard = limiter.acquire("bucket").await;
        guard.defer(Duration::from_secs(5));
        guard.defer(Duration::from_secs(1));
        drop(guard);

        let start = Instant::now();
        let _next = limiter.acquire("bucket").await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_idle_buckets_are_evicted() {
        let limiter = RateLimiter::new();

        let guard = limiter.acquire("bucket").await;
        assert_eq!(limiter.bucket_count(), 1);
        drop(guard);
        assert_eq!(limiter.bucket_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_bucket_evicted_after_timer() {
        let limiter = RateLimiter::new();

        let mut guard = limiter.acquire("bucket").await;
        guard.defer(Duration::from_secs(2));
        drop(guard);
        assert_eq!(limiter.bucket_count(), 1);

        sleep(Duration::from_secs(3)).await;
        assert_eq!(limiter.bucket_count(), 0);
    }

    #[tokio::test]
    async fn test_global_pause_blocks_every_bucket() {
        let limiter = RateLimiter::new();
        let pause = limiter.pause_global();
        assert!(limiter.is_globally_paused());

        let blocked = timeout(Duration::from_millis(50), limiter.acquire("other")).await;
        assert!(blocked.is_err());

        drop(pause);
        assert!(!limiter.is_globally_paused());
        let admitted = timeout(Duration::from_millis(100), limiter.acquire("other")).await;
        assert!(admitted.is_ok());
    }

    #[tokio::test]
    async fn test_overlapping_pauses() {
        let limiter = RateLimiter::new();
        let first = limiter.pause_global();
        let second = limiter.pause_global();

        drop(first);
        assert!(limiter.is_globally_paused());
        drop(second);
        assert!(!limiter.is_globally_paused());
    }

    #[test]
    fn test_release_without_runtime_is_immediate() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let limiter = RateLimiter::new();

        let mut guard = runtime.block_on(limiter.acquire("bucket"));
        guard.defer(Duration::from_secs(60));
        drop(guard);

        assert_eq!(limiter.bucket_count(), 0);
    }
}
