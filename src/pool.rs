//! Leaky buffer pools for query results.
//!
//! Every query hands back a `Vec` that the caller reads and then drops. The
//! pools keep a bounded number of those allocations around for reuse:
//! - Acquire never blocks; an empty pool means a fresh allocation
//! - Release never blocks; a full pool means the buffer is freed
//! - Reuse is invisible to callers; `Disabled` behaves identically

use crate::core::PoolingMode;
use crossbeam::queue::ArrayQueue;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for pool performance monitoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Acquires served from the pool
    pub hits: u64,
    /// Acquires that had to allocate
    pub misses: u64,
    /// Releases kept by the pool
    pub returns: u64,
    /// Releases dropped because the pool was full
    pub discards: u64,
    /// Buffers currently waiting in the pool
    pub available: usize,
    /// Maximum number of pooled buffers
    pub capacity: usize,
}

impl PoolStats {
    /// Fraction of acquires served without allocating
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            1.0
        }
    }
}

/// Strategy for obtaining and recycling result buffers.
///
/// Implementations must be non-blocking and safe to call from any thread.
pub trait BufferPool<T>: Send + Sync {
    /// Take an empty buffer, allocating when none is pooled
    fn acquire(&self) -> Vec<T>;

    /// Offer a buffer back; dropped when the pool is full
    fn release(&self, buf: Vec<T>);

    /// Current statistics
    fn stats(&self) -> PoolStats;
}

/// Shared handle to a buffer strategy
pub type SharedPool<T> = Arc<dyn BufferPool<T>>;

/// Bounded lock-free pool backed by an `ArrayQueue`.
pub struct LeakyPool<T> {
    queue: ArrayQueue<Vec<T>>,
    alloc_capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    discards: AtomicU64,
}

impl<T> LeakyPool<T> {
    /// Create an empty pool holding at most `capacity` buffers.
    ///
    /// Fresh buffers are allocated with room for `alloc_capacity` elements.
    /// A zero `capacity` is raised to one slot.
    pub fn new(capacity: usize, alloc_capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            alloc_capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            discards: AtomicU64::new(0),
        }
    }
}

impl<T: Send> BufferPool<T> for LeakyPool<T> {
    #[inline]
    fn acquire(&self) -> Vec<T> {
        match self.queue.pop() {
            Some(mut buf) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                buf.clear();
                buf
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Vec::with_capacity(self.alloc_capacity)
            },
        }
    }

    #[inline]
    fn release(&self, buf: Vec<T>) {
        match self.queue.push(buf) {
            Ok(()) => {
                self.returns.fetch_add(1, Ordering::Relaxed);
            },
            Err(_full) => {
                self.discards.fetch_add(1, Ordering::Relaxed);
            },
        }
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
            available: self.queue.len(),
            capacity: self.queue.capacity(),
        }
    }
}

/// Strategy that never reuses anything.
pub struct FreshAlloc {
    alloc_capacity: usize,
    misses: AtomicU64,
    discards: AtomicU64,
}

impl FreshAlloc {
    /// Allocate buffers with room for `alloc_capacity` elements
    pub fn new(alloc_capacity: usize) -> Self {
        Self {
            alloc_capacity,
            misses: AtomicU64::new(0),
            discards: AtomicU64::new(0),
        }
    }
}

impl<T> BufferPool<T> for FreshAlloc {
    fn acquire(&self) -> Vec<T> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        Vec::with_capacity(self.alloc_capacity)
    }

    fn release(&self, _buf: Vec<T>) {
        self.discards.fetch_add(1, Ordering::Relaxed);
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            misses: self.misses.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
            ..PoolStats::default()
        }
    }
}

/// Build a pool for the configured strategy.
///
/// A zero `capacity` degrades to `FreshAlloc` regardless of `mode`.
pub fn shared_pool<T: Send + 'static>(
    mode: PoolingMode,
    capacity: usize,
    alloc_capacity: usize,
) -> SharedPool<T> {
    match mode {
        PoolingMode::Leaky if capacity > 0 => Arc::new(LeakyPool::new(capacity, alloc_capacity)),
        _ => Arc::new(FreshAlloc::new(alloc_capacity)),
    }
}

/// Query result that goes back to its pool when dropped.
pub struct Pooled<T> {
    buf: Option<Vec<T>>,
    pool: SharedPool<T>,
}

impl<T> Pooled<T> {
    /// Wrap a buffer obtained from `pool`
    pub fn new(buf: Vec<T>, pool: SharedPool<T>) -> Self {
        Self {
            buf: Some(buf),
            pool,
        }
    }

    /// Return the buffer to its pool now
    #[inline]
    pub fn release(self) {
        drop(self);
    }

    /// Take ownership of the buffer (won't return to pool)
    #[inline]
    pub fn into_vec(mut self) -> Vec<T> {
        self.buf.take().unwrap_or_default()
    }

    fn as_slice(&self) -> &[T] {
        self.buf.as_deref().unwrap_or(&[])
    }
}

impl<T> Deref for Pooled<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsRef<[T]> for Pooled<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T> Drop for Pooled<T> {
    #[inline]
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaky_pool_reuses_allocation() {
        let pool = LeakyPool::<f64>::new(2, 8);

        let mut buf = pool.acquire();
        buf.extend_from_slice(&[1.0, 2.0, 3.0]);
        let ptr = buf.as_ptr();
        pool.release(buf);

        let reused = pool.acquire();
        assert!(reused.is_empty());
        assert!(reused.capacity() >= 3);
        assert_eq!(reused.as_ptr(), ptr);

        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.returns, 1);
    }

    #[test]
    fn test_leaky_pool_discards_when_full() {
        let pool = LeakyPool::<u8>::new(1, 4);

        pool.release(Vec::new());
        pool.release(Vec::new());

        let stats = pool.stats();
        assert_eq!(stats.returns, 1);
        assert_eq!(stats.discards, 1);
        assert_eq!(stats.available, 1);
    }

    #[test]
    fn test_empty_pool_allocates() {
        let pool = LeakyPool::<String>::new(4, 32);
        let buf = pool.acquire();
        assert!(buf.capacity() >= 32);
        assert_eq!(pool.stats().misses, 1);
        assert_eq!(pool.stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_zero_capacity_keeps_one_slot() {
        let pool = LeakyPool::<f64>::new(0, 1);
        pool.release(Vec::new());
        pool.release(Vec::new());

        let stats = pool.stats();
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.returns, 1);
        assert_eq!(stats.discards, 1);
    }

    #[test]
    fn test_disabled_strategy_never_pools() {
        let pool: SharedPool<f64> = shared_pool(PoolingMode::Disabled, 8, 4);
        let buf = pool.acquire();
        pool.release(buf);
        let _ = pool.acquire();

        let stats = pool.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.available, 0);
    }

    #[test]
    fn test_zero_capacity_leaky_falls_back() {
        let pool: SharedPool<f64> = shared_pool(PoolingMode::Leaky, 0, 4);
        pool.release(pool.acquire());
        assert_eq!(pool.stats().capacity, 0);
    }

    #[test]
    fn test_pooled_returns_on_drop() {
        let pool: SharedPool<f64> = shared_pool(PoolingMode::Leaky, 4, 4);
        let pooled = Pooled::new(vec![1.0, 2.0], Arc::clone(&pool));
        assert_eq!(&*pooled, &[1.0, 2.0]);

        drop(pooled);
        assert_eq!(pool.stats().available, 1);

        let kept = Pooled::new(pool.acquire(), Arc::clone(&pool));
        let owned = kept.into_vec();
        assert!(owned.is_empty());
        assert_eq!(pool.stats().available, 0);
    }

    #[test]
    fn test_explicit_release_returns_buffer() {
        let pool: SharedPool<f64> = shared_pool(PoolingMode::Leaky, 4, 4);
        let snapshot = Pooled::new(pool.acquire(), Arc::clone(&pool));
        assert_eq!(pool.stats().returns, 0);

        snapshot.release();
        let stats = pool.stats();
        assert_eq!(stats.returns, 1);
        assert_eq!(stats.available, 1);

        // The released allocation serves the next acquire
        let _again = pool.acquire();
        assert_eq!(pool.stats().hits, 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        use std::thread;

        let pool: SharedPool<u64> = shared_pool(PoolingMode::Leaky, 8, 16);
        let mut handles = vec![];

        for thread_id in 0..8u64 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    let mut buf = pool.acquire();
                    assert!(buf.is_empty());
                    buf.push(thread_id * 1000 + i);
                    pool.release(buf);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = pool.stats();
        assert_eq!(stats.hits + stats.misses, 4000);
        assert_eq!(stats.returns + stats.discards, 4000);
        assert!(stats.available <= 8);
    }
}
