//! Byte-budgeted memory pools.
//!
//! A [`Pool`] hands out [`PoolBuffer`]s while the bytes it has leased stay under
//! its capacity. Dropping a buffer returns its bytes to the pool, so a buffer
//! is released on every exit path without explicit bookkeeping.
//!
//! An [`Allocator`] pairs a small fast pool with a larger general pool and
//! falls back from the first to the second, the way camera firmware tries
//! PSRAM before internal RAM.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct PoolState {
    name: &'static str,
    capacity: usize,
    in_use: AtomicUsize,
    live: AtomicUsize,
}

impl PoolState {
    /// Reserve `size` bytes of budget. Returns false when the pool is full.
    fn reserve(&self, size: usize) -> bool {
        let mut current = self.in_use.load(Ordering::Relaxed);
        loop {
            let next = match current.checked_add(size) {
                Some(next) if next <= self.capacity => next,
                _ => return false,
            };
            match self.in_use.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.live.fetch_add(1, Ordering::AcqRel);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn unreserve(&self, size: usize) {
        self.in_use.fetch_sub(size, Ordering::AcqRel);
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A named memory pool with a fixed byte capacity.
#[derive(Clone)]
pub struct Pool {
    state: Arc<PoolState>,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.state.name)
            .field("capacity", &self.state.capacity)
            .field("in_use", &self.in_use())
            .field("live", &self.live())
            .finish()
    }
}

impl Pool {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            state: Arc::new(PoolState {
                name,
                capacity,
                in_use: AtomicUsize::new(0),
                live: AtomicUsize::new(0),
            }),
        }
    }

    /// A pool limited only by what the system allocator can provide.
    pub fn unbounded(name: &'static str) -> Self {
        Self::new(name, usize::MAX)
    }

    pub fn name(&self) -> &'static str {
        self.state.name
    }

    pub fn capacity(&self) -> usize {
        self.state.capacity
    }

    /// Bytes currently leased out.
    pub fn in_use(&self) -> usize {
        self.state.in_use.load(Ordering::Acquire)
    }

    /// Number of buffers currently leased out.
    pub fn live(&self) -> usize {
        self.state.live.load(Ordering::Acquire)
    }

    /// Lease a zeroed buffer of `size` bytes.
    ///
    /// Returns `None` if the pool budget is exhausted or the system
    /// allocator cannot provide the memory.
    pub fn try_alloc(&self, size: usize) -> Option<PoolBuffer> {
        if !self.state.reserve(size) {
            return None;
        }

        let mut data = Vec::new();
        if data.try_reserve_exact(size).is_err() {
            self.state.unreserve(size);
            return None;
        }
        data.resize(size, 0);

        Some(self.lease(data))
    }

    /// Charge an already allocated vector against this pool's budget.
    ///
    /// Returns `None` (dropping `data`) if the pool cannot take it.
    pub fn try_adopt(&self, data: Vec<u8>) -> Option<PoolBuffer> {
        if !self.state.reserve(data.len()) {
            return None;
        }
        Some(self.lease(data))
    }

    fn lease(&self, data: Vec<u8>) -> PoolBuffer {
        let size = data.len();
        PoolBuffer {
            data,
            lease: Some(Lease {
                pool: Arc::clone(&self.state),
                size,
            }),
        }
    }
}

struct Lease {
    pool: Arc<PoolState>,
    size: usize,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.pool.unreserve(self.size);
    }
}

/// An owned byte buffer, optionally leased from a [`Pool`].
///
/// The length is fixed for the buffer's lifetime. Dropping it returns the
/// leased bytes to the pool.
pub struct PoolBuffer {
    data: Vec<u8>,
    lease: Option<Lease>,
}

impl PoolBuffer {
    /// Wrap a vector that is not accounted to any pool.
    pub fn unpooled(data: Vec<u8>) -> Self {
        Self { data, lease: None }
    }

    /// Name of the pool this buffer was leased from, if any.
    pub fn pool_name(&self) -> Option<&'static str> {
        self.lease.as_ref().map(|lease| lease.pool.name)
    }
}

impl Deref for PoolBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PoolBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for PoolBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuffer")
            .field("len", &self.data.len())
            .field("pool", &self.pool_name())
            .finish()
    }
}

/// Two-tier allocator: tries the fast pool, then the general pool.
#[derive(Clone, Debug)]
pub struct Allocator {
    fast: Pool,
    general: Pool,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::with_pools(Pool::unbounded("fast"), Pool::unbounded("general"))
    }
}

impl Allocator {
    /// Create an allocator with a `fast` and a `general` pool of the given byte capacities.
    pub fn new(fast_capacity: usize, general_capacity: usize) -> Self {
        Self::with_pools(
            Pool::new("fast", fast_capacity),
            Pool::new("general", general_capacity),
        )
    }

    pub fn with_pools(fast: Pool, general: Pool) -> Self {
        Self { fast, general }
    }

    pub fn fast(&self) -> &Pool {
        &self.fast
    }

    pub fn general(&self) -> &Pool {
        &self.general
    }

    /// Bytes leased from both pools.
    pub fn in_use(&self) -> usize {
        self.fast.in_use() + self.general.in_use()
    }

    /// Buffers leased from both pools.
    pub fn live(&self) -> usize {
        self.fast.live() + self.general.live()
    }

    /// Lease `size` zeroed bytes, falling back to the general pool when the
    /// fast pool cannot serve the request. `None` means both pools failed.
    pub fn allocate(&self, size: usize) -> Option<PoolBuffer> {
        if let Some(buffer) = self.fast.try_alloc(size) {
            return Some(buffer);
        }
        log::debug!(
            "{} pool exhausted ({} of {} bytes), falling back to {}",
            self.fast.name(),
            self.fast.in_use(),
            self.fast.capacity(),
            self.general.name()
        );
        self.general.try_alloc(size)
    }

    /// Charge an existing vector to the fast pool, or else the general pool.
    pub fn adopt(&self, data: Vec<u8>) -> Option<PoolBuffer> {
        let len = data.len();
        if self.fast.state.reserve(len) {
            return Some(self.fast.lease(data));
        }
        self.general.try_adopt(data)
    }
}
