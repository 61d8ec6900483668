//! Single-producer, single-consumer bounded ring buffer.
//!
//! The ring is the backbone of the market-data pipeline: the generator's
//! producer thread pushes fixed-size records, the feed's consumer thread pops
//! them. Capacity is a compile-time power of two so sequence-to-index mapping
//! is a single bitwise AND.
//!
//! # Protocol
//!
//! Two monotonically increasing 64-bit counters describe the ring: `head` is
//! the next slot to pop, `tail` the next slot to push. A cell holds a live
//! value iff `head <= i < tail`. Occupancy is `tail - head`, never more than
//! the capacity.
//!
//! **Producer:** read own `tail` relaxed, read `head` with Acquire (must
//! observe the consumer's destruction of the cell before overwriting it),
//! write the cell, publish `tail + 1` with Release.
//!
//! **Consumer:** read own `head` relaxed, read `tail` with Acquire (must
//! observe the producer's cell write), move the value out, publish `head + 1`
//! with Release.
//!
//! # Single producer, single consumer
//!
//! The role split is enforced at compile time: [`SpscRing::new`] returns one
//! [`RingProducer`] and one [`RingConsumer`], neither of which is `Clone`.
//! Both are `Send`, so each side can move to its thread, but `&`-sharing a
//! handle across threads is impossible and the SPSC contract cannot be
//! violated from safe code.
//!
//! Progress is wait-free on both sides: a failed push (full) or pop (empty)
//! is a normal control outcome, not an error.

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A counter alone on its cache line. Head and tail are written by different
/// threads; sharing a line would turn every push/pop into a coherence miss.
#[repr(align(64))]
struct PaddedCounter(AtomicU64);

struct Shared<T, const N: usize> {
    head: PaddedCounter,
    tail: PaddedCounter,
    /// `N` raw cells. A cell is initialized iff its index lies in
    /// `[head, tail)` modulo `N`.
    cells: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: the cells are plain storage coordinated entirely by the head/tail
// protocol above. Only the producer writes a vacant cell, only the consumer
// reads an occupied one, and the Acquire/Release pairs on the counters order
// those accesses. The handle types guarantee there is at most one of each.
unsafe impl<T: Send, const N: usize> Send for Shared<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for Shared<T, N> {}

impl<T, const N: usize> Shared<T, N> {
    #[inline(always)]
    fn occupancy_relaxed(&self) -> u64 {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let head = self.head.0.load(Ordering::Relaxed);
        tail.wrapping_sub(head)
    }
}

impl<T, const N: usize> Drop for Shared<T, N> {
    fn drop(&mut self) {
        // Both handles are gone, so no concurrency: drop any values still in
        // flight between head and tail.
        let head = *self.head.0.get_mut();
        let tail = *self.tail.0.get_mut();
        for i in head..tail {
            let cell = self.cells[(i as usize) & (N - 1)].get_mut();
            // SAFETY: indices in [head, tail) hold initialized values.
            unsafe { cell.assume_init_drop() };
        }
    }
}

/// Constructor namespace for the ring; see [`SpscRing::new`].
pub struct SpscRing<T, const N: usize>(PhantomData<T>);

impl<T, const N: usize> SpscRing<T, N> {
    const CAPACITY_OK: () = assert!(N > 0 && N.is_power_of_two(), "N must be a power of 2");

    /// Creates a ring of capacity `N` and splits it into its two endpoints.
    ///
    /// # Panics
    /// Fails to compile if `N` is not a power of 2.
    ///
    /// # Example
    /// ```
    /// use basalt_ring::SpscRing;
    ///
    /// let (mut tx, mut rx) = SpscRing::<u64, 8>::new();
    /// assert_eq!(tx.capacity(), 8);
    /// assert!(tx.try_push(7).is_ok());
    /// assert_eq!(rx.try_pop(), Some(7));
    /// ```
    pub fn new() -> (RingProducer<T, N>, RingConsumer<T, N>) {
        // Forces the compile-time capacity check for every instantiation.
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;

        let cells = (0..N)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let shared = Arc::new(Shared::<T, N> {
            head: PaddedCounter(AtomicU64::new(0)),
            tail: PaddedCounter(AtomicU64::new(0)),
            cells,
        });

        (
            RingProducer {
                shared: Arc::clone(&shared),
            },
            RingConsumer { shared },
        )
    }
}

/// The push side of the ring. Exactly one exists per ring.
pub struct RingProducer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

impl<T, const N: usize> RingProducer<T, N> {
    /// Attempts to push a value. Fails iff the ring is full, handing the
    /// value back so the caller decides the backpressure policy.
    ///
    /// # Example
    /// ```
    /// use basalt_ring::SpscRing;
    ///
    /// let (mut tx, _rx) = SpscRing::<u32, 1>::new();
    /// assert!(tx.try_push(1).is_ok());
    /// // Full: the rejected value comes back to the caller.
    /// assert_eq!(tx.try_push(2), Err(2));
    /// ```
    #[inline(always)]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        let tail = self.shared.tail.0.load(Ordering::Relaxed);
        let head = self.shared.head.0.load(Ordering::Acquire);

        if tail.wrapping_sub(head) == N as u64 {
            return Err(value);
        }

        let cell = &self.shared.cells[(tail as usize) & (N - 1)];
        // SAFETY: occupancy < N, so this cell is vacant; the Acquire on head
        // ordered the consumer's take-out of the previous lap before us.
        unsafe { (*cell.get()).write(value) };

        self.shared.tail.0.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.shared.occupancy_relaxed() as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// A cheap observation handle for monitoring occupancy from other threads.
    pub fn monitor(&self) -> RingMonitor<T, N> {
        RingMonitor {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// The pop side of the ring. Exactly one exists per ring.
pub struct RingConsumer<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

impl<T, const N: usize> RingConsumer<T, N> {
    /// Attempts to pop the oldest value. `None` iff the ring is empty.
    ///
    /// # Example
    /// ```
    /// use basalt_ring::SpscRing;
    ///
    /// let (mut tx, mut rx) = SpscRing::<&str, 4>::new();
    /// assert_eq!(rx.try_pop(), None);
    ///
    /// tx.try_push("tick").unwrap();
    /// tx.try_push("tock").unwrap();
    /// assert_eq!(rx.try_pop(), Some("tick"));
    /// assert_eq!(rx.try_pop(), Some("tock"));
    /// ```
    #[inline(always)]
    pub fn try_pop(&mut self) -> Option<T> {
        let head = self.shared.head.0.load(Ordering::Relaxed);
        let tail = self.shared.tail.0.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        let cell = &self.shared.cells[(head as usize) & (N - 1)];
        // SAFETY: head < tail, so this cell holds an initialized value; the
        // Acquire on tail ordered the producer's write before this read. The
        // read leaves the cell logically vacant.
        let value = unsafe { (*cell.get()).assume_init_read() };

        self.shared.head.0.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.shared.occupancy_relaxed() as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn monitor(&self) -> RingMonitor<T, N> {
        RingMonitor {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Read-only occupancy view of a ring. Clonable and shareable; it can only
/// load the counters, never touch the cells.
pub struct RingMonitor<T, const N: usize> {
    shared: Arc<Shared<T, N>>,
}

impl<T, const N: usize> Clone for RingMonitor<T, N> {
    fn clone(&self) -> Self {
        RingMonitor {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, const N: usize> RingMonitor<T, N> {
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.shared.occupancy_relaxed() as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Occupancy as a fraction of capacity, in `[0, 1]`.
    ///
    /// # Example
    /// ```
    /// use basalt_ring::SpscRing;
    ///
    /// let (mut tx, rx) = SpscRing::<u8, 4>::new();
    /// let mon = rx.monitor();
    /// tx.try_push(1).unwrap();
    /// tx.try_push(2).unwrap();
    /// assert_eq!(mon.utilization(), 0.5);
    /// ```
    pub fn utilization(&self) -> f64 {
        self.len() as f64 / N as f64
    }
}
