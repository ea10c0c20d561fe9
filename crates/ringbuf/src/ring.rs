//! The ring core: `setup`/`acquire`/`produce`/`consume`/`release`.
//!
//! There are three offsets to keep straight — think of clock hands:
//! - `next`: the beginning of the available space; producers race to
//!   advance it.
//! - `written`: the point up to which the consumer has actually released
//!   data; producers must never claim a range that catches up with it.
//! - the observed *ready* offset: the point up to which data is ready to be
//!   consumed, computed by the consumer from the smallest in-flight `seen`.
//!
//! Producers cannot go beyond `written` and cannot catch up with it; only
//! the consumer is allowed to catch up with the producer frontier.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::backoff::Backoff;
use crate::config::Config;
use crate::error::{Result, RingError};
use crate::insights;
use crate::invariants::{
    debug_assert_in_bounds, debug_assert_release_preconditions, debug_assert_stable_seen,
    debug_assert_wrap_preconditions,
};
use crate::metrics::Metrics;
use crate::offset::{self, Off, NO_END, NO_SEEN, UNSTABLE_BIT, WRAP_LOCK};
use crate::slot::{self, Slot, Stack};

/// Cache-line pad to keep independently-mutated hot fields on separate
/// lines and avoid false sharing between producer and consumer threads.
#[repr(align(128))]
#[derive(Debug, Default)]
struct CacheAligned<T>(T);

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

/// Opaque handle to an in-flight reservation's producer slot. Returned by
/// [`Ring::acquire`] and consumed by [`Ring::produce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHandle(u32);

/// A successful reservation: the caller may write into
/// `[offset, offset + len)` of its own backing byte buffer, then hand the
/// whole value to [`Ring::produce`] once the bytes are in place.
#[derive(Debug)]
pub struct Reservation {
    slot: SlotHandle,
    pub offset: u32,
    pub len: u32,
}

/// A consumer-ready range, or `len == 0` if nothing is ready yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumed {
    pub offset: u32,
    pub len: u32,
}

impl Consumed {
    const EMPTY: Self = Self { offset: 0, len: 0 };

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Lock-free multi-producer/single-consumer byte ring buffer with
/// contiguous range reservations. Vends offsets into a caller-owned byte
/// buffer; it never touches the payload bytes itself.
#[derive(Debug)]
pub struct Ring {
    space: u32,
    next: CacheAligned<Off>,
    end: CacheAligned<AtomicU32>,
    written: CacheAligned<AtomicU32>,
    free: CacheAligned<Stack>,
    used: CacheAligned<Stack>,
    slots: Box<[Slot]>,
    metrics: Option<Metrics>,
}

impl Ring {
    /// Construct a ring from a validated [`Config`].
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let slots: Box<[Slot]> = (0..config.nworkers).map(|_| Slot::new()).collect();
        let free = Stack::full(&slots, config.nworkers as u32);
        insights::ring_created(config.space, config.nworkers);
        Self {
            space: config.space,
            next: CacheAligned(Off::new(0)),
            end: CacheAligned(AtomicU32::new(NO_END)),
            written: CacheAligned(AtomicU32::new(0)),
            free: CacheAligned(free),
            used: CacheAligned(Stack::new()),
            slots,
            metrics: config.enable_metrics.then(Metrics::new),
        }
    }

    /// Fallible constructor for runtime-sourced dimensions; maps an
    /// out-of-range `space`/`nworkers` to [`RingError::InvalidConfig`]
    /// instead of panicking.
    pub fn new(nworkers: usize, space: u32, enable_metrics: bool) -> Result<Self> {
        let config = Config::try_new(nworkers, space, enable_metrics)?;
        Ok(Self::with_config(config))
    }

    #[must_use]
    pub fn space(&self) -> u32 {
        self.space
    }

    #[must_use]
    pub fn metrics(&self) -> Option<crate::metrics::MetricsSnapshot> {
        self.metrics.as_ref().map(Metrics::snapshot)
    }

    /// Bytes required for a ring supporting `nworkers` concurrent
    /// reservations, split into the fixed ring header and the per-worker
    /// slot record size. Offered for callers that size their own
    /// allocations against this crate's ABI; this crate itself always
    /// allocates the slot pool internally via [`Ring::with_config`].
    #[must_use]
    pub fn get_sizes(nworkers: usize) -> (usize, usize) {
        (
            std::mem::size_of::<Ring>(),
            nworkers * std::mem::size_of::<Slot>(),
        )
    }

    /// Request `len` contiguous bytes. Returns `None` if the reservation
    /// would lap the consumer or no producer slot is free; the caller
    /// should retry. This is ordinary back-pressure, not an error.
    pub fn acquire(&self, len: u32) -> Option<Reservation> {
        debug_assert!(len > 0 && len <= self.space, "acquire: len out of range");

        let slot_idx = match self.free.pop(&self.slots) {
            Some(idx) => idx,
            None => {
                self.record_fail_no_slots();
                return None;
            }
        };

        let (pos, target, written_at_claim) = loop {
            let seen_word = self.next.stable();
            let pos = offset::position(seen_word);
            debug_assert_in_bounds!(pos, self.space);

            let written = self.written.load(Ordering::Relaxed);
            let target_raw = u64::from(pos) + u64::from(len);

            if pos < written && target_raw >= u64::from(written) {
                self.free.push(&self.slots, slot_idx);
                self.record_fail_lap();
                return None;
            }

            let target = if target_raw >= u64::from(self.space) {
                let exceed = target_raw > u64::from(self.space);
                let masked = if exceed { u64::from(len) } else { 0 };
                if masked >= u64::from(written) {
                    self.free.push(&self.slots, slot_idx);
                    self.record_fail_lap();
                    return None;
                }
                let mut t = masked;
                if exceed {
                    t |= WRAP_LOCK;
                }
                t | offset::wrap_incr(offset::wrap_counter(seen_word))
            } else {
                target_raw | offset::wrap_counter(seen_word)
            };

            match self
                .next
                .compare_exchange_weak(seen_word, target, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => break (pos, target, written),
                Err(_) => continue,
            }
        };

        // The CAS just made `pos` globally visible as claimed; stamp it as
        // this slot's stable `seen` and publish it on the used stack.
        self.slots[slot_idx as usize]
            .seen
            .store(u64::from(pos), Ordering::Release);
        self.used.push(&self.slots, slot_idx);

        let mut returned_offset = pos;
        if target & WRAP_LOCK != 0 {
            let end = self.end.load(Ordering::Relaxed);
            debug_assert_wrap_preconditions!(written_at_claim, pos, end, NO_END);
            self.end.store(pos, Ordering::Relaxed);
            std::sync::atomic::fence(Ordering::Release);
            self.next.store(target & !WRAP_LOCK, Ordering::Relaxed);
            insights::wrap_locked(pos);
            self.record_wrap();
            returned_offset = 0;
        }
        debug_assert_in_bounds!(offset::position(target & !WRAP_LOCK), self.space);

        self.record_acquire_ok(len);
        Some(Reservation {
            slot: SlotHandle(slot_idx),
            offset: returned_offset,
            len,
        })
    }

    /// Mark a reservation's bytes as ready for the consumer. Consumes the
    /// reservation so it cannot be produced twice.
    pub fn produce(&self, reservation: Reservation) {
        let idx = reservation.slot.0;
        let seen = self.slots[idx as usize].seen.load(Ordering::Relaxed);
        debug_assert_stable_seen!(seen, NO_SEEN, UNSTABLE_BIT);
        std::sync::atomic::fence(Ordering::Release);
        self.slots[idx as usize].seen.store(NO_SEEN, Ordering::Relaxed);
    }

    /// Return the largest contiguous range that is fully produced and not
    /// yet released. `len == 0` means nothing is ready.
    pub fn consume(&self) -> Consumed {
        loop {
            let written = self.written.load(Ordering::Relaxed);
            let next = offset::position(self.next.stable());
            if written == next && self.end.load(Ordering::Relaxed) == NO_END {
                return Consumed::EMPTY;
            }

            let mut ready: u64 = NO_SEEN;
            let mut prev = self.used.head_word();
            let mut idx = slot::link_index(prev.load(Ordering::Acquire));

            while !slot::is_nil(idx) {
                let seen = self.stable_seen(idx);
                if seen == NO_SEEN {
                    if Stack::try_unlink_after(prev, &self.slots, idx) {
                        self.free.push(&self.slots, idx);
                        idx = slot::link_index(prev.load(Ordering::Acquire));
                        continue;
                    }
                    // Lost the race to splice this produced slot out; leave
                    // it for the next `consume` call and move on. A
                    // produced-but-unspliced slot never constrains `ready`.
                } else if seen >= u64::from(written) {
                    ready = ready.min(seen);
                }
                prev = slot::link_word(&self.slots, idx);
                idx = slot::link_index(prev.load(Ordering::Acquire));
            }

            if next < written {
                let end = self.end.load(Ordering::Relaxed).min(self.space);
                if ready == NO_SEEN && written == end {
                    if self.end.load(Ordering::Relaxed) != NO_END {
                        self.end.store(NO_END, Ordering::Relaxed);
                        std::sync::atomic::fence(Ordering::Release);
                    }
                    self.written.store(0, Ordering::Relaxed);
                    insights::wrap_restart();
                    continue;
                }
                let ready = ready.min(u64::from(end));
                return Consumed {
                    offset: written,
                    len: (ready - u64::from(written)) as u32,
                };
            }

            let ready = ready.min(u64::from(next));
            return Consumed {
                offset: written,
                len: (ready - u64::from(written)) as u32,
            };
        }
    }

    /// Release `nbytes` of a previously returned [`Consumed`] range back to
    /// the ring, making that space available to producers again.
    pub fn release(&self, nbytes: u32) {
        let written = self.written.load(Ordering::Relaxed);
        let end = self.end.load(Ordering::Relaxed);
        let new_written = written + nbytes;
        debug_assert_release_preconditions!(written, end, NO_END, new_written, self.space);

        self.written.store(
            if new_written == self.space { 0 } else { new_written },
            Ordering::Relaxed,
        );
        self.record_release(nbytes);
    }

    fn stable_seen(&self, idx: u32) -> u64 {
        let mut backoff = Backoff::new();
        loop {
            let seen = self.slots[idx as usize].seen.load(Ordering::Relaxed);
            if seen & UNSTABLE_BIT == 0 {
                return seen;
            }
            self.record_consume_spin();
            backoff.spin();
        }
    }

    fn record_acquire_ok(&self, len: u32) {
        if let Some(m) = &self.metrics {
            m.record_acquire_ok(len);
        }
    }

    fn record_fail_lap(&self) {
        if let Some(m) = &self.metrics {
            m.record_acquire_fail_lap();
        }
    }

    fn record_fail_no_slots(&self) {
        if let Some(m) = &self.metrics {
            m.record_acquire_fail_no_slots();
        }
    }

    fn record_wrap(&self) {
        if let Some(m) = &self.metrics {
            m.record_wrap();
        }
    }

    fn record_consume_spin(&self) {
        if let Some(m) = &self.metrics {
            m.record_consume_spin();
        }
    }

    fn record_release(&self, nbytes: u32) {
        if let Some(m) = &self.metrics {
            m.record_release(nbytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(space: u32, nworkers: usize) -> Ring {
        Ring::with_config(Config::new(nworkers, space, false))
    }

    #[test]
    fn single_producer_roundtrip() {
        let r = ring(16, 2);
        let res = r.acquire(4).expect("acquire");
        assert_eq!(res.offset, 0);
        r.produce(res);
        let c = r.consume();
        assert_eq!(c, Consumed { offset: 0, len: 4 });
        r.release(4);
        assert!(r.consume().is_empty());
    }

    #[test]
    fn acquire_fails_when_slots_exhausted() {
        let r = ring(64, 1);
        let first = r.acquire(4).expect("first acquire");
        assert!(r.acquire(4).is_none());
        r.produce(first);
        let c = r.consume();
        assert_eq!(c.len, 4);
    }

    #[test]
    fn scenario_s1_wrap_around_exact_and_exceed() {
        let r = ring(1000, 4);
        let a = r.acquire(501).unwrap();
        assert_eq!(a.offset, 0);
        r.produce(a);

        let c = r.consume();
        assert_eq!(c, Consumed { offset: 0, len: 501 });
        r.release(501);

        assert!(r.acquire(501).is_none());

        let b = r.acquire(500).unwrap();
        assert_eq!(b.offset, 0);
        r.produce(b);

        let c = r.consume();
        assert_eq!(c, Consumed { offset: 0, len: 500 });
        r.release(500);
    }

    #[test]
    fn scenario_s2_two_producers_interleaved() {
        let r = ring(3, 4);
        let a1 = r.acquire(1).unwrap();
        assert_eq!(a1.offset, 0);
        r.produce(a1);

        let a2 = r.acquire(1).unwrap();
        assert_eq!(a2.offset, 1);
        r.produce(a2);

        assert!(r.acquire(1).is_none());

        let c = r.consume();
        assert_eq!(c, Consumed { offset: 0, len: 2 });
        r.release(2);
        assert!(r.consume().is_empty());

        assert!(r.acquire(2).is_none());

        let a3 = r.acquire(1).unwrap();
        assert_eq!(a3.offset, 2);
        r.produce(a3);

        let a4 = r.acquire(1).unwrap();
        assert_eq!(a4.offset, 0);
        r.produce(a4);

        assert!(r.acquire(1).is_none());

        let c = r.consume();
        assert_eq!(c, Consumed { offset: 2, len: 1 });
        r.release(1);

        let c = r.consume();
        assert_eq!(c, Consumed { offset: 0, len: 1 });
        r.release(1);
    }

    #[test]
    fn scenario_s6_setup_rejects_oversized_space() {
        let err = Config::try_new(4, u32::MAX, false).unwrap_err();
        assert!(matches!(err, RingError::InvalidConfig { .. }));
    }
}
