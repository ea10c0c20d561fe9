//! Packed 64-bit offset words used to coordinate producers and the consumer.
//!
//! An [`Off`] packs three fields into one `u64` so a single CAS can advance
//! the write frontier and bump its ABA-defeating generation counter in one
//! atomic step: bits `[0, 32)` are a position in `[0, space]`, bits `[32, 63)`
//! are a wrap-generation counter, and bit 63 is the wrap-lock.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::backoff::Backoff;

pub const OFF_MASK: u64 = 0x0000_0000_ffff_ffff;
pub const WRAP_LOCK: u64 = 1 << 63;
pub const WRAP_CTR: u64 = 0x7fff_ffff_0000_0000;
pub const OFF_MAX: u64 = u64::MAX & !WRAP_LOCK;

/// Sentinel `seen` value meaning "this slot holds no in-flight reservation".
pub const NO_SEEN: u64 = OFF_MAX;

/// Tag bit on a slot's `seen` word marking it unstable while the owning
/// producer's `next` CAS is still in flight. Reuses the same bit as
/// [`WRAP_LOCK`] — both mark "this word is mid-publish, reread me".
pub const UNSTABLE_BIT: u64 = WRAP_LOCK;

/// Sentinel `end` value meaning "no wrap-around is pending".
pub const NO_END: u32 = u32::MAX;

#[inline]
#[must_use]
pub const fn wrap_incr(word: u64) -> u64 {
    word.wrapping_add(1 << 32) & WRAP_CTR
}

#[inline]
#[must_use]
pub const fn position(word: u64) -> u32 {
    (word & OFF_MASK) as u32
}

#[inline]
#[must_use]
pub const fn wrap_counter(word: u64) -> u64 {
    word & WRAP_CTR
}

#[inline]
#[must_use]
pub const fn is_locked(word: u64) -> bool {
    word & WRAP_LOCK != 0
}

/// Atomic offset word shared by the ring's `next` frontier.
#[derive(Debug, Default)]
pub struct Off(AtomicU64);

impl Off {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> u64 {
        self.0.load(order)
    }

    #[inline]
    pub fn store(&self, value: u64, order: Ordering) {
        self.0.store(value, order);
    }

    #[inline]
    pub fn compare_exchange_weak(
        &self,
        current: u64,
        new: u64,
        success: Ordering,
        failure: Ordering,
    ) -> Result<u64, u64> {
        self.0.compare_exchange_weak(current, new, success, failure)
    }

    /// Spin until the wrap-lock bit clears, then return the stable word.
    ///
    /// Issues an acquire fence on exit so callers observe everything the
    /// wrap-locking producer published before releasing the lock.
    pub fn stable(&self) -> u64 {
        let mut backoff = Backoff::new();
        loop {
            let word = self.0.load(Ordering::Relaxed);
            if !is_locked(word) {
                std::sync::atomic::fence(Ordering::Acquire);
                return word;
            }
            backoff.spin();
        }
    }
}
