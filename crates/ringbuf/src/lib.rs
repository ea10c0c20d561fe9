//! Lock-free multi-producer/single-consumer byte ring buffer supporting
//! contiguous range reservations.
//!
//! A producer [`Ring::acquire`]s N contiguous bytes, gets back an offset
//! into a caller-owned byte buffer, writes into it, then
//! [`Ring::produce`]s. The single consumer [`Ring::consume`]s the largest
//! contiguous, fully-produced prefix and [`Ring::release`]s it once done.
//! The ring wraps only at boundaries producers actually reserved —
//! reservations never straddle the physical end of the buffer.
//!
//! The ring vends offsets, not pointers or slices: the backing byte array
//! is owned entirely by the caller.

mod backoff;
mod config;
mod error;
mod insights;
mod invariants;
mod metrics;
mod offset;
mod ring;
mod slot;

pub use backoff::Backoff;
pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG, MAX_SPACE};
pub use error::{Result, RingError};
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::{Consumed, Reservation, Ring, SlotHandle};
