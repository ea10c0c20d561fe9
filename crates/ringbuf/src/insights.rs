//! Coarse-grained, opt-in tracing for infrequent ring events.
//!
//! Only construction, wrap-lock finalization, and consumer wrap-restart are
//! instrumented. `acquire`, `produce`, and the steady-state path of
//! `consume` are never touched here — these stubs compile to nothing when
//! the `tracing` feature is off.

#[cfg(feature = "tracing")]
pub(crate) fn ring_created(space: u32, nworkers: usize) {
    tracing::debug!(space, nworkers, "ring created");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn ring_created(_space: u32, _nworkers: usize) {}

#[cfg(feature = "tracing")]
pub(crate) fn wrap_locked(pos: u32) {
    tracing::trace!(pos, "wrap-lock finalized, end published");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn wrap_locked(_pos: u32) {}

#[cfg(feature = "tracing")]
pub(crate) fn wrap_restart() {
    tracing::trace!("consumer drained wrap tail, restarting frame at 0");
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
pub(crate) fn wrap_restart() {}
