//! Debug-only assertions for the ring's core invariants. Compiled out
//! entirely in release builds; a violation here is a protocol bug, not a
//! condition callers should handle.

/// `written <= space` and `next.position <= space`.
macro_rules! debug_assert_in_bounds {
    ($pos:expr, $space:expr) => {
        debug_assert!($pos <= $space, "position {} exceeds space {}", $pos, $space);
    };
}

/// A wrap-lock finalization may only begin with no wrap already outstanding,
/// and only past the position the consumer has released.
macro_rules! debug_assert_wrap_preconditions {
    ($written:expr, $pos:expr, $end:expr, $no_end:expr) => {
        debug_assert!(
            $written <= $pos,
            "wrap finalized with written {} > pos {}",
            $written,
            $pos
        );
        debug_assert!($end == $no_end, "wrap finalized with a wrap already outstanding");
    };
}

/// `produce` may only clear a `seen` that is currently stable and non-idle.
macro_rules! debug_assert_stable_seen {
    ($seen:expr, $no_seen:expr, $unstable_bit:expr) => {
        debug_assert!(
            $seen != $no_seen && $seen & $unstable_bit == 0,
            "produce called on a slot with no stable reservation"
        );
    };
}

/// `release`'s bookkeeping must stay within the ring's capacity and not
/// cross an outstanding wrap boundary.
macro_rules! debug_assert_release_preconditions {
    ($written:expr, $end:expr, $no_end:expr, $new_written:expr, $space:expr) => {
        debug_assert!($written <= $space, "written {} exceeds space {}", $written, $space);
        debug_assert!(
            $end == $no_end || $written <= $end,
            "written {} past outstanding end {}",
            $written,
            $end
        );
        debug_assert!(
            $new_written <= $space,
            "release advances written to {} past space {}",
            $new_written,
            $space
        );
    };
}

pub(crate) use debug_assert_in_bounds;
pub(crate) use debug_assert_release_preconditions;
pub(crate) use debug_assert_stable_seen;
pub(crate) use debug_assert_wrap_preconditions;
