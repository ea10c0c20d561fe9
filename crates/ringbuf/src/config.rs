//! Ring dimensions: worker (producer slot) capacity and byte capacity.

/// Maximum `space` the packed [`crate::offset::Off`] position field can
/// address: `2^32 - 2`, leaving room for the `NO_SEEN`/`OFF_MAX` sentinel.
pub const MAX_SPACE: u64 = u32::MAX as u64 - 1;

pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 1024;

/// Validated ring dimensions.
///
/// `Config::new` is a `const fn` for compile-time-known dimensions and
/// panics on an out-of-range literal, matching the existing convention of
/// catching a misconfigured constant at the construction boundary. For
/// dimensions only known at runtime (e.g. parsed from a config file), use
/// [`Config::try_new`], which returns a [`crate::error::RingError`] instead
/// of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub nworkers: usize,
    pub space: u32,
    pub enable_metrics: bool,
}

impl Config {
    #[must_use]
    pub const fn new(nworkers: usize, space: u32, enable_metrics: bool) -> Self {
        assert!(nworkers >= MIN_WORKERS && nworkers <= MAX_WORKERS);
        assert!(space >= 1 && (space as u64) <= MAX_SPACE);
        Self {
            nworkers,
            space,
            enable_metrics,
        }
    }

    /// Fallible counterpart to [`Config::new`] for runtime-sourced dimensions.
    pub fn try_new(
        nworkers: usize,
        space: u32,
        enable_metrics: bool,
    ) -> crate::error::Result<Self> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&nworkers) {
            return Err(crate::error::RingError::invalid_config(format!(
                "nworkers must be in [{MIN_WORKERS}, {MAX_WORKERS}], got {nworkers}"
            )));
        }
        if space == 0 || u64::from(space) > MAX_SPACE {
            return Err(crate::error::RingError::invalid_config(format!(
                "space must be in [1, {MAX_SPACE}], got {space}"
            )));
        }
        Ok(Self {
            nworkers,
            space,
            enable_metrics,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(16, 1 << 16, false)
    }
}

pub const LOW_LATENCY_CONFIG: Config = Config::new(8, 1 << 12, false);
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(64, 1 << 20, false);
