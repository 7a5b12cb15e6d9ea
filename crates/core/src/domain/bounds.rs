// Worker Bounds - (min, max) permissible worker count

use super::error::{CapacityError, DomainError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Largest value either bound may take (both halves share one 64-bit word)
pub const MAX_WORKER_LIMIT: usize = u32::MAX as usize;

/// Validated worker bounds. `min <= max` and `max >= 1` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    min: usize,
    max: usize,
}

impl Bounds {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if max == 0 {
            return Err(DomainError::ZeroMaxWorkers);
        }
        if max > MAX_WORKER_LIMIT {
            return Err(DomainError::WorkerCountTooLarge(max));
        }
        if min > max {
            return Err(DomainError::MinExceedsMax { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    // Upper 32 bits: min, lower 32 bits: max
    fn pack(self) -> u64 {
        ((self.min as u64) << 32) | (self.max as u64 & 0xFFFF_FFFF)
    }

    fn unpack(packed: u64) -> Self {
        Self {
            min: (packed >> 32) as usize,
            max: (packed & 0xFFFF_FFFF) as usize,
        }
    }
}

/// Lock-free bounds cell for a live pool.
///
/// Both halves live in one `AtomicU64`, so a `load` can never observe a torn
/// pair. Each setter is a single CAS that refuses a result with `min > max`;
/// a two-field change is therefore two independent atomic steps, and callers
/// must order them (see `application::capacity`).
#[derive(Debug)]
pub struct AtomicBounds {
    packed: AtomicU64,
}

impl AtomicBounds {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            packed: AtomicU64::new(bounds.pack()),
        }
    }

    /// Consistent (min, max) read
    pub fn load(&self) -> Bounds {
        Bounds::unpack(self.packed.load(Ordering::Acquire))
    }

    /// Set max, keeping the current min. Refused if `max < min` or `max == 0`.
    pub fn set_max(&self, max: usize) -> std::result::Result<Bounds, CapacityError> {
        if max == 0 {
            return Err(CapacityError::ZeroMax);
        }
        if max > MAX_WORKER_LIMIT {
            return Err(CapacityError::OutOfRange(max));
        }
        self.update(|current| {
            if max < current.min {
                Err(CapacityError::MaxBelowMin {
                    max,
                    min: current.min,
                })
            } else {
                Ok(Bounds {
                    min: current.min,
                    max,
                })
            }
        })
    }

    /// Set min, keeping the current max. Refused if `min > max`.
    pub fn set_min(&self, min: usize) -> std::result::Result<Bounds, CapacityError> {
        if min > MAX_WORKER_LIMIT {
            return Err(CapacityError::OutOfRange(min));
        }
        self.update(|current| {
            if min > current.max {
                Err(CapacityError::MinAboveMax {
                    min,
                    max: current.max,
                })
            } else {
                Ok(Bounds {
                    min,
                    max: current.max,
                })
            }
        })
    }

    // CAS loop: re-validate against whatever a concurrent writer left behind
    fn update<F>(&self, next: F) -> std::result::Result<Bounds, CapacityError>
    where
        F: Fn(Bounds) -> std::result::Result<Bounds, CapacityError>,
    {
        loop {
            let packed = self.packed.load(Ordering::Acquire);
            let proposed = next(Bounds::unpack(packed))?;

            match self.packed.compare_exchange(
                packed,
                proposed.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(proposed),
                Err(_) => continue,
            }
        }
    }
}
