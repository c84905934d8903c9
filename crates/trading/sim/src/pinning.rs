//! Thread to core pinning

use crate::error::SimError;
use tracing::debug;

/// Number of cores the OS lets this process run on
#[must_use]
pub fn available_cores() -> usize {
    core_affinity::get_core_ids().map_or(0, |cores| cores.len())
}

/// Check that every core in `first..first + count` exists
///
/// # Errors
/// [`SimError::CorePinning`] naming the first missing core, or `first` if
/// the range runs past `usize::MAX`.
pub fn check_cores(first: usize, count: usize) -> Result<(), SimError> {
    let cores = core_affinity::get_core_ids().unwrap_or_default();
    let Some(end) = first.checked_add(count) else {
        return Err(SimError::CorePinning {
            core: first,
            available: cores.len(),
        });
    };
    (first..end)
        .find(|idx| !cores.iter().any(|c| c.id == *idx))
        .map_or(Ok(()), |core| {
            Err(SimError::CorePinning {
                core,
                available: cores.len(),
            })
        })
}

/// Pin the calling thread to core `idx`
///
/// # Errors
/// [`SimError::CorePinning`] if the core does not exist or the OS refuses.
pub fn pin_current_thread(idx: usize) -> Result<(), SimError> {
    let cores = core_affinity::get_core_ids().unwrap_or_default();
    let available = cores.len();
    let pinned = cores
        .into_iter()
        .find(|c| c.id == idx)
        .is_some_and(core_affinity::set_for_current);
    if pinned {
        debug!("Pinned {:?} to core {}", std::thread::current().id(), idx);
        Ok(())
    } else {
        Err(SimError::CorePinning {
            core: idx,
            available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_core_is_reported() {
        let missing = available_cores() + 1024;
        assert!(matches!(
            check_cores(missing, 1),
            Err(SimError::CorePinning { core, .. }) if core == missing
        ));
        assert!(pin_current_thread(missing).is_err());
        assert!(check_cores(0, 0).is_ok());
    }

    #[test]
    fn test_core_range_past_usize_max_is_reported() {
        assert!(matches!(
            check_cores(usize::MAX - 1, 5),
            Err(SimError::CorePinning { core, .. }) if core == usize::MAX - 1
        ));
    }
}
