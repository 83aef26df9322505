use nab_kiln::format_binary;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuAllocationError
{
    pub requested: u64,
    pub available: u64,
}
impl Display for GpuAllocationError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "GPU memory budget exceeded: requested {:#.2}B with {:#.2}B available",
            format_binary!(self.requested), format_binary!(self.available))
    }
}
impl Error for GpuAllocationError { }

/// Tracks device memory handed out to GPU-side resources against a fixed capacity
pub struct GpuMemoryBudget
{
    capacity: u64,
    used: AtomicU64,
}
impl GpuMemoryBudget
{
    #[must_use]
    pub const fn new(capacity: u64) -> Self
    {
        Self { capacity, used: AtomicU64::new(0) }
    }

    pub fn try_allocate(&self, bytes: u64) -> Result<(), GpuAllocationError>
    {
        self.used.fetch_update(Ordering::AcqRel, Ordering::Acquire, |used|
        {
            used.checked_add(bytes).filter(|total| *total <= self.capacity)
        })
        .map(|_| ())
        .map_err(|used| GpuAllocationError { requested: bytes, available: self.capacity.saturating_sub(used) })
    }

    pub fn free(&self, bytes: u64)
    {
        let result = self.used.fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| used.checked_sub(bytes));
        if result.is_err()
        {
            log::error!("Freed {bytes} more GPU bytes than were allocated");
            self.used.store(0, Ordering::Release);
        }
    }

    #[inline] #[must_use]
    pub fn capacity(&self) -> u64 { self.capacity }

    #[inline] #[must_use]
    pub fn used(&self) -> u64 { self.used.load(Ordering::Acquire) }

    #[inline] #[must_use]
    pub fn available(&self) -> u64 { self.capacity.saturating_sub(self.used()) }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn allocate_until_full()
    {
        let budget = GpuMemoryBudget::new(100);
        budget.try_allocate(60).unwrap();
        budget.try_allocate(40).unwrap();
        assert_eq!(0, budget.available());

        let err = budget.try_allocate(1).unwrap_err();
        assert_eq!(GpuAllocationError { requested: 1, available: 0 }, err);
        assert_eq!(100, budget.used());
    }

    #[test]
    fn free_returns_bytes()
    {
        let budget = GpuMemoryBudget::new(100);
        budget.try_allocate(70).unwrap();
        assert!(budget.try_allocate(50).is_err());

        budget.free(70);
        budget.try_allocate(50).unwrap();
        assert_eq!(50, budget.used());
    }

    #[test]
    fn overflow_is_rejected()
    {
        let budget = GpuMemoryBudget::new(u64::MAX);
        budget.try_allocate(10).unwrap();
        assert!(budget.try_allocate(u64::MAX).is_err());
    }
}
