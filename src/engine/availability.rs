use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::model::Status;

// ── Availability Counters ─────────────────────────────────────────

/// Free spaces per status quota, bounded by the lot capacity.
///
/// Every status has an entry, even when its quota is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityTracker {
    counters: BTreeMap<Status, u32>,
    capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaError {
    /// Seeded quotas add up to more spaces than the lot has.
    ExceedsCapacity { total: u64, capacity: u32 },
}

impl fmt::Display for QuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaError::ExceedsCapacity { total, capacity } => {
                write!(f, "quotas total {total} spaces but the lot holds {capacity}")
            }
        }
    }
}

impl std::error::Error for QuotaError {}

impl AvailabilityTracker {
    pub fn new(seed: impl IntoIterator<Item = (Status, u32)>, capacity: u32) -> Result<Self, QuotaError> {
        let mut counters: BTreeMap<Status, u32> = Status::ALL.iter().map(|s| (*s, 0)).collect();
        for (status, free) in seed {
            counters.insert(status, free);
        }
        let total: u64 = counters.values().map(|v| u64::from(*v)).sum();
        if total > u64::from(capacity) {
            return Err(QuotaError::ExceedsCapacity { total, capacity });
        }
        Ok(Self { counters, capacity })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Sum over all status quotas.
    pub fn free_spaces(&self) -> u32 {
        self.counters.values().sum()
    }

    pub fn free_for(&self, status: Status) -> u32 {
        self.counters.get(&status).copied().unwrap_or(0)
    }

    /// Whether [`try_take`](Self::try_take) would succeed, without mutating.
    pub fn can_take(&self, status: Status) -> bool {
        self.free_spaces() > 0 && self.free_for(status) > 0
    }

    /// Take one space from `status`'s quota. Returns false, leaving the
    /// counters untouched, when the lot or that quota is empty.
    pub fn try_take(&mut self, status: Status) -> bool {
        if !self.can_take(status) {
            return false;
        }
        if let Some(free) = self.counters.get_mut(&status) {
            *free -= 1;
        }
        true
    }

    /// Return one space to `status`'s quota. A full lot stays full: the
    /// release is dropped with a warning and false is returned.
    pub fn release(&mut self, status: Status) -> bool {
        let free = self.free_spaces();
        if free >= self.capacity {
            warn!(%status, free, capacity = self.capacity, "release dropped, lot already at capacity");
            return false;
        }
        *self.counters.entry(status).or_insert(0) += 1;
        true
    }

    pub fn snapshot(&self) -> Vec<(Status, u32)> {
        self.counters.iter().map(|(s, v)| (*s, *v)).collect()
    }

    /// Overwrite counters from a snapshot. Statuses missing from it keep
    /// their current value.
    pub fn restore(&mut self, snapshot: &[(Status, u32)]) {
        for (status, free) in snapshot {
            self.counters.insert(*status, *free);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> AvailabilityTracker {
        AvailabilityTracker::new(
            [
                (Status::Disabled, 0),
                (Status::EdMd, 0),
                (Status::CriticalWorker, 0),
                (Status::Other, 15),
            ],
            36,
        )
        .unwrap()
    }

    #[test]
    fn free_spaces_sums_quotas() {
        let t = seeded();
        assert_eq!(t.free_spaces(), 15);
        assert_eq!(t.free_for(Status::Other), 15);
        assert_eq!(t.free_for(Status::Disabled), 0);
        assert_eq!(t.capacity(), 36);
    }

    #[test]
    fn seed_over_capacity_rejected() {
        let err = AvailabilityTracker::new([(Status::Other, 30), (Status::Disabled, 7)], 36).unwrap_err();
        assert_eq!(err, QuotaError::ExceedsCapacity { total: 37, capacity: 36 });
    }

    #[test]
    fn unseeded_statuses_start_at_zero() {
        let t = AvailabilityTracker::new([(Status::Other, 2)], 36).unwrap();
        assert_eq!(t.snapshot().len(), 4);
        assert_eq!(t.free_for(Status::EdMd), 0);
    }

    #[test]
    fn take_and_release_balance() {
        let mut t = seeded();
        let initial = t.free_spaces();
        let mut taken = 0;
        for _ in 0..5 {
            assert!(t.try_take(Status::Other));
            taken += 1;
        }
        t.release(Status::Other);
        t.release(Status::Disabled);
        assert_eq!(t.free_spaces(), initial - taken + 2);
    }

    #[test]
    fn take_fails_without_mutation_when_lot_empty() {
        let mut t = AvailabilityTracker::new([(Status::Other, 1)], 36).unwrap();
        assert!(t.try_take(Status::Other));
        let before = t.clone();
        assert!(!t.try_take(Status::Other));
        assert_eq!(t, before);
    }

    // A pooled check (lot total only) would let an empty quota go negative.
    // The tracker checks the status's own quota as well.
    #[test]
    fn take_from_empty_quota_rejected_even_with_pool_slack() {
        let mut t = seeded();
        assert!(t.free_spaces() > 0);
        assert!(!t.can_take(Status::Disabled));
        assert!(!t.try_take(Status::Disabled));
        assert_eq!(t.free_for(Status::Disabled), 0);
        assert_eq!(t.free_spaces(), 15);
    }

    #[test]
    fn counters_never_negative_under_churn() {
        let mut t = seeded();
        for i in 0..100 {
            let status = Status::ALL[i % 4];
            if i % 3 == 0 {
                t.release(status);
            } else {
                t.try_take(status);
            }
            // u32 cannot underflow silently in debug builds; this also pins the sum
            assert_eq!(t.free_spaces(), t.snapshot().iter().map(|(_, v)| v).sum::<u32>());
        }
    }

    #[test]
    fn release_stops_at_capacity() {
        let mut t = AvailabilityTracker::new([(Status::Other, 35)], 36).unwrap();
        assert!(t.release(Status::Disabled));
        assert_eq!(t.free_spaces(), 36);
        let before = t.clone();
        assert!(!t.release(Status::Other));
        assert_eq!(t, before);
    }

    #[test]
    fn repeated_releases_never_overfill_the_lot() {
        let mut t = seeded();
        for i in 0..100 {
            t.release(Status::ALL[i % 4]);
            assert!(t.free_spaces() <= t.capacity());
        }
        assert_eq!(t.free_spaces(), 36);
    }

    #[test]
    fn snapshot_restore() {
        let mut t = seeded();
        t.try_take(Status::Other);
        let snap = t.snapshot();
        let mut fresh = seeded();
        fresh.restore(&snap);
        assert_eq!(fresh, t);
    }
}
