/// Range of probes refreshed during a frame.
///
/// The range starts at `offset` and spans `count` probes, wrapping around at
/// `total`; all three are expressed in flattened probe indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateRange {
    pub offset: u32,
    pub count: u32,
    pub total: u32,
}

impl UpdateRange {
    pub fn full(total: u32) -> Self {
        Self {
            offset: 0,
            count: total,
            total,
        }
    }

    pub fn rolling(offset: u32, budget: u32, total: u32) -> Self {
        Self {
            offset: if total == 0 { 0 } else { offset % total },
            count: budget.min(total),
            total,
        }
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.total
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn contains(&self, probe: u32) -> bool {
        if self.total == 0 {
            return false;
        }

        (probe % self.total + self.total - self.offset % self.total)
            % self.total
            < self.count
    }

    /// Returns index of the probe handled by `nth` invocation of a dispatch
    /// spanning this range.
    pub fn probe(&self, nth: u32) -> u32 {
        (self.offset + nth) % self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.count).map(move |nth| self.probe(nth))
    }
}
