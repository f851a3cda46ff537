//! Cyclic selection over a fixed, non-empty list

/// Index into a fixed-length list that wraps to the first entry after the last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclicSelector {
    current: usize,
    len: usize,
}

impl CyclicSelector {
    /// Selector over `len` entries starting at the first
    ///
    /// A zero length is treated as one so the index is always valid.
    pub const fn new(len: usize) -> Self {
        Self { current: 0, len: if len == 0 { 1 } else { len } }
    }

    /// `(current + 1) mod len`
    pub const fn next_index(current: usize, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            (current + 1) % len
        }
    }

    /// Currently selected index
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Number of entries cycled over
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always false; a selector covers at least one entry
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Advance to the next entry and return its index
    pub fn advance(&mut self) -> usize {
        self.current = Self::next_index(self.current, self.len);
        self.current
    }

    /// Jump to `index`, wrapped into range
    pub fn select(&mut self, index: usize) -> usize {
        self.current = index % self.len;
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps() {
        let mut selector = CyclicSelector::new(3);
        let sequence: Vec<usize> = (0..4).map(|_| selector.advance()).collect();
        assert_eq!(sequence, vec![1, 2, 0, 1]);
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        for len in 1..6 {
            let mut selector = CyclicSelector::new(len);
            selector.select(len - 1);
            let start = selector.current();
            for _ in 0..len {
                selector.advance();
            }
            assert_eq!(selector.current(), start);
        }
    }

    #[test]
    fn test_select_wraps_out_of_range() {
        let mut selector = CyclicSelector::new(4);
        assert_eq!(selector.select(9), 1);
        assert_eq!(CyclicSelector::new(0).len(), 1);
    }
}
