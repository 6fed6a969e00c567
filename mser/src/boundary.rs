/// Number of gray levels of 8-bit input.
pub const GRAY_LEVELS: usize = 256;

/// Frontier of the flood fill: one LIFO stack of pixel indices per gray level.
#[derive(Clone, Debug)]
pub struct BoundaryStacks {
    stacks: Vec<Vec<usize>>,
}

impl Default for BoundaryStacks {
    fn default() -> Self {
        BoundaryStacks::new(GRAY_LEVELS)
    }
}

impl BoundaryStacks {
    pub fn new(levels: usize) -> Self {
        BoundaryStacks {
            stacks: vec![Vec::new(); levels],
        }
    }

    /// Empties every stack, keeping the allocations.
    pub fn clear(&mut self) {
        self.stacks.iter_mut().for_each(Vec::clear);
    }

    #[inline]
    pub fn push(&mut self, level: usize, index: usize) {
        self.stacks[level].push(index);
    }

    #[inline]
    pub fn pop(&mut self, level: usize) -> Option<usize> {
        self.stacks[level].pop()
    }

    /// Lowest level `>= from` whose stack holds pixels.
    pub fn next_nonempty(&self, from: usize) -> Option<usize> {
        (from..self.stacks.len()).find(|&level| !self.stacks[level].is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundaryStacks, GRAY_LEVELS};

    #[test]
    fn test_lifo_within_level() {
        let mut stacks = BoundaryStacks::default();
        stacks.push(7, 1);
        stacks.push(7, 2);
        stacks.push(7, 3);
        assert_eq!(stacks.pop(7), Some(3));
        assert_eq!(stacks.pop(7), Some(2));
        assert_eq!(stacks.pop(7), Some(1));
        assert_eq!(stacks.pop(7), None);
        assert_eq!(stacks.next_nonempty(0), None);
        // the default covers every 8-bit level
        stacks.push(GRAY_LEVELS - 1, 4);
        assert_eq!(stacks.next_nonempty(0), Some(GRAY_LEVELS - 1));
    }

    #[test]
    fn test_next_nonempty() {
        let mut stacks = BoundaryStacks::new(16);
        assert_eq!(stacks.next_nonempty(0), None);
        stacks.push(3, 10);
        stacks.push(9, 11);
        assert_eq!(stacks.next_nonempty(0), Some(3));
        assert_eq!(stacks.next_nonempty(3), Some(3));
        assert_eq!(stacks.next_nonempty(4), Some(9));
        assert_eq!(stacks.next_nonempty(10), None);
        // past the last level
        assert_eq!(stacks.next_nonempty(16), None);

        stacks.clear();
        assert_eq!(stacks.next_nonempty(0), None);
        assert_eq!(stacks.pop(3), None);
    }
}
