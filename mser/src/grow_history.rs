/// Snapshot of a component taken whenever its gray level advances or it is
/// merged with another component.
///
/// Nodes live in a [`HistoryArena`] and refer to each other by index. A node
/// whose `child` (or `shortcut`) is its own index terminates the respective
/// chain.
#[derive(Clone, Debug, PartialEq)]
pub struct GrowHistory {
    pub shortcut: usize,
    pub child: usize,
    // size of the component when it was last stable, zero if never stable
    pub stable_size: usize,
    pub value: usize,
    pub size: usize,
}

#[derive(Clone, Debug, Default)]
pub struct HistoryArena {
    nodes: Vec<GrowHistory>,
    // D centre coordinates per node
    centers: Vec<f64>,
    num_dimensions: usize,
}

impl HistoryArena {
    pub fn new(num_dimensions: usize) -> Self {
        HistoryArena {
            nodes: Vec::new(),
            centers: Vec::new(),
            num_dimensions,
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.centers.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: usize) -> &GrowHistory {
        &self.nodes[id]
    }

    /// Centre of mass of the component at the time node `id` was recorded.
    pub fn center(&self, id: usize) -> &[f64] {
        &self.centers[id * self.num_dimensions..(id + 1) * self.num_dimensions]
    }

    /// Appends a node continuing the chain of `previous`, or starting a new
    /// chain if the component has no history yet.
    pub fn add_history(
        &mut self,
        previous: Option<usize>,
        value: usize,
        size: usize,
        center: &[f64],
    ) -> usize {
        debug_assert_eq!(center.len(), self.num_dimensions);
        let id = self.nodes.len();
        let (shortcut, stable_size) = match previous {
            Some(prev) => {
                let prev = &mut self.nodes[prev];
                prev.child = id;
                (prev.shortcut, prev.stable_size)
            }
            None => (id, 0),
        };
        self.nodes.push(GrowHistory {
            shortcut,
            child: id,
            stable_size,
            value,
            size,
        });
        self.centers.extend_from_slice(center);
        id
    }

    /// Appends the node recording a merge. The lineage follows the bigger
    /// component; the stable size is the larger of both.
    pub fn merge_history(
        &mut self,
        bigger: Option<usize>,
        smaller: Option<usize>,
        value: usize,
        size: usize,
        center: &[f64],
    ) -> usize {
        let id = self.add_history(bigger, value, size, center);
        if let Some(smaller) = smaller {
            let smaller_stable = self.nodes[smaller].stable_size;
            if smaller_stable > self.nodes[id].stable_size {
                self.nodes[id].stable_size = smaller_stable;
            }
        }
        id
    }

    /// Relative growth of a component of `size` pixels at gray level `value`
    /// with respect to its size `delta` levels earlier.
    ///
    /// Uses `|R_i - R_{i-delta}| / |R_{i-delta}|`, not the
    /// `|R_{i+delta} - R_{i-delta}| / |R_i|` of Matas et al. The node found is
    /// written back into `history.shortcut`, so the next call for the same
    /// component starts from there.
    pub fn calculate_variation(
        &mut self,
        history: Option<usize>,
        value: usize,
        size: usize,
        delta: usize,
    ) -> f64 {
        let history = match history {
            Some(history) => history,
            None => return 1.0,
        };

        let mut shortcut = self.nodes[history].shortcut;
        while shortcut != self.nodes[shortcut].shortcut
            && self.nodes[shortcut].value + delta > value
        {
            shortcut = self.nodes[shortcut].shortcut;
        }

        let mut child = self.nodes[shortcut].child;
        while child != self.nodes[child].child && self.nodes[child].value + delta <= value {
            shortcut = child;
            child = self.nodes[child].child;
        }

        self.nodes[history].shortcut = shortcut;

        let reference = self.nodes[shortcut].size as f64;
        (size as f64 - reference) / reference
    }

    pub fn mark_stable(&mut self, id: usize) {
        let node = &mut self.nodes[id];
        node.stable_size = node.size;
    }

    /// Follows `child` links from `id` up to and including the end of the chain.
    pub fn chain(&self, id: usize) -> impl Iterator<Item = &GrowHistory> + '_ {
        let mut next = Some(id);
        std::iter::from_fn(move || {
            let current = next?;
            let node = &self.nodes[current];
            next = (node.child != current).then(|| node.child);
            Some(node)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryArena;
    use assert_approx_eq::assert_approx_eq;
    use itertools::Itertools;

    fn build_chain(arena: &mut HistoryArena, snapshots: &[(usize, usize)]) -> Vec<usize> {
        let mut previous = None;
        snapshots
            .iter()
            .map(|&(value, size)| {
                let id = arena.add_history(previous, value, size, &[0.0, 0.0]);
                previous = Some(id);
                id
            })
            .collect()
    }

    #[test]
    fn test_add_history_links_chain() {
        let mut arena = HistoryArena::new(2);
        let ids = build_chain(&mut arena, &[(10, 4), (11, 9), (12, 16)]);

        assert_eq!(arena.get(ids[0]).shortcut, ids[0]);
        assert_eq!(arena.get(ids[0]).child, ids[1]);
        assert_eq!(arena.get(ids[1]).child, ids[2]);
        assert_eq!(arena.get(ids[2]).child, ids[2]);
        // later nodes inherit the first node's shortcut
        assert_eq!(arena.get(ids[2]).shortcut, ids[0]);

        let sizes = arena.chain(ids[0]).map(|n| n.size).collect_vec();
        assert_eq!(sizes, vec![4, 9, 16]);

        arena.clear();
        assert!(arena.is_empty());
    }

    #[test]
    fn test_variation_without_history() {
        let mut arena = HistoryArena::new(2);
        assert_approx_eq!(arena.calculate_variation(None, 5, 10, 2), 1.0);
    }

    #[test]
    fn test_variation_uses_delta_levels_back() {
        let mut arena = HistoryArena::new(2);
        let ids = build_chain(
            &mut arena,
            &[(10, 4), (11, 9), (12, 16), (13, 25), (14, 36)],
        );
        let last = *ids.last().unwrap();

        // component now at level 15 with 49 pixels; two levels back is level 13
        let var = arena.calculate_variation(Some(last), 15, 49, 2);
        assert_approx_eq!(var, (49.0 - 25.0) / 25.0);
        assert_eq!(arena.get(last).shortcut, ids[3]);

        // memoized shortcut gives the same answer on a repeated call
        let var = arena.calculate_variation(Some(last), 15, 49, 2);
        assert_approx_eq!(var, (49.0 - 25.0) / 25.0);
    }

    #[test]
    fn test_variation_shortcut_moves_forward() {
        let mut arena = HistoryArena::new(2);
        let ids = build_chain(&mut arena, &[(10, 4), (11, 9), (12, 16)]);
        // the walk never steps onto the newest node, so level 11 is the reference
        assert_approx_eq!(
            arena.calculate_variation(Some(ids[2]), 13, 20, 1),
            (20.0 - 9.0) / 9.0
        );
        assert_eq!(arena.get(ids[2]).shortcut, ids[1]);

        let next = arena.add_history(Some(ids[2]), 13, 20, &[0.0, 0.0]);
        // inherited shortcut already points at level 11
        assert_eq!(arena.get(next).shortcut, ids[1]);
        // level 12 is no longer the newest node and becomes the reference
        assert_approx_eq!(
            arena.calculate_variation(Some(next), 14, 30, 1),
            (30.0 - 16.0) / 16.0
        );
        assert_eq!(arena.get(next).shortcut, ids[2]);
    }

    #[test]
    fn test_variation_with_short_history() {
        let mut arena = HistoryArena::new(2);
        let ids = build_chain(&mut arena, &[(10, 4), (11, 8)]);
        // not enough levels yet: the oldest snapshot is used
        assert_approx_eq!(
            arena.calculate_variation(Some(ids[1]), 12, 12, 5),
            (12.0 - 4.0) / 4.0
        );
    }

    #[test]
    fn test_merge_history_keeps_larger_stable_size() {
        let mut arena = HistoryArena::new(2);
        let big = arena.add_history(None, 20, 50, &[1.0, 1.0]);
        let small = arena.add_history(None, 18, 30, &[5.0, 5.0]);
        arena.mark_stable(small);

        let merged = arena.merge_history(Some(big), Some(small), 18, 50, &[1.0, 1.0]);
        let node = arena.get(merged);
        assert_eq!(node.stable_size, 30);
        assert_eq!(node.shortcut, big);
        assert_eq!(arena.get(big).child, merged);
        assert_eq!(arena.center(merged), &[1.0, 1.0]);
    }
}
