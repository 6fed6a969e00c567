use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

/// Direction of the flooding pass that produced a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// Regions darker than their surroundings.
    DarkToBright,
    /// Regions brighter than their surroundings.
    BrightToDark,
}

impl Polarity {
    /// Gray level at which a pixel of raw intensity `value` is flooded.
    #[inline]
    pub fn level(self, value: u8) -> usize {
        match self {
            Polarity::DarkToBright => value as usize,
            Polarity::BrightToDark => 255 - value as usize,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::DarkToBright => write!(f, "dark to bright"),
            Polarity::BrightToDark => write!(f, "bright to dark"),
        }
    }
}

/// A maximally stable extremal region.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub id: usize,
    pub size: usize,
    pub perimeter: usize,
    pub center: Vec<f64>,
    pub polarity: Polarity,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl Region {
    pub fn center(&self, index: usize) -> f64 {
        self.center[index]
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Region {}, {}, size: {}",
            self.id,
            self.center.iter().map(|c| *c as i64).join(" "),
            self.size
        )
    }
}

/// Forest of regions found by one call to the engine.
///
/// Region ids are handed out by the engine and are contiguous within a tree,
/// starting at [`RegionTree::first_id`]. A region's parent is always newer
/// than the region itself.
#[derive(Clone, Debug, Default)]
pub struct RegionTree {
    first_id: usize,
    regions: Vec<Region>,
    top_level: BTreeSet<usize>,
}

impl RegionTree {
    pub fn new(first_id: usize) -> Self {
        RegionTree {
            first_id,
            regions: Vec::new(),
            top_level: BTreeSet::new(),
        }
    }

    pub fn first_id(&self) -> usize {
        self.first_id
    }

    /// Id the next inserted region must carry.
    pub fn next_id(&self) -> usize {
        self.first_id + self.regions.len()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Region> {
        self.regions.get(id.checked_sub(self.first_id)?)
    }

    /// All regions, in order of detection.
    pub fn iter(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter()
    }

    /// Regions without a parent.
    pub fn top_level(&self) -> impl Iterator<Item = &Region> + '_ {
        self.top_level.iter().filter_map(move |&id| self.get(id))
    }

    pub fn top_level_ids(&self) -> &BTreeSet<usize> {
        &self.top_level
    }

    /// Adds a new region. Its children move under it and leave the top level.
    pub(crate) fn insert(&mut self, region: Region) -> usize {
        debug_assert_eq!(region.id, self.next_id());
        let id = region.id;
        for &child in &region.children {
            self.top_level.remove(&child);
            if let Some(index) = child.checked_sub(self.first_id) {
                if let Some(child) = self.regions.get_mut(index) {
                    child.parent = Some(id);
                }
            }
        }
        self.top_level.insert(id);
        self.regions.push(region);
        id
    }

    /// Walks the parent chain of `id`, nearest ancestor first.
    pub fn ancestors(&self, id: usize) -> impl Iterator<Item = &Region> + '_ {
        let mut current = self.get(id).and_then(|r| r.parent);
        std::iter::from_fn(move || {
            let region = self.get(current?)?;
            current = region.parent;
            Some(region)
        })
    }

    pub fn is_ancestor_of(&self, ancestor: usize, id: usize) -> bool {
        self.ancestors(id).any(|r| r.id == ancestor)
    }

    /// Regions of one pass only.
    pub fn with_polarity(&self, polarity: Polarity) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter().filter(move |r| r.polarity == polarity)
    }
}

#[cfg(test)]
mod tests {
    use super::{Polarity, Region, RegionTree};
    use itertools::Itertools;

    fn region(id: usize, size: usize, children: Vec<usize>) -> Region {
        Region {
            id,
            size,
            perimeter: 0,
            center: vec![1.6, 2.2],
            polarity: Polarity::DarkToBright,
            parent: None,
            children,
        }
    }

    #[test]
    fn test_insert_links_children() {
        let mut tree = RegionTree::new(5);
        tree.insert(region(5, 12, vec![]));
        tree.insert(region(6, 14, vec![]));
        tree.insert(region(7, 40, vec![5, 6]));
        tree.insert(region(8, 20, vec![]));

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get(5).unwrap().parent, Some(7));
        assert_eq!(tree.get(6).unwrap().parent, Some(7));
        assert!(tree.get(4).is_none());
        assert_eq!(tree.top_level().map(|r| r.id).collect_vec(), vec![7, 8]);

        assert!(tree.is_ancestor_of(7, 5));
        assert!(!tree.is_ancestor_of(5, 7));
        assert!(!tree.is_ancestor_of(8, 5));
    }

    #[test]
    fn test_ancestors_chain() {
        let mut tree = RegionTree::new(0);
        tree.insert(region(0, 12, vec![]));
        tree.insert(region(1, 20, vec![0]));
        tree.insert(region(2, 30, vec![1]));
        assert_eq!(tree.ancestors(0).map(|r| r.id).collect_vec(), vec![1, 2]);
        assert_eq!(tree.ancestors(2).count(), 0);
        assert!(tree.is_ancestor_of(2, 0));
    }

    #[test]
    fn test_polarity_level() {
        assert_eq!(Polarity::DarkToBright.level(40), 40);
        assert_eq!(Polarity::BrightToDark.level(40), 215);
        assert_eq!(Polarity::BrightToDark.level(255), 0);
    }

    #[test]
    fn test_display() {
        let r = region(3, 12, vec![]);
        assert_eq!(r.to_string(), "Region 3, 1 2, size: 12");
    }
}
