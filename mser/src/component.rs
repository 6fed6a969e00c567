use std::collections::{HashMap, HashSet};

use crate::grow_history::HistoryArena;
use crate::mser_detector::MserParameter;
use crate::neighborhood::Neighborhood;

pub const NONE: usize = usize::MAX;

/// Linked lists of pixel indices threaded through one array of image size.
/// Every pixel belongs to at most one component's list.
#[derive(Clone, Debug, Default)]
pub struct PixelList {
    next: Vec<usize>,
}

impl PixelList {
    pub fn new(size: usize) -> Self {
        PixelList {
            next: vec![NONE; size],
        }
    }

    pub fn resize(&mut self, size: usize) {
        self.next.clear();
        self.next.resize(size, NONE);
    }

    /// Up to `count` indices starting at `head`.
    pub fn iter(&self, head: usize, count: usize) -> impl Iterator<Item = usize> + '_ {
        let mut index = head;
        std::iter::from_fn(move || {
            if index == NONE {
                return None;
            }
            let current = index;
            index = self.next[current];
            Some(current)
        })
        .take(count)
    }
}

/// Region already emitted from a component. Its pixels are the `size` list
/// entries starting at `head`; later appends and splices keep them together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildRegion {
    pub id: usize,
    pub head: usize,
    pub size: usize,
}

/// A region under construction during one pass.
#[derive(Clone, Debug)]
pub struct ConnectedComponent {
    pub head: usize,
    pub tail: usize,
    pub history: Option<usize>,
    pub value: usize,
    pub size: usize,
    pub center: Vec<f64>,
    pub variation: f64,
    pub var_changed: bool,
    child_regions: Vec<ChildRegion>,
}

impl ConnectedComponent {
    pub fn new(value: usize, num_dimensions: usize) -> Self {
        ConnectedComponent {
            head: NONE,
            tail: NONE,
            history: None,
            value,
            size: 0,
            center: vec![0.0; num_dimensions],
            variation: 0.0,
            var_changed: true,
            child_regions: Vec::new(),
        }
    }

    pub fn add_history(&mut self, histories: &mut HistoryArena) {
        self.history = Some(histories.add_history(
            self.history,
            self.value,
            self.size,
            &self.center,
        ));
    }

    pub fn add_position(&mut self, index: usize, position: &[usize], pixels: &mut PixelList) {
        if self.size > 0 {
            pixels.next[self.tail] = index;
        } else {
            self.head = index;
        }
        pixels.next[index] = NONE;
        self.tail = index;
        self.size += 1;

        let weight = 1.0 / self.size as f64;
        for (c, &p) in self.center.iter_mut().zip(position) {
            *c = (1.0 - weight) * *c + weight * p as f64;
        }
    }

    /// Absorbs `other` into `self`.
    ///
    /// The merged component always takes `other`'s gray value. The history
    /// lineage, variation state and the front of the pixel list come from the
    /// bigger of the two.
    pub fn merge(
        &mut self,
        other: ConnectedComponent,
        histories: &mut HistoryArena,
        pixels: &mut PixelList,
    ) {
        self.value = other.value;

        let self_is_bigger = self.size >= other.size;
        let (bigger, smaller) = if self_is_bigger {
            (&*self, &other)
        } else {
            (&other, &*self)
        };

        let new_history = histories.merge_history(
            bigger.history,
            smaller.history,
            other.value,
            bigger.size,
            &bigger.center,
        );
        let (variation, var_changed) = (bigger.variation, bigger.var_changed);

        if bigger.size > 0 && smaller.size > 0 {
            pixels.next[bigger.tail] = smaller.head;
        }
        let head = if bigger.size > 0 {
            bigger.head
        } else {
            smaller.head
        };
        let tail = if smaller.size > 0 {
            smaller.tail
        } else {
            bigger.tail
        };

        let self_weight = self.size as f64 / (self.size + other.size) as f64;
        for (c, &o) in self.center.iter_mut().zip(&other.center) {
            *c = self_weight * *c + (1.0 - self_weight) * o;
        }

        self.variation = variation;
        self.var_changed = var_changed;
        self.head = head;
        self.tail = tail;
        self.history = Some(new_history);
        self.size += other.size;
        self.child_regions.extend(other.child_regions);
    }

    pub fn calculate_variation(&self, histories: &mut HistoryArena, delta: usize) -> f64 {
        histories.calculate_variation(self.history, self.value, self.size, delta)
    }

    /// Tests whether the last history snapshot was a maximally stable region.
    ///
    /// A snapshot is reported one step after the local minimum of the
    /// variation: the variation must have stopped increasing at the previous
    /// call and increase now, or a gray level must have been skipped.
    pub fn is_stable(&mut self, histories: &mut HistoryArena, param: &MserParameter) -> bool {
        let history = match self.history {
            Some(history) => history,
            None => return false,
        };
        let (size, stable_size, value) = {
            let node = histories.get(history);
            (node.size, node.stable_size, node.value)
        };
        if size <= param.min_area || size >= param.max_area {
            return false;
        }

        let div = (size as f64 - stable_size as f64) / size as f64;
        let var = self.calculate_variation(histories, param.delta);

        let dvar = self.variation < var || value + 1 < self.value;
        let is_stable = dvar
            && !self.var_changed
            && self.variation < param.max_variation
            && div > param.min_diversity;

        self.variation = var;
        self.var_changed = dvar;

        if is_stable {
            histories.mark_stable(history);
        }
        is_stable
    }

    /// Pixels of the last history snapshot, which form the head of the list.
    pub fn stable_pixels<'a>(
        &self,
        histories: &HistoryArena,
        pixels: &'a PixelList,
    ) -> impl Iterator<Item = usize> + 'a {
        let count = self.history.map_or(0, |h| histories.get(h).size);
        pixels.iter(self.head, count)
    }

    pub fn child_regions(&self) -> &[ChildRegion] {
        &self.child_regions
    }

    /// Makes `region`, built from the last history snapshot, the parent of
    /// every child region inside that snapshot and returns their ids.
    ///
    /// After a merge the snapshot only covers the bigger component, so
    /// regions of the smaller one stay pending until a later region covers
    /// them.
    pub fn adopt_child_regions(
        &mut self,
        region: usize,
        histories: &HistoryArena,
        pixels: &PixelList,
    ) -> Vec<usize> {
        let size = self.history.map_or(0, |h| histories.get(h).size);
        let mut adopted = Vec::new();
        if !self.child_regions.is_empty() {
            let positions: HashMap<usize, usize> = pixels
                .iter(self.head, size)
                .enumerate()
                .map(|(position, index)| (index, position))
                .collect();
            let (inside, outside): (Vec<ChildRegion>, Vec<ChildRegion>) =
                self.child_regions.iter().copied().partition(|child| {
                    positions
                        .get(&child.head)
                        .map_or(false, |&start| start + child.size <= size)
                });
            adopted = inside.into_iter().map(|child| child.id).collect();
            self.child_regions = outside;
        }
        self.child_regions.push(ChildRegion {
            id: region,
            head: self.head,
            size,
        });
        adopted
    }
}

/// Counts the cracks between member pixels and face neighbors that are not
/// members, including neighbors outside the image and the walls of holes.
pub fn perimeter<I>(members: I, neighborhood: &Neighborhood) -> usize
where
    I: IntoIterator<Item = usize>,
{
    let members: HashSet<usize> = members.into_iter().collect();
    let mut position = vec![0; neighborhood.num_dimensions()];
    members
        .iter()
        .map(|&index| {
            neighborhood.index_to_position(index, &mut position);
            (0..neighborhood.len())
                .filter(|&k| match neighborhood.neighbor(index, &position, k) {
                    Some(n) => !members.contains(&n),
                    None => true,
                })
                .count()
        })
        .sum()
}
