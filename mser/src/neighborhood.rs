/// Face-connected neighborhood of a flattened N-dimensional grid.
///
/// Dimension 0 varies fastest in the linear index. Each axis contributes two
/// neighbors, `+1` then `-1`, so a 2-D image yields the order
/// `[x+1, x-1, y+1, y-1]`.
#[derive(Clone, Debug)]
pub struct Neighborhood {
    dimensions: Vec<usize>,
    offsets: Vec<isize>,
    relative_positions: Vec<Vec<isize>>,
    size: usize,
}

impl Neighborhood {
    pub fn new(dimensions: &[usize]) -> Self {
        let num_dimensions = dimensions.len();
        let strides: Vec<usize> = dimensions
            .iter()
            .scan(1_usize, |acc, &d| {
                let stride = *acc;
                *acc *= d;
                Some(stride)
            })
            .collect();

        let mut offsets = Vec::with_capacity(2 * num_dimensions);
        let mut relative_positions = Vec::with_capacity(2 * num_dimensions);
        for (d, &stride) in strides.iter().enumerate() {
            for step in [1_isize, -1] {
                offsets.push(step * stride as isize);
                let mut position = vec![0; num_dimensions];
                position[d] = step;
                relative_positions.push(position);
            }
        }

        Neighborhood {
            dimensions: dimensions.to_vec(),
            offsets,
            relative_positions,
            size: dimensions.iter().product(),
        }
    }

    /// Number of neighbors of an interior pixel.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn num_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of pixels in the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offsets(&self) -> &[isize] {
        &self.offsets
    }

    pub fn relative_positions(&self) -> &[Vec<isize>] {
        &self.relative_positions
    }

    pub fn index_to_position(&self, index: usize, position: &mut [usize]) {
        let mut prod = 1;
        for (p, &d) in position.iter_mut().zip(&self.dimensions) {
            *p = (index / prod) % d;
            prod *= d;
        }
    }

    /// Moves `position` to neighbor `k`, writing the result into `result`.
    /// Returns false if the neighbor lies outside the grid.
    #[inline]
    pub fn step(&self, position: &[usize], k: usize, result: &mut [usize]) -> bool {
        for ((r, (&p, &delta)), &d) in result
            .iter_mut()
            .zip(position.iter().zip(&self.relative_positions[k]))
            .zip(&self.dimensions)
        {
            let moved = p as isize + delta;
            if moved < 0 || moved >= d as isize {
                return false;
            }
            *r = moved as usize;
        }
        true
    }

    /// Linear index of neighbor `k`. Only meaningful after `step` succeeded.
    #[inline]
    pub fn neighbor_index(&self, index: usize, k: usize) -> usize {
        (index as isize + self.offsets[k]) as usize
    }

    /// Linear index of neighbor `k`, or `None` when it falls outside the grid.
    pub fn neighbor(&self, index: usize, position: &[usize], k: usize) -> Option<usize> {
        let d = k / 2;
        let inside = if k % 2 == 0 {
            position[d] + 1 < self.dimensions[d]
        } else {
            position[d] > 0
        };
        inside.then(|| self.neighbor_index(index, k))
    }
}

#[cfg(test)]
mod tests {
    use super::Neighborhood;

    #[test]
    fn test_offsets_and_positions() {
        let neighborhood = Neighborhood::new(&[4, 3, 2]);
        assert_eq!(neighborhood.len(), 6);
        assert!(!neighborhood.is_empty());
        assert!(Neighborhood::new(&[]).is_empty());
        assert_eq!(neighborhood.size(), 24);
        assert_eq!(neighborhood.offsets(), &[1, -1, 4, -4, 12, -12]);
        assert_eq!(
            neighborhood.relative_positions(),
            &[
                vec![1, 0, 0],
                vec![-1, 0, 0],
                vec![0, 1, 0],
                vec![0, -1, 0],
                vec![0, 0, 1],
                vec![0, 0, -1],
            ]
        );
    }

    #[test]
    fn test_index_to_position() {
        let neighborhood = Neighborhood::new(&[4, 3, 2]);
        let mut position = [0; 3];
        neighborhood.index_to_position(23, &mut position);
        assert_eq!(position, [3, 2, 1]);
        neighborhood.index_to_position(13, &mut position);
        assert_eq!(position, [1, 0, 1]);
    }

    #[test]
    fn test_step_stays_inside() {
        let neighborhood = Neighborhood::new(&[4, 3]);
        let mut result = [0; 2];

        // right edge
        assert!(!neighborhood.step(&[3, 1], 0, &mut result));
        assert!(neighborhood.step(&[3, 1], 1, &mut result));
        assert_eq!(result, [2, 1]);
        assert_eq!(neighborhood.neighbor_index(7, 1), 6);

        // top edge
        assert!(!neighborhood.step(&[0, 0], 3, &mut result));
        assert!(neighborhood.step(&[0, 0], 2, &mut result));
        assert_eq!(neighborhood.neighbor_index(0, 2), 4);
    }

    #[test]
    fn test_neighbor_matches_step() {
        let neighborhood = Neighborhood::new(&[5, 4, 3]);
        let mut position = [0; 3];
        let mut result = [0; 3];
        for index in 0..neighborhood.size() {
            neighborhood.index_to_position(index, &mut position);
            for k in 0..neighborhood.len() {
                let stepped = neighborhood.step(&position, k, &mut result);
                let neighbor = neighborhood.neighbor(index, &position, k);
                assert_eq!(stepped, neighbor.is_some());
                if let Some(n) = neighbor {
                    let mut expected = [0; 3];
                    neighborhood.index_to_position(n, &mut expected);
                    assert_eq!(expected, result);
                }
            }
        }
    }
}
