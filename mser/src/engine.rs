use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use slog::{info, Logger};

use crate::boundary::{BoundaryStacks, GRAY_LEVELS};
use crate::component::{perimeter, ConnectedComponent, PixelList};
use crate::error::MserError;
use crate::grow_history::HistoryArena;
use crate::mser_detector::MserParameter;
use crate::neighborhood::Neighborhood;
use crate::region::{Polarity, Region, RegionTree};
use crate::source::{HeatMapSink, IntensitySource};
use crate::utils::set_log_config;
use crate::IS_DEBUG;

/// Buffers of one flooding pass, reset by [`Mser::setup_buffers`].
#[derive(Debug)]
struct Scratch {
    values: Vec<u8>,
    visited: Vec<bool>,
    next_neighbors: Vec<usize>,
    pixels: PixelList,
    stacks: BoundaryStacks,
    components: Vec<ConnectedComponent>,
    histories: HistoryArena,
}

/// Detector for maximally stable extremal regions in N-dimensional 8-bit
/// images of fixed dimensions.
pub struct Mser {
    neighborhood: Neighborhood,
    param: MserParameter,
    scratch: Scratch,
    next_region_id: usize,
    log: Logger,
}

/// Everything a pass writes to besides the component stack.
struct Pass<'a, 'b> {
    neighborhood: &'a Neighborhood,
    param: &'a MserParameter,
    polarity: Polarity,
    histories: &'a mut HistoryArena,
    pixels: &'a mut PixelList,
    tree: &'a mut RegionTree,
    heat_map: &'a mut Option<&'b mut dyn HeatMapSink>,
}

impl<'a, 'b> Pass<'a, 'b> {
    /// Tests `component` for stability, then records its history and moves
    /// it up to `level`.
    fn advance(&mut self, component: &mut ConnectedComponent, level: usize) {
        if component.is_stable(self.histories, self.param) {
            self.add_region(component);
        }
        component.add_history(self.histories);
        component.value = level;
    }

    fn add_region(&mut self, component: &mut ConnectedComponent) {
        let history = match component.history {
            Some(history) => history,
            None => return,
        };

        if let Some(sink) = self.heat_map.as_mut() {
            for index in component.stable_pixels(self.histories, self.pixels) {
                sink.accumulate(index, 1.0);
            }
        }

        if !self.param.build_region_tree {
            return;
        }

        let perimeter = if self.param.compute_perimeter {
            perimeter(
                component.stable_pixels(self.histories, self.pixels),
                self.neighborhood,
            )
        } else {
            0
        };
        let id = self.tree.next_id();
        let children = component.adopt_child_regions(id, self.histories, self.pixels);
        self.tree.insert(Region {
            id,
            size: self.histories.get(history).size,
            perimeter,
            center: self.histories.center(history).to_vec(),
            polarity: self.polarity,
            parent: None,
            children,
        });
    }
}

impl Mser {
    pub fn new(dimensions: &[usize], param: MserParameter) -> Self {
        let neighborhood = Neighborhood::new(dimensions);
        let num_dimensions = neighborhood.num_dimensions();
        Mser {
            neighborhood,
            param: param.clamped(),
            scratch: Scratch {
                values: Vec::new(),
                visited: Vec::new(),
                next_neighbors: Vec::new(),
                pixels: PixelList::default(),
                stacks: BoundaryStacks::new(GRAY_LEVELS),
                components: Vec::new(),
                histories: HistoryArena::new(num_dimensions),
            },
            next_region_id: 0,
            log: set_log_config(),
        }
    }

    pub fn with_logger(mut self, log: Logger) -> Self {
        self.log = log;
        self
    }

    pub fn dimensions(&self) -> &[usize] {
        self.neighborhood.dimensions()
    }

    pub fn parameters(&self) -> &MserParameter {
        &self.param
    }

    pub fn set_parameters(&mut self, param: MserParameter) {
        self.param = param.clamped();
    }

    /// Runs the requested passes over `source`.
    ///
    /// Regions of both passes go into one tree. Ids continue from the
    /// previous call on the same engine. Every pixel of every stable region
    /// adds one to `heat_map`.
    pub fn process<S>(
        &mut self,
        source: &S,
        heat_map: Option<&mut dyn HeatMapSink>,
    ) -> Result<RegionTree, MserError>
    where
        S: IntensitySource + ?Sized,
    {
        self.process_inner(source, heat_map, None)
    }

    /// Like [`Mser::process`], giving up with [`MserError::Aborted`] once
    /// `abort` is set. Partial results are discarded.
    pub fn process_with_abort<S>(
        &mut self,
        source: &S,
        heat_map: Option<&mut dyn HeatMapSink>,
        abort: &AtomicBool,
    ) -> Result<RegionTree, MserError>
    where
        S: IntensitySource + ?Sized,
    {
        self.process_inner(source, heat_map, Some(abort))
    }

    fn process_inner<S>(
        &mut self,
        source: &S,
        mut heat_map: Option<&mut dyn HeatMapSink>,
        abort: Option<&AtomicBool>,
    ) -> Result<RegionTree, MserError>
    where
        S: IntensitySource + ?Sized,
    {
        let dimensions = source.dimensions();
        if dimensions != self.neighborhood.dimensions() {
            return Err(MserError::DimensionMismatch {
                expected: self.neighborhood.dimensions().to_vec(),
                actual: dimensions,
            });
        }

        let mut tree = RegionTree::new(self.next_region_id);
        let size = self.neighborhood.size();
        if self.neighborhood.is_empty() || size == 0 {
            return Ok(tree);
        }

        self.scratch.values.clear();
        self.scratch
            .values
            .extend((0..size).map(|index| source.intensity(index)));

        let passes = [
            (self.param.dark_to_bright, Polarity::DarkToBright),
            (self.param.bright_to_dark, Polarity::BrightToDark),
        ];
        for polarity in passes.iter().filter(|(on, _)| *on).map(|(_, p)| *p) {
            self.setup_buffers();
            self.run_pass(polarity, &mut tree, &mut heat_map, abort)?;
        }

        self.next_region_id = tree.next_id();
        Ok(tree)
    }

    fn setup_buffers(&mut self) {
        let size = self.neighborhood.size();
        let scratch = &mut self.scratch;
        scratch.visited.clear();
        scratch.visited.resize(size, false);
        scratch.next_neighbors.clear();
        scratch.next_neighbors.resize(size, 0);
        scratch.pixels.resize(size);
        scratch.stacks.clear();
        scratch.components.clear();
        scratch.histories.clear();
    }

    fn run_pass(
        &mut self,
        polarity: Polarity,
        tree: &mut RegionTree,
        heat_map: &mut Option<&mut dyn HeatMapSink>,
        abort: Option<&AtomicBool>,
    ) -> Result<(), MserError> {
        info!(self.log, "Processing from {}", polarity);
        let tick = Instant::now();
        let regions_before = tree.len();

        let Mser {
            neighborhood,
            param,
            scratch,
            ..
        } = self;
        let Scratch {
            values,
            visited,
            next_neighbors,
            pixels,
            stacks,
            components,
            histories,
        } = scratch;
        let mut pass = Pass {
            neighborhood,
            param,
            polarity,
            histories,
            pixels,
            tree: &mut *tree,
            heat_map: &mut *heat_map,
        };

        let num_dimensions = neighborhood.num_dimensions();
        let num_neighbors = neighborhood.len();
        let level = |index: usize| polarity.level(values[index]);

        // bottom of the stack, never merged
        components.push(ConnectedComponent::new(GRAY_LEVELS, num_dimensions));

        let mut cur_index = 0;
        let mut cur_level = level(cur_index);
        let mut cur_position = vec![0; num_dimensions];
        let mut neighbor_position = vec![0; num_dimensions];
        components.push(ConnectedComponent::new(cur_level, num_dimensions));
        visited[cur_index] = true;

        loop {
            if abort.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                return Err(MserError::Aborted);
            }

            while next_neighbors[cur_index] < num_neighbors {
                let k = next_neighbors[cur_index];
                if !neighborhood.step(&cur_position, k, &mut neighbor_position) {
                    next_neighbors[cur_index] += 1;
                    continue;
                }

                let neighbor_index = neighborhood.neighbor_index(cur_index, k);
                if !visited[neighbor_index] {
                    visited[neighbor_index] = true;
                    let neighbor_level = level(neighbor_index);

                    if neighbor_level < cur_level {
                        // descend: come back to the current pixel later
                        stacks.push(cur_level, cur_index);
                        next_neighbors[cur_index] += 1;

                        cur_index = neighbor_index;
                        cur_level = neighbor_level;
                        cur_position.copy_from_slice(&neighbor_position);
                        components.push(ConnectedComponent::new(cur_level, num_dimensions));
                        continue;
                    }
                    stacks.push(neighbor_level, neighbor_index);
                }
                next_neighbors[cur_index] += 1;
            }

            let top = components.len() - 1;
            components[top].add_position(cur_index, &cur_position, pass.pixels);

            if let Some(index) = stacks.pop(cur_level) {
                cur_index = index;
                neighborhood.index_to_position(cur_index, &mut cur_position);
                continue;
            }

            let next = stacks
                .next_nonempty(cur_level + 1)
                .and_then(|next_level| Some((next_level, stacks.pop(next_level)?)));
            let (next_level, index) = match next {
                Some(next) => next,
                None => break,
            };
            cur_index = index;
            cur_level = next_level;
            neighborhood.index_to_position(cur_index, &mut cur_position);

            if next_level < components[top - 1].value {
                pass.advance(&mut components[top], next_level);
                continue;
            }

            // merge the top two components until the top reaches next_level
            while let Some(merged) = components.pop() {
                let top = components.len() - 1;
                components[top].merge(merged, pass.histories, pass.pixels);

                if components[top].value >= next_level {
                    break;
                }
                if components[top - 1].value > next_level {
                    pass.advance(&mut components[top], next_level);
                    break;
                }
            }
        }

        if IS_DEBUG {
            info!(
                self.log,
                "{} pass found {} regions, {} history nodes, took {:.3}s",
                polarity,
                tree.len() - regions_before,
                self.scratch.histories.len(),
                tick.elapsed().as_millis() as f64 / 1000.0
            );
        }
        Ok(())
    }
}
