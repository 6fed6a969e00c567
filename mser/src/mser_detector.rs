use std::fmt;

use crate::boundary::GRAY_LEVELS;
use crate::engine::Mser;
use crate::error::MserError;
use crate::region::RegionTree;
use crate::source::{HeatMap, IntensitySource};
use crate::utils::clamp;

/// MserParameter
#[derive(Clone, Debug, PartialEq)]
pub struct MserParameter {
    /// Number of gray levels to look back for the variation.
    pub delta: usize,
    pub min_area: usize,
    pub max_area: usize,
    pub max_variation: f64,
    pub min_diversity: f64,
    pub dark_to_bright: bool,
    pub bright_to_dark: bool,
    pub build_region_tree: bool,
    pub compute_perimeter: bool,
}

impl Default for MserParameter {
    fn default() -> Self {
        Self {
            delta: 10,
            min_area: 10,
            max_area: 100_000,
            max_variation: 10.0,
            min_diversity: 0.5,
            dark_to_bright: true,
            bright_to_dark: false,
            build_region_tree: true,
            compute_perimeter: false,
        }
    }
}

impl MserParameter {
    pub fn new(
        delta: usize,
        min_area: usize,
        max_area: usize,
        max_variation: f64,
        min_diversity: f64,
    ) -> MserParameter {
        MserParameter {
            delta,
            min_area,
            max_area,
            max_variation,
            min_diversity,
            ..Default::default()
        }
    }

    pub fn with_directions(mut self, dark_to_bright: bool, bright_to_dark: bool) -> Self {
        self.dark_to_bright = dark_to_bright;
        self.bright_to_dark = bright_to_dark;
        self
    }

    pub fn with_region_tree(mut self, build_region_tree: bool) -> Self {
        self.build_region_tree = build_region_tree;
        self
    }

    pub fn with_perimeter(mut self, compute_perimeter: bool) -> Self {
        self.compute_perimeter = compute_perimeter;
        self
    }

    /// Pulls values into the range the engine can use. Out-of-range values
    /// that can never produce a region (negative variation, diversity above
    /// one) stay unsatisfiable after clamping.
    pub fn clamped(&self) -> MserParameter {
        MserParameter {
            delta: self.delta.min(GRAY_LEVELS - 1),
            max_variation: clamp(self.max_variation, 0.0, f64::MAX),
            min_diversity: clamp(self.min_diversity, f64::MIN, 1.0),
            ..self.clone()
        }
    }
}

impl fmt::Display for MserParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.delta, self.min_area, self.max_area, self.max_variation, self.min_diversity
        )
    }
}

/// Detect maximally stable extremal regions in `source`.
pub fn detect_msers<S>(source: &S, param: &MserParameter) -> Result<RegionTree, MserError>
where
    S: IntensitySource + ?Sized,
{
    let mut mser = Mser::new(&source.dimensions(), param.clone());
    mser.process(source, None)
}

/// Like [`detect_msers`], also counting for each pixel how many stable
/// regions contain it.
pub fn detect_msers_with_heat_map<S>(
    source: &S,
    param: &MserParameter,
) -> Result<(RegionTree, HeatMap), MserError>
where
    S: IntensitySource + ?Sized,
{
    let dimensions = source.dimensions();
    let mut heat_map = HeatMap::new(&dimensions);
    let mut mser = Mser::new(&dimensions, param.clone());
    let tree = mser.process(source, Some(&mut heat_map))?;
    Ok((tree, heat_map))
}
