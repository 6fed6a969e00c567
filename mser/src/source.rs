use image::GrayImage;
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};

use crate::error::MserError;

/// Scalar N-dimensional image read by the engine.
///
/// Dimension 0 varies fastest in the linear index, i.e. a 2-D image has
/// dimensions `[width, height]` and pixel `(x, y)` sits at `x + y * width`.
pub trait IntensitySource {
    fn dimensions(&self) -> Vec<usize>;

    fn intensity(&self, index: usize) -> u8;
}

/// Receives one increment per pixel of every stable region.
pub trait HeatMapSink {
    fn accumulate(&mut self, index: usize, delta: f32);
}

impl IntensitySource for GrayImage {
    fn dimensions(&self) -> Vec<usize> {
        vec![self.width() as usize, self.height() as usize]
    }

    #[inline]
    fn intensity(&self, index: usize) -> u8 {
        self.as_raw()[index]
    }
}

impl HeatMapSink for [f32] {
    #[inline]
    fn accumulate(&mut self, index: usize, delta: f32) {
        self[index] += delta;
    }
}

impl HeatMapSink for Vec<f32> {
    #[inline]
    fn accumulate(&mut self, index: usize, delta: f32) {
        self.as_mut_slice().accumulate(index, delta);
    }
}

/// Owned 8-bit volume of any dimensionality.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayVolume {
    dimensions: Vec<usize>,
    data: Vec<u8>,
}

impl GrayVolume {
    pub fn new(dimensions: &[usize], data: Vec<u8>) -> Result<Self, MserError> {
        let expected = dimensions.iter().product();
        if data.len() != expected {
            return Err(MserError::BufferSize {
                dimensions: dimensions.to_vec(),
                expected,
                actual: data.len(),
            });
        }
        Ok(GrayVolume {
            dimensions: dimensions.to_vec(),
            data,
        })
    }

    /// Fills a volume by evaluating `f` at every position.
    pub fn from_fn<F>(dimensions: &[usize], mut f: F) -> Self
    where
        F: FnMut(&[usize]) -> u8,
    {
        let size = dimensions.iter().product();
        let mut position = vec![0; dimensions.len()];
        let data = (0..size)
            .map(|index| {
                let mut prod = 1;
                for (p, &d) in position.iter_mut().zip(dimensions) {
                    *p = (index / prod) % d;
                    prod *= d;
                }
                f(&position)
            })
            .collect();
        GrayVolume {
            dimensions: dimensions.to_vec(),
            data,
        }
    }

    /// Copies an array; its last axis becomes dimension 0.
    pub fn from_array<S, D>(array: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = u8>,
        D: Dimension,
    {
        GrayVolume {
            dimensions: array.shape().iter().rev().copied().collect(),
            data: array.iter().copied().collect(),
        }
    }

    /// Copy of the volume with axes in `ndarray` order.
    pub fn to_array(&self) -> Result<ArrayD<u8>, MserError> {
        let shape: Vec<usize> = self.dimensions.iter().rev().copied().collect();
        Ok(ArrayD::from_shape_vec(IxDyn(&shape), self.data.clone())?)
    }

    /// Intensities inverted, `255 - v`.
    pub fn complement(&self) -> Self {
        GrayVolume {
            dimensions: self.dimensions.clone(),
            data: self.data.iter().map(|v| 255 - v).collect(),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl IntensitySource for GrayVolume {
    fn dimensions(&self) -> Vec<usize> {
        self.dimensions.clone()
    }

    #[inline]
    fn intensity(&self, index: usize) -> u8 {
        self.data[index]
    }
}

/// Number of stable regions covering each pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatMap {
    dimensions: Vec<usize>,
    data: Vec<f32>,
}

impl HeatMap {
    pub fn new(dimensions: &[usize]) -> Self {
        HeatMap {
            dimensions: dimensions.to_vec(),
            data: vec![0.0; dimensions.iter().product()],
        }
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn get(&self, index: usize) -> f32 {
        self.data[index]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn to_array(&self) -> Result<ArrayD<f32>, MserError> {
        let shape: Vec<usize> = self.dimensions.iter().rev().copied().collect();
        Ok(ArrayD::from_shape_vec(IxDyn(&shape), self.data.clone())?)
    }

    /// Stretches a 2-D heat map to 0..=255; `None` for other dimensionalities.
    pub fn to_gray_image(&self) -> Option<GrayImage> {
        if self.dimensions.len() != 2 {
            return None;
        }
        let max = self.data.iter().copied().fold(0.0_f32, f32::max);
        let scale = if max > 0.0 { 255.0 / max } else { 0.0 };
        let data = self
            .data
            .iter()
            .map(|&x| (x * scale).round() as u8)
            .collect();
        GrayImage::from_vec(self.dimensions[0] as u32, self.dimensions[1] as u32, data)
    }
}

impl HeatMapSink for HeatMap {
    #[inline]
    fn accumulate(&mut self, index: usize, delta: f32) {
        self.data[index] += delta;
    }
}
