use ndarray_stats::errors::MinMaxError;

#[derive(Debug, thiserror::Error)]
pub enum MserError {
    /// The source does not match the dimensions the engine was set up for.
    #[error("image has dimensions {actual:?}, engine was set up for {expected:?}")]
    DimensionMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A pixel buffer does not hold one value per pixel.
    #[error("buffer of {actual} values does not fit dimensions {dimensions:?} ({expected} pixels)")]
    BufferSize {
        dimensions: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// Processing was stopped through the abort flag.
    #[error("processing aborted")]
    Aborted,

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Intensities could not be mapped to gray levels.
    #[error("cannot rescale intensities: {0}")]
    Rescale(#[from] MinMaxError),
}
