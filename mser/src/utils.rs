use ndarray::{ArrayBase, Data, Dimension};
use ndarray_stats::QuantileExt;
use slog::o;
use slog::Drain;
use slog::FnValue;
use slog::Logger;

use crate::error::MserError;
use crate::source::GrayVolume;

pub fn clamp(input: f64, min: f64, max: f64) -> f64 {
    debug_assert!(min <= max, "min must be less than or equal to max");
    if input < min {
        min
    } else if input > max {
        max
    } else {
        input
    }
}

/// Stretches floating point intensities linearly onto `0..=255`.
///
/// A constant array maps to zeros. Empty arrays and arrays holding NaN are
/// rejected.
pub fn rescale_to_gray<S, D>(array: &ArrayBase<S, D>) -> Result<GrayVolume, MserError>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let min = *array.min()?;
    let max = *array.max()?;
    let range = max - min;
    let gray = array.mapv(|x| {
        if range > 0.0 {
            ((x - min) * 255.0 / range).round() as u8
        } else {
            0
        }
    });
    Ok(GrayVolume::from_array(&gray))
}

/// Loads an image file as 8-bit gray levels.
pub fn read_gray_image(path: &str) -> Result<image::GrayImage, MserError> {
    Ok(image::open(path)?.into_luma8())
}

pub(crate) fn set_log_config() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(
        drain,
        o!("place" =>
         FnValue(move |info| {
             format!("{}:{} {}",
                     info.file(),
                     info.line(),
                     info.module(),
                     )
         })
        ),
    )
}

#[cfg(test)]
mod tests {

    use super::{clamp, rescale_to_gray};
    use crate::error::MserError;
    use crate::source::IntensitySource;
    use crate::utils::set_log_config;
    use ndarray::{arr2, Array2};
    use slog::info;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
        assert_eq!(clamp(7.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_rescale_to_gray() {
        let log = set_log_config();
        let data = arr2(&[[-1.0_f32, 0.0, 1.0], [0.5, 1.0, -1.0]]);
        let volume = rescale_to_gray(&data).unwrap();
        info!(log, "rescaled {:?}", volume.as_slice());

        assert_eq!(volume.dimensions(), vec![3, 2]);
        assert_eq!(volume.as_slice(), &[0, 128, 255, 191, 255, 0]);
    }

    #[test]
    fn test_rescale_constant_and_empty() {
        let flat = Array2::<f32>::from_elem((4, 4), 3.5);
        assert!(rescale_to_gray(&flat)
            .unwrap()
            .as_slice()
            .iter()
            .all(|&v| v == 0));

        let empty = Array2::<f32>::zeros((0, 3));
        assert!(matches!(
            rescale_to_gray(&empty),
            Err(MserError::Rescale(_))
        ));

        let nan = arr2(&[[0.0_f32, f32::NAN]]);
        assert!(matches!(rescale_to_gray(&nan), Err(MserError::Rescale(_))));
    }
}
