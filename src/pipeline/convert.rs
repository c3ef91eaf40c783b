use ndarray::{Array1, Array2};

use super::error::{PipelineError, PipelineResult};

// ---------------------------------------------------------------------------
// Raw form input
// ---------------------------------------------------------------------------

/// The five scalars of the conversion form, exactly as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionInput {
    pub x_size_mm: String,
    pub y_size_mm: String,
    pub counts_per_pixel_si: String,
    pub counts_per_pixel_total: String,
    pub pixels_per_raster: String,
}

/// Parsed conversion scalars. All values are finite, the lengths are not
/// negative and the raster factor is positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionFactors {
    pub x_size_mm: f64,
    pub y_size_mm: f64,
    pub counts_per_pixel_si: f64,
    pub counts_per_pixel_total: f64,
    pub pixels_per_raster: f64,
}

fn parse_finite(text: &str, field: &'static str) -> PipelineResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(PipelineError::NonNumericInput { field })
}

/// Field length in mm. Negative lengths would run the axis backwards.
fn parse_length(text: &str, field: &'static str) -> PipelineResult<f64> {
    let value = parse_finite(text, field)?;
    if value < 0.0 {
        return Err(PipelineError::InputOutOfRange {
            field,
            expected: "zero or positive",
        });
    }
    Ok(value)
}

/// The raster factor divides the counts again for the preview.
fn parse_raster(text: &str, field: &'static str) -> PipelineResult<f64> {
    let value = parse_finite(text, field)?;
    if value <= 0.0 {
        return Err(PipelineError::InputOutOfRange {
            field,
            expected: "positive",
        });
    }
    Ok(value)
}

impl ConversionInput {
    /// Parse every field; the first one that fails is reported.
    pub fn parse(&self) -> PipelineResult<ConversionFactors> {
        Ok(ConversionFactors {
            x_size_mm: parse_length(&self.x_size_mm, "X size")?,
            y_size_mm: parse_length(&self.y_size_mm, "Y size")?,
            counts_per_pixel_si: parse_finite(&self.counts_per_pixel_si, "Counts/pixel (Si)")?,
            counts_per_pixel_total: parse_finite(
                &self.counts_per_pixel_total,
                "Counts/pixel (total)",
            )?,
            pixels_per_raster: parse_raster(&self.pixels_per_raster, "Pixel/raster factor")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Axes
// ---------------------------------------------------------------------------

/// `n` evenly spaced samples over `[0, length]`, both ends included.
///
/// A single sample sits at 0.
pub fn physical_axis(length: f64, n: usize) -> Array1<f64> {
    match n {
        0 => Array1::zeros(0),
        1 => Array1::zeros(1),
        _ => Array1::linspace(0.0, length, n),
    }
}

/// Pixel-index axis `0, 1, .., n - 1`.
pub fn pixel_axis(n: usize) -> Array1<f64> {
    Array1::from_iter((0..n).map(|i| i as f64))
}

/// Coordinate grids of shape (H, W) built from an X axis of length W and a
/// Y axis of length H.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGrid {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
}

impl MeshGrid {
    pub fn new(x_axis: &Array1<f64>, y_axis: &Array1<f64>) -> Self {
        let shape = (y_axis.len(), x_axis.len());
        Self {
            x: Array2::from_shape_fn(shape, |(_, c)| x_axis[c]),
            y: Array2::from_shape_fn(shape, |(r, _)| y_axis[r]),
        }
    }

    /// Pixel-space grid for an (H, W) array.
    pub fn pixels(dim: (usize, usize)) -> Self {
        Self::new(&pixel_axis(dim.1), &pixel_axis(dim.0))
    }
}

// ---------------------------------------------------------------------------
// Signal conversion
// ---------------------------------------------------------------------------

/// Values substituted for zero counts before any division or logarithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroSentinels {
    pub primary: f64,
    pub reference: f64,
}

impl Default for ZeroSentinels {
    fn default() -> Self {
        Self {
            primary: 1.0,
            reference: 1000.0,
        }
    }
}

/// Result of a successful conversion. All arrays share one (H, W) shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub factors: ConversionFactors,
    pub mesh: MeshGrid,
    /// Si signal in counts, zeros already replaced.
    pub primary: Array2<f64>,
    /// Total-ion signal in counts, zeros already replaced.
    pub reference: Array2<f64>,
}

impl Conversion {
    /// Si counts per pixel, i.e. without the raster factor.
    pub fn primary_per_pixel(&self) -> Array2<f64> {
        let raster = self.factors.pixels_per_raster;
        self.primary.mapv(|v| v / raster)
    }
}

/// `intensity * counts_per_pixel * raster`, with exact zeros replaced by
/// `sentinel`.
pub fn to_counts(
    intensity: &Array2<f64>,
    counts_per_pixel: f64,
    raster: f64,
    sentinel: f64,
) -> Array2<f64> {
    intensity.mapv(|v| {
        let counts = v * counts_per_pixel * raster;
        if counts == 0.0 {
            sentinel
        } else {
            counts
        }
    })
}

/// Convert the Si (possibly smoothed) and total-ion arrays to counts on a
/// millimetre grid.
pub fn convert(
    primary: &Array2<f64>,
    reference: &Array2<f64>,
    factors: ConversionFactors,
    sentinels: ZeroSentinels,
) -> PipelineResult<Conversion> {
    if primary.dim() != reference.dim() {
        let (si_height, si_width) = primary.dim();
        let (total_height, total_width) = reference.dim();
        return Err(PipelineError::ShapeMismatch {
            si_width,
            si_height,
            total_width,
            total_height,
        });
    }

    let (rows, cols) = primary.dim();
    let x_axis = physical_axis(factors.x_size_mm, cols);
    let y_axis = physical_axis(factors.y_size_mm, rows);
    let mesh = MeshGrid::new(&x_axis, &y_axis);

    let reference = to_counts(
        reference,
        factors.counts_per_pixel_total,
        factors.pixels_per_raster,
        sentinels.reference,
    );
    let primary = to_counts(
        primary,
        factors.counts_per_pixel_si,
        factors.pixels_per_raster,
        sentinels.primary,
    );

    Ok(Conversion {
        factors,
        mesh,
        primary,
        reference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn input(x: &str, y: &str, c1: &str, c2: &str, r: &str) -> ConversionInput {
        ConversionInput {
            x_size_mm: x.into(),
            y_size_mm: y.into(),
            counts_per_pixel_si: c1.into(),
            counts_per_pixel_total: c2.into(),
            pixels_per_raster: r.into(),
        }
    }

    fn unit_factors() -> ConversionFactors {
        input("1", "1", "1", "1", "1").parse().unwrap()
    }

    #[test]
    fn parses_trimmed_numbers() {
        let f = input(" 2.5", "3 ", "0.13", "31.4", "16834").parse().unwrap();
        assert_eq!(f.x_size_mm, 2.5);
        assert_eq!(f.y_size_mm, 3.0);
        assert_eq!(f.pixels_per_raster, 16834.0);
    }

    #[test]
    fn reports_first_non_numeric_field() {
        let err = input("1", "abc", "x", "1", "1").parse().unwrap_err();
        assert_eq!(err, PipelineError::NonNumericInput { field: "Y size" });

        let err = input("1", "1", "1", "1", "").parse().unwrap_err();
        assert_eq!(
            err,
            PipelineError::NonNumericInput {
                field: "Pixel/raster factor"
            }
        );
    }

    #[test]
    fn rejects_non_finite() {
        for bad in ["inf", "-inf", "NaN"] {
            assert!(input(bad, "1", "1", "1", "1").parse().is_err());
        }
    }

    #[test]
    fn negative_lengths_are_rejected() {
        let err = input("-2", "1", "1", "1", "1").parse().unwrap_err();
        assert_eq!(
            err,
            PipelineError::InputOutOfRange {
                field: "X size",
                expected: "zero or positive"
            }
        );
        let err = input("1", "-0.5", "1", "1", "1").parse().unwrap_err();
        assert!(matches!(err, PipelineError::InputOutOfRange { field: "Y size", .. }));

        // A zero-length field is allowed and collapses the axis onto 0.
        let f = input("0", "0", "1", "1", "1").parse().unwrap();
        assert_eq!((f.x_size_mm, f.y_size_mm), (0.0, 0.0));
    }

    #[test]
    fn axes_from_parsed_lengths_never_decrease() {
        let factors = input("2", "3", "1", "1", "1").parse().unwrap();
        let conv = convert(
            &Array2::zeros((4, 3)),
            &Array2::zeros((4, 3)),
            factors,
            ZeroSentinels::default(),
        )
        .unwrap();
        for row in conv.mesh.x.rows() {
            assert!(row.windows(2).into_iter().all(|w| w[0] <= w[1]));
        }
        for col in conv.mesh.y.columns() {
            assert!(col.windows(2).into_iter().all(|w| w[0] <= w[1]));
        }
        assert_eq!(conv.mesh.x[[0, 2]], 2.0);
        assert_eq!(conv.mesh.y[[3, 0]], 3.0);
    }

    #[test]
    fn raster_factor_must_be_positive() {
        for bad in ["0", "-16834"] {
            let err = input("1", "1", "1", "1", bad).parse().unwrap_err();
            assert_eq!(
                err,
                PipelineError::InputOutOfRange {
                    field: "Pixel/raster factor",
                    expected: "positive"
                }
            );
        }
    }

    #[test]
    fn axis_spans_zero_to_length() {
        let axis = physical_axis(1.0, 4);
        assert_eq!(axis.len(), 4);
        assert_relative_eq!(axis[0], 0.0);
        assert_relative_eq!(axis[1], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(axis[3], 1.0);
        assert!(axis.windows(2).into_iter().all(|w| w[0] <= w[1]));

        assert_eq!(physical_axis(5.0, 1), array![0.0]);
    }

    #[test]
    fn mesh_has_row_col_layout() {
        let mesh = MeshGrid::new(&array![0.0, 1.0, 2.0], &array![10.0, 20.0]);
        assert_eq!(mesh.x.dim(), (2, 3));
        assert_eq!(mesh.x, array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0]]);
        assert_eq!(mesh.y, array![[10.0, 10.0, 10.0], [20.0, 20.0, 20.0]]);
    }

    #[test]
    fn zeros_are_replaced_by_sentinels() {
        let primary = array![[0.0, 3.0], [5.0, 0.0]];
        let reference = array![[0.0, 0.0], [7.0, 1.0]];
        let conv = convert(&primary, &reference, unit_factors(), ZeroSentinels::default()).unwrap();

        assert_eq!(conv.primary, array![[1.0, 3.0], [5.0, 1.0]]);
        assert_eq!(conv.reference, array![[1000.0, 1000.0], [7.0, 1.0]]);
    }

    #[test]
    fn zero_factor_turns_everything_into_sentinels() {
        let primary = array![[10.0, 20.0]];
        let mut factors = unit_factors();
        factors.counts_per_pixel_si = 0.0;
        let conv = convert(&primary, &primary, factors, ZeroSentinels::default()).unwrap();
        assert_eq!(conv.primary, array![[1.0, 1.0]]);
    }

    #[test]
    fn custom_sentinels_are_used() {
        let zeros = Array2::<f64>::zeros((2, 2));
        let sentinels = ZeroSentinels {
            primary: 2.0,
            reference: 50.0,
        };
        let conv = convert(&zeros, &zeros, unit_factors(), sentinels).unwrap();
        assert!(conv.primary.iter().all(|&v| v == 2.0));
        assert!(conv.reference.iter().all(|&v| v == 50.0));
    }

    #[test]
    fn full_scale_with_unit_factors_is_exact() {
        let full = Array2::from_elem((3, 3), 255.0);
        let conv = convert(&full, &full, unit_factors(), ZeroSentinels::default()).unwrap();
        assert!(conv.primary.iter().all(|&v| v == 255.0));
        assert!(conv.reference.iter().all(|&v| v == 255.0));
    }

    #[test]
    fn factors_multiply_and_per_pixel_view_removes_raster() {
        let primary = array![[2.0]];
        let reference = array![[3.0]];
        let factors = input("1", "1", "0.5", "4", "100").parse().unwrap();
        let conv = convert(&primary, &reference, factors, ZeroSentinels::default()).unwrap();

        assert_relative_eq!(conv.primary[[0, 0]], 100.0);
        assert_relative_eq!(conv.reference[[0, 0]], 1200.0);
        assert_relative_eq!(conv.primary_per_pixel()[[0, 0]], 1.0);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let primary = Array2::<f64>::zeros((2, 3));
        let reference = Array2::<f64>::zeros((3, 3));
        let err = convert(&primary, &reference, unit_factors(), ZeroSentinels::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { si_width: 3, si_height: 2, .. }));
    }
}
