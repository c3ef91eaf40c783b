use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// A prior pipeline step that has not been completed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingStep {
    SiImage,
    TotalImage,
    SmoothedImage,
    Conversion,
    Coefficients,
}

impl std::fmt::Display for MissingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            MissingStep::SiImage => "Before, you need to load the Si image",
            MissingStep::TotalImage => "Before, you need to load the total image",
            MissingStep::SmoothedImage => {
                "Smoothing is enabled: smooth the Si image before converting"
            }
            MissingStep::Conversion => "Before, you need to convert pixels in mm and counts",
            MissingStep::Coefficients => {
                "Before, select a molecule in the library or enter new coefficients"
            }
        };
        f.write_str(msg)
    }
}

/// Failures of the exponential calibration law.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("Calibration coefficient '{name}' must not be zero")]
    ZeroCoefficient { name: &'static str },

    /// `signal / a` was not strictly positive for this many cells.
    #[error("Logarithm undefined for {cells} cell(s): signal / a must be positive")]
    LogDomain { cells: usize },
}

/// Every user-correctable failure of the pipeline.
///
/// None of these is fatal: the session keeps its previous state and the
/// message is shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Could not load image {path}: {reason}")]
    ImageLoad { path: String, reason: String },

    #[error("{0}")]
    MissingInput(MissingStep),

    #[error("Please check if your factors are numbers ('{field}' is not a finite number)")]
    NonNumericInput { field: &'static str },

    #[error("Please check your factors ('{field}' must be {expected})")]
    InputOutOfRange {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Allow the checkbox for smoothing before")]
    SmoothingNotEnabled,

    #[error("Kernel size {size} is outside the allowed range {min}..={max}")]
    KernelSizeOutOfRange { size: usize, min: usize, max: usize },

    #[error(
        "Si image is {si_width}x{si_height} but total image is {total_width}x{total_height}: \
         both images must have the same size"
    )]
    ShapeMismatch {
        si_width: usize,
        si_height: usize,
        total_width: usize,
        total_height: usize,
    },

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
