/// Pipeline layer: ingest, smoothing, unit conversion, normalization and
/// thickness calibration.
///
/// Architecture:
/// ```text
///  Si image        total-ion image
///     │                  │
///     ▼                  ▼
///   ┌────────┐      ┌────────┐
///   │ ingest │      │ ingest │   decode → 8-bit luma IntensityImage
///   └────────┘      └────────┘
///     │                  │
///     ▼                  │
///   [smooth]             │       box-kernel "same" convolution
///     │                  │
///     ▼                  ▼
///   ┌──────────────────────┐
///   │       convert        │     pixels → mm axes, intensity → counts
///   └──────────────────────┘
///     │
///     ▼
///   [normalize]                  Si counts / total counts
///     │
///     ▼
///   [calibrate] ◄── library      ln(signal / a) / b  →  nm
///     │
///     ▼
///   PlotOutput
/// ```
///
/// Every stage is a pure function over `ndarray` arrays. [`session::Session`]
/// holds the results between user actions and enforces the order.

pub mod calibrate;
pub mod convert;
pub mod error;
pub mod ingest;
pub mod library;
pub mod normalize;
pub mod session;
pub mod smooth;

pub use error::PipelineError;
