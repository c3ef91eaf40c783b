use std::path::Path;

use ndarray::Array2;

use super::calibrate::{calibrate, CalibrationCoefficients, CoefficientInput};
use super::convert::{convert, Conversion, ConversionInput, MeshGrid, ZeroSentinels};
use super::error::{MissingStep, PipelineError, PipelineResult};
use super::ingest::{load_image, LoadedImage};
use super::library::{CoefficientLibrary, LibraryNode};
use super::normalize::normalize;
use super::smooth::{smooth, KernelLimits, SmoothedImage};
use crate::config::PipelineConfig;

// ---------------------------------------------------------------------------
// Plot output
// ---------------------------------------------------------------------------

/// Which branch of the pipeline produced a [`PlotOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    /// Si image right after loading, pixel axes.
    PixelIntensity,
    /// Si image after the box filter, pixel axes.
    SmoothedIntensity,
    /// Si counts per pixel after conversion.
    ConvertedIntensity,
    /// Si counts, no normalization, no calibration.
    Intensity,
    NormalizedIntensity,
    Thickness,
    NormalizedThickness,
}

impl PlotKind {
    pub fn title(self) -> &'static str {
        match self {
            PlotKind::PixelIntensity => "Si image intensity",
            PlotKind::SmoothedIntensity => "Si image smoothed intensity",
            PlotKind::ConvertedIntensity | PlotKind::Intensity => "Si intensity",
            PlotKind::NormalizedIntensity => "Si intensity (normalized)",
            PlotKind::Thickness => "Thickness",
            PlotKind::NormalizedThickness => "Thickness (normalized)",
        }
    }

    /// Unit of both horizontal axes.
    pub fn axis_unit(self) -> &'static str {
        match self {
            PlotKind::PixelIntensity | PlotKind::SmoothedIntensity => "pixels",
            _ => "mm",
        }
    }

    pub fn value_label(self) -> &'static str {
        match self {
            PlotKind::PixelIntensity | PlotKind::SmoothedIntensity => "pixel intensity",
            PlotKind::ConvertedIntensity
            | PlotKind::Intensity
            | PlotKind::NormalizedIntensity => "counts",
            PlotKind::Thickness | PlotKind::NormalizedThickness => "nm",
        }
    }

    /// Previews come from load/smooth/convert; the rest from Plot.
    pub fn is_preview(self) -> bool {
        matches!(
            self,
            PlotKind::PixelIntensity | PlotKind::SmoothedIntensity | PlotKind::ConvertedIntensity
        )
    }
}

/// A value array on its coordinate grid, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOutput {
    pub kind: PlotKind,
    pub mesh: MeshGrid,
    pub values: Array2<f64>,
}

impl PlotOutput {
    fn pixels(kind: PlotKind, values: Array2<f64>) -> Self {
        Self {
            kind,
            mesh: MeshGrid::pixels(values.dim()),
            values,
        }
    }

    /// Finite (min, max) of the values, `None` if there are none.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

// ---------------------------------------------------------------------------
// Options and coefficient state
// ---------------------------------------------------------------------------

/// Branch flags for one Plot invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotOptions {
    pub normalize: bool,
    pub calibrate: bool,
    /// Manually entered coefficients; `Some` when the override flag is set.
    pub manual_coefficients: Option<CoefficientInput>,
}

/// Where the active coefficients came from.
#[derive(Debug, Clone, PartialEq)]
pub enum CoefficientSource {
    Library { category: String, molecule: String },
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCoefficients {
    pub source: CoefficientSource,
    pub values: CalibrationCoefficients,
}

// ---------------------------------------------------------------------------
// Session – all pipeline state of one window
// ---------------------------------------------------------------------------

/// Results of the steps performed so far.
///
/// Each operation checks its preconditions, computes into locals and only
/// then commits, so a failed operation leaves every field as it was.
#[derive(Debug, Clone, Default)]
pub struct Session {
    sentinels: ZeroSentinels,
    kernel_limits: KernelLimits,

    si: Option<LoadedImage>,
    total: Option<LoadedImage>,
    smoothed: Option<SmoothedImage>,
    conversion: Option<Conversion>,
    coefficients: Option<SelectedCoefficients>,
    thickness: Option<Array2<f64>>,
}

impl Session {
    pub fn new(sentinels: ZeroSentinels, kernel_limits: KernelLimits) -> Self {
        Self {
            sentinels,
            kernel_limits,
            ..Default::default()
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            ZeroSentinels {
                primary: config.primary_zero_sentinel,
                reference: config.reference_zero_sentinel,
            },
            KernelLimits {
                min: config.kernel_min,
                max: config.kernel_max,
            },
        )
    }

    // -- accessors --

    pub fn si_image(&self) -> Option<&LoadedImage> {
        self.si.as_ref()
    }

    pub fn total_image(&self) -> Option<&LoadedImage> {
        self.total.as_ref()
    }

    pub fn smoothed(&self) -> Option<&SmoothedImage> {
        self.smoothed.as_ref()
    }

    pub fn conversion(&self) -> Option<&Conversion> {
        self.conversion.as_ref()
    }

    pub fn coefficients(&self) -> Option<&SelectedCoefficients> {
        self.coefficients.as_ref()
    }

    /// Thickness map of the last calibrated plot.
    pub fn thickness(&self) -> Option<&Array2<f64>> {
        self.thickness.as_ref()
    }

    pub fn kernel_limits(&self) -> KernelLimits {
        self.kernel_limits
    }

    // -- ingest --

    /// Install a new Si image. Results derived from the previous one are
    /// dropped.
    pub fn set_si_image(&mut self, image: LoadedImage) -> PlotOutput {
        let preview = PlotOutput::pixels(PlotKind::PixelIntensity, image.intensity.to_f64());
        self.si = Some(image);
        self.smoothed = None;
        self.conversion = None;
        preview
    }

    /// Install a new total-ion image. An existing conversion is dropped.
    pub fn set_total_image(&mut self, image: LoadedImage) {
        self.total = Some(image);
        self.conversion = None;
    }

    pub fn load_si(&mut self, path: &Path) -> PipelineResult<PlotOutput> {
        let image = load_image(path)?;
        Ok(self.set_si_image(image))
    }

    pub fn load_total(&mut self, path: &Path) -> PipelineResult<()> {
        let image = load_image(path)?;
        self.set_total_image(image);
        Ok(())
    }

    // -- smoothing --

    /// Smooth the Si image. `enabled` is the user's smoothing switch.
    pub fn smooth(&mut self, enabled: bool, kernel_size: usize) -> PipelineResult<PlotOutput> {
        if !enabled {
            return Err(PipelineError::SmoothingNotEnabled);
        }
        let si = self
            .si
            .as_ref()
            .ok_or(PipelineError::MissingInput(MissingStep::SiImage))?;

        let smoothed = smooth(&si.intensity, kernel_size, self.kernel_limits)?;
        let preview = PlotOutput::pixels(PlotKind::SmoothedIntensity, smoothed.clone());
        self.smoothed = Some(smoothed);
        Ok(preview)
    }

    // -- conversion --

    /// Convert both images to counts on a millimetre grid.
    ///
    /// With `use_smoothed` the smoothed Si image is the primary signal.
    pub fn convert(
        &mut self,
        input: &ConversionInput,
        use_smoothed: bool,
    ) -> PipelineResult<PlotOutput> {
        let si = self
            .si
            .as_ref()
            .ok_or(PipelineError::MissingInput(MissingStep::SiImage))?;
        let total = self
            .total
            .as_ref()
            .ok_or(PipelineError::MissingInput(MissingStep::TotalImage))?;

        let primary = if use_smoothed {
            self.smoothed
                .clone()
                .ok_or(PipelineError::MissingInput(MissingStep::SmoothedImage))?
        } else {
            si.intensity.to_f64()
        };

        let factors = input.parse()?;
        let conversion = convert(&primary, &total.intensity.to_f64(), factors, self.sentinels)?;
        log::info!(
            "Converted {}x{} images: {} mm x {} mm, factors {}/{}, raster {}",
            si.intensity.width(),
            si.intensity.height(),
            factors.x_size_mm,
            factors.y_size_mm,
            factors.counts_per_pixel_si,
            factors.counts_per_pixel_total,
            factors.pixels_per_raster
        );

        let preview = PlotOutput {
            kind: PlotKind::ConvertedIntensity,
            mesh: conversion.mesh.clone(),
            values: conversion.primary_per_pixel(),
        };
        self.conversion = Some(conversion);
        Ok(preview)
    }

    // -- coefficients --

    /// Apply a library row. Category rows leave the state unchanged.
    pub fn select_library(
        &mut self,
        library: &CoefficientLibrary,
        node: &LibraryNode,
    ) -> Option<CalibrationCoefficients> {
        let values = library.select(node)?;
        if let LibraryNode::Molecule { category, name } = node {
            self.coefficients = Some(SelectedCoefficients {
                source: CoefficientSource::Library {
                    category: category.clone(),
                    molecule: name.clone(),
                },
                values,
            });
        }
        Some(values)
    }

    /// Replace the active coefficients with manually entered ones.
    pub fn set_manual_coefficients(
        &mut self,
        input: &CoefficientInput,
    ) -> PipelineResult<CalibrationCoefficients> {
        let values = input.parse()?;
        self.coefficients = Some(SelectedCoefficients {
            source: CoefficientSource::Manual,
            values,
        });
        Ok(values)
    }

    // -- plot --

    /// Run the normalization / calibration branch selected by `options`.
    pub fn plot(&mut self, options: &PlotOptions) -> PipelineResult<PlotOutput> {
        if self.si.is_none() {
            return Err(PipelineError::MissingInput(MissingStep::SiImage));
        }
        let conversion = self
            .conversion
            .as_ref()
            .ok_or(PipelineError::MissingInput(MissingStep::Conversion))?;

        let signal = if options.normalize {
            normalize(&conversion.primary, &conversion.reference)
        } else {
            conversion.primary.clone()
        };

        if !options.calibrate {
            let kind = if options.normalize {
                PlotKind::NormalizedIntensity
            } else {
                PlotKind::Intensity
            };
            return Ok(PlotOutput {
                kind,
                mesh: conversion.mesh.clone(),
                values: signal,
            });
        }

        let selected = match &options.manual_coefficients {
            Some(input) => SelectedCoefficients {
                source: CoefficientSource::Manual,
                values: input.parse()?,
            },
            None => self
                .coefficients
                .clone()
                .ok_or(PipelineError::MissingInput(MissingStep::Coefficients))?,
        };

        let (a, b) = selected.values.pair(options.normalize);
        let thickness = calibrate(&signal, a, b)?;
        let kind = if options.normalize {
            PlotKind::NormalizedThickness
        } else {
            PlotKind::Thickness
        };
        let output = PlotOutput {
            kind,
            mesh: conversion.mesh.clone(),
            values: thickness.clone(),
        };
        log::info!("{} computed with a = {a}, b = {b}", kind.title());

        self.coefficients = Some(selected);
        self.thickness = Some(thickness);
        Ok(output)
    }
}
