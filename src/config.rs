use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "TBB_CONFIG";

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Instrument-dependent constants of the pipeline.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides:
///
/// ```json
/// { "reference_zero_sentinel": 500.0, "library_path": "molecules.json" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Replaces zero counts in the Si signal (keeps the logarithm finite).
    pub primary_zero_sentinel: f64,
    /// Replaces zero counts in the total-ion signal (keeps the quotient finite).
    pub reference_zero_sentinel: f64,
    /// Pixel/raster factor pre-filled in the conversion form.
    pub default_raster_factor: f64,
    pub kernel_min: usize,
    pub kernel_max: usize,
    pub default_kernel: usize,
    /// Edge length of the square thumbnails, in pixels.
    pub thumbnail_size: u32,
    /// JSON molecule catalog replacing the built-in library.
    pub library_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary_zero_sentinel: 1.0,
            reference_zero_sentinel: 1000.0,
            default_raster_factor: 16834.0,
            kernel_min: 3,
            kernel_max: 100,
            default_kernel: 3,
            thumbnail_size: 250,
            library_path: None,
        }
    }
}

impl PipelineConfig {
    /// Read a config file. Missing keys fall back to the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: PipelineConfig =
            serde_json::from_str(&text).context("parsing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$TBB_CONFIG` if set, otherwise use the defaults.
    ///
    /// A broken config file is reported and ignored so the app still starts.
    pub fn load() -> Self {
        Self::load_from(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    fn load_from(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Ignoring config {}: {e:#}", path.display());
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.kernel_min >= 1 && self.kernel_min <= self.kernel_max,
            "kernel range {}..={} is empty",
            self.kernel_min,
            self.kernel_max
        );
        anyhow::ensure!(
            (self.kernel_min..=self.kernel_max).contains(&self.default_kernel),
            "default_kernel {} is outside {}..={}",
            self.default_kernel,
            self.kernel_min,
            self.kernel_max
        );
        anyhow::ensure!(
            self.primary_zero_sentinel.is_finite() && self.primary_zero_sentinel > 0.0,
            "primary_zero_sentinel must be positive"
        );
        anyhow::ensure!(
            self.reference_zero_sentinel.is_finite() && self.reference_zero_sentinel != 0.0,
            "reference_zero_sentinel must be non-zero"
        );
        anyhow::ensure!(
            self.default_raster_factor.is_finite() && self.default_raster_factor > 0.0,
            "default_raster_factor must be positive"
        );
        anyhow::ensure!(self.thumbnail_size > 0, "thumbnail_size must be positive");
        Ok(())
    }
}
