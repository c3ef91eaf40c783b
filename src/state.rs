use std::path::Path;

use eframe::egui::TextureHandle;

use crate::color::ColorMapKind;
use crate::config::PipelineConfig;
use crate::pipeline::calibrate::CoefficientInput;
use crate::pipeline::convert::ConversionInput;
use crate::pipeline::library::{CoefficientLibrary, LibraryNode};
use crate::pipeline::session::{PlotOptions, PlotOutput, Session};
use crate::pipeline::PipelineError;
use crate::ui::help::HelpTopic;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: PipelineConfig,

    /// Pipeline results (images, conversion, coefficients, thickness).
    pub session: Session,

    /// Molecule catalog shown in the coefficient table.
    pub library: CoefficientLibrary,

    /// Row last clicked in the coefficient table.
    pub selected_node: Option<LibraryNode>,

    // -- form fields --
    pub smoothing_enabled: bool,
    pub kernel_size: usize,
    pub conversion_input: ConversionInput,
    pub use_manual_coefficients: bool,
    pub manual_coefficients: CoefficientInput,
    /// Molecule name typed into the library search field.
    pub molecule_query: String,
    pub apply_calibration: bool,
    pub apply_normalization: bool,

    /// Colour map for the final plot.
    pub color_map: ColorMapKind,

    /// Last array handed to the renderer.
    pub plot: Option<PlotOutput>,

    /// GPU copies of `plot` and the thumbnails, rebuilt lazily when `None`.
    pub plot_texture: Option<TextureHandle>,
    pub si_thumbnail: Option<TextureHandle>,
    pub total_thumbnail: Option<TextureHandle>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Open help window, if any.
    pub help_topic: Option<HelpTopic>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        let library = match &config.library_path {
            Some(path) => match CoefficientLibrary::from_json_file(path) {
                Ok(lib) if lib.is_empty() => {
                    log::warn!(
                        "Molecule library {} has no molecules, using the built-in one",
                        path.display()
                    );
                    CoefficientLibrary::builtin()
                }
                Ok(lib) => {
                    log::info!("Loaded {} molecules from {}", lib.len(), path.display());
                    lib
                }
                Err(e) => {
                    log::error!("Failed to load molecule library: {e:#}");
                    CoefficientLibrary::builtin()
                }
            },
            None => CoefficientLibrary::builtin(),
        };

        Self {
            session: Session::from_config(&config),
            library,
            selected_node: None,
            smoothing_enabled: false,
            kernel_size: config.default_kernel,
            conversion_input: ConversionInput {
                x_size_mm: "1".into(),
                y_size_mm: "1".into(),
                counts_per_pixel_si: "1".into(),
                counts_per_pixel_total: "1".into(),
                pixels_per_raster: config.default_raster_factor.to_string(),
            },
            use_manual_coefficients: false,
            manual_coefficients: CoefficientInput::default(),
            molecule_query: String::new(),
            apply_calibration: false,
            apply_normalization: false,
            color_map: ColorMapKind::default(),
            plot: None,
            plot_texture: None,
            si_thumbnail: None,
            total_thumbnail: None,
            status_message: None,
            help_topic: None,
            config,
        }
    }

    /// Show a new array and drop the stale texture.
    fn show(&mut self, plot: PlotOutput) {
        log::debug!(
            "Showing '{}' {:?}, range {:?}",
            plot.kind.title(),
            plot.values.dim(),
            plot.value_range()
        );
        self.plot = Some(plot);
        self.plot_texture = None;
        self.status_message = None;
    }

    /// Report a failed operation. State stays as it was.
    fn report(&mut self, action: &str, err: PipelineError) {
        match &err {
            PipelineError::ImageLoad { .. } => log::error!("{action}: {err}"),
            _ => log::warn!("{action}: {err}"),
        }
        self.status_message = Some(err.to_string());
    }

    /// Colour map for the current plot: fixed for previews.
    pub fn plot_color_map(&self) -> ColorMapKind {
        match &self.plot {
            Some(plot) if plot.kind.is_preview() => ColorMapKind::Coolwarm,
            _ => self.color_map,
        }
    }

    pub fn load_si(&mut self, path: &Path) {
        match self.session.load_si(path) {
            Ok(preview) => {
                self.si_thumbnail = None;
                self.show(preview);
            }
            Err(e) => self.report("Loading Si image", e),
        }
    }

    pub fn load_total(&mut self, path: &Path) {
        match self.session.load_total(path) {
            Ok(()) => {
                self.total_thumbnail = None;
                self.status_message = None;
            }
            Err(e) => self.report("Loading total image", e),
        }
    }

    pub fn smooth(&mut self) {
        match self.session.smooth(self.smoothing_enabled, self.kernel_size) {
            Ok(preview) => self.show(preview),
            Err(e) => self.report("Smoothing", e),
        }
    }

    pub fn convert(&mut self) {
        match self
            .session
            .convert(&self.conversion_input, self.smoothing_enabled)
        {
            Ok(preview) => self.show(preview),
            Err(e) => self.report("Conversion", e),
        }
    }

    /// Click on a library row. Category rows only change the highlight.
    pub fn select_node(&mut self, node: LibraryNode) {
        if let Some(c) = self.session.select_library(&self.library, &node) {
            log::info!("Selected {node:?}: {c:?}");
        }
        self.selected_node = Some(node);
    }

    /// Select the library molecule named in the search field.
    pub fn find_molecule(&mut self) {
        let query = self.molecule_query.trim();
        let Some((category, _)) = self.library.find(query) else {
            log::warn!("Molecule '{query}' is not in the library");
            self.status_message = Some(format!("Molecule '{query}' is not in the library"));
            return;
        };
        let node = LibraryNode::Molecule {
            category: category.to_string(),
            name: query.to_string(),
        };
        self.status_message = None;
        self.select_node(node);
    }

    /// Make the manual coefficients the active ones without plotting.
    pub fn apply_manual_coefficients(&mut self) {
        match self
            .session
            .set_manual_coefficients(&self.manual_coefficients)
        {
            Ok(c) => {
                log::info!("Manual coefficients set: {c:?}");
                self.status_message = None;
            }
            Err(e) => self.report("Manual coefficients", e),
        }
    }

    pub fn plot(&mut self) {
        let options = PlotOptions {
            normalize: self.apply_normalization,
            calibrate: self.apply_calibration,
            manual_coefficients: self
                .use_manual_coefficients
                .then(|| self.manual_coefficients.clone()),
        };
        match self.session.plot(&options) {
            Ok(plot) => self.show(plot),
            Err(e) => self.report("Plot", e),
        }
    }
}
