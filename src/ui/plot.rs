use eframe::egui::{self, Color32, RichText, Sense, Ui};
use egui_plot::{Plot, PlotImage, PlotPoint};

use crate::color::{heatmap_rgba, ColorMapKind};
use crate::pipeline::session::PlotOutput;
use crate::state::AppState;

/// Width reserved for the colour bar and its labels.
const COLOR_BAR_WIDTH: f32 = 90.0;

// ---------------------------------------------------------------------------
// Surface plot (central panel)
// ---------------------------------------------------------------------------

/// Render the last pipeline output as a colour-mapped surface seen from
/// above.
pub fn surface_plot(ui: &mut Ui, state: &mut AppState) {
    let color_map = state.plot_color_map();
    let Some(output) = &state.plot else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Load a Si image to start  (File → Open Si image…)");
        });
        return;
    };

    let texture = state.plot_texture.get_or_insert_with(|| {
        let (size, rgba) = heatmap_rgba(&output.values, color_map);
        let image = egui::ColorImage::from_rgba_unmultiplied(size, &rgba);
        ui.ctx()
            .load_texture("surface", image, egui::TextureOptions::NEAREST)
    });
    let texture_id = texture.id();

    let kind = output.kind;
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(kind.title());
    });

    let bounds = Extent::of(output);
    let unit = kind.axis_unit();
    ui.horizontal(|ui: &mut Ui| {
        let plot_width = (ui.available_width() - COLOR_BAR_WIDTH).max(100.0);
        let height = ui.available_height();

        Plot::new("surface_plot")
            .width(plot_width)
            .height(height)
            .data_aspect(1.0)
            .x_axis_label(format!("X ({unit})"))
            .y_axis_label(format!("Y ({unit})"))
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true)
            .label_formatter(|_name, point| match value_at(output, point) {
                Some(v) => format!(
                    "x = {:.3} {unit}\ny = {:.3} {unit}\n{v:.4} {}",
                    point.x,
                    point.y,
                    kind.value_label()
                ),
                None => String::new(),
            })
            .show(ui, |plot_ui| {
                let image = PlotImage::new(
                    texture_id,
                    PlotPoint::new(bounds.center_x(), bounds.center_y()),
                    egui::vec2(bounds.width() as f32, bounds.height() as f32),
                );
                plot_ui.image(image);
            });

        color_bar(ui, output, color_map, height);
    });
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Plot-space rectangle covered by the texture. Each cell is centred on
/// its mesh coordinate.
struct Extent {
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    dx: f64,
    dy: f64,
}

impl Extent {
    fn of(output: &PlotOutput) -> Self {
        let (rows, cols) = output.values.dim();
        let mesh = &output.mesh;
        let x0 = mesh.x[[0, 0]];
        let x1 = mesh.x[[0, cols - 1]];
        let y0 = mesh.y[[0, 0]];
        let y1 = mesh.y[[rows - 1, 0]];
        Self {
            x0,
            x1,
            y0,
            y1,
            dx: spacing(x0, x1, cols),
            dy: spacing(y0, y1, rows),
        }
    }

    fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    fn center_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    fn width(&self) -> f64 {
        (self.x1 - self.x0).abs() + self.dx
    }

    fn height(&self) -> f64 {
        (self.y1 - self.y0).abs() + self.dy
    }
}

/// Cell pitch along one axis; unit pitch for degenerate axes.
fn spacing(start: f64, end: f64, n: usize) -> f64 {
    let span = (end - start).abs();
    if n > 1 && span > 0.0 {
        span / (n - 1) as f64
    } else {
        1.0
    }
}

/// Value of the cell under a plot-space point.
fn value_at(output: &PlotOutput, point: &PlotPoint) -> Option<f64> {
    let (rows, cols) = output.values.dim();
    let extent = Extent::of(output);
    let col = nearest_index(point.x, extent.x0, extent.x1, extent.dx, cols)?;
    let row = nearest_index(point.y, extent.y0, extent.y1, extent.dy, rows)?;
    output.values.get([row, col]).copied()
}

fn nearest_index(coord: f64, start: f64, end: f64, pitch: f64, n: usize) -> Option<usize> {
    let sign = if end < start { -1.0 } else { 1.0 };
    let idx = ((coord - start) * sign / pitch).round();
    (idx >= 0.0 && idx < n as f64).then_some(idx as usize)
}

// ---------------------------------------------------------------------------
// Colour bar
// ---------------------------------------------------------------------------

fn color_bar(ui: &mut Ui, output: &PlotOutput, map: ColorMapKind, height: f32) {
    let Some((lo, hi)) = output.value_range() else {
        return;
    };
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(output.kind.value_label()).small());
        ui.label(format!("{hi:.3}"));

        let bar_height = (height - 80.0).max(60.0);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(24.0, bar_height), Sense::hover());
        let steps = 64;
        let painter = ui.painter();
        for i in 0..steps {
            // top of the bar is the maximum
            let t = 1.0 - (i as f64 + 0.5) / steps as f64;
            let top = rect.top() + rect.height() * i as f32 / steps as f32;
            let bottom = rect.top() + rect.height() * (i + 1) as f32 / steps as f32;
            let band = egui::Rect::from_x_y_ranges(rect.x_range(), top..=bottom);
            painter.rect_filled(band, 0.0, map.sample(t));
        }
        painter.rect_stroke(
            rect,
            0.0,
            egui::Stroke::new(1.0, Color32::GRAY),
            egui::StrokeKind::Outside,
        );

        ui.label(format!("{lo:.3}"));
    });
}
