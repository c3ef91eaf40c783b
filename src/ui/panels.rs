use eframe::egui::{self, Color32, RichText, ScrollArea, TextureHandle, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::ColorMapKind;
use crate::pipeline::ingest::LoadedImage;
use crate::pipeline::library::LibraryNode;
use crate::pipeline::session::CoefficientSource;
use crate::state::AppState;
use crate::ui::help::HelpTopic;

// ---------------------------------------------------------------------------
// Left side panel – loading, conversion, coefficients, plot flags
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            loading_section(ui, state);
            ui.separator();
            conversion_section(ui, state);
            ui.separator();
            coefficient_section(ui, state);
            ui.separator();
            plot_section(ui, state);
        });
}

fn help_button(ui: &mut Ui, state: &mut AppState, topic: HelpTopic) {
    if ui.small_button("?").clicked() {
        state.help_topic = Some(topic);
    }
}

fn loading_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Loading and smoothing");

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Load Si image").clicked() {
            if let Some(path) = pick_image("Select Si image") {
                state.load_si(&path);
            }
        }
        if let Some(img) = state.session.si_image() {
            ui.label(img.path.display().to_string());
        }
    });
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Load total ions image").clicked() {
            if let Some(path) = pick_image("Select total ions image") {
                state.load_total(&path);
            }
        }
        if let Some(img) = state.session.total_image() {
            ui.label(img.path.display().to_string());
        }
    });

    let size = state.config.thumbnail_size;
    ui.horizontal(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label("Si image loaded");
            if let Some(img) = state.session.si_image() {
                let texture = thumbnail(ui, &mut state.si_thumbnail, "si_thumb", img, size);
                ui.add(egui::Image::new((texture.id(), egui::vec2(120.0, 120.0))));
            }
        });
        ui.vertical(|ui: &mut Ui| {
            ui.label("Total image loaded");
            if let Some(img) = state.session.total_image() {
                let texture =
                    thumbnail(ui, &mut state.total_thumbnail, "total_thumb", img, size);
                ui.add(egui::Image::new((texture.id(), egui::vec2(120.0, 120.0))));
            }
        });
    });

    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut state.smoothing_enabled, "Smooth image");
        let limits = state.session.kernel_limits();
        ui.add(egui::Slider::new(&mut state.kernel_size, limits.min..=limits.max).text("kernel"));
        help_button(ui, state, HelpTopic::Smoothing);
    });
    if ui.button("Smooth and plot image").clicked() {
        state.smooth();
    }
}

/// Texture for a thumbnail, created on first use.
fn thumbnail<'a>(
    ui: &Ui,
    slot: &'a mut Option<TextureHandle>,
    name: &str,
    image: &LoadedImage,
    size: u32,
) -> &'a TextureHandle {
    slot.get_or_insert_with(|| {
        let thumb = image.thumbnail(size);
        let color = egui::ColorImage::from_rgba_unmultiplied(
            [thumb.width() as usize, thumb.height() as usize],
            thumb.as_raw(),
        );
        ui.ctx()
            .load_texture(name, color, egui::TextureOptions::LINEAR)
    })
}

fn labelled_field(ui: &mut Ui, label: &str, value: &mut String) -> bool {
    ui.label(label);
    ui.add(egui::TextEdit::singleline(value).desired_width(90.0))
        .changed()
}

fn conversion_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Calculator");

    let fields: [(&str, HelpTopic); 5] = [
        ("X size (mm)", HelpTopic::XSize),
        ("Y size (mm)", HelpTopic::YSize),
        ("Counts/pixel factor (Si image)", HelpTopic::CountsSi),
        ("Counts/pixel factor (total image)", HelpTopic::CountsTotal),
        ("Pixel/raster factor", HelpTopic::RasterFactor),
    ];

    egui::Grid::new("conversion_grid")
        .num_columns(3)
        .show(ui, |ui: &mut Ui| {
            for (i, (label, topic)) in fields.into_iter().enumerate() {
                let input = &mut state.conversion_input;
                let value = match i {
                    0 => &mut input.x_size_mm,
                    1 => &mut input.y_size_mm,
                    2 => &mut input.counts_per_pixel_si,
                    3 => &mut input.counts_per_pixel_total,
                    _ => &mut input.pixels_per_raster,
                };
                labelled_field(ui, label, value);
                help_button(ui, state, topic);
                ui.end_row();
            }
        });

    if ui.button("Conversion").clicked() {
        state.convert();
    }
}

fn coefficient_section(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut state.use_manual_coefficients, "Use new coefficients");
        help_button(ui, state, HelpTopic::Coefficients);
    });

    ui.add_enabled_ui(state.use_manual_coefficients, |ui: &mut Ui| {
        egui::Grid::new("manual_coefficients")
            .num_columns(4)
            .show(ui, |ui: &mut Ui| {
                let manual = &mut state.manual_coefficients;
                labelled_field(ui, "a", &mut manual.a);
                labelled_field(ui, "a (norm.)", &mut manual.a_norm);
                ui.end_row();
                labelled_field(ui, "b", &mut manual.b);
                labelled_field(ui, "b (norm.)", &mut manual.b_norm);
                ui.end_row();
            });
        if ui.button("Set coefficients").clicked() {
            state.apply_manual_coefficients();
        }
    });

    ui.add_space(4.0);
    ui.label(RichText::new("Use library coefficients").strong());
    ui.horizontal(|ui: &mut Ui| {
        let response = ui.add(
            egui::TextEdit::singleline(&mut state.molecule_query)
                .hint_text("molecule name")
                .desired_width(160.0),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Find").clicked() || submitted {
            state.find_molecule();
        }
    });
    library_table(ui, state);

    if let Some(selected) = state.session.coefficients() {
        let source = match &selected.source {
            CoefficientSource::Library { category, molecule } => {
                format!("{category} / {molecule}")
            }
            CoefficientSource::Manual => "manual entry".to_string(),
        };
        let c = selected.values;
        ui.label(format!(
            "Active: {source}  (a = {}, b = {}, a norm. = {}, b norm. = {})",
            c.a, c.b, c.a_norm, c.b_norm
        ));
    }
}

fn library_table(ui: &mut Ui, state: &mut AppState) {
    // Collect the rows first so the click handler can mutate `state`.
    let mut rows: Vec<(LibraryNode, Option<[f64; 4]>)> = Vec::new();
    for category in state.library.categories() {
        rows.push((LibraryNode::Category(category.to_string()), None));
        for (name, c) in state.library.molecules(category) {
            rows.push((
                LibraryNode::Molecule {
                    category: category.to_string(),
                    name: name.to_string(),
                },
                Some([c.a, c.b, c.a_norm, c.b_norm]),
            ));
        }
    }

    let mut clicked = None;
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(120.0))
        .columns(Column::auto().at_least(50.0), 4)
        .header(20.0, |mut header| {
            for title in ["Molecules library", "a", "b", "a (norm.)", "b (norm.)"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for (node, values) in &rows {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        let selected = state.selected_node.as_ref() == Some(node);
                        let label = match node {
                            LibraryNode::Category(name) => RichText::new(name).strong(),
                            LibraryNode::Molecule { name, .. } => {
                                RichText::new(format!("    {name}"))
                            }
                        };
                        if ui.selectable_label(selected, label).clicked() {
                            clicked = Some(node.clone());
                        }
                    });
                    for i in 0..4 {
                        row.col(|ui: &mut Ui| {
                            if let Some(v) = values {
                                ui.label(v[i].to_string());
                            }
                        });
                    }
                });
            }
        });

    if let Some(node) = clicked {
        state.select_node(node);
    }
}

fn plot_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Plot");
    ui.checkbox(&mut state.apply_calibration, "Apply calibration");
    ui.checkbox(&mut state.apply_normalization, "Apply normalization");

    let before = state.color_map;
    egui::ComboBox::from_id_salt("color_map")
        .selected_text(state.color_map.name())
        .show_ui(ui, |ui: &mut Ui| {
            for map in ColorMapKind::SELECTABLE {
                ui.selectable_value(&mut state.color_map, map, map.name());
            }
        });
    if state.color_map != before {
        state.plot_texture = None;
    }

    if ui.button("Plot").clicked() {
        state.plot();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open Si image…").clicked() {
                if let Some(path) = pick_image("Select Si image") {
                    state.load_si(&path);
                }
                ui.close_menu();
            }
            if ui.button("Open total ions image…").clicked() {
                if let Some(path) = pick_image("Select total ions image") {
                    state.load_total(&path);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(img) = state.session.si_image() {
            ui.label(format!(
                "{} x {} pixels",
                img.intensity.width(),
                img.intensity.height()
            ));
        }
        if state.session.smoothed().is_some() {
            ui.label("smoothed");
        }
        if let Some(conv) = state.session.conversion() {
            ui.label(format!(
                "{} x {} mm",
                conv.factors.x_size_mm, conv.factors.y_size_mm
            ));
        }
        if let Some(thickness) = state.session.thickness() {
            let (lo, hi) = thickness
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
                    (lo.min(t), hi.max(t))
                });
            ui.label(format!("thickness {lo:.2} .. {hi:.2} nm"));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Help window
// ---------------------------------------------------------------------------

pub fn help_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(topic) = state.help_topic else {
        return;
    };
    let mut open = true;
    egui::Window::new(topic.title())
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui: &mut Ui| {
            ui.label(topic.text());
        });
    if !open {
        state.help_topic = None;
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn pick_image(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("All images", &["png", "jpg", "jpeg", "bmp"])
        .add_filter("PNG", &["png"])
        .add_filter("JPG", &["jpg", "jpeg"])
        .add_filter("BMP", &["bmp"])
        .pick_file()
}
