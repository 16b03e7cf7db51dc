use crate::pad::options::{ContactPolicy, LineCap, LineJoin, PadColor, PadOptions, SaveFormat};
use crate::pad::widget::SignaturePad;
use crate::settings::Settings;
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use chrono::Local;
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::path::PathBuf;

pub const SETTINGS_FILE: &str = "settings.json";

/// Demo shell hosting a single [`SignaturePad`] with an options form, the
/// clear/save commands and a read-only output field.
pub struct PadApp {
    settings: Settings,
    pad: SignaturePad,
    toasts: Toasts,
    last_saved: Option<PathBuf>,
}

impl PadApp {
    pub fn new(mut settings: Settings) -> Self {
        settings.pad.sanitize();
        let pad = SignaturePad::new(settings.pad.clone());
        let toasts = Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]);
        Self {
            settings,
            pad,
            toasts,
            last_saved: None,
        }
    }

    fn add_toast(&mut self, kind: ToastKind, text: impl Into<String>) {
        if !self.settings.enable_toasts {
            return;
        }
        self.toasts.add(Toast {
            text: text.into().into(),
            kind,
            options: ToastOptions::default()
                .duration_in_seconds(self.settings.toast_duration as f64),
        });
    }

    fn apply_options(&mut self) {
        self.pad.set_options(self.settings.pad.clone());
        if let Err(err) = self.settings.save(SETTINGS_FILE) {
            tracing::warn!("failed to persist settings: {err:#}");
        }
    }

    fn save_signature(&mut self) {
        let Some(url) = self.pad.data_url().map(str::to_owned) else {
            self.add_toast(ToastKind::Error, "Please sign before saving.");
            return;
        };
        match self.write_export(&url) {
            Ok(path) => {
                self.add_toast(ToastKind::Success, format!("Saved {}", path.display()));
                if let Err(err) = open::that(&path) {
                    tracing::warn!("could not reveal {}: {err}", path.display());
                }
                self.last_saved = Some(path);
            }
            Err(err) => {
                tracing::error!("saving signature failed: {err:#}");
                self.add_toast(ToastKind::Error, format!("Save failed: {err}"));
            }
        }
    }

    fn write_export(&self, url: &str) -> Result<PathBuf> {
        let (extension, bytes) = decode_data_url(url)?;
        let dir = self.settings.export_directory();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create export folder {}", dir.display()))?;
        let filename = format!(
            "signature_{}.{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            extension
        );
        let path = dir.join(filename);
        std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    fn options_ui(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;
        let pad = &mut self.settings.pad;

        ui.heading("Pen");
        egui::Grid::new("pen_options").num_columns(2).show(ui, |ui| {
            ui.label("Color");
            let mut rgba = pad.line_color.to_rgba_array();
            if ui.color_edit_button_srgba_unmultiplied(&mut rgba).changed() {
                pad.line_color = PadColor::from_rgba_array(rgba);
                changed = true;
            }
            ui.end_row();

            ui.label("Thickness");
            changed |= ui
                .add(egui::DragValue::new(&mut pad.line_thickness).clamp_range(0.5..=32.0))
                .changed();
            ui.end_row();

            ui.label("Line join");
            egui::ComboBox::from_id_source("line_join")
                .selected_text(pad.line_join.as_svg())
                .show_ui(ui, |ui| {
                    for join in [LineJoin::Miter, LineJoin::Round, LineJoin::Bevel] {
                        changed |= ui
                            .selectable_value(&mut pad.line_join, join, join.as_svg())
                            .changed();
                    }
                });
            ui.end_row();

            ui.label("Line cap");
            egui::ComboBox::from_id_source("line_cap")
                .selected_text(pad.line_cap.as_svg())
                .show_ui(ui, |ui| {
                    for cap in [LineCap::Butt, LineCap::Round, LineCap::Square] {
                        changed |= ui
                            .selectable_value(&mut pad.line_cap, cap, cap.as_svg())
                            .changed();
                    }
                });
            ui.end_row();
        });

        ui.separator();
        ui.heading("Speed response");
        egui::Grid::new("speed_options").num_columns(2).show(ui, |ui| {
            ui.label("Min thickness");
            changed |= ui
                .add(egui::DragValue::new(&mut pad.min_thickness).clamp_range(0.5..=32.0))
                .changed();
            ui.end_row();

            ui.label("Max thickness");
            changed |= ui
                .add(egui::DragValue::new(&mut pad.max_thickness).clamp_range(0.5..=32.0))
                .changed();
            ui.end_row();

            ui.label("Min speed");
            changed |= ui
                .add(
                    egui::DragValue::new(&mut pad.min_speed)
                        .clamp_range(0.0..=50.0)
                        .speed(0.05),
                )
                .changed();
            ui.end_row();

            ui.label("Max speed");
            changed |= ui
                .add(
                    egui::DragValue::new(&mut pad.max_speed)
                        .clamp_range(0.1..=50.0)
                        .speed(0.05),
                )
                .changed();
            ui.end_row();

            ui.label("Smoothness");
            changed |= ui
                .add(egui::DragValue::new(&mut pad.smoothness).clamp_range(1..=64))
                .changed();
            ui.end_row();

            ui.label("Speed sensitivity");
            changed |= ui
                .add(
                    egui::Slider::new(&mut pad.speed_sensitivity, 0.0..=4.0)
                        .clamp_to_range(true),
                )
                .changed();
            ui.end_row();
        });

        ui.separator();
        ui.heading("Pad");
        egui::Grid::new("pad_options").num_columns(2).show(ui, |ui| {
            ui.label("Scale");
            changed |= ui
                .add(
                    egui::DragValue::new(&mut pad.pad_scale)
                        .clamp_range(0.25..=8.0)
                        .speed(0.25),
                )
                .changed();
            ui.end_row();

            ui.label("Save format");
            egui::ComboBox::from_id_source("save_format")
                .selected_text(pad.save_format.extension())
                .show_ui(ui, |ui| {
                    for format in [SaveFormat::Png, SaveFormat::Jpeg, SaveFormat::Svg] {
                        changed |= ui
                            .selectable_value(&mut pad.save_format, format, format.extension())
                            .changed();
                    }
                });
            ui.end_row();

            ui.label("Second contact");
            egui::ComboBox::from_id_source("contact_policy")
                .selected_text(match pad.contact_policy {
                    ContactPolicy::Ignore => "ignore",
                    ContactPolicy::EndPrevious => "end previous",
                })
                .show_ui(ui, |ui| {
                    changed |= ui
                        .selectable_value(&mut pad.contact_policy, ContactPolicy::Ignore, "ignore")
                        .changed();
                    changed |= ui
                        .selectable_value(
                            &mut pad.contact_policy,
                            ContactPolicy::EndPrevious,
                            "end previous",
                        )
                        .changed();
                });
            ui.end_row();
        });

        if changed {
            self.settings.pad.sanitize();
            self.apply_options();
        }
    }
}

/// Split a `data:<mime>;base64,<payload>` string into a file extension and
/// decoded bytes.
pub fn decode_data_url(url: &str) -> Result<(&'static str, Vec<u8>)> {
    let (header, payload) = url
        .split_once(";base64,")
        .context("unrecognized data url")?;
    let extension = match header {
        "data:image/png" => "png",
        "data:image/jpeg" => "jpg",
        "data:image/svg+xml" => "svg",
        _ => "bin",
    };
    let bytes = general_purpose::STANDARD
        .decode(payload)
        .context("decode data url payload")?;
    Ok((extension, bytes))
}

impl eframe::App for PadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::right("options")
            .default_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.options_ui(ui);
                });
            });

        egui::TopBottomPanel::bottom("output").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Output");
                // The hidden-field analog: the exported data URL a form would
                // submit.
                let mut url = self.pad.data_url().unwrap_or_default().to_owned();
                ui.add(
                    egui::TextEdit::singleline(&mut url)
                        .desired_width(f32::INFINITY)
                        .interactive(false),
                );
            });
            if let Some(path) = &self.last_saved {
                ui.label(format!("Last saved: {}", path.display()));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Clear").clicked() {
                    self.pad.clear();
                }
                if ui.button("Save").clicked() {
                    self.save_signature();
                }
                ui.label("Sign below");
            });
            self.pad.show(ui);
        });

        self.toasts.show(ctx);
    }
}
