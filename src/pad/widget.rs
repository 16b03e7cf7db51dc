use crate::pad::export;
use crate::pad::input::{PadInputState, PointerSample, StrokeEvent};
use crate::pad::model::PadModel;
use crate::pad::options::PadOptions;
use crate::pad::render::Surface;
use eframe::egui::{
    self, Color32, PointerButton, Rect, Response, Sense, TextureHandle, TextureOptions, Ui,
};

/// Host resize requests must stay stable this long before the surface is
/// rebuilt, so window drags do not rescale the raster every frame.
const RESIZE_THROTTLE_MS: f64 = 250.0;

/// The egui widget draws with a single synthetic contact id; multi-contact
/// filtering only matters for hosts that feed the tracker directly.
const PRIMARY_CONTACT: u64 = 0;

/// A signature capture widget.
///
/// The widget itself is an event sink: `pointer_down`/`pointer_move`/
/// `pointer_up` and `resize` can be driven by any event source, and
/// [`SignaturePad::show`] wires them to egui. On every stroke end the current
/// drawing is encoded into the output slot, readable via
/// [`SignaturePad::data_url`].
pub struct SignaturePad {
    options: PadOptions,
    surface: Option<Surface>,
    input: PadInputState,
    model: PadModel,
    texture: Option<TextureHandle>,
    texture_dirty: bool,
    output: Option<String>,
    /// Pending logical size change and when it was first seen.
    pending_resize: Option<((f32, f32), f64)>,
}

impl SignaturePad {
    pub fn new(mut options: PadOptions) -> Self {
        options.sanitize();
        let input = PadInputState::new(&options);
        Self {
            options,
            surface: None,
            input,
            model: PadModel::default(),
            texture: None,
            texture_dirty: false,
            output: None,
            pending_resize: None,
        }
    }

    pub fn options(&self) -> &PadOptions {
        &self.options
    }

    pub fn model(&self) -> &PadModel {
        &self.model
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// The last exported drawing, if any stroke has been committed.
    pub fn data_url(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn has_signature(&self) -> bool {
        !self.model.is_empty()
    }

    /// Size the surface. Called implicitly on first show; hosts without a
    /// GUI call it directly.
    pub fn initialize(&mut self, logical_width: f32, logical_height: f32) {
        if self.surface.is_none() {
            self.surface = Some(Surface::new(
                logical_width,
                logical_height,
                self.options.pad_scale,
            ));
            self.texture_dirty = true;
        }
    }

    /// Reinitialize with new options, keeping drawn content. An in-flight
    /// stroke is dropped.
    pub fn set_options(&mut self, mut options: PadOptions) {
        options.sanitize();
        if let Some(surface) = self.surface.as_mut() {
            let (logical_w, logical_h) = surface.logical_size();
            surface.resize_preserving(logical_w, logical_h, options.pad_scale);
        }
        self.input.reconfigure(&options);
        self.options = options;
        self.texture_dirty = true;
    }

    /// Reinitialize from loose host-page options; malformed entries default.
    pub fn set_options_from_value(&mut self, value: &serde_json::Value) {
        self.set_options(PadOptions::from_value(value));
    }

    /// Remove all drawn pixels and reset the output to empty.
    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
        self.model.clear();
        self.input.abort();
        self.output = None;
        self.texture_dirty = true;
    }

    /// Immediately resize the surface, preserving a scaled copy of the
    /// drawing. `show` debounces before calling this.
    pub fn resize(&mut self, logical_width: f32, logical_height: f32) {
        if let Some(surface) = self.surface.as_mut() {
            surface.resize_preserving(logical_width, logical_height, self.options.pad_scale);
            self.texture_dirty = true;
        } else {
            self.initialize(logical_width, logical_height);
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, time_ms: f64) {
        let events = self
            .input
            .handle_down(PointerSample::new(PRIMARY_CONTACT, x, y, time_ms));
        self.apply_events(events);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, time_ms: f64) {
        let events = self
            .input
            .handle_move(PointerSample::new(PRIMARY_CONTACT, x, y, time_ms));
        self.apply_events(events);
    }

    pub fn pointer_up(&mut self, x: f32, y: f32, time_ms: f64) {
        let events = self
            .input
            .handle_up(PointerSample::new(PRIMARY_CONTACT, x, y, time_ms));
        self.apply_events(events);
    }

    /// Contact cancelled or lost: end the stroke at its last accepted point.
    pub fn pointer_cancel(&mut self) {
        let events = self.input.release();
        self.apply_events(events);
    }

    fn apply_events(&mut self, events: Vec<StrokeEvent>) {
        if events.is_empty() {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        for event in events {
            match event {
                StrokeEvent::Begin { point } => {
                    // The touch-down dot doubles as the start cap and keeps a
                    // plain tap visible.
                    surface.draw_dot((point.x, point.y), point.width, self.options.line_color);
                }
                StrokeEvent::Extend { segment } => {
                    surface.draw_curve(&segment, self.options.line_color);
                }
                StrokeEvent::End { stroke } => {
                    if !stroke.is_dot() {
                        if let Some(last) = stroke.points.last() {
                            surface.draw_cap(
                                (last.x, last.y),
                                last.width,
                                self.options.line_cap,
                                self.options.line_color,
                            );
                        }
                    }
                    self.model.push(stroke);
                    match export::export_data_url(surface, &self.model, &self.options) {
                        Ok(Some(url)) => self.output = Some(url),
                        Ok(None) => {}
                        Err(err) => tracing::warn!("signature export failed: {err:#}"),
                    }
                }
            }
        }
        self.texture_dirty = true;
    }

    fn track_resize(&mut self, size: (f32, f32), now_ms: f64) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let (logical_w, logical_h) = surface.logical_size();
        let changed = (logical_w - size.0).abs() > 0.5 || (logical_h - size.1).abs() > 0.5;
        if !changed {
            self.pending_resize = None;
            return;
        }
        match self.pending_resize {
            Some((_, since)) if now_ms - since >= RESIZE_THROTTLE_MS => {
                // Don't rescale under the pen.
                if !self.input.is_active() {
                    self.resize(size.0, size.1);
                    self.pending_resize = None;
                }
            }
            Some((_, since)) => self.pending_resize = Some((size, since)),
            None => self.pending_resize = Some((size, now_ms)),
        }
    }

    pub fn show(&mut self, ui: &mut Ui) -> Response {
        let desired = ui.available_size().max(egui::vec2(64.0, 64.0));
        let (response, painter) = ui.allocate_painter(desired, Sense::drag());
        let rect = response.rect;
        let now_ms = ui.input(|i| i.time) * 1000.0;

        self.initialize(rect.width(), rect.height());
        self.track_resize((rect.width(), rect.height()), now_ms);

        let local = |pos: egui::Pos2| (pos.x - rect.min.x, pos.y - rect.min.y);
        if response.drag_started_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = local(pos);
                self.pointer_down(x, y, now_ms);
            }
        } else if response.dragged_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                if rect.contains(pos) {
                    let (x, y) = local(pos);
                    self.pointer_move(x, y, now_ms);
                } else {
                    // Leaving the surface ends the stroke, clamped to the
                    // edge it left through.
                    let (x, y) = local(pos.clamp(rect.min, rect.max));
                    self.pointer_up(x, y, now_ms);
                }
            }
        } else if response.drag_stopped_by(PointerButton::Primary) {
            match response.interact_pointer_pos() {
                Some(pos) => {
                    let (x, y) = local(pos.clamp(rect.min, rect.max));
                    self.pointer_up(x, y, now_ms);
                }
                None => self.pointer_cancel(),
            }
        }

        self.upload_texture(ui);

        painter.rect_filled(rect, 2.0, Color32::WHITE);
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        painter.rect_stroke(rect, 2.0, egui::Stroke::new(1.0, Color32::GRAY));

        response
    }

    fn upload_texture(&mut self, ui: &Ui) {
        if !self.texture_dirty {
            return;
        }
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let size = [surface.width() as usize, surface.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, surface.pixels());
        if let Some(texture) = self.texture.as_mut() {
            texture.set(color_image, TextureOptions::LINEAR);
        } else {
            self.texture = Some(ui.ctx().load_texture(
                "signature_pad",
                color_image,
                TextureOptions::LINEAR,
            ));
        }
        self.texture_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pad::options::SaveFormat;

    fn pad() -> SignaturePad {
        let mut pad = SignaturePad::new(PadOptions::default());
        pad.initialize(200.0, 100.0);
        pad
    }

    fn draw_line(pad: &mut SignaturePad) {
        pad.pointer_down(20.0, 50.0, 0.0);
        pad.pointer_move(60.0, 50.0, 20.0);
        pad.pointer_move(100.0, 60.0, 40.0);
        pad.pointer_up(140.0, 60.0, 60.0);
    }

    #[test]
    fn no_output_until_a_stroke_ends() {
        let mut pad = pad();
        assert_eq!(pad.data_url(), None);

        pad.pointer_down(20.0, 50.0, 0.0);
        pad.pointer_move(60.0, 50.0, 20.0);
        assert_eq!(pad.data_url(), None, "no export while the pen is down");

        pad.pointer_up(100.0, 50.0, 40.0);
        assert!(pad.data_url().is_some());
        assert!(pad.has_signature());
    }

    #[test]
    fn clear_resets_output_and_pixels() {
        let mut pad = pad();
        draw_line(&mut pad);
        assert!(pad.data_url().is_some());
        assert!(!pad.surface().unwrap().is_blank());

        pad.clear();
        assert_eq!(pad.data_url(), None);
        assert!(pad.surface().unwrap().is_blank());
        assert!(!pad.has_signature());
    }

    #[test]
    fn tap_draws_a_dot_and_exports() {
        let mut pad = pad();
        pad.pointer_down(50.0, 50.0, 0.0);
        pad.pointer_up(50.0, 50.0, 30.0);

        assert!(pad.has_signature());
        assert!(pad.model().strokes[0].is_dot());
        assert!(!pad.surface().unwrap().is_blank());
        assert!(pad.data_url().is_some());
    }

    #[test]
    fn cancel_commits_the_stroke_like_release() {
        let mut pad = pad();
        pad.pointer_down(20.0, 20.0, 0.0);
        pad.pointer_move(60.0, 20.0, 20.0);
        pad.pointer_cancel();
        assert!(pad.has_signature());
        assert!(pad.data_url().is_some());
    }

    #[test]
    fn set_options_preserves_drawing_and_rescales() {
        let mut pad = pad();
        draw_line(&mut pad);
        let before = pad.surface().unwrap().scale();

        let mut options = PadOptions::default();
        options.pad_scale = before * 2.0;
        options.save_format = SaveFormat::Svg;
        pad.set_options(options);

        let surface = pad.surface().unwrap();
        assert_eq!(surface.scale(), before * 2.0);
        assert!(!surface.is_blank(), "content survives reconfiguration");
        assert_eq!(pad.options().save_format, SaveFormat::Svg);
    }

    #[test]
    fn export_format_follows_options() {
        let mut pad = SignaturePad::new(PadOptions {
            save_format: SaveFormat::Svg,
            ..PadOptions::default()
        });
        pad.initialize(100.0, 100.0);
        pad.pointer_down(10.0, 10.0, 0.0);
        pad.pointer_up(40.0, 40.0, 30.0);
        assert!(pad
            .data_url()
            .is_some_and(|url| url.starts_with("data:image/svg+xml;base64,")));
    }

    #[test]
    fn resize_preserves_prior_content() {
        let mut pad = pad();
        draw_line(&mut pad);
        pad.resize(100.0, 50.0);
        let surface = pad.surface().unwrap();
        assert_eq!(surface.logical_size(), (100.0, 50.0));
        assert!(!surface.is_blank());
    }
}
