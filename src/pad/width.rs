use crate::pad::options::PadOptions;
use std::collections::VecDeque;

/// Upper bound on the smoothing window regardless of configuration.
const MAX_WINDOW: usize = 64;

/// Derives per-point line thickness from pointer speed.
///
/// The target width for a sample is
/// `max - clamp((speed - min_speed) / (max_speed - min_speed), 0, 1) * (max - min)`,
/// then averaged over a sliding window of the last `smoothness` samples so a
/// jittery pointer does not produce a lumpy stroke. Speed is measured in
/// logical px/ms and scaled by `speed_sensitivity` before normalization; a
/// sensitivity of zero disables variation entirely and every sample gets the
/// fixed `line_thickness`.
#[derive(Debug, Clone)]
pub struct WidthFilter {
    line_thickness: f32,
    min_thickness: f32,
    max_thickness: f32,
    min_speed: f32,
    max_speed: f32,
    speed_sensitivity: f32,
    smoothness: usize,
    window: VecDeque<f32>,
}

impl WidthFilter {
    pub fn from_options(options: &PadOptions) -> Self {
        Self {
            line_thickness: options.line_thickness,
            min_thickness: options.min_thickness,
            max_thickness: options.max_thickness,
            min_speed: options.min_speed,
            max_speed: options.max_speed,
            speed_sensitivity: options.speed_sensitivity,
            smoothness: options.smoothness.clamp(1, MAX_WINDOW),
            window: VecDeque::new(),
        }
    }

    pub fn is_variable(&self) -> bool {
        self.speed_sensitivity > 0.0
    }

    /// Forget the smoothing window. Called between strokes so a slow finish
    /// does not bleed into the start of the next stroke.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn width_for_speed(&mut self, speed: f32) -> f32 {
        if !self.is_variable() {
            return self.line_thickness;
        }
        let range = (self.max_speed - self.min_speed).max(f32::EPSILON);
        let adjusted = speed.max(0.0) * self.speed_sensitivity;
        let normalized = ((adjusted - self.min_speed) / range).clamp(0.0, 1.0);
        let target = self.max_thickness - normalized * (self.max_thickness - self.min_thickness);

        self.window.push_back(target);
        while self.window.len() > self.smoothness {
            self.window.pop_front();
        }
        self.window.iter().sum::<f32>() / self.window.len() as f32
    }
}
