use crate::pad::model::{Stroke, StrokePoint};
use crate::pad::options::{ContactPolicy, PadOptions};
use crate::pad::width::WidthFilter;

/// Move samples closer than this (squared, logical px) to the previous
/// accepted sample are dropped.
const MIN_SAMPLE_DIST_SQ: f32 = 4.0;

/// One raw pointer sample in logical surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Identifies the contact (pointer id); used to filter to a single
    /// active contact.
    pub contact: u64,
    pub x: f32,
    pub y: f32,
    pub time_ms: f64,
}

impl PointerSample {
    pub fn new(contact: u64, x: f32, y: f32, time_ms: f64) -> Self {
        Self {
            contact,
            x,
            y,
            time_ms,
        }
    }
}

/// One smoothed drawing step: a quadratic curve from the previous midpoint
/// to the new midpoint, with the previous sample as control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSegment {
    pub from: (f32, f32),
    pub control: (f32, f32),
    pub to: (f32, f32),
    pub start_width: f32,
    pub end_width: f32,
}

/// What the tracker wants the renderer to do in response to a sample.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeEvent {
    /// First contact: draw a filled dot at the touch point.
    Begin { point: StrokePoint },
    /// Stroke continued: draw the next smoothed segment.
    Extend { segment: CurveSegment },
    /// Contact lifted: the finished stroke buffer, ready to commit.
    End { stroke: Stroke },
}

#[derive(Debug, Clone)]
struct ActiveStroke {
    contact: u64,
    points: Vec<StrokePoint>,
    /// Last midpoint already drawn; the next segment starts here.
    last_mid: (f32, f32),
}

/// Pointer tracking state machine.
///
/// Holds at most one active stroke buffer. Samples from other contacts are
/// ignored or end the active stroke first, depending on the configured
/// [`ContactPolicy`]. Release, cancel and leaving the surface all end the
/// stroke; the caller maps them onto [`PadInputState::handle_up`] or
/// [`PadInputState::release`].
#[derive(Debug, Clone)]
pub struct PadInputState {
    policy: ContactPolicy,
    filter: WidthFilter,
    active: Option<ActiveStroke>,
}

impl PadInputState {
    pub fn new(options: &PadOptions) -> Self {
        Self {
            policy: options.contact_policy,
            filter: WidthFilter::from_options(options),
            active: None,
        }
    }

    /// Apply new options. Any in-flight stroke is dropped without being
    /// committed, matching a pad re-initialization.
    pub fn reconfigure(&mut self, options: &PadOptions) {
        self.policy = options.contact_policy;
        self.filter = WidthFilter::from_options(options);
        self.active = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Drop the active stroke without committing it.
    pub fn abort(&mut self) {
        self.active = None;
        self.filter.reset();
    }

    pub fn handle_down(&mut self, sample: PointerSample) -> Vec<StrokeEvent> {
        let mut events = Vec::new();
        if self.active.is_some() {
            match self.policy {
                ContactPolicy::Ignore => return events,
                ContactPolicy::EndPrevious => events.extend(self.finish_active()),
            }
        }

        self.filter.reset();
        let width = self.filter.width_for_speed(0.0);
        let point = StrokePoint::new(sample.x, sample.y, width, sample.time_ms);
        self.active = Some(ActiveStroke {
            contact: sample.contact,
            points: vec![point],
            last_mid: (sample.x, sample.y),
        });
        events.push(StrokeEvent::Begin { point });
        events
    }

    pub fn handle_move(&mut self, sample: PointerSample) -> Vec<StrokeEvent> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        if active.contact != sample.contact {
            return Vec::new();
        }
        let Some(last) = active.points.last().copied() else {
            return Vec::new();
        };

        let dx = sample.x - last.x;
        let dy = sample.y - last.y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq < MIN_SAMPLE_DIST_SQ {
            return Vec::new();
        }

        let elapsed_ms = (sample.time_ms - last.time_ms) as f32;
        let speed = if elapsed_ms > 0.0 {
            dist_sq.sqrt() / elapsed_ms
        } else {
            0.0
        };
        let width = self.filter.width_for_speed(speed);
        let point = StrokePoint::new(sample.x, sample.y, width, sample.time_ms);

        let mid = ((last.x + point.x) / 2.0, (last.y + point.y) / 2.0);
        let segment = CurveSegment {
            from: active.last_mid,
            control: (last.x, last.y),
            to: mid,
            start_width: last.width,
            end_width: point.width,
        };
        active.last_mid = mid;
        active.points.push(point);
        vec![StrokeEvent::Extend { segment }]
    }

    /// Contact lifted (or cancelled, or left the surface) at a known
    /// position.
    pub fn handle_up(&mut self, sample: PointerSample) -> Vec<StrokeEvent> {
        let Some(active) = self.active.as_ref() else {
            return Vec::new();
        };
        if active.contact != sample.contact {
            return Vec::new();
        }
        let mut events = self.handle_move(sample);
        events.extend(self.finish_active());
        events
    }

    /// Contact lifted without a final position (pointer lost): end the
    /// stroke at its last accepted point.
    pub fn release(&mut self) -> Vec<StrokeEvent> {
        self.finish_active()
    }

    fn finish_active(&mut self) -> Vec<StrokeEvent> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };
        self.filter.reset();

        let mut events = Vec::new();
        if active.points.len() > 1 {
            if let Some(last) = active.points.last().copied() {
                // Close the gap between the last drawn midpoint and the
                // final sample.
                events.push(StrokeEvent::Extend {
                    segment: CurveSegment {
                        from: active.last_mid,
                        control: (last.x, last.y),
                        to: (last.x, last.y),
                        start_width: last.width,
                        end_width: last.width,
                    },
                });
            }
        }
        events.push(StrokeEvent::End {
            stroke: Stroke {
                points: active.points,
            },
        });
        events
    }
}
