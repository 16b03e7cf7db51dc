use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// RGBA pen color.
///
/// Serialized as a hex string (`#rrggbb` / `#rrggbbaa`); deserialization also
/// accepts a channel map and a small set of CSS color names. Unparseable
/// color strings silently fall back to the default, matching the widget's
/// overall "malformed options default" behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

static NAMED_COLORS: Lazy<HashMap<&'static str, PadColor>> = Lazy::new(|| {
    HashMap::from([
        ("black", PadColor::rgba(0, 0, 0, 255)),
        ("white", PadColor::rgba(255, 255, 255, 255)),
        ("red", PadColor::rgba(255, 0, 0, 255)),
        ("green", PadColor::rgba(0, 128, 0, 255)),
        ("blue", PadColor::rgba(0, 0, 255, 255)),
        ("yellow", PadColor::rgba(255, 255, 0, 255)),
        ("cyan", PadColor::rgba(0, 255, 255, 255)),
        ("magenta", PadColor::rgba(255, 0, 255, 255)),
        ("orange", PadColor::rgba(255, 165, 0, 255)),
        ("purple", PadColor::rgba(128, 0, 128, 255)),
        ("gray", PadColor::rgba(128, 128, 128, 255)),
        ("grey", PadColor::rgba(128, 128, 128, 255)),
        ("navy", PadColor::rgba(0, 0, 128, 255)),
        ("transparent", PadColor::rgba(0, 0, 0, 0)),
    ])
});

impl PadColor {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_rgba_array(color: [u8; 4]) -> Self {
        Self::rgba(color[0], color[1], color[2], color[3])
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or a known color name.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(named) = NAMED_COLORS.get(text.to_ascii_lowercase().as_str()) {
            return Some(*named);
        }
        let hex = text.strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let channel = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .ok()
                        .map(|v| v * 16 + v)
                };
                Some(Self::rgba(channel(0)?, channel(1)?, channel(2)?, 255))
            }
            6 | 8 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
                Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
            }
            _ => None,
        }
    }
}

impl Default for PadColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Serialize for PadColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PadColorWire {
    Text(String),
    Channels {
        r: u8,
        g: u8,
        b: u8,
        #[serde(default = "default_alpha")]
        a: u8,
    },
}

fn default_alpha() -> u8 {
    255
}

impl<'de> Deserialize<'de> for PadColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match PadColorWire::deserialize(deserializer)? {
            PadColorWire::Text(text) => PadColor::parse(&text).unwrap_or_default(),
            PadColorWire::Channels { r, g, b, a } => PadColor::rgba(r, g, b, a),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn as_svg(self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "miter" => Some(LineJoin::Miter),
            "round" => Some(LineJoin::Round),
            "bevel" => Some(LineJoin::Bevel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn as_svg(self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "butt" => Some(LineCap::Butt),
            "round" => Some(LineCap::Round),
            "square" => Some(LineCap::Square),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaveFormat {
    Png,
    Jpeg,
    Svg,
}

impl SaveFormat {
    pub fn mime(self) -> &'static str {
        match self {
            SaveFormat::Png => "image/png",
            SaveFormat::Jpeg => "image/jpeg",
            SaveFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Svg => "svg",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpeg" | "jpg" => Some(SaveFormat::Jpeg),
            "svg" => Some(SaveFormat::Svg),
            _ => None,
        }
    }
}

/// What happens when a second contact touches down while a stroke is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactPolicy {
    /// The later contact is ignored until the first one lifts.
    Ignore,
    /// The active stroke is committed first, then the new contact starts one.
    EndPrevious,
}

impl ContactPolicy {
    fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "ignore" => Some(ContactPolicy::Ignore),
            "end_previous" | "endprevious" => Some(ContactPolicy::EndPrevious),
            _ => None,
        }
    }
}

/// Flat configuration record for one pad instance.
///
/// Read at initialization and on explicit reconfiguration. Host pages that
/// feed options as loose JSON (the camelCase aliases below) go through
/// [`PadOptions::from_value`], where malformed entries fall back to their
/// defaults field by field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PadOptions {
    #[serde(default = "default_line_color", alias = "lineColor")]
    pub line_color: PadColor,
    /// Fixed thickness used when speed variation is disabled.
    #[serde(default = "default_line_thickness", alias = "lineThickness")]
    pub line_thickness: f32,
    #[serde(default = "default_line_join", alias = "lineJoin")]
    pub line_join: LineJoin,
    #[serde(default = "default_line_cap", alias = "lineCap")]
    pub line_cap: LineCap,
    /// Raster resolution multiplier: surface pixels per logical unit.
    #[serde(default = "default_pad_scale", alias = "padScale")]
    pub pad_scale: f32,
    #[serde(default = "default_min_thickness", alias = "minThickness")]
    pub min_thickness: f32,
    #[serde(default = "default_max_thickness", alias = "maxThickness")]
    pub max_thickness: f32,
    /// Speed (logical px/ms) at or below which strokes are drawn at
    /// `max_thickness`.
    #[serde(default = "default_min_speed", alias = "minSpeed")]
    pub min_speed: f32,
    /// Speed at or above which strokes are drawn at `min_thickness`.
    #[serde(default = "default_max_speed", alias = "maxSpeed")]
    pub max_speed: f32,
    /// Moving-average window (in samples) applied to the derived thickness.
    #[serde(default = "default_smoothness")]
    pub smoothness: usize,
    /// Multiplier applied to measured speed; `0` disables speed variation.
    #[serde(default = "default_speed_sensitivity", alias = "speedSensitivity")]
    pub speed_sensitivity: f32,
    #[serde(default = "default_save_format", alias = "saveFormat")]
    pub save_format: SaveFormat,
    #[serde(default = "default_contact_policy", alias = "contactPolicy")]
    pub contact_policy: ContactPolicy,
}

fn default_line_color() -> PadColor {
    PadColor::BLACK
}

fn default_line_thickness() -> f32 {
    3.0
}

fn default_line_join() -> LineJoin {
    LineJoin::Round
}

fn default_line_cap() -> LineCap {
    LineCap::Round
}

fn default_pad_scale() -> f32 {
    2.0
}

fn default_min_thickness() -> f32 {
    1.0
}

fn default_max_thickness() -> f32 {
    4.5
}

fn default_min_speed() -> f32 {
    0.0
}

fn default_max_speed() -> f32 {
    2.5
}

fn default_smoothness() -> usize {
    4
}

fn default_speed_sensitivity() -> f32 {
    1.0
}

fn default_save_format() -> SaveFormat {
    SaveFormat::Png
}

fn default_contact_policy() -> ContactPolicy {
    ContactPolicy::Ignore
}

impl Default for PadOptions {
    fn default() -> Self {
        Self {
            line_color: default_line_color(),
            line_thickness: default_line_thickness(),
            line_join: default_line_join(),
            line_cap: default_line_cap(),
            pad_scale: default_pad_scale(),
            min_thickness: default_min_thickness(),
            max_thickness: default_max_thickness(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            smoothness: default_smoothness(),
            speed_sensitivity: default_speed_sensitivity(),
            save_format: default_save_format(),
            contact_policy: default_contact_policy(),
        }
    }
}

impl PadOptions {
    /// Repair inconsistent numeric ranges in place. Returns whether anything
    /// had to change.
    pub fn sanitize(&mut self) -> bool {
        let defaults = Self::default();
        let mut changed = false;

        if !self.line_thickness.is_finite() || self.line_thickness <= 0.0 {
            self.line_thickness = defaults.line_thickness;
            changed = true;
        }
        if !self.min_thickness.is_finite() || self.min_thickness <= 0.0 {
            self.min_thickness = defaults.min_thickness;
            changed = true;
        }
        if !self.max_thickness.is_finite() || self.max_thickness <= 0.0 {
            self.max_thickness = defaults.max_thickness;
            changed = true;
        }
        if self.min_thickness > self.max_thickness {
            std::mem::swap(&mut self.min_thickness, &mut self.max_thickness);
            changed = true;
        }
        if !self.pad_scale.is_finite() || self.pad_scale <= 0.0 {
            self.pad_scale = defaults.pad_scale;
            changed = true;
        } else {
            let clamped = self.pad_scale.clamp(0.25, 8.0);
            if clamped != self.pad_scale {
                self.pad_scale = clamped;
                changed = true;
            }
        }
        if self.smoothness == 0 {
            self.smoothness = 1;
            changed = true;
        } else if self.smoothness > 64 {
            self.smoothness = 64;
            changed = true;
        }
        if !self.min_speed.is_finite() || self.min_speed < 0.0 {
            self.min_speed = defaults.min_speed;
            changed = true;
        }
        if !self.max_speed.is_finite() || self.max_speed <= self.min_speed {
            self.max_speed = self.min_speed + (defaults.max_speed - defaults.min_speed);
            changed = true;
        }
        if !self.speed_sensitivity.is_finite() || self.speed_sensitivity < 0.0 {
            self.speed_sensitivity = defaults.speed_sensitivity;
            changed = true;
        }
        changed
    }

    /// Build options from a loose JSON value, the way a host page hands them
    /// over. Every malformed or missing entry falls back to its default;
    /// this never fails.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let mut options = Self::default();
        let Some(map) = value.as_object() else {
            return options;
        };

        if let Some(color) = field(map, &["line_color", "lineColor"])
            .and_then(serde_json::Value::as_str)
            .and_then(PadColor::parse)
        {
            options.line_color = color;
        }
        if let Some(v) = lenient_f32(field(map, &["line_thickness", "lineThickness"])) {
            options.line_thickness = v;
        }
        if let Some(join) = field(map, &["line_join", "lineJoin"])
            .and_then(serde_json::Value::as_str)
            .and_then(LineJoin::parse)
        {
            options.line_join = join;
        }
        if let Some(cap) = field(map, &["line_cap", "lineCap"])
            .and_then(serde_json::Value::as_str)
            .and_then(LineCap::parse)
        {
            options.line_cap = cap;
        }
        if let Some(v) = lenient_f32(field(map, &["pad_scale", "padScale"])) {
            options.pad_scale = v;
        }
        if let Some(v) = lenient_f32(field(map, &["min_thickness", "minThickness"])) {
            options.min_thickness = v;
        }
        if let Some(v) = lenient_f32(field(map, &["max_thickness", "maxThickness"])) {
            options.max_thickness = v;
        }
        if let Some(v) = lenient_f32(field(map, &["min_speed", "minSpeed"])) {
            options.min_speed = v;
        }
        if let Some(v) = lenient_f32(field(map, &["max_speed", "maxSpeed"])) {
            options.max_speed = v;
        }
        if let Some(v) = lenient_usize(field(map, &["smoothness"])) {
            options.smoothness = v;
        }
        if let Some(v) = lenient_f32(field(map, &["speed_sensitivity", "speedSensitivity"])) {
            options.speed_sensitivity = v;
        }
        if let Some(format) = field(map, &["save_format", "saveFormat"])
            .and_then(serde_json::Value::as_str)
            .and_then(SaveFormat::parse)
        {
            options.save_format = format;
        }
        if let Some(policy) = field(map, &["contact_policy", "contactPolicy"])
            .and_then(serde_json::Value::as_str)
            .and_then(ContactPolicy::parse)
        {
            options.contact_policy = policy;
        }

        options.sanitize();
        options
    }
}

fn field<'a>(
    map: &'a serde_json::Map<String, serde_json::Value>,
    names: &[&str],
) -> Option<&'a serde_json::Value> {
    names.iter().find_map(|name| map.get(*name))
}

fn lenient_f32(value: Option<&serde_json::Value>) -> Option<f32> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64().map(|v| v as f32),
        serde_json::Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn lenient_usize(value: Option<&serde_json::Value>) -> Option<usize> {
    match value? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
            .map(|v| v as usize),
        serde_json::Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip_pad_options() {
        let options = PadOptions::default();
        let json = serde_json::to_string(&options).expect("serialize pad options");
        let decoded: PadOptions = serde_json::from_str(&json).expect("deserialize pad options");
        assert_eq!(decoded, options);
    }

    #[test]
    fn defaults_cover_every_enumerated_option() {
        let options = PadOptions::default();
        assert_eq!(options.line_color, PadColor::BLACK);
        assert_eq!(options.line_thickness, 3.0);
        assert_eq!(options.line_join, LineJoin::Round);
        assert_eq!(options.line_cap, LineCap::Round);
        assert_eq!(options.pad_scale, 2.0);
        assert_eq!(options.min_thickness, 1.0);
        assert_eq!(options.max_thickness, 4.5);
        assert_eq!(options.min_speed, 0.0);
        assert_eq!(options.max_speed, 2.5);
        assert_eq!(options.smoothness, 4);
        assert_eq!(options.speed_sensitivity, 1.0);
        assert_eq!(options.save_format, SaveFormat::Png);
        assert_eq!(options.contact_policy, ContactPolicy::Ignore);
    }

    #[test]
    fn color_parses_hex_and_names() {
        assert_eq!(PadColor::parse("#102030"), Some(PadColor::rgba(16, 32, 48, 255)));
        assert_eq!(
            PadColor::parse("#10203040"),
            Some(PadColor::rgba(16, 32, 48, 64))
        );
        assert_eq!(PadColor::parse("#fff"), Some(PadColor::WHITE));
        assert_eq!(PadColor::parse("Navy"), Some(PadColor::rgba(0, 0, 128, 255)));
        assert_eq!(PadColor::parse("no-such-color"), None);
        assert_eq!(PadColor::parse("#12345"), None);
    }

    #[test]
    fn color_deserializes_from_string_or_channels() {
        let from_hex: PadColor = serde_json::from_value(serde_json::json!("#ff0000")).unwrap();
        assert_eq!(from_hex, PadColor::rgba(255, 0, 0, 255));

        let from_map: PadColor =
            serde_json::from_value(serde_json::json!({ "r": 1, "g": 2, "b": 3 })).unwrap();
        assert_eq!(from_map, PadColor::rgba(1, 2, 3, 255));

        // Garbage strings fall back to the default color rather than erroring.
        let fallback: PadColor = serde_json::from_value(serde_json::json!("##nope")).unwrap();
        assert_eq!(fallback, PadColor::BLACK);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let decoded: PadOptions = serde_json::from_value(serde_json::json!({
            "line_color": "red",
            "max_thickness": 6.0
        }))
        .expect("deserialize partial options");
        assert_eq!(decoded.line_color, PadColor::rgba(255, 0, 0, 255));
        assert_eq!(decoded.max_thickness, 6.0);
        assert_eq!(decoded.smoothness, 4);
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let decoded: PadOptions = serde_json::from_value(serde_json::json!({
            "lineThickness": 5.0,
            "saveFormat": "svg"
        }))
        .expect("deserialize aliased options");
        assert_eq!(decoded.line_thickness, 5.0);
        assert_eq!(decoded.save_format, SaveFormat::Svg);
    }

    #[test]
    fn from_value_defaults_malformed_entries() {
        let options = PadOptions::from_value(&serde_json::json!({
            "lineColor": "not a color",
            "lineThickness": "oops",
            "padScale": [1, 2],
            "maxSpeed": "3.5",
            "smoothness": "7",
            "saveFormat": "bmp"
        }));
        assert_eq!(options.line_color, PadColor::BLACK);
        assert_eq!(options.line_thickness, 3.0);
        assert_eq!(options.pad_scale, 2.0);
        assert_eq!(options.max_speed, 3.5);
        assert_eq!(options.smoothness, 7);
        assert_eq!(options.save_format, SaveFormat::Png);
    }

    #[test]
    fn from_value_accepts_non_object_input() {
        assert_eq!(
            PadOptions::from_value(&serde_json::json!(null)),
            PadOptions::default()
        );
        assert_eq!(
            PadOptions::from_value(&serde_json::json!("nonsense")),
            PadOptions::default()
        );
    }

    #[test]
    fn sanitize_repairs_inverted_and_degenerate_ranges() {
        let mut options = PadOptions {
            min_thickness: 9.0,
            max_thickness: 2.0,
            pad_scale: -1.0,
            smoothness: 0,
            max_speed: 0.0,
            ..PadOptions::default()
        };
        assert!(options.sanitize());
        assert!(options.min_thickness <= options.max_thickness);
        assert_eq!(options.pad_scale, 2.0);
        assert_eq!(options.smoothness, 1);
        assert!(options.max_speed > options.min_speed);

        let mut clean = PadOptions::default();
        assert!(!clean.sanitize());
    }
}
