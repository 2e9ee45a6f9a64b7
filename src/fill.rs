//! Fill styles and the canvas seam they are applied through.
//!
//! A [`Fill`] only describes paint. Rasterizing, PDF or SVG output happens in
//! an external [`Canvas`]; [`crate::export::SvgCanvas`] is the reference
//! implementation.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use strum::{EnumMessage, IntoEnumIterator};
use strum_macros::{EnumIter, EnumMessage, EnumString, IntoStaticStr};

use crate::error::{QrRenderError, Result};
use crate::geometry::{BezPath, Point, Rect};

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = QrRenderError;

    /// Parses `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = |why: String| QrRenderError::invalid_setting("color", why);
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| bad(format!("color must start with #, got: {}", s)))?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(bad(format!("'{}' is not made of hex digits", hex)));
        }
        let channel = |digits: &str| {
            u8::from_str_radix(digits, 16).map_err(|e| bad(format!("'{}': {}", digits, e)))
        };
        match hex.len() {
            3 => Ok(Color::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            6 | 8 => {
                let a = if hex.len() == 8 { f32::from(channel(&hex[6..8])?) / 255.0 } else { 1.0 };
                Ok(Color::rgba(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?, a))
            }
            n => Err(bad(format!("expected 3, 6 or 8 hex digits, got {}", n))),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: Color,
}

impl ColorStop {
    pub fn new(position: f64, color: Color) -> Self {
        Self { position, color }
    }
}

/// A bitmap shared between fills, logos and documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef(Arc<RgbaImage>);

impl ImageRef {
    pub fn new(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }

    /// Base64 text of the PNG encoding.
    pub fn to_base64_png(&self) -> Result<String> {
        let mut bytes = Vec::new();
        self.0.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(STANDARD.encode(bytes))
    }

    pub fn from_base64_png(text: &str) -> Result<Self> {
        let bytes = STANDARD.decode(text)?;
        let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?;
        Ok(Self::new(image.to_rgba8()))
    }
}

/// How a region is painted.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Color),
    /// Stops along the line from `start` to `end`, both in unit space of the region.
    LinearGradient {
        stops: Vec<ColorStop>,
        start: Point,
        end: Point,
    },
    /// Stops from `center` (unit space) out to the region's edge.
    RadialGradient { stops: Vec<ColorStop>, center: Point },
    /// A bitmap stretched over the region.
    Image(ImageRef),
}

impl Default for Fill {
    fn default() -> Self {
        Fill::Solid(Color::BLACK)
    }
}

/// Persisted form: `{"name": ..., "settings": {...}}`.
#[derive(Serialize, Deserialize)]
#[serde(tag = "name", content = "settings", rename_all = "camelCase")]
enum FillRecord {
    Solid {
        color: Color,
    },
    LinearGradient {
        stops: Vec<ColorStop>,
        start: [f64; 2],
        end: [f64; 2],
    },
    RadialGradient {
        stops: Vec<ColorStop>,
        center: [f64; 2],
    },
    Image {
        png: String,
    },
}

/// The closed set of fill styles, by persisted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter, EnumMessage)]
#[strum(serialize_all = "camelCase")]
pub enum FillKind {
    #[strum(message = "Solid color")]
    Solid,
    #[strum(message = "Linear gradient")]
    LinearGradient,
    #[strum(message = "Radial gradient")]
    RadialGradient,
    #[strum(message = "Image")]
    Image,
}

impl FillKind {
    /// Persisted names, in declaration order.
    pub fn available_names() -> Vec<&'static str> {
        FillKind::iter().map(Into::into).collect()
    }

    pub fn available_titles() -> Vec<&'static str> {
        FillKind::iter().map(FillKind::title).collect()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn title(self) -> &'static str {
        self.get_message().unwrap_or_else(|| self.name())
    }

    /// What [`Fill::create`] hands out when no settings are given.
    pub fn default_fill(self) -> Fill {
        let stops = vec![ColorStop::new(0.0, Color::BLACK), ColorStop::new(1.0, Color::WHITE)];
        match self {
            FillKind::Solid => Fill::Solid(Color::BLACK),
            FillKind::LinearGradient => Fill::LinearGradient {
                stops,
                start: Point::new(0.0, 0.0),
                end: Point::new(1.0, 1.0),
            },
            FillKind::RadialGradient => Fill::RadialGradient {
                stops,
                center: Point::new(0.5, 0.5),
            },
            FillKind::Image => Fill::Image(ImageRef::new(RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255])))),
        }
    }

    fn lookup(name: &str) -> Result<FillKind> {
        FillKind::from_str(name).map_err(|_| QrRenderError::UnknownGenerator {
            family: "fill",
            name: name.to_string(),
        })
    }
}

fn check_stops(stops: &[ColorStop]) -> Result<()> {
    if stops.is_empty() {
        return Err(QrRenderError::invalid_setting("stops", "a gradient needs at least one stop"));
    }
    if stops.iter().any(|s| !(0.0..=1.0).contains(&s.position)) {
        return Err(QrRenderError::invalid_setting("stops", "stop positions must be within 0..1"));
    }
    if stops.windows(2).any(|w| w[0].position > w[1].position) {
        return Err(QrRenderError::invalid_setting("stops", "stop positions must be ascending"));
    }
    Ok(())
}

impl Fill {
    /// # Errors
    ///
    /// [`QrRenderError::InvalidSetting`] for empty, out of range or unordered stops.
    pub fn linear_gradient(stops: Vec<ColorStop>, start: Point, end: Point) -> Result<Fill> {
        check_stops(&stops)?;
        Ok(Fill::LinearGradient { stops, start, end })
    }

    pub fn radial_gradient(stops: Vec<ColorStop>, center: Point) -> Result<Fill> {
        check_stops(&stops)?;
        Ok(Fill::RadialGradient { stops, center })
    }

    /// Creates the named fill from its `settings` object, or with the kind's
    /// defaults when there is none.
    ///
    /// # Errors
    ///
    /// [`QrRenderError::UnknownGenerator`] if `name` is not a fill, otherwise
    /// whatever [`Fill::from_settings`] reports for the settings.
    pub fn create(name: &str, settings: Option<&Value>) -> Result<Fill> {
        let kind = FillKind::lookup(name)?;
        match settings {
            Some(settings) => Fill::from_settings(&json!({"name": name, "settings": settings})),
            None => Ok(kind.default_fill()),
        }
    }

    pub fn kind(&self) -> FillKind {
        match self {
            Fill::Solid(_) => FillKind::Solid,
            Fill::LinearGradient { .. } => FillKind::LinearGradient,
            Fill::RadialGradient { .. } => FillKind::RadialGradient,
            Fill::Image(_) => FillKind::Image,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn title(&self) -> &'static str {
        self.kind().title()
    }

    /// Paints `path` on `canvas`. `region` is the area gradients and images
    /// are laid out against.
    pub fn apply(&self, canvas: &mut dyn Canvas, region: Rect, path: &BezPath) {
        canvas.fill_path(path, self, region);
    }

    pub fn settings(&self) -> Result<Value> {
        let record = match self {
            Fill::Solid(color) => FillRecord::Solid { color: *color },
            Fill::LinearGradient { stops, start, end } => FillRecord::LinearGradient {
                stops: stops.clone(),
                start: [start.x, start.y],
                end: [end.x, end.y],
            },
            Fill::RadialGradient { stops, center } => FillRecord::RadialGradient {
                stops: stops.clone(),
                center: [center.x, center.y],
            },
            Fill::Image(image) => FillRecord::Image {
                png: image.to_base64_png()?,
            },
        };
        Ok(serde_json::to_value(record)?)
    }

    /// # Errors
    ///
    /// [`QrRenderError::UnknownGenerator`] for an unregistered fill name,
    /// otherwise the first field that fails to parse or validate.
    pub fn from_settings(value: &Value) -> Result<Fill> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| QrRenderError::Malformed("fill has no name".to_string()))?;
        FillKind::lookup(name)?;
        let point = |p: [f64; 2]| Point::new(p[0], p[1]);
        match serde_json::from_value::<FillRecord>(value.clone())? {
            FillRecord::Solid { color } => Ok(Fill::Solid(color)),
            FillRecord::LinearGradient { stops, start, end } => {
                Fill::linear_gradient(stops, point(start), point(end))
            }
            FillRecord::RadialGradient { stops, center } => Fill::radial_gradient(stops, point(center)),
            FillRecord::Image { png } => Ok(Fill::Image(ImageRef::from_base64_png(&png)?)),
        }
    }
}

/// Destination for a draw list.
pub trait Canvas {
    /// Paints the inside of `path` (nonzero winding) with `fill`, laid out over `region`.
    fn fill_path(&mut self, path: &BezPath, fill: &Fill, region: Rect);

    /// Draws a bitmap stretched into `rect`.
    fn draw_image(&mut self, image: &ImageRef, rect: Rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_color_hex() {
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#102030".parse::<Color>().unwrap(), Color::rgb(16, 32, 48));
        let c: Color = "#10203080".parse().unwrap();
        assert_eq!(c.to_hex(), "#10203080");
        assert!("102030".parse::<Color>().is_err());
        assert!("#12".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_rejects_non_hex_text() {
        for text in ["#éa", "#ffé", "#12345g", "#+1+2+3"] {
            let err = text.parse::<Color>().unwrap_err();
            assert!(matches!(err, QrRenderError::InvalidSetting { .. }), "{}", text);
        }
    }

    #[test]
    fn test_fill_kinds() {
        assert_eq!(FillKind::available_names(), vec!["solid", "linearGradient", "radialGradient", "image"]);
        assert_eq!(
            FillKind::available_titles(),
            vec!["Solid color", "Linear gradient", "Radial gradient", "Image"]
        );
        for name in FillKind::available_names() {
            let fill = Fill::create(name, None).unwrap();
            assert_eq!(fill.name(), name);
            assert_eq!(Fill::from_settings(&fill.settings().unwrap()).unwrap(), fill);
        }
    }

    #[test]
    fn test_create_with_settings() {
        let fill = Fill::create("solid", Some(&json!({"color": "#00ff00"}))).unwrap();
        assert_eq!(fill, Fill::Solid(Color::rgb(0, 255, 0)));
        assert_eq!(fill.title(), "Solid color");
        assert!(Fill::create("solid", Some(&json!({"color": "#éa"}))).is_err());
        assert!(matches!(
            Fill::create("plaid", None),
            Err(QrRenderError::UnknownGenerator { family: "fill", .. })
        ));
    }

    #[test]
    fn test_solid_settings_shape() {
        let fill = Fill::Solid(Color::rgb(255, 0, 0));
        assert_eq!(fill.settings().unwrap(), json!({"name": "solid", "settings": {"color": "#ff0000"}}));
    }

    #[test]
    fn test_gradient_round_trip() {
        let fill = Fill::linear_gradient(
            vec![ColorStop::new(0.0, Color::BLACK), ColorStop::new(1.0, Color::rgb(0, 0, 200))],
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
        )
        .unwrap();
        assert_eq!(Fill::from_settings(&fill.settings().unwrap()).unwrap(), fill);
    }

    #[test]
    fn test_gradient_validation() {
        assert!(Fill::radial_gradient(vec![], Point::new(0.5, 0.5)).is_err());
        let unordered = vec![ColorStop::new(0.8, Color::BLACK), ColorStop::new(0.2, Color::WHITE)];
        assert!(Fill::radial_gradient(unordered, Point::new(0.5, 0.5)).is_err());
    }

    #[test]
    fn test_unknown_fill_name() {
        let err = Fill::from_settings(&json!({"name": "plaid", "settings": {}})).unwrap_err();
        assert!(matches!(err, QrRenderError::UnknownGenerator { family: "fill", .. }));
    }

    #[test]
    fn test_image_fill_round_trip() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        let fill = Fill::Image(ImageRef::new(img));
        assert_eq!(Fill::from_settings(&fill.settings().unwrap()).unwrap(), fill);
    }
}
