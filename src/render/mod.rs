//! Compiled drawing instructions.
//!
//! Every instruction owns the [`Rule`] it was compiled under. The variant set
//! is closed: paths (lines and areas), circles, text labels and symbols.

mod scale;

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

use crate::rules::Rule;
use crate::tags::KeyId;

pub use scale::ZoomScale;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.a, self.r, self.g, self.b
            )
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

/// Which linear attributes of a path follow the zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    None,
    #[default]
    Stroke,
    All,
}

/// An image resource resolved at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Icon {
    pub path: PathBuf,
    /// Requested size in pixels, already multiplied by the density ratio.
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Size relative to the image's own size, in percent.
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Brush {
    #[default]
    None,
    Solid(Color),
    Pattern(Icon),
}

impl Brush {
    pub fn is_none(&self) -> bool {
        matches!(self, Brush::None)
    }
}

/// Stroke parameters at a given zoom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pen {
    pub color: Color,
    pub width: f64,
    /// Dash and gap lengths in pixels; empty for solid lines.
    pub dash: Vec<f64>,
    pub cap: LineCap,
    pub join: LineJoin,
}

/// Line or area style.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRender {
    pub(crate) z_order: u32,
    pub(crate) stroke_color: Option<Color>,
    pub(crate) stroke_width: f64,
    pub(crate) dash: Vec<f64>,
    pub(crate) cap: LineCap,
    pub(crate) join: LineJoin,
    pub(crate) brush: Brush,
    pub(crate) area: bool,
    pub(crate) curve: bool,
    pub(crate) scale: ScaleMode,
    pub(crate) dy: f64,
    pub(crate) zoom_scale: ZoomScale,
}

impl PathRender {
    pub(crate) fn new(z_order: u32, zoom_scale: ZoomScale) -> Self {
        Self {
            z_order,
            stroke_color: None,
            stroke_width: 0.0,
            dash: Vec::new(),
            cap: LineCap::default(),
            join: LineJoin::default(),
            brush: Brush::None,
            area: false,
            curve: false,
            scale: ScaleMode::default(),
            dy: 0.0,
            zoom_scale,
        }
    }

    pub fn z_order(&self) -> u32 {
        self.z_order
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn area(&self) -> bool {
        self.area
    }

    pub fn curve(&self) -> bool {
        self.curve
    }

    pub fn scale(&self) -> ScaleMode {
        self.scale
    }

    /// Stroke at `zoom`, or `None` when the path has no stroke.
    pub fn pen(&self, zoom: u8) -> Option<Pen> {
        let color = self.stroke_color?;
        let factor = self.zoom_scale.factor(zoom);
        let width = match self.scale {
            ScaleMode::None => self.stroke_width,
            ScaleMode::Stroke | ScaleMode::All => self.stroke_width * factor,
        };
        let dash = match self.scale {
            ScaleMode::All => self.dash.iter().map(|d| d * factor).collect(),
            ScaleMode::None | ScaleMode::Stroke => self.dash.clone(),
        };

        Some(Pen {
            color,
            width,
            dash,
            cap: self.cap,
            join: self.join,
        })
    }

    /// Vertical offset at `zoom`.
    pub fn dy(&self, zoom: u8) -> f64 {
        match self.scale {
            ScaleMode::None => self.dy,
            ScaleMode::Stroke | ScaleMode::All => self.dy * self.zoom_scale.factor(zoom),
        }
    }
}

/// Point marker.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleRender {
    pub(crate) z_order: u32,
    pub(crate) stroke_color: Option<Color>,
    pub(crate) stroke_width: f64,
    pub(crate) fill: Option<Color>,
    pub(crate) radius: f64,
    pub(crate) scale: bool,
    pub(crate) zoom_scale: ZoomScale,
}

impl CircleRender {
    pub(crate) fn new(z_order: u32, zoom_scale: ZoomScale) -> Self {
        Self {
            z_order,
            stroke_color: None,
            stroke_width: 0.0,
            fill: None,
            radius: 0.0,
            scale: false,
            zoom_scale,
        }
    }

    pub fn z_order(&self) -> u32 {
        self.z_order
    }

    pub fn pen(&self) -> Option<Pen> {
        self.stroke_color.map(|color| Pen {
            color,
            width: self.stroke_width,
            dash: Vec::new(),
            cap: LineCap::default(),
            join: LineJoin::default(),
        })
    }

    pub fn brush(&self) -> Brush {
        self.fill.map_or(Brush::None, Brush::Solid)
    }

    pub fn radius(&self, zoom: u8) -> f64 {
        if self.scale {
            self.radius * self.zoom_scale.factor(zoom)
        } else {
            self.radius
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    #[default]
    Default,
    Monospace,
    SansSerif,
    Serif,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Font {
    pub family: FontFamily,
    pub style: FontStyle,
    /// Pixel size, already multiplied by the density ratio.
    pub size: f64,
}

impl Font {
    pub const DEFAULT_SIZE: f64 = 10.0;
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: FontFamily::default(),
            style: FontStyle::default(),
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// Text label. Lower priorities are drawn first.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRender {
    pub(crate) priority: i32,
    pub(crate) fill: Color,
    pub(crate) stroke: Color,
    pub(crate) stroke_width: f64,
    pub(crate) font: Font,
    pub(crate) key: KeyId,
    pub(crate) dy: f64,
}

impl TextRender {
    pub(crate) fn new(key: KeyId) -> Self {
        Self {
            priority: 0,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            stroke_width: 0.0,
            font: Font::default(),
            key,
            dy: 0.0,
        }
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn fill_color(&self) -> Color {
        self.fill
    }

    pub fn stroke_color(&self) -> Color {
        self.stroke
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    /// Tag key whose value is the label text.
    pub fn key(&self) -> KeyId {
        self.key
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }
}

/// Icon placed on nodes or area centers.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub(crate) priority: i32,
    pub(crate) icon: Icon,
}

impl Symbol {
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn icon(&self) -> &Icon {
        &self.icon
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderKind {
    Path(PathRender),
    Circle(CircleRender),
    Text(TextRender),
    Symbol(Symbol),
}

/// A compiled instruction together with its selecting rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Render {
    pub rule: Rule,
    pub kind: RenderKind,
}

impl Render {
    pub fn new(rule: Rule, kind: RenderKind) -> Self {
        Self { rule, kind }
    }

    /// Paint order key: z-order for paths and circles, priority otherwise.
    pub fn order(&self) -> i64 {
        match &self.kind {
            RenderKind::Path(path) => i64::from(path.z_order),
            RenderKind::Circle(circle) => i64::from(circle.z_order),
            RenderKind::Text(text) => i64::from(text.priority),
            RenderKind::Symbol(symbol) => i64::from(symbol.priority),
        }
    }

    pub fn as_path(&self) -> Option<&PathRender> {
        match &self.kind {
            RenderKind::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_circle(&self) -> Option<&CircleRender> {
        match &self.kind {
            RenderKind::Circle(circle) => Some(circle),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextRender> {
        match &self.kind {
            RenderKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match &self.kind {
            RenderKind::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }
}
