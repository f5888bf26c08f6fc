use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use rendertheme::render::{Brush, Color, Font, Icon, Pen};

pub mod jsonl;

pub use self::jsonl::JsonlSink;

/// Instructions that apply to one input feature.
#[derive(Clone, Debug, Serialize)]
pub struct FeatureReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub instructions: Vec<InstructionReport>,
}

/// One instruction with its zoom dependent values resolved.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InstructionReport {
    Path {
        z_order: u32,
        area: bool,
        curve: bool,
        pen: Option<Pen>,
        brush: Brush,
        dy: f64,
    },
    Circle {
        z_order: u32,
        radius: f64,
        pen: Option<Pen>,
        brush: Brush,
    },
    Label {
        priority: i32,
        text: String,
        font: Font,
        fill: Color,
        stroke: Color,
        stroke_width: f64,
        dy: f64,
    },
    Symbol {
        priority: i32,
        icon: Icon,
    },
}

pub trait DataSink: Send {
    fn add_report(&mut self, report: &FeatureReport) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}
