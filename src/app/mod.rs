use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rendertheme::config::StyleConfig;
use rendertheme::resources::DirectoryResolver;
use rendertheme::style::{LoadReport, Style};
use rendertheme::tags::{FeatureKind, Tag, TagTable};

use crate::sinks::{DataSink, FeatureReport, InstructionReport, JsonlSink};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Render theme (XML)
    #[arg(short, long)]
    pub theme: PathBuf,

    /// Style configuration file (YAML, TOML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Feature descriptors, one JSON object per line ("-" for stdin)
    #[arg(short, long)]
    pub features: PathBuf,

    /// Zoom level to evaluate at
    #[arg(short, long)]
    pub zoom: u8,

    /// Output file ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Display density ratio (overrides the configuration)
    #[arg(long)]
    pub ratio: Option<f64>,

    /// Style menu layer (overrides the configuration)
    #[arg(long)]
    pub layer: Option<String>,

    /// Number of threads (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Node,
    Way,
}

impl From<InputKind> for FeatureKind {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::Node => FeatureKind::Node,
            InputKind::Way => FeatureKind::Way,
        }
    }
}

/// A feature descriptor as read from the input file.
#[derive(Debug, Deserialize)]
pub struct FeatureInput {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(rename = "type")]
    pub kind: InputKind,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// A feature with interned tags.
pub struct Feature {
    pub id: Option<Value>,
    pub kind: FeatureKind,
    pub closed: bool,
    pub tags: Vec<Tag>,
}

pub fn load_config(cli: &Cli) -> Result<StyleConfig> {
    let mut config = match &cli.config {
        Some(path) => StyleConfig::load(path)
            .with_context(|| format!("CLI: Failed to load configuration {:?}", path))?,
        None => StyleConfig::default(),
    };
    if let Some(ratio) = cli.ratio {
        config.ratio = ratio;
    }
    if let Some(layer) = &cli.layer {
        config.menu.layer = Some(layer.clone());
    }
    Ok(config)
}

pub fn read_features(path: &Path) -> Result<Vec<FeatureInput>> {
    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let file = std::fs::File::open(path)
            .with_context(|| format!("CLI: Failed to open features {:?}", path))?;
        Box::new(BufReader::new(file))
    };

    let mut features = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.context("CLI: Failed to read features")?;
        if line.trim().is_empty() {
            continue;
        }
        let feature: FeatureInput = serde_json::from_str(&line)
            .with_context(|| format!("CLI: Invalid feature on line {}", number + 1))?;
        features.push(feature);
    }
    Ok(features)
}

/// Intern the keys of every feature; the table then acts as the map data's
/// key dictionary.
pub fn intern_features(inputs: Vec<FeatureInput>, table: &mut TagTable) -> Vec<Feature> {
    inputs
        .into_iter()
        .map(|input| Feature {
            tags: table.tags(input.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
            id: input.id,
            kind: input.kind.into(),
            closed: input.closed,
        })
        .collect()
}

pub fn load_style(cli: &Cli, table: &TagTable, config: &StyleConfig) -> Result<(Style, LoadReport)> {
    let xml = std::fs::read_to_string(&cli.theme)
        .with_context(|| format!("CLI: Failed to read theme {:?}", cli.theme))?;
    let resources = DirectoryResolver::for_theme(&cli.theme);

    let mut style = Style::new();
    let report = style
        .load_str(&xml, table, &resources, config)
        .with_context(|| format!("Style: Failed to load theme {:?}", cli.theme))?;
    Ok((style, report))
}

pub fn evaluate_feature(style: &Style, zoom: u8, feature: &Feature) -> FeatureReport {
    let mut instructions = Vec::new();
    let tags = &feature.tags;

    match feature.kind {
        FeatureKind::Way => {
            for path in style.paths(zoom, feature.closed, tags) {
                instructions.push(InstructionReport::Path {
                    z_order: path.z_order(),
                    area: path.area(),
                    curve: path.curve(),
                    pen: path.pen(zoom),
                    brush: path.brush().clone(),
                    dy: path.dy(zoom),
                });
            }
        }
        FeatureKind::Node => {
            for circle in style.circles(zoom, tags) {
                instructions.push(InstructionReport::Circle {
                    z_order: circle.z_order(),
                    radius: circle.radius(zoom),
                    pen: circle.pen(),
                    brush: circle.brush(),
                });
            }
        }
    }

    for label in style.labels(zoom, feature.kind, feature.closed, tags) {
        let text = tags
            .iter()
            .find(|tag| tag.key == label.key())
            .map(|tag| tag.value.clone())
            .unwrap_or_default();
        instructions.push(InstructionReport::Label {
            priority: label.priority(),
            text,
            font: *label.font(),
            fill: label.fill_color(),
            stroke: label.stroke_color(),
            stroke_width: label.stroke_width(),
            dy: label.dy(),
        });
    }

    for symbol in style.symbols(zoom, feature.kind, feature.closed, tags) {
        instructions.push(InstructionReport::Symbol {
            priority: symbol.priority(),
            icon: symbol.icon().clone(),
        });
    }

    FeatureReport {
        id: feature.id.clone(),
        instructions,
    }
}

pub fn init_sink(output: &Path) -> Result<Box<dyn DataSink + Send>> {
    if output == Path::new("-") {
        tracing::info!("Sink: stdout");
        Ok(Box::new(JsonlSink::stdout()?))
    } else {
        tracing::info!("Sink: {:?}", output);
        Ok(Box::new(
            JsonlSink::new(output)
                .with_context(|| format!("CLI: Failed to create output {:?}", output))?,
        ))
    }
}

pub fn run(cli: &Cli) -> Result<usize> {
    let config = load_config(cli)?;

    let inputs = read_features(&cli.features)?;
    let mut table = TagTable::new();
    let features = intern_features(inputs, &mut table);
    tracing::info!(
        "Features: {} read, {} distinct keys",
        features.len(),
        table.len()
    );

    let (style, report) = load_style(cli, &table, &config)?;
    if style.is_empty() {
        tracing::warn!("Style: theme {:?} produced no instructions", cli.theme);
    }
    tracing::debug!("Style: {:?}", report);

    let reports: Vec<FeatureReport> = features
        .par_iter()
        .map(|feature| evaluate_feature(&style, cli.zoom, feature))
        .collect();

    let mut sink = init_sink(&cli.output)?;
    for report in &reports {
        sink.add_report(report)?;
    }
    sink.finish().context("CLI: Failed to finalize output")?;

    Ok(reports.len())
}
