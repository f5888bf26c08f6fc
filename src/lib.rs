//! Style-rule engine for Mapsforge-style render themes.
//!
//! A theme is compiled once into a [`Style`]; at draw time the style answers
//! which instructions apply to a feature given the zoom level, its interned
//! tags and whether its geometry is closed.
//!
//! ```no_run
//! use rendertheme::{Style, StyleConfig, TagTable};
//! use rendertheme::resources::NoResources;
//!
//! let mut table = TagTable::new();
//! let tags = table.tags([("highway", "primary")]);
//!
//! let mut style = Style::new();
//! style.load_str(
//!     r##"<rendertheme><rule e="way" k="highway" v="primary">
//!         <line stroke="#ff0000" stroke-width="2"/></rule></rendertheme>"##,
//!     &table,
//!     &NoResources,
//!     &StyleConfig::default(),
//! )?;
//!
//! for path in style.paths(14, false, &tags) {
//!     println!("{:?}", path.pen(14));
//! }
//! # Ok::<(), rendertheme::StyleError>(())
//! ```

pub mod config;
pub mod error;
pub mod render;
pub mod resources;
pub mod rules;
pub mod style;
pub mod tags;
pub mod theme;

pub use config::StyleConfig;
pub use error::{Result, StyleError};
pub use render::{Render, RenderKind};
pub use rules::{Filter, Rule};
pub use style::{Handle, LoadReport, Style, Styled};
pub use tags::{FeatureKind, Tag, TagDictionary, TagTable};
