//! Render-theme documents.
//!
//! A theme is a nested markup document (Mapsforge render-theme XML):
//!
//! ```text
//! <rendertheme>
//!   <stylemenu defaultvalue="..."> <layer id=".."> <cat id=".."/> </layer> </stylemenu>
//!   <rule e="way|node|any" k="key|key" v="value|~|*" closed="yes|no|any"
//!         zoom-min=".." zoom-max=".." cat="..">
//!     <rule ...> ... </rule>
//!     <area/> <line/> <circle/> <caption/> <pathText/> <symbol/>
//!   </rule>
//! </rendertheme>
//! ```

mod document;
pub mod values;

pub use document::{Element, parse_document};
