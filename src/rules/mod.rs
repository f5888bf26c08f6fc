//! Rule predicates.
//!
//! A [`Rule`] combines an element type, an open/closed constraint, a zoom
//! range and a conjunction of [`Filter`]s. Rules nest: each child is derived
//! from its parent with [`Rule::refine`] and can only match a subset of what
//! the parent matches.

mod filter;
mod rule;

pub use filter::{Filter, KeyPattern, ValuePattern};
pub use rule::{Closed, Constraints, ElementType, MAX_ZOOM, Rule, ZoomRange};
