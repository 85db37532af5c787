//! Dependency discovery and staleness resolution.
//!
//! The pipeline for one run:
//!
//! 1. [`TargetDiscoverer`] finds the units that define an entry point
//!    (or takes an explicit [`TargetSelection`]).
//! 2. [`collect_units`] walks each target's include closure and gathers the
//!    units it needs, following the same-base-name rule for headers.
//! 3. [`DependencyResolver`] computes the closures, scanning each file once
//!    through [`IncludeScanner`].
//! 4. [`BuildPlan`] records objects and executables and reports which of
//!    them are stale.

mod collect;
mod discover;
mod plan;
mod resolve;
mod scan;
mod stale;

pub use collect::{collect_units, CollectedUnits};
pub use discover::{TargetDiscoverer, TargetSelection};
pub use plan::{BuildPlan, Step, TargetPlan, UnitPlan};
pub use resolve::{DependencyResolver, DependencySet};
pub use scan::{local_includes, strip_line_comment, IncludeScanner};
pub use stale::{check, needs_rebuild, Staleness};
