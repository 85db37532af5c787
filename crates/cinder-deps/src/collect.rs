//! Which compilation units make up a target.
//!
//! A unit is part of a target when it is the root, when it appears in the
//! closure of a unit already in the target, or when a header in such a
//! closure has a same-named unit on disk (`util.h` pulls in `util.cpp`).

use cinder_build::Result;
use cinder_common::Node;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::resolve::{DependencyResolver, DependencySet};

/// Units backing one target and the files they depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedUnits {
    /// Root unit first, then units in discovery order.
    pub units: IndexSet<PathBuf>,
    /// Union of every unit's DependencySet.
    pub dependencies: DependencySet,
}

/// Collect the units reachable from `root`.
pub fn collect_units(resolver: &mut DependencyResolver, root: &Path) -> Result<CollectedUnits> {
    let mut units = IndexSet::new();
    let mut dependencies = DependencySet::new();
    let mut pending = vec![root.to_path_buf()];
    units.insert(root.to_path_buf());

    while let Some(unit) = pending.pop() {
        let closure = resolver.resolve(&unit)?;
        let layout = resolver.layout();

        for file in closure.iter() {
            let candidate = match layout.classify(file) {
                Node::Unit(path) => path,
                Node::Header(header) => {
                    let sibling = layout.sibling_unit(&header);
                    if !layout.exists(&sibling) {
                        continue;
                    }
                    sibling
                }
            };
            if units.insert(candidate.clone()) {
                debug!(unit = %candidate.display(), via = %file.display(), "pulled in unit");
                pending.push(candidate);
            }
        }
        dependencies.extend(closure.iter().cloned());
    }

    Ok(CollectedUnits {
        units,
        dependencies,
    })
}
