//! Build plans: targets, their units, and the artifacts they produce.

use cinder_build::Result;
use cinder_common::{Layout, TargetName};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::collect::collect_units;
use crate::resolve::{DependencyResolver, DependencySet};
use crate::stale::{self, Staleness};

/// One compilation unit and its object file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPlan {
    pub unit: PathBuf,
    pub object: PathBuf,
    /// The unit's DependencySet (includes the unit itself).
    pub dependencies: DependencySet,
}

/// One executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlan {
    pub name: TargetName,
    pub root: PathBuf,
    /// Root unit first.
    pub units: IndexSet<PathBuf>,
    /// Object files, in the same order as `units`.
    pub objects: Vec<PathBuf>,
    pub executable: PathBuf,
    /// Union of the DependencySets of all units.
    pub dependencies: DependencySet,
}

/// An artifact that has to be (re)built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Compile {
        unit: PathBuf,
        object: PathBuf,
    },
    Link {
        target: TargetName,
        objects: Vec<PathBuf>,
        executable: PathBuf,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Compile { unit, object } => {
                write!(f, "compile {} -> {}", unit.display(), object.display())
            }
            Step::Link {
                objects,
                executable,
                ..
            } => {
                let objects: Vec<_> = objects.iter().map(|o| o.display().to_string()).collect();
                write!(f, "link {} -> {}", objects.join(" "), executable.display())
            }
        }
    }
}

/// Everything a run knows before touching the toolchain.
///
/// All paths are relative to the layout's root.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    layout: Layout,
    targets: Vec<TargetPlan>,
    units: IndexMap<PathBuf, UnitPlan>,
}

impl BuildPlan {
    /// Plan the given targets. Scanning errors (such as a missing header)
    /// surface here, before anything is compiled.
    pub fn new(resolver: &mut DependencyResolver, targets: &[TargetName]) -> Result<Self> {
        let layout = resolver.layout().clone();
        let mut plans = Vec::with_capacity(targets.len());
        let mut units: IndexMap<PathBuf, UnitPlan> = IndexMap::new();

        for name in targets {
            let root = layout.unit_for(name);
            let collected = collect_units(resolver, &root)?;

            for unit in &collected.units {
                if units.contains_key(unit) {
                    continue;
                }
                let closure = resolver.resolve(unit)?;
                let dependencies = DependencySet::clone(&closure);
                units.insert(
                    unit.clone(),
                    UnitPlan {
                        unit: unit.clone(),
                        object: layout.object_for(unit),
                        dependencies,
                    },
                );
            }

            let objects = collected
                .units
                .iter()
                .map(|unit| layout.object_for(unit))
                .collect();
            debug!(name = %name, units = collected.units.len(), "planned target");

            plans.push(TargetPlan {
                name: name.clone(),
                root,
                units: collected.units,
                objects,
                executable: layout.executable_for(name),
                dependencies: collected.dependencies,
            });
        }

        Ok(Self {
            layout,
            targets: plans,
            units,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn targets(&self) -> &[TargetPlan] {
        &self.targets
    }

    pub fn unit(&self, unit: &Path) -> Option<&UnitPlan> {
        self.units.get(unit)
    }

    /// Every unit of every target, each once.
    pub fn units(&self) -> impl Iterator<Item = &UnitPlan> {
        self.units.values()
    }

    /// Object file vs the unit's DependencySet, read from disk now.
    pub fn unit_staleness(&self, unit: &UnitPlan) -> Staleness {
        stale::check(
            &self.layout.on_disk(&unit.object),
            unit.dependencies.iter().map(|d| self.layout.on_disk(d)),
        )
    }

    /// Executable vs the target's object files, read from disk now.
    pub fn link_staleness(&self, target: &TargetPlan) -> Staleness {
        stale::check(
            &self.layout.on_disk(&target.executable),
            target.objects.iter().map(|o| self.layout.on_disk(o)),
        )
    }

    /// The artifacts a build would produce right now, units before the
    /// targets that need them. A target is relinked when any of its units
    /// is recompiled.
    pub fn stale_steps(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut checked: FxHashSet<&Path> = FxHashSet::default();
        let mut recompiled: FxHashSet<&Path> = FxHashSet::default();

        for target in &self.targets {
            for unit in target.units.iter().filter_map(|u| self.unit(u)) {
                if !checked.insert(unit.unit.as_path()) {
                    continue;
                }
                if self.unit_staleness(unit).needs_rebuild() {
                    recompiled.insert(unit.unit.as_path());
                    steps.push(Step::Compile {
                        unit: unit.unit.clone(),
                        object: unit.object.clone(),
                    });
                }
            }

            let relink = target
                .units
                .iter()
                .any(|u| recompiled.contains(u.as_path()))
                || self.link_staleness(target).needs_rebuild();
            if relink {
                steps.push(Step::Link {
                    target: target.name.clone(),
                    objects: target.objects.clone(),
                    executable: target.executable.clone(),
                });
            }
        }
        steps
    }

    /// Every object file and executable of the plan.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        self.units
            .values()
            .map(|u| u.object.clone())
            .chain(self.targets.iter().map(|t| t.executable.clone()))
            .collect()
    }
}
