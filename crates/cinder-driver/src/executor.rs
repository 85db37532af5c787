//! Runs a [`BuildPlan`] against a [`Toolchain`].
//!
//! Targets are handled one after another. A target's stale units compile on
//! a bounded worker pool; its link starts only after all of them succeeded.
//! Staleness is read from disk at the moment each step is considered.

use cinder_build::{BuildError, Result};
use cinder_common::TargetName;
use cinder_deps::{BuildPlan, UnitPlan};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::toolchain::Toolchain;

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Units compiled, in the order their compiles were scheduled.
    pub compiled: Vec<PathBuf>,
    /// Targets linked.
    pub linked: Vec<TargetName>,
    /// Artifacts that were already up to date.
    pub up_to_date: usize,
}

impl BuildReport {
    pub fn is_noop(&self) -> bool {
        self.compiled.is_empty() && self.linked.is_empty()
    }
}

/// Drives compile and link steps.
pub struct Executor<'t, T: Toolchain> {
    toolchain: &'t T,
    jobs: usize,
}

impl<'t, T: Toolchain> Executor<'t, T> {
    pub fn new(toolchain: &'t T) -> Self {
        Self { toolchain, jobs: 1 }
    }

    /// Allow up to `jobs` concurrent compiles (at least one).
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Bring every artifact of `plan` up to date.
    ///
    /// The first failing compile or link aborts the run.
    pub fn run(&self, plan: &BuildPlan) -> Result<BuildReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| BuildError::WorkerPool {
                jobs: self.jobs,
                reason: e.to_string(),
            })?;

        let mut report = BuildReport::default();
        let mut checked: FxHashSet<PathBuf> = FxHashSet::default();
        let mut recompiled: FxHashSet<PathBuf> = FxHashSet::default();

        for target in plan.targets() {
            let mut stale: Vec<&UnitPlan> = Vec::new();
            for unit in target.units.iter().filter_map(|u| plan.unit(u)) {
                // A unit shared between targets is considered once per run.
                if !checked.insert(unit.unit.clone()) {
                    continue;
                }
                let staleness = plan.unit_staleness(unit);
                if staleness.needs_rebuild() {
                    debug!(unit = %unit.unit.display(), reason = %staleness, "unit is stale");
                    stale.push(unit);
                } else {
                    debug!(object = %unit.object.display(), "up to date");
                    report.up_to_date += 1;
                }
            }

            pool.install(|| {
                stale
                    .par_iter()
                    .map(|unit| self.compile(unit))
                    .collect::<Result<Vec<()>>>()
            })?;
            for unit in &stale {
                report.compiled.push(unit.unit.clone());
                recompiled.insert(unit.unit.clone());
            }

            let staleness = plan.link_staleness(target);
            let units_changed = target.units.iter().any(|u| recompiled.contains(u));
            if units_changed || staleness.needs_rebuild() {
                info!(name = %target.name, executable = %target.executable.display(), "linking");
                self.toolchain.link(&target.objects, &target.executable)?;
                report.linked.push(target.name.clone());
            } else {
                debug!(executable = %target.executable.display(), "up to date");
                report.up_to_date += 1;
            }
        }

        Ok(report)
    }

    fn compile(&self, unit: &UnitPlan) -> Result<()> {
        info!(unit = %unit.unit.display(), "compiling");
        self.toolchain.compile(&unit.unit, &unit.object)
    }
}
