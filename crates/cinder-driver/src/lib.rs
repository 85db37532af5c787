//! Build driver: turns a project directory into up-to-date executables.

mod clean;
mod executor;
mod toolchain;

pub use clean::clean;
pub use executor::{BuildReport, Executor};
pub use toolchain::{find_compiler, CxxToolchain, Toolchain};

use cinder_build::{BuildConfig, BuildError, CompileCommand, CompileCommands, Result};
use cinder_common::{Layout, TargetName};
use cinder_deps::{BuildPlan, DependencyResolver, DependencySet, TargetDiscoverer, TargetSelection};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Driver that orchestrates one project directory.
///
/// Each operation starts from fresh resolver state, so file changes between
/// calls are always picked up.
#[derive(Debug, Clone)]
pub struct Driver {
    root: PathBuf,
    config: BuildConfig,
}

impl Driver {
    pub fn new(root: impl Into<PathBuf>, config: BuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            root: root.into(),
            config,
        })
    }

    /// Driver for `root` configured from its `cinder.toml` and the environment.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut config = BuildConfig::load(&root)?;
        config.apply_env();
        Self::new(root, config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BuildConfig {
        &mut self.config
    }

    pub fn layout(&self) -> Layout {
        self.config.layout(&self.root)
    }

    /// Target names for `selection`.
    pub fn targets(&self, selection: &TargetSelection) -> Result<Vec<TargetName>> {
        let discoverer = TargetDiscoverer::new(&self.config.layout.entry_point)?;
        discoverer.select(&self.layout(), selection)
    }

    /// Scan the project and plan `selection`. Nothing is built.
    pub fn plan(&self, selection: &TargetSelection) -> Result<BuildPlan> {
        let targets = self.targets(selection)?;
        let mut resolver = DependencyResolver::new(self.layout());
        BuildPlan::new(&mut resolver, &targets)
    }

    /// The C++ toolchain described by the configuration.
    pub fn toolchain(&self) -> Result<CxxToolchain> {
        CxxToolchain::new(&self.config.compiler, &self.root)
    }

    /// Bring the artifacts of `plan` up to date with `toolchain`.
    pub fn build<T: Toolchain>(&self, plan: &BuildPlan, toolchain: &T) -> Result<BuildReport> {
        Executor::new(toolchain).jobs(self.config.jobs()).run(plan)
    }

    /// [`Driver::build`], creating the toolchain only when something is stale.
    ///
    /// An up-to-date or empty plan succeeds without looking for a compiler.
    pub fn build_if_stale<T, F>(&self, plan: &BuildPlan, toolchain: F) -> Result<BuildReport>
    where
        T: Toolchain,
        F: FnOnce() -> Result<T>,
    {
        if plan.stale_steps().is_empty() {
            debug!("all artifacts up to date");
            return Ok(BuildReport {
                up_to_date: plan.artifacts().len(),
                ..BuildReport::default()
            });
        }
        let toolchain = toolchain()?;
        self.build(plan, &toolchain)
    }

    /// DependencySet of one file, given relative to the project or absolute.
    pub fn dependencies(&self, file: &Path) -> Result<DependencySet> {
        let file = file.strip_prefix(&self.root).unwrap_or(file);
        let mut resolver = DependencyResolver::new(self.layout());
        let set = resolver.resolve(file)?;
        Ok(DependencySet::clone(&set))
    }

    /// compile_commands.json entries for every unit of `plan`.
    pub fn compile_commands(&self, plan: &BuildPlan, toolchain: &CxxToolchain) -> Result<CompileCommands> {
        let directory =
            std::fs::canonicalize(&self.root).map_err(|e| BuildError::io(&self.root, e))?;
        let commands = plan
            .units()
            .map(|unit| {
                CompileCommand::new(
                    &directory,
                    &unit.unit,
                    toolchain.compile_args(&unit.unit, &unit.object),
                    &unit.object,
                )
            })
            .collect();
        Ok(CompileCommands::new(commands))
    }

    /// Write the entries for `plan` to `path`, keeping any entries an
    /// existing database there has for other files.
    pub fn write_compile_commands(
        &self,
        plan: &BuildPlan,
        toolchain: &CxxToolchain,
        path: &Path,
    ) -> Result<CompileCommands> {
        let fresh = self.compile_commands(plan, toolchain)?;
        let database = if path.is_file() {
            let mut existing = CompileCommands::from_file(path)?;
            existing.update(fresh);
            existing
        } else {
            fresh
        };
        database.write_to_file(path)?;
        Ok(database)
    }
}
