use cinder_build::{CompileCommands, ConfigOverrides};
use cinder_common::Diagnostic;
use cinder_deps::{BuildPlan, TargetSelection};
use cinder_driver::{BuildReport, Driver};
use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cinder")]
#[command(author, version, about = "Incremental builds for C++ projects without build files")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project directory
    #[arg(short = 'C', long = "directory", global = true, default_value = ".")]
    directory: PathBuf,

    /// Maximum concurrent compiles (default: one per CPU)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// C++ compiler to use
    #[arg(long, global = true)]
    cxx: Option<PathBuf>,

    /// C++ standard (e.g. c++17)
    #[arg(long, global = true)]
    std: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build targets, recompiling only what changed
    Build {
        /// Targets to build (default: every unit defining `main`)
        targets: Vec<String>,
    },

    /// Print the steps a build would run, without running them
    Plan {
        /// Targets to plan
        targets: Vec<String>,
    },

    /// Remove object files and executables
    Clean {
        /// Targets to clean
        targets: Vec<String>,
    },

    /// Print every file a source file depends on
    Deps {
        /// Source file or header
        file: PathBuf,
    },

    /// List discovered targets and their units
    Targets,

    /// Write compile_commands.json
    Compdb {
        /// Output file path (default: compile_commands.json in the project)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let mut driver = Driver::load(&cli.directory)?;
    driver.config_mut().apply_overrides(&ConfigOverrides {
        jobs: cli.jobs,
        cxx: cli.cxx,
        std: cli.std,
    })?;

    match cli.command.unwrap_or(Commands::Build { targets: Vec::new() }) {
        Commands::Build { targets } => {
            let plan = plan_targets(&driver, targets)?;
            let report = driver.build_if_stale(&plan, || driver.toolchain())?;
            println!("{}", summary(&report));
        }

        Commands::Plan { targets } => {
            let plan = plan_targets(&driver, targets)?;
            let steps = plan.stale_steps();
            if steps.is_empty() {
                println!("nothing to do");
            }
            for step in steps {
                println!("{}", step);
            }
        }

        Commands::Clean { targets } => {
            let plan = plan_targets(&driver, targets)?;
            let removed = cinder_driver::clean(&plan)?;
            println!("removed {} file(s)", removed.len());
        }

        Commands::Deps { file } => {
            for dep in driver.dependencies(&file)? {
                println!("{}", dep.display());
            }
        }

        Commands::Targets => {
            let plan = plan_targets(&driver, Vec::new())?;
            for target in plan.targets() {
                let units: Vec<_> = target.units.iter().map(|u| u.display().to_string()).collect();
                println!("{}: {}", target.name, units.join(" "));
            }
        }

        Commands::Compdb { output } => {
            let plan = plan_targets(&driver, Vec::new())?;
            let toolchain = driver.toolchain()?;
            let path = output.unwrap_or_else(|| driver.root().join(CompileCommands::FILE_NAME));
            let commands = driver.write_compile_commands(&plan, &toolchain, &path)?;
            info!(path = %path.display(), entries = commands.commands().len(), "wrote compilation database");
        }
    }

    Ok(())
}

/// Plan `targets`, discovering them when none are named.
fn plan_targets(driver: &Driver, targets: Vec<String>) -> Result<BuildPlan> {
    let selection = TargetSelection::from_names(targets);
    let plan = driver.plan(&selection)?;
    if plan.targets().is_empty() && selection == TargetSelection::Discover {
        let warning = Diagnostic::warning("no targets found")
            .with_code("cinder::no_targets")
            .with_help(format!(
                "a target is a top-level .{} file that defines `{}`",
                driver.config().layout.source_ext,
                driver.config().layout.entry_point
            ));
        eprintln!("{:?}", miette::Report::new(warning));
    }
    Ok(plan)
}

fn summary(report: &BuildReport) -> String {
    if report.is_noop() {
        return format!("up to date ({} artifact(s))", report.up_to_date);
    }
    format!(
        "compiled {} unit(s), linked {} target(s), {} up to date",
        report.compiled.len(),
        report.linked.len(),
        report.up_to_date
    )
}
