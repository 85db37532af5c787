//! Modification-time staleness checks.
//!
//! Timestamps are read from disk on every call; nothing is cached, so a check
//! made after a compile step sees the freshly written object files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Outcome of comparing an artifact against its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// The artifact does not exist.
    Missing,
    /// A dependency is newer than the artifact, or does not exist yet.
    Outdated { newer: PathBuf },
    /// The artifact is at least as new as every dependency.
    UpToDate,
}

impl Staleness {
    pub fn needs_rebuild(&self) -> bool {
        !matches!(self, Staleness::UpToDate)
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::Missing => write!(f, "missing"),
            Staleness::Outdated { newer } => write!(f, "older than {}", newer.display()),
            Staleness::UpToDate => write!(f, "up to date"),
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Compare `artifact` with `dependencies` (filesystem paths).
pub fn check<I, P>(artifact: &Path, dependencies: I) -> Staleness
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let Some(built) = modified(artifact) else {
        return Staleness::Missing;
    };
    for dep in dependencies {
        let dep = dep.as_ref();
        match modified(dep) {
            Some(time) if time <= built => {}
            _ => {
                return Staleness::Outdated {
                    newer: dep.to_path_buf(),
                }
            }
        }
    }
    Staleness::UpToDate
}

/// True when `artifact` is absent or some dependency is strictly newer.
pub fn needs_rebuild<I, P>(artifact: &Path, dependencies: I) -> bool
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    check(artifact, dependencies).needs_rebuild()
}
