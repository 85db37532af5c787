//! Removal of generated artifacts.

use cinder_build::{BuildError, Result};
use cinder_deps::BuildPlan;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::info;

/// Delete every object file and executable of `plan` that exists on disk.
///
/// Returns the removed artifacts, relative to the project directory.
pub fn clean(plan: &BuildPlan) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for artifact in plan.artifacts() {
        let path = plan.layout().on_disk(&artifact);
        if !path.is_file() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(artifact = %artifact.display(), "removed");
                removed.push(artifact);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::io(artifact, e)),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_common::Layout;
    use cinder_deps::DependencyResolver;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_only_existing_artifacts() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path();
        std::fs::write(root.join("main.cpp"), "#include \"util.h\"\nint main() {}\n").unwrap();
        std::fs::write(root.join("util.h"), "").unwrap();
        std::fs::write(root.join("util.cpp"), "#include \"util.h\"\n").unwrap();
        std::fs::write(root.join("main.o"), "").unwrap();
        std::fs::write(root.join("main"), "").unwrap();
        std::fs::write(root.join("unrelated.o"), "").unwrap();

        let mut resolver = DependencyResolver::new(Layout::new(root));
        let plan = BuildPlan::new(&mut resolver, &["main".into()]).unwrap();

        let removed = clean(&plan).unwrap();
        assert_eq!(removed, vec![PathBuf::from("main.o"), PathBuf::from("main")]);
        assert!(!root.join("main.o").exists());
        assert!(!root.join("main").exists());
        assert!(root.join("unrelated.o").exists());
        assert!(root.join("main.cpp").exists());

        assert!(clean(&plan).unwrap().is_empty());
    }
}
