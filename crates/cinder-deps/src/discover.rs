//! Target discovery: which top-level units define an entry point.

use cinder_build::{BuildError, Result};
use cinder_common::{Layout, TargetName};
use indexmap::IndexSet;
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::scan::{read_source, strip_line_comment};

/// Where the list of targets comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetSelection {
    /// Every unit that defines the entry point.
    #[default]
    Discover,
    /// Exactly these targets; discovery is skipped.
    Explicit(Vec<String>),
}

impl TargetSelection {
    /// Explicit when `names` is non-empty, discovery otherwise.
    pub fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() {
            TargetSelection::Discover
        } else {
            TargetSelection::Explicit(names)
        }
    }
}

/// Finds units whose text defines the entry-point function.
#[derive(Debug, Clone)]
pub struct TargetDiscoverer {
    entry: Regex,
    /// `<entry> (` at the start of a line, return type on the line above.
    bare_entry: Regex,
}

impl TargetDiscoverer {
    /// Discoverer for the entry symbol `entry_point` (usually `main`).
    pub fn new(entry_point: &str) -> Result<Self> {
        // One or more return-type words, then `<entry> (`.
        let pattern = format!(
            r#"^\s*((?:[\w:<>,*&"]+\s+)+)\**\s*{}\s*\("#,
            regex::escape(entry_point)
        );
        let bare = format!(r#"^\s*{}\s*\("#, regex::escape(entry_point));
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| BuildError::Validation(format!("bad entry point pattern: {}", e)))
        };
        Ok(Self {
            entry: compile(&pattern)?,
            bare_entry: compile(&bare)?,
        })
    }

    /// Whether any comment-stripped line of `text` defines the entry point.
    ///
    /// A line starting with `<entry> (` counts too, unless it ends in `;`
    /// (a call or a declaration).
    pub fn has_entry_point(&self, text: &str) -> bool {
        text.lines().map(strip_line_comment).any(|line| {
            let typed = self.entry.captures(line).is_some_and(|caps| {
                caps.get(1)
                    .and_then(|m| m.as_str().split_whitespace().next())
                    .is_some_and(|first| first != "return")
            });
            typed || (self.bare_entry.is_match(line) && !line.trim_end().ends_with(';'))
        })
    }

    /// Target names of all entry-point units directly in the project
    /// directory, sorted by file name. Subdirectories are not searched.
    pub fn discover(&self, layout: &Layout) -> Result<Vec<TargetName>> {
        let root = layout.root();
        let entries = std::fs::read_dir(root).map_err(|e| BuildError::io(root, e))?;

        let mut units = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BuildError::io(root, e))?;
            let unit = PathBuf::from(entry.file_name());
            if layout.is_unit(&unit) && entry.path().is_file() {
                units.push(unit);
            }
        }
        units.sort();

        let mut targets = Vec::new();
        for unit in units {
            let text = read_source(layout, &unit)?;
            if !self.has_entry_point(&text) {
                continue;
            }
            if let Some(name) = layout.target_name(&unit) {
                debug!(unit = %unit.display(), "found entry point");
                targets.push(name);
            }
        }

        if targets.is_empty() {
            warn!(dir = %root.display(), "no unit defines an entry point; nothing to link");
        }
        Ok(targets)
    }

    /// Resolve a selection into target names.
    ///
    /// Explicit names are taken as given (a trailing source suffix is
    /// dropped, duplicates are removed) but must have a root unit.
    pub fn select(&self, layout: &Layout, selection: &TargetSelection) -> Result<Vec<TargetName>> {
        match selection {
            TargetSelection::Discover => self.discover(layout),
            TargetSelection::Explicit(names) => {
                let mut targets = IndexSet::new();
                for name in names {
                    let name = layout.normalize_target(name);
                    let unit = layout.unit_for(name);
                    if !layout.exists(&unit) {
                        return Err(BuildError::TargetNotFound {
                            name: name.to_string(),
                            unit,
                        });
                    }
                    targets.insert(TargetName::new(name));
                }
                Ok(targets.into_iter().collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn discoverer() -> TargetDiscoverer {
        TargetDiscoverer::new("main").unwrap()
    }

    #[test]
    fn test_entry_point_signatures() {
        let d = discoverer();
        assert!(d.has_entry_point("int main (int argc, char* argv[])\n{\n}\n"));
        assert!(d.has_entry_point("int main() { return 0; }"));
        assert!(d.has_entry_point("  auto main() -> int {}"));
        assert!(d.has_entry_point("static int\tmain(void)"));
        assert!(d.has_entry_point("extern \"C\" int main(int, char**)"));
        assert!(d.has_entry_point("int\nmain (int argc, char *argv[])\n{\n  return 0;\n}\n"));
        assert!(d.has_entry_point("int\nmain(void) // entry\n{\n}\n"));
    }

    #[test]
    fn test_not_entry_points() {
        let d = discoverer();
        assert!(!d.has_entry_point("// int main() {}\n"));
        assert!(!d.has_entry_point("int x; // example: int main() {}\n"));
        assert!(!d.has_entry_point("int domain(int);\n"));
        assert!(!d.has_entry_point("int main_loop();\n"));
        assert!(!d.has_entry_point("    return main();\n"));
        assert!(!d.has_entry_point("main();\n"));
        assert!(!d.has_entry_point("  main (argc, argv);  \n"));
        assert!(!d.has_entry_point("int domain\n(int);\n"));
    }

    #[test]
    fn test_custom_entry_symbol() {
        let d = TargetDiscoverer::new("wmain").unwrap();
        assert!(d.has_entry_point("int wmain(int argc, wchar_t** argv)"));
        assert!(!d.has_entry_point("int main()"));
    }

    #[test]
    fn test_discover_top_level_only() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path();
        std::fs::write(root.join("zeta.cpp"), "int main() {}\n").unwrap();
        std::fs::write(root.join("alpha.cpp"), "int main(int argc, char** argv) {}\n").unwrap();
        std::fs::write(root.join("util.cpp"), "int add(int a, int b) { return a + b; }\n").unwrap();
        std::fs::write(root.join("notes.txt"), "int main() {}\n").unwrap();
        std::fs::create_dir(root.join("sub")).unwrap();
        std::fs::write(root.join("sub").join("nested.cpp"), "int main() {}\n").unwrap();

        let targets = discoverer().discover(&Layout::new(root)).unwrap();
        assert_eq!(targets, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_discover_reads_non_utf8_units() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(
            dir.path().join("cafe.cpp"),
            b"// caf\xe9 menu\nint main() { return 0; }\n",
        )
        .unwrap();
        let targets = discoverer().discover(&Layout::new(dir.path())).unwrap();
        assert_eq!(targets, vec!["cafe"]);
    }

    #[test]
    fn test_discover_nothing_is_not_an_error() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("lib.cpp"), "void f() {}\n").unwrap();
        let targets = discoverer().discover(&Layout::new(dir.path())).unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn test_explicit_selection_skips_discovery() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        // No entry point: discovery would find nothing.
        std::fs::write(dir.path().join("tool.cpp"), "void f() {}\n").unwrap();
        let layout = Layout::new(dir.path());

        let selection = TargetSelection::from_names(vec!["tool.cpp".into(), "tool".into()]);
        let targets = discoverer().select(&layout, &selection).unwrap();
        assert_eq!(targets, vec!["tool"]);

        let missing = TargetSelection::Explicit(vec!["nope".into()]);
        assert!(matches!(
            discoverer().select(&layout, &missing),
            Err(BuildError::TargetNotFound { .. })
        ));
    }

    #[test]
    fn test_from_names() {
        assert_eq!(TargetSelection::from_names(vec![]), TargetSelection::Discover);
    }
}
