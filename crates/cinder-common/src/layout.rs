use smol_str::SmolStr;
use std::path::{Path, PathBuf};

/// Name of a build target: its root unit's file name without the source suffix.
pub type TargetName = SmolStr;

/// A file taking part in the include graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    /// A compilation unit (carries the source suffix).
    Unit(PathBuf),
    /// Anything reached through a local include that is not a unit.
    Header(PathBuf),
}

impl Node {
    pub fn path(&self) -> &Path {
        match self {
            Node::Unit(path) | Node::Header(path) => path,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Node::Unit(_))
    }
}

/// Naming rules of a flat project directory.
///
/// Every path handed out by a `Layout` is relative to [`Layout::root`];
/// use [`Layout::on_disk`] to get the location on the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    source_ext: String,
    object_ext: String,
    executable_ext: String,
}

impl Layout {
    pub const DEFAULT_SOURCE_EXT: &'static str = "cpp";
    pub const DEFAULT_OBJECT_EXT: &'static str = "o";

    /// Create a layout rooted at `root` with the default suffixes.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            source_ext: Self::DEFAULT_SOURCE_EXT.to_string(),
            object_ext: Self::DEFAULT_OBJECT_EXT.to_string(),
            executable_ext: String::new(),
        }
    }

    pub fn with_source_ext(mut self, ext: impl Into<String>) -> Self {
        self.source_ext = ext.into();
        self
    }

    pub fn with_object_ext(mut self, ext: impl Into<String>) -> Self {
        self.object_ext = ext.into();
        self
    }

    pub fn with_executable_ext(mut self, ext: impl Into<String>) -> Self {
        self.executable_ext = ext.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_ext(&self) -> &str {
        &self.source_ext
    }

    /// Location of a project-relative path on the filesystem.
    pub fn on_disk(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.on_disk(path).is_file()
    }

    pub fn is_unit(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.source_ext)
    }

    /// Tag a path as a unit or a header based on its suffix.
    pub fn classify(&self, path: &Path) -> Node {
        if self.is_unit(path) {
            Node::Unit(path.to_path_buf())
        } else {
            Node::Header(path.to_path_buf())
        }
    }

    /// The unit a header would be implemented in: same base name, source suffix.
    pub fn sibling_unit(&self, header: &Path) -> PathBuf {
        header.with_extension(&self.source_ext)
    }

    pub fn unit_for(&self, target: &str) -> PathBuf {
        PathBuf::from(format!("{}.{}", target, self.source_ext))
    }

    pub fn object_for(&self, unit: &Path) -> PathBuf {
        unit.with_extension(&self.object_ext)
    }

    pub fn executable_for(&self, target: &str) -> PathBuf {
        if self.executable_ext.is_empty() {
            PathBuf::from(target)
        } else {
            PathBuf::from(format!("{}.{}", target, self.executable_ext))
        }
    }

    /// Target name for a unit, if it is one.
    pub fn target_name(&self, unit: &Path) -> Option<TargetName> {
        if !self.is_unit(unit) {
            return None;
        }
        unit.file_stem()
            .and_then(|s| s.to_str())
            .map(TargetName::new)
    }

    /// Accept `main` as well as `main.cpp` when a target is named by hand.
    pub fn normalize_target<'a>(&self, name: &'a str) -> &'a str {
        name.strip_suffix(self.source_ext.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(name)
    }
}
