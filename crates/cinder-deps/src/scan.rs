//! Local include scanning.
//!
//! Detection is line-oriented: a line counts when it is `#include "name"`
//! with nothing but whitespace before the `#`. Angle-bracket includes are
//! never looked at.

use cinder_build::{BuildError, Result};
use cinder_common::Layout;
use indexmap::IndexSet;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::sync::LazyLock;
use tracing::debug;

static LOCAL_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#\s*include\s*"([^"]+)""#).expect("include pattern is valid")
});

/// Text of a project file. Bytes that are not UTF-8 (say, a Latin-1 name in
/// a comment) are replaced; matching only looks at ASCII.
pub fn read_source(layout: &Layout, file: &Path) -> Result<String> {
    let bytes = std::fs::read(layout.on_disk(file)).map_err(|e| BuildError::io(file, e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Drop a trailing `//` comment from a line.
pub fn strip_line_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Header names referenced by local includes in `text`, first occurrence first.
///
/// The pattern is anchored at `#` and stops at the closing quote, so a
/// commented-out include never matches and a trailing comment is ignored.
pub fn local_includes(text: &str) -> Vec<String> {
    let names: IndexSet<&str> = text
        .lines()
        .filter_map(|line| LOCAL_INCLUDE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
        .collect();
    names.into_iter().map(str::to_string).collect()
}

/// `./util.h` and `util.h` name the same file.
fn normalize(name: &str) -> PathBuf {
    Path::new(name)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Reads files once and remembers the headers each one includes.
#[derive(Debug)]
pub struct IncludeScanner {
    layout: Layout,
    cache: FxHashMap<PathBuf, Rc<[PathBuf]>>,
    reads: usize,
}

impl IncludeScanner {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            cache: FxHashMap::default(),
            reads: 0,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of files read from disk so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Headers locally included by `file` (one level).
    ///
    /// Every returned header exists; a reference to a missing file fails with
    /// [`BuildError::MissingHeader`] naming both files.
    pub fn includes(&mut self, file: &Path) -> Result<Rc<[PathBuf]>> {
        if let Some(headers) = self.cache.get(file) {
            return Ok(Rc::clone(headers));
        }

        let text = read_source(&self.layout, file)?;
        self.reads += 1;

        let mut headers = Vec::new();
        for name in local_includes(&text) {
            let header = normalize(&name);
            if !self.layout.exists(&header) {
                return Err(BuildError::MissingHeader {
                    header,
                    includer: file.to_path_buf(),
                });
            }
            headers.push(header);
        }
        debug!(file = %file.display(), headers = headers.len(), "scanned local includes");

        let headers: Rc<[PathBuf]> = headers.into();
        self.cache.insert(file.to_path_buf(), Rc::clone(&headers));
        Ok(headers)
    }
}
