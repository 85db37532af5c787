//! Transitive closure of local includes.
//!
//! The include graph is walked depth-first with an explicit stack, and
//! strongly connected components are found on the way (Tarjan). Every file
//! of one include cycle ends up with the same closure, so the result is
//! complete even for cyclic graphs and each file is scanned at most once.

use cinder_build::{BuildError, Result};
use cinder_common::Layout;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

use crate::scan::IncludeScanner;

/// A file plus every header reachable from it through local includes.
pub type DependencySet = BTreeSet<PathBuf>;

/// Per-run resolver state: scanned includes and finished closures.
#[derive(Debug)]
pub struct DependencyResolver {
    scanner: IncludeScanner,
    closures: FxHashMap<PathBuf, Rc<DependencySet>>,
}

/// A file on the walk stack.
struct Visit {
    path: PathBuf,
    includes: Rc<[PathBuf]>,
    lowlink: usize,
    on_stack: bool,
}

#[derive(Default)]
struct Walk {
    visits: Vec<Visit>,
    ids: FxHashMap<PathBuf, usize>,
    stack: Vec<usize>,
}

impl DependencyResolver {
    pub fn new(layout: Layout) -> Self {
        Self {
            scanner: IncludeScanner::new(layout),
            closures: FxHashMap::default(),
        }
    }

    pub fn layout(&self) -> &Layout {
        self.scanner.layout()
    }

    pub fn scanner(&self) -> &IncludeScanner {
        &self.scanner
    }

    /// DependencySet of `file`, computed on first request.
    pub fn resolve(&mut self, file: &Path) -> Result<Rc<DependencySet>> {
        if let Some(set) = self.closures.get(file) {
            return Ok(Rc::clone(set));
        }
        self.walk(file)?;
        self.closures
            .get(file)
            .cloned()
            .ok_or_else(|| BuildError::Validation(format!("{} was not resolved", file.display())))
    }

    fn walk(&mut self, start: &Path) -> Result<()> {
        let mut walk = Walk::default();
        let root = self.enter(&mut walk, start.to_path_buf())?;
        // (visit id, index of the next include to follow)
        let mut frames = vec![(root, 0usize)];

        while let Some(&(v, edge)) = frames.last() {
            if let Some(header) = walk.visits[v].includes.get(edge).cloned() {
                if let Some(top) = frames.last_mut() {
                    top.1 += 1;
                }
                if self.closures.contains_key(&header) {
                    continue;
                }
                match walk.ids.get(&header) {
                    Some(&w) => {
                        if walk.visits[w].on_stack {
                            walk.visits[v].lowlink = walk.visits[v].lowlink.min(w);
                        }
                    }
                    None => {
                        let w = self.enter(&mut walk, header)?;
                        frames.push((w, 0));
                    }
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                walk.visits[parent].lowlink =
                    walk.visits[parent].lowlink.min(walk.visits[v].lowlink);
            }
            if walk.visits[v].lowlink == v {
                self.close_component(&mut walk, v);
            }
        }
        Ok(())
    }

    /// Scan `path` and push it on the walk stack. The file is marked as
    /// visited before any of its includes are followed.
    fn enter(&mut self, walk: &mut Walk, path: PathBuf) -> Result<usize> {
        let includes = self.scanner.includes(&path)?;
        let id = walk.visits.len();
        walk.ids.insert(path.clone(), id);
        walk.visits.push(Visit {
            path,
            includes,
            lowlink: id,
            on_stack: true,
        });
        walk.stack.push(id);
        Ok(id)
    }

    /// Pop the component rooted at `root` and give all its files one closure.
    ///
    /// Includes leaving the component point at files whose closures are
    /// already final.
    fn close_component(&mut self, walk: &mut Walk, root: usize) {
        let mut members = Vec::new();
        while let Some(w) = walk.stack.pop() {
            walk.visits[w].on_stack = false;
            members.push(w);
            if w == root {
                break;
            }
        }

        let mut set = DependencySet::new();
        for &m in &members {
            set.insert(walk.visits[m].path.clone());
            for header in walk.visits[m].includes.iter() {
                if let Some(done) = self.closures.get(header) {
                    set.extend(done.iter().cloned());
                }
            }
        }

        if members.len() > 1 {
            debug!(
                files = members.len(),
                root = %walk.visits[root].path.display(),
                "include cycle"
            );
        }

        let set = Rc::new(set);
        for &m in &members {
            self.closures
                .insert(walk.visits[m].path.clone(), Rc::clone(&set));
        }
    }
}
