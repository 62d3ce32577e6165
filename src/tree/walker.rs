//! Filesystem walker for sealed roots.
//!
//! Enumerates a sealed root in post-order (children before their parent) so
//! directory digests can be composed as the walk unwinds, using an explicit
//! frame stack instead of recursion. Children are presented in byte-wise
//! normalized-name order. Nested sealed roots are surfaced as opaque children
//! and never descended into; the orchestrator seals them first as their own
//! operation.

use crate::error::SealError;
use crate::store::MANIFEST_FOLDER_NAME;
use crate::tree::path::{join_rel, normalize_name, ROOT_PATH};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Platform metadata files that never participate in a seal.
const PLATFORM_SKIP_LIST: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    "$RECYCLE.BIN",
    ".Trashes",
    ".Spotlight-V100",
    ".fseventsd",
    "System Volume Information",
];

/// Walker configuration.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Extra entry names to skip, on top of the fixed platform list.
    pub ignore_patterns: Vec<String>,
}

/// How a directory child participates in the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    File,
    Directory,
    /// A subdirectory with its own manifest store; treated as a single opaque
    /// child whose digests come from its own freshly written generation.
    NestedRoot,
}

/// One immediate child of a walked directory, in canonical order.
#[derive(Debug, Clone)]
pub struct ChildRef {
    pub name: String,
    pub kind: ChildKind,
}

/// A regular file observed by the walk.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// A directory and its ordered children, emitted in post-order.
#[derive(Debug, Clone)]
pub struct DirRecord {
    pub rel_path: String,
    pub children: Vec<ChildRef>,
}

/// An entry the seal cannot handle (symlink, special file). Recorded as a
/// note; never affects the exit code.
#[derive(Debug, Clone)]
pub struct UnsupportedRecord {
    pub rel_path: String,
    pub reason: String,
}

/// Complete walk result for one sealed root.
#[derive(Debug, Clone)]
pub struct WalkedTree {
    pub files: Vec<FileRecord>,
    /// Every directory including the root (`.`), children before parents.
    pub dirs_post_order: Vec<DirRecord>,
    pub unsupported: Vec<UnsupportedRecord>,
    /// Nested sealed roots encountered at their boundary: (rel path, abs path).
    pub nested_roots: Vec<(String, PathBuf)>,
}

/// Post-order filesystem walker for one sealed root.
pub struct Walker {
    root: PathBuf,
    nested_boundaries: HashSet<PathBuf>,
    config: WalkerConfig,
}

struct ListedChild {
    name: String,
    kind: ChildKind,
    abs_path: PathBuf,
    size: u64,
    modified: Option<DateTime<Utc>>,
}

struct Frame {
    rel_path: String,
    children: Vec<ChildRef>,
    pending: Vec<ListedChild>,
    next: usize,
}

impl Walker {
    /// Create a walker. `nested_boundaries` is the closed set of nested
    /// sealed roots beneath `root`, computed before the walk.
    pub fn new(root: PathBuf, nested_boundaries: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            root,
            nested_boundaries: nested_boundaries.into_iter().collect(),
            config,
        }
    }

    /// Walk the sealed root.
    pub fn walk(&self) -> Result<WalkedTree, SealError> {
        let mut files = Vec::new();
        let mut dirs_post_order = Vec::new();
        let mut unsupported = Vec::new();
        let mut nested_roots = Vec::new();

        let mut stack = vec![self.open_frame(ROOT_PATH.to_string(), &self.root, &mut unsupported)?];

        // Explicit frame stack: descend and pop outside the frame borrow.
        loop {
            let descend: Option<(String, PathBuf)>;
            {
                let Some(frame) = stack.last_mut() else { break };
                if frame.next < frame.pending.len() {
                    let index = frame.next;
                    frame.next += 1;

                    let child = &frame.pending[index];
                    let child_rel = join_rel(&frame.rel_path, &child.name);
                    match child.kind {
                        ChildKind::File => {
                            files.push(FileRecord {
                                rel_path: child_rel,
                                abs_path: child.abs_path.clone(),
                                size: child.size,
                                modified: child.modified,
                            });
                            continue;
                        }
                        ChildKind::NestedRoot => {
                            debug!(path = %child_rel, "nested sealed root boundary");
                            nested_roots.push((child_rel, child.abs_path.clone()));
                            continue;
                        }
                        ChildKind::Directory => {
                            descend = Some((child_rel, child.abs_path.clone()));
                        }
                    }
                } else {
                    descend = None;
                }
            }

            match descend {
                Some((child_rel, abs)) => {
                    let next_frame = self.open_frame(child_rel, &abs, &mut unsupported)?;
                    stack.push(next_frame);
                }
                None => {
                    if let Some(frame) = stack.pop() {
                        dirs_post_order.push(DirRecord {
                            rel_path: frame.rel_path,
                            children: frame.children,
                        });
                    }
                }
            }
        }

        Ok(WalkedTree {
            files,
            dirs_post_order,
            unsupported,
            nested_roots,
        })
    }

    fn open_frame(
        &self,
        rel_path: String,
        abs_path: &Path,
        unsupported: &mut Vec<UnsupportedRecord>,
    ) -> Result<Frame, SealError> {
        let pending = self.list_children(abs_path, &rel_path, unsupported)?;
        let children = pending
            .iter()
            .map(|c| ChildRef {
                name: c.name.clone(),
                kind: c.kind,
            })
            .collect();
        Ok(Frame {
            rel_path,
            children,
            pending,
            next: 0,
        })
    }

    /// List the immediate children of a directory in canonical order,
    /// applying ignore rules and the nested-root boundary.
    fn list_children(
        &self,
        dir: &Path,
        rel_dir: &str,
        unsupported: &mut Vec<UnsupportedRecord>,
    ) -> Result<Vec<ListedChild>, SealError> {
        let mut children = Vec::new();

        let entries = fs::read_dir(dir).map_err(|e| SealError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| SealError::io(dir, e))?;
            let name = normalize_name(&entry.file_name());

            if self.should_ignore(&name) {
                continue;
            }

            let abs_path = entry.path();
            let rel_path = join_rel(rel_dir, &name);

            // symlink_metadata so links are seen as links, never followed
            let metadata = fs::symlink_metadata(&abs_path).map_err(|e| SealError::io(&abs_path, e))?;
            let file_type = metadata.file_type();

            if file_type.is_symlink() {
                warn!(path = %rel_path, "skipping symbolic link");
                unsupported.push(UnsupportedRecord {
                    rel_path,
                    reason: "symbolic link".to_string(),
                });
                continue;
            }

            if file_type.is_file() {
                children.push(ListedChild {
                    name,
                    kind: ChildKind::File,
                    abs_path,
                    size: metadata.len(),
                    modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                });
            } else if file_type.is_dir() {
                let kind = if self.nested_boundaries.contains(&abs_path) {
                    ChildKind::NestedRoot
                } else {
                    ChildKind::Directory
                };
                children.push(ListedChild {
                    name,
                    kind,
                    abs_path,
                    size: 0,
                    modified: None,
                });
            } else {
                unsupported.push(UnsupportedRecord {
                    rel_path,
                    reason: "special file".to_string(),
                });
            }
        }

        children.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Ok(children)
    }

    fn should_ignore(&self, name: &str) -> bool {
        if name == MANIFEST_FOLDER_NAME {
            return true;
        }
        if PLATFORM_SKIP_LIST.iter().any(|skip| *skip == name) {
            return true;
        }
        self.config.ignore_patterns.iter().any(|p| p == name)
    }
}
