//! Radix tree node implementation.
//!
//! The route registry stores paths in a radix tree keyed by path segment.
//! Static segments match before `{param}` segments, which match before a
//! trailing `*name` catch-all.

use crate::method_table::MethodTable;
use crate::params::Params;

/// Kind of path segment in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal path segment (e.g. `users`).
    Static,
    /// Named parameter (e.g. `{id}`).
    Param(String),
    /// Trailing catch-all (e.g. `*rest`); must be the last segment.
    CatchAll(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    segment: String,
    kind: SegmentKind,
    table: Option<MethodTable<T>>,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    catch_all_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            table: None,
            static_children: Vec::new(),
            param_child: None,
            catch_all_child: None,
        }
    }

    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Inserts a path into the tree, merging method tables on collision.
    pub fn insert(&mut self, path: &str, table: MethodTable<T>) {
        let segments = parse_path(path);
        self.insert_segments(&segments, table);
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], table: MethodTable<T>) {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            if let Some(existing) = &mut self.table {
                existing.merge(table);
            } else {
                self.table = Some(table);
            }
            return;
        };

        match kind {
            SegmentKind::Static => {
                if let Some(child) = self
                    .static_children
                    .iter_mut()
                    .find(|c| c.segment == *segment)
                {
                    child.insert_segments(remaining, table);
                } else {
                    let mut child = Node::new(segment.clone(), SegmentKind::Static);
                    child.insert_segments(remaining, table);
                    self.static_children.push(child);
                    self.static_children
                        .sort_by(|a, b| a.segment.cmp(&b.segment));
                }
            }
            SegmentKind::Param(name) => {
                let child = self.param_child.get_or_insert_with(|| {
                    Box::new(Node::new(segment.clone(), SegmentKind::Param(name.clone())))
                });
                child.insert_segments(remaining, table);
            }
            SegmentKind::CatchAll(name) => {
                assert!(
                    remaining.is_empty(),
                    "catch-all must be the last path segment"
                );
                let child = self.catch_all_child.get_or_insert_with(|| {
                    Box::new(Node::new(
                        segment.clone(),
                        SegmentKind::CatchAll(name.clone()),
                    ))
                });
                if let Some(existing) = &mut child.table {
                    existing.merge(table);
                } else {
                    child.table = Some(table);
                }
            }
        }
    }

    /// Matches a path against the tree.
    ///
    /// Empty segments are filtered, so trailing slashes are normalized.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodTable<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        self.match_segments(&segments, &mut params)
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<(&'a MethodTable<T>, Params)> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.table.as_ref().map(|t| (t, params.clone()));
        };

        // Static match has highest priority
        if let Some(child) = self.find_static_child(segment) {
            if let Some(result) = child.match_segments(remaining, params) {
                return Some(result);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                params.push(name.clone(), (*segment).to_string());
                if let Some(result) = child.match_segments(remaining, params) {
                    return Some(result);
                }
            }
        }

        if let Some(child) = &self.catch_all_child {
            if let SegmentKind::CatchAll(name) = &child.kind {
                params.push(name.clone(), segments.join("/"));
                return child.table.as_ref().map(|t| (t, params.clone()));
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

fn parse_path(path: &str) -> Vec<(String, SegmentKind)> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                (s.to_string(), SegmentKind::Param(name.to_string()))
            } else if let Some(name) = s.strip_prefix('*') {
                (s.to_string(), SegmentKind::CatchAll(name.to_string()))
            } else {
                (s.to_string(), SegmentKind::Static)
            }
        })
        .collect()
}
