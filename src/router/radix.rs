//! Segment trie for route matching
//!
//! The trie is built in two phases:
//!
//! 1. **Build**: [`RadixBuilder`] grows an arena of nodes as patterns are
//!    inserted. Nodes are created lazily and never removed.
//! 2. **Freeze**: [`RadixBuilder::freeze`] turns the arena into an immutable
//!    [`RadixTree`] whose literal edges are sorted for binary search.
//!
//! Nodes refer to each other by [`NodeId`] (an index into the arena) rather than
//! by pointer, so a frozen tree is a flat `Vec` that clones cheaply when every
//! worker needs its own copy.
//!
//! ## Node shape
//!
//! - Literal children keyed by exact segment text
//! - At most one parameter child, shared by every parameter name at that depth
//! - At most one wildcard child, always a leaf
//! - A method-keyed map of values for patterns that end at the node
//!
//! Parameter names are not stored in the trie. Matching returns captured values
//! in descent order and the caller zips them with the names stored on the value.
//!
//! ## Matching
//!
//! Depth-first with backtracking, using an explicit stack of choice points so
//! deep paths cannot overflow a coroutine stack. At every level the branches
//! are tried literal, then parameter, then wildcard; a dead end deeper in the
//! literal branch resumes at the parameter branch of the same node.

use http::Method;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use super::pattern::PathSegment;

/// Maximum captures held inline before spilling to the heap.
const INLINE_CAPTURES: usize = 8;

/// Captured parameter values in descent order.
pub type Captures<'p> = SmallVec<[Cow<'p, str>; INLINE_CAPTURES]>;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct BuilderNode<T> {
    literals: HashMap<Arc<str>, NodeId>,
    param: Option<NodeId>,
    wildcard: Option<NodeId>,
    routes: HashMap<Method, T>,
}

impl<T> BuilderNode<T> {
    fn new() -> Self {
        Self {
            literals: HashMap::new(),
            param: None,
            wildcard: None,
            routes: HashMap::new(),
        }
    }
}

/// Mutable trie used during registration.
#[derive(Debug, Clone)]
pub struct RadixBuilder<T> {
    nodes: Vec<BuilderNode<T>>,
}

impl<T> Default for RadixBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RadixBuilder<T> {
    /// Create a builder holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![BuilderNode::new()],
        }
    }

    fn push_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(BuilderNode::new());
        id
    }

    /// Walk (creating as needed) the edges for `segments` and return the final node.
    ///
    /// `Param` and `OptionalParam` both descend into the shared parameter child.
    /// A `Wildcard` ends the walk at the wildcard leaf.
    fn descend(&mut self, segments: &[PathSegment]) -> NodeId {
        let mut current = NodeId::ROOT;
        for segment in segments {
            current = match segment {
                PathSegment::Literal(text) => {
                    match self.nodes[current.index()].literals.get(text).copied() {
                        Some(child) => child,
                        None => {
                            let child = self.push_node();
                            self.nodes[current.index()]
                                .literals
                                .insert(Arc::clone(text), child);
                            child
                        }
                    }
                }
                PathSegment::Param(_) | PathSegment::OptionalParam(_) => {
                    match self.nodes[current.index()].param {
                        Some(child) => child,
                        None => {
                            let child = self.push_node();
                            self.nodes[current.index()].param = Some(child);
                            child
                        }
                    }
                }
                PathSegment::Wildcard(_) => {
                    let leaf = match self.nodes[current.index()].wildcard {
                        Some(child) => child,
                        None => {
                            let child = self.push_node();
                            self.nodes[current.index()].wildcard = Some(child);
                            child
                        }
                    };
                    return leaf;
                }
            };
        }
        current
    }

    /// Store `value` under `method` at the node reached by `segments`.
    ///
    /// Returns the value previously stored for the same method and shape, if any.
    pub fn insert(&mut self, segments: &[PathSegment], method: Method, value: T) -> Option<T> {
        let node = self.descend(segments);
        self.nodes[node.index()].routes.insert(method, value)
    }

    /// Value stored under `method` at the node reached by `segments`, if any.
    ///
    /// Walking creates any missing nodes, as [`RadixBuilder::insert`] would.
    pub fn get_mut(&mut self, segments: &[PathSegment], method: &Method) -> Option<&mut T> {
        let node = self.descend(segments);
        self.nodes[node.index()].routes.get_mut(method)
    }

    /// Number of nodes allocated so far.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Freeze into an immutable tree.
    #[must_use]
    pub fn freeze(self) -> RadixTree<T> {
        let nodes = self
            .nodes
            .into_iter()
            .map(|node| {
                let mut literals: Vec<(Arc<str>, NodeId)> = node.literals.into_iter().collect();
                literals.sort_by(|a, b| a.0.cmp(&b.0));
                RadixNode {
                    literals: literals.into_boxed_slice(),
                    param: node.param,
                    wildcard: node.wildcard,
                    routes: node.routes,
                }
            })
            .collect::<Vec<_>>();
        RadixTree {
            nodes: nodes.into_boxed_slice(),
        }
    }
}

#[derive(Debug, Clone)]
struct RadixNode<T> {
    /// Sorted by key for binary search
    literals: Box<[(Arc<str>, NodeId)]>,
    param: Option<NodeId>,
    wildcard: Option<NodeId>,
    routes: HashMap<Method, T>,
}

impl<T> RadixNode<T> {
    fn literal(&self, segment: &str) -> Option<NodeId> {
        self.literals
            .binary_search_by(|(key, _)| key.as_ref().cmp(segment))
            .ok()
            .map(|i| self.literals[i].1)
    }
}

/// A choice point on the matcher stack.
///
/// When popped, captures are truncated back to `depth` before `capture`
/// (if any) is pushed, which undoes whatever a failed sibling branch bound.
struct Frame<'p> {
    node: NodeId,
    idx: usize,
    depth: usize,
    capture: Option<Cow<'p, str>>,
}

/// Immutable segment trie.
#[derive(Debug, Clone)]
pub struct RadixTree<T> {
    nodes: Box<[RadixNode<T>]>,
}

impl<T> RadixTree<T> {
    /// Number of nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: NodeId) -> &RadixNode<T> {
        &self.nodes[id.index()]
    }

    /// Push the branches of `node` for segment `idx` in reverse precedence so the
    /// literal branch is popped first.
    fn push_branches<'p>(
        &self,
        stack: &mut Vec<Frame<'p>>,
        node: &RadixNode<T>,
        segments: &[&'p str],
        idx: usize,
        depth: usize,
    ) {
        if let Some(wildcard) = node.wildcard {
            stack.push(Frame {
                node: wildcard,
                idx: segments.len(),
                depth,
                capture: Some(rest_of(segments, idx)),
            });
        }
        if idx == segments.len() {
            return;
        }
        if let Some(param) = node.param {
            stack.push(Frame {
                node: param,
                idx: idx + 1,
                depth,
                capture: Some(Cow::Borrowed(segments[idx])),
            });
        }
        if let Some(literal) = node.literal(segments[idx]) {
            stack.push(Frame {
                node: literal,
                idx: idx + 1,
                depth,
                capture: None,
            });
        }
    }

    /// Find the value for `method` whose pattern matches `segments`.
    ///
    /// Returns the value and the captured parameter values in descent order.
    /// A node whose patterns exist only for other methods is treated as a dead
    /// end and the search backtracks.
    pub fn find<'t, 'p>(
        &'t self,
        method: &Method,
        segments: &[&'p str],
    ) -> Option<(&'t T, Captures<'p>)> {
        let mut captures = Captures::new();
        let mut stack: Vec<Frame<'p>> = Vec::with_capacity(segments.len() * 2 + 1);
        stack.push(Frame {
            node: NodeId::ROOT,
            idx: 0,
            depth: 0,
            capture: None,
        });

        while let Some(frame) = stack.pop() {
            captures.truncate(frame.depth);
            if let Some(value) = frame.capture {
                captures.push(value);
            }

            let node = self.node(frame.node);
            if frame.idx == segments.len() {
                if let Some(value) = node.routes.get(method) {
                    return Some((value, captures));
                }
            }
            self.push_branches(&mut stack, node, segments, frame.idx, captures.len());
        }

        None
    }

    /// Every method registered on any pattern that matches `segments`.
    ///
    /// Explores all branches instead of stopping at the first hit.
    #[must_use]
    pub fn methods_for(&self, segments: &[&str]) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        let mut stack: Vec<Frame<'_>> = vec![Frame {
            node: NodeId::ROOT,
            idx: 0,
            depth: 0,
            capture: None,
        }];

        while let Some(frame) = stack.pop() {
            let node = self.node(frame.node);
            if frame.idx == segments.len() {
                for method in node.routes.keys() {
                    if !methods.contains(method) {
                        methods.push(method.clone());
                    }
                }
            }
            self.push_branches(&mut stack, node, segments, frame.idx, 0);
        }

        methods
    }

    /// Visit every stored value together with its method.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Method, &T),
    {
        for node in self.nodes.iter() {
            for (method, value) in &node.routes {
                f(method, value);
            }
        }
    }
}

fn rest_of<'p>(segments: &[&'p str], idx: usize) -> Cow<'p, str> {
    match &segments[idx..] {
        [] => Cow::Borrowed(""),
        [only] => Cow::Borrowed(*only),
        rest => Cow::Owned(rest.join("/")),
    }
}

/// Split a request path into non-empty segments.
///
/// Leading, trailing and doubled slashes produce no segments, so `/users/`
/// and `/users` are the same path to the trie.
#[must_use]
pub fn split_path(path: &str) -> SmallVec<[&str; 16]> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
