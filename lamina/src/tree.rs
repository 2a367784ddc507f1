//! Flat node arena: identity resolution, dirty detection, pruning.
//!
//! The tree owns every node in an id-keyed table. Parent and children are
//! id back-references, never owning pointers, so the parent/child cycle has
//! no ownership cycle. Children order is rebuilt every structure pass;
//! node *contents* persist across frames, which is what lets interaction
//! state and computed rects survive the per-frame rebuild.
//!
//! Dirty detection is a diff-and-commit walk: each node's structural hash
//! (own layout-relevant style + children ids/hashes in order) is compared
//! against the hash recorded last frame and then overwritten. A single
//! differing node dirties the whole tree; relayout is all-or-nothing.

use rustc_hash::FxHashMap;

use crate::node::{mix, Node, NodeId};
use crate::primitives::Size;
use crate::layout::SizeSpec;

/// Frames an id may go unresolved before its node is dropped from the
/// table. The description code not visiting an id for this long means the
/// element is gone, not hidden.
pub(crate) const PRUNE_AFTER_FRAMES: u64 = 120;

#[derive(Debug, Default)]
pub struct Tree {
    nodes: FxHashMap<NodeId, Node>,
    /// Hash recorded per id by the previous diff-and-commit.
    committed: FxHashMap<NodeId, u64>,
    /// Set when an id is seen for the first time; conservatively forces a
    /// relayout that frame.
    structure_changed: bool,
    frame: u64,
    /// Call site that produced each id this pass; used to spot suspicious
    /// id collisions in debug builds.
    #[cfg(debug_assertions)]
    pass_call_sites: FxHashMap<NodeId, u64>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame: reset the structure flag, refresh the root and
    /// pin its size to the screen.
    pub(crate) fn begin_frame(&mut self, frame: u64, screen: Size) {
        self.frame = frame;
        self.structure_changed = false;
        #[cfg(debug_assertions)]
        self.pass_call_sites.clear();

        let root = self
            .nodes
            .entry(NodeId::ROOT)
            .or_insert_with(|| Node::new(NodeId::ROOT, None, frame));
        root.style.width = SizeSpec::Pixels(screen.width);
        root.style.height = SizeSpec::Pixels(screen.height);
        root.children.clear();
        root.last_seen = frame;
    }

    /// Resolve (or create) the child of `parent` at this call site and
    /// occurrence index. Never fails; always returns a usable node id.
    ///
    /// During the structure pass the child is linked into `parent` in call
    /// order and its own children list is reset, ready to be refilled if
    /// the caller enters it. The draw pass re-resolves the same ids without
    /// touching structure.
    pub(crate) fn resolve_child(
        &mut self,
        parent: NodeId,
        call_site: u64,
        occurrence: u32,
        structure_pass: bool,
    ) -> NodeId {
        let id = NodeId::derive(parent, call_site, occurrence);

        #[cfg(debug_assertions)]
        if structure_pass {
            if let Some(&other) = self.pass_call_sites.get(&id) {
                if other != call_site {
                    tracing::warn!(
                        id = id.raw(),
                        "node id collision: two distinct call sites resolved the same id"
                    );
                }
            } else {
                self.pass_call_sites.insert(id, call_site);
            }
        }

        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.last_seen = self.frame;
                node.parent = Some(parent);
                if structure_pass {
                    node.children.clear();
                }
            }
            None => {
                // First sighting of this id. Allocation during the draw
                // pass only happens after a truncated structure pass; the
                // node's rect stays undefined until the next layout.
                tracing::trace!(id = id.raw(), "allocating node");
                self.nodes.insert(id, Node::new(id, Some(parent), self.frame));
                self.structure_changed = true;
            }
        }

        if structure_pass {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.push(id);
            }
        }

        id
    }

    /// Diff-and-commit over the whole tree. Records every node's new
    /// structural hash and returns whether anything differed from the
    /// previous frame. Not idempotent: the commit is the point.
    pub(crate) fn commit_hashes(&mut self) -> bool {
        self.commit_node(NodeId::ROOT)
    }

    fn commit_node(&mut self, id: NodeId) -> bool {
        let (style_hash, children) = match self.nodes.get(&id) {
            Some(node) => (node.style.layout_hash(), node.children.clone()),
            None => return false,
        };

        let mut dirty = false;
        let mut combined = style_hash;
        for child in children {
            dirty |= self.commit_node(child);
            let child_hash = self.nodes.get(&child).map_or(0, |n| n.structural_hash);
            // Fold the child id as well as its hash so swapping two
            // equal-looking children still changes the parent.
            combined = mix(combined, child.raw());
            combined = mix(combined, child_hash);
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            node.structural_hash = combined;
        }
        dirty |= self.committed.get(&id) != Some(&combined);
        self.committed.insert(id, combined);
        dirty
    }

    /// Drop nodes (and their hash records) not resolved within the last
    /// [`PRUNE_AFTER_FRAMES`] frames. The root is never pruned.
    pub(crate) fn prune(&mut self) {
        let cutoff = self.frame.saturating_sub(PRUNE_AFTER_FRAMES);
        let before = self.nodes.len();
        self.nodes
            .retain(|id, node| *id == NodeId::ROOT || node.last_seen >= cutoff);
        if self.nodes.len() != before {
            tracing::debug!(pruned = before - self.nodes.len(), "pruned stale nodes");
            let nodes = &self.nodes;
            self.committed.retain(|id, _| nodes.contains_key(id));
        }
    }

    #[inline]
    pub(crate) fn structure_changed(&self) -> bool {
        self.structure_changed
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
