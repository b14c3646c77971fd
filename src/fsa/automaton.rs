use std::cmp::Ordering;
use std::io::{self, Write};

use super::sequences::Sequences;

/// Arc flag: consuming this arc completes a stored sequence.
pub(crate) const FLAG_FINAL: u8 = 0b01;
/// Arc flag: this is the last arc of its node.
pub(crate) const FLAG_LAST: u8 = 0b10;

/// Handle of a node (state). Index into the automaton's node array.
///
/// Slot 0 of the array is reserved, so a valid handle is never 0; absence of
/// a node is expressed as `Option<NodeId>` in the public API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// Handle of an arc (labeled transition). Index into the automaton's arc array.
///
/// Slot 0 of the array is reserved, so a valid handle is never 0; absence of
/// an arc is expressed as `Option<ArcId>` in the public API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArcId(pub(crate) u32);

/// One arc in the flat arc array.
///
/// `target == 0` marks a terminal arc (the path dead-ends after the label).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ArcSlot {
    pub(crate) label: u8,
    pub(crate) flags: u8,
    pub(crate) target: u32,
}

impl ArcSlot {
    pub(crate) fn is_final(self) -> bool {
        self.flags & FLAG_FINAL != 0
    }

    pub(crate) fn is_last(self) -> bool {
        self.flags & FLAG_LAST != 0
    }
}

/// One node in the flat node array. A node's arcs occupy the contiguous
/// range `first_arc..first_arc + arity`, sorted by ascending label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeSlot {
    pub(crate) first_arc: u32,
    pub(crate) arity: u16,
}

/// Compares two byte sequences in strict lexicographic order.
///
/// A shorter sequence orders before any longer sequence it is a prefix of.
/// This is the order in which input must be fed to
/// [`FsaBuilder::add`](super::FsaBuilder::add), and the order in which
/// [`sequences`](Fsa::sequences) enumerates and
/// [`perfect_hash`](super::Traversal::perfect_hash) assigns ranks.
pub fn lexical_ordering(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// A minimal, acyclic, deterministic finite-state automaton over bytes.
///
/// Produced by [`FsaBuilder`](super::FsaBuilder) or
/// [`codec::read`](super::codec::read), and immutable from then on. Nodes and
/// arcs are integer handles into flat arrays; all accessors are read-only, so
/// a finished automaton can be queried concurrently from any number of
/// threads.
pub struct Fsa {
    /// Slot 0 is a reserved sentinel; real nodes start at 1.
    pub(crate) nodes: Vec<NodeSlot>,
    /// Slot 0 is a reserved sentinel; real arcs start at 1.
    pub(crate) arcs: Vec<ArcSlot>,
    pub(crate) root: u32,
    /// Right-language counts, parallel to `nodes`. Present only when the
    /// automaton was built or deserialized with the numbering extension.
    pub(crate) numbers: Option<Vec<u64>>,
}

impl Fsa {
    /// Returns the root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(self.root)
    }

    /// Returns the first (smallest-label) arc of a node, or `None` if the
    /// node has no outgoing arcs.
    #[inline]
    pub fn first_arc(&self, node: NodeId) -> Option<ArcId> {
        let slot = self.nodes[node.0 as usize];
        (slot.arity > 0).then_some(ArcId(slot.first_arc))
    }

    /// Returns the next arc of the same node, or `None` if this was the
    /// node's last arc.
    #[inline]
    pub fn next_arc(&self, arc: ArcId) -> Option<ArcId> {
        (!self.arcs[arc.0 as usize].is_last()).then_some(ArcId(arc.0 + 1))
    }

    /// Looks up the arc of `node` labeled `label`, or `None` if absent.
    ///
    /// Binary search over the node's label-sorted arc range.
    pub fn find_arc(&self, node: NodeId, label: u8) -> Option<ArcId> {
        let slot = self.nodes[node.0 as usize];
        let first = slot.first_arc as usize;
        let range = &self.arcs[first..first + slot.arity as usize];
        range
            .binary_search_by_key(&label, |a| a.label)
            .ok()
            .map(|i| ArcId((first + i) as u32))
    }

    /// Returns the byte consumed by this arc.
    #[inline]
    pub fn label(&self, arc: ArcId) -> u8 {
        self.arcs[arc.0 as usize].label
    }

    /// True iff the path from the root through this arc spells a stored
    /// sequence.
    #[inline]
    pub fn is_final(&self, arc: ArcId) -> bool {
        self.arcs[arc.0 as usize].is_final()
    }

    /// True iff this arc has no target node (the path dead-ends here).
    #[inline]
    pub fn is_terminal(&self, arc: ArcId) -> bool {
        self.arcs[arc.0 as usize].target == 0
    }

    /// Returns the node this arc leads to, or `None` for a terminal arc.
    #[inline]
    pub fn end_node(&self, arc: ArcId) -> Option<NodeId> {
        let target = self.arcs[arc.0 as usize].target;
        (target != 0).then_some(NodeId(target))
    }

    /// Returns the number of complete sequences in the node's right
    /// language, or `None` if the automaton lacks the numbering extension.
    #[inline]
    pub fn right_language_count(&self, node: NodeId) -> Option<u64> {
        self.numbers.as_ref().map(|n| n[node.0 as usize])
    }

    /// Returns an iterator over a node's arcs in ascending label order.
    #[inline]
    pub fn arcs(&self, node: NodeId) -> Arcs<'_> {
        Arcs {
            fsa: self,
            next: self.first_arc(node),
        }
    }

    /// Returns the number of nodes in the automaton.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Returns the number of arcs in the automaton.
    pub fn arc_count(&self) -> usize {
        self.arcs.len() - 1
    }

    /// Lazily enumerates all sequences in the right language of `node`, in
    /// ascending lexicographic order.
    ///
    /// Each call produces a fresh, independent enumeration with its own
    /// traversal state, so concurrent enumerations never interfere.
    pub fn sequences(&self, node: NodeId) -> Sequences<'_> {
        Sequences::new(self, node)
    }

    /// Lazily enumerates every stored sequence, in ascending lexicographic
    /// order. Equivalent to `sequences(root())`.
    pub fn sequences_from_root(&self) -> Sequences<'_> {
        self.sequences(self.root())
    }

    /// Iterates every node handle, including ones only reachable through
    /// shared suffixes. For structure checks; the order is unspecified.
    pub(crate) fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (1..self.nodes.len() as u32).map(NodeId)
    }

    /// Writes the subgraph reachable from `node` in graphviz `dot` format.
    ///
    /// Terminal arcs point at a shared `stop` shape; final arcs get a `tee`
    /// arrowhead; with the numbering extension, each node is labeled with
    /// its right-language count.
    pub fn to_dot(&self, node: NodeId, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "digraph Automaton {{")?;
        writeln!(w, "  rankdir = LR;")?;
        writeln!(w, "  stop [shape=doublecircle,label=\"\"];")?;
        writeln!(w, "  initial [shape=plaintext,label=\"\"];")?;
        writeln!(w, "  initial -> {}", node.0)?;
        writeln!(w)?;

        let mut visited = vec![false; self.nodes.len()];
        let mut pending = vec![node];
        visited[node.0 as usize] = true;

        while let Some(current) = pending.pop() {
            match self.right_language_count(current) {
                Some(count) => {
                    writeln!(w, "  {} [shape=circle,label=\"{count}\"];", current.0)?
                }
                None => writeln!(w, "  {} [shape=circle,label=\"\"];", current.0)?,
            }

            for arc in self.arcs(current) {
                write!(w, "  {} -> ", current.0)?;
                match self.end_node(arc) {
                    Some(target) => {
                        write!(w, "{}", target.0)?;
                        if !visited[target.0 as usize] {
                            visited[target.0 as usize] = true;
                            pending.push(target);
                        }
                    }
                    None => write!(w, "stop")?,
                }

                let label = self.label(arc);
                if label.is_ascii_alphanumeric() {
                    write!(w, " [label=\"{}\"", label as char)?;
                } else {
                    write!(w, " [label=\"0x{label:02x}\"")?;
                }
                if self.is_final(arc) {
                    write!(w, " arrowhead=\"tee\"")?;
                }
                writeln!(w, "]")?;
            }
        }

        writeln!(w, "}}")
    }
}

impl std::fmt::Debug for Fsa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fsa")
            .field("node_count", &self.node_count())
            .field("arc_count", &self.arc_count())
            .field("numbered", &self.numbers.is_some())
            .finish()
    }
}

/// An iterator over the arcs of one node, in ascending label order.
#[derive(Clone)]
pub struct Arcs<'a> {
    fsa: &'a Fsa,
    next: Option<ArcId>,
}

impl Iterator for Arcs<'_> {
    type Item = ArcId;

    #[inline]
    fn next(&mut self) -> Option<ArcId> {
        let arc = self.next?;
        self.next = self.fsa.next_arc(arc);
        Some(arc)
    }
}
