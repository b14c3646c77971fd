use super::automaton::{ArcId, Fsa, NodeId};

/// A lazy, depth-first enumeration of the right language of one node.
///
/// Arcs are visited in ascending label order, so sequences come out in
/// ascending lexicographic order, matching the order in which
/// [`perfect_hash`](super::Traversal::perfect_hash) assigns ranks. The
/// traversal keeps an explicit arc stack instead of recursing, so
/// dictionaries with long shared suffixes cannot overflow the call stack.
///
/// All state is owned by the iterator; obtaining several `Sequences` from
/// one automaton is fine, including from different threads.
pub struct Sequences<'a> {
    fsa: &'a Fsa,
    /// Arcs on the current path, deepest last. `path` holds their labels.
    stack: Vec<ArcId>,
    path: Vec<u8>,
    /// The next arc to step onto, one level below the top of `stack`.
    pending: Option<ArcId>,
}

impl<'a> Sequences<'a> {
    pub(crate) fn new(fsa: &'a Fsa, node: NodeId) -> Self {
        Sequences {
            fsa,
            stack: Vec::new(),
            path: Vec::new(),
            pending: fsa.first_arc(node),
        }
    }
}

impl Iterator for Sequences<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            let arc = match self.pending.take() {
                Some(arc) => arc,
                None => {
                    // Subtree exhausted: back out one level and continue
                    // with the sibling of the arc we came through.
                    let done = self.stack.pop()?;
                    self.path.pop();
                    self.pending = self.fsa.next_arc(done);
                    continue;
                }
            };
            self.stack.push(arc);
            self.path.push(self.fsa.label(arc));
            self.pending = self
                .fsa
                .end_node(arc)
                .and_then(|target| self.fsa.first_arc(target));
            if self.fsa.is_final(arc) {
                return Some(self.path.clone());
            }
        }
    }
}
