use super::automaton::{Fsa, NodeId};

/// Outcome taxonomy of [`Traversal::match_sequence`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// The query is a stored sequence.
    ExactMatch,
    /// The query traversed fine but ended on a non-final arc: it is a
    /// proper prefix of at least one stored sequence.
    SequenceIsAPrefix,
    /// The automaton's matched path ended completely (a terminal arc was
    /// consumed) before the query did: some stored sequence is a proper
    /// prefix of the query.
    AutomatonHasPrefix,
    /// The current node offers no arc for the next query byte.
    NoMatch,
}

/// Result of matching a query against the automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchResult {
    /// How the match concluded.
    pub kind: MatchKind,
    /// The query offset at which matching concluded. For the two success
    /// kinds this is one past the last consumed byte; for the two failure
    /// kinds it is the offset of the first unconsumed byte.
    pub index: usize,
    /// The node reached when matching concluded, or `None` if the path was
    /// exhausted through a terminal arc.
    pub node: Option<NodeId>,
}

/// Sentinel returned by [`Traversal::perfect_hash`] when the query is not
/// stored and the walk failed on a missing arc.
pub const NO_MATCH: i64 = -1;
/// Sentinel returned by [`Traversal::perfect_hash`] when a stored sequence
/// is a proper prefix of the query.
pub const AUTOMATON_HAS_PREFIX: i64 = -2;
/// Sentinel returned by [`Traversal::perfect_hash`] when the query is a
/// proper prefix of a stored sequence.
pub const SEQUENCE_IS_A_PREFIX: i64 = -3;

/// Read-only query operations over a borrowed automaton.
///
/// Holds no mutable state, so one `Traversal` (or many) can serve any
/// number of threads concurrently.
///
/// # Examples
///
/// ```
/// use libfsa::fsa::{build_fsa, MatchKind, Traversal};
///
/// let fsa = build_fsa(["a", "aba", "ac"], true).unwrap();
/// let traversal = Traversal::new(&fsa);
///
/// assert_eq!(traversal.match_sequence(b"aba").kind, MatchKind::ExactMatch);
/// assert_eq!(traversal.perfect_hash(b"ac"), 2);
/// ```
pub struct Traversal<'a> {
    fsa: &'a Fsa,
}

impl<'a> Traversal<'a> {
    /// Creates a traversal over the given automaton.
    pub fn new(fsa: &'a Fsa) -> Self {
        Traversal { fsa }
    }

    /// Matches `query` against the automaton, byte by byte from the root.
    ///
    /// The four outcomes are distinguished purely by arc terminality, not
    /// by the final flag of the last consumed arc: running off the end of
    /// the automaton (every consumed path exhausted via a terminal arc)
    /// reports [`MatchKind::AutomatonHasPrefix`], while a node that still
    /// branches but lacks the next byte reports [`MatchKind::NoMatch`].
    ///
    /// An empty query reports [`MatchKind::SequenceIsAPrefix`] at the root.
    pub fn match_sequence(&self, query: &[u8]) -> MatchResult {
        let fsa = self.fsa;
        let mut node = Some(fsa.root());
        for (i, &byte) in query.iter().enumerate() {
            let Some(current) = node else {
                return MatchResult {
                    kind: MatchKind::AutomatonHasPrefix,
                    index: i,
                    node: None,
                };
            };
            let Some(arc) = fsa.find_arc(current, byte) else {
                return MatchResult {
                    kind: MatchKind::NoMatch,
                    index: i,
                    node: Some(current),
                };
            };
            if i + 1 == query.len() {
                let kind = if fsa.is_final(arc) {
                    MatchKind::ExactMatch
                } else {
                    MatchKind::SequenceIsAPrefix
                };
                return MatchResult {
                    kind,
                    index: i + 1,
                    node: fsa.end_node(arc),
                };
            }
            node = fsa.end_node(arc);
        }
        MatchResult {
            kind: MatchKind::SequenceIsAPrefix,
            index: 0,
            node: Some(fsa.root()),
        }
    }

    /// Computes the 0-based lexicographic rank of `query` among all stored
    /// sequences, or a negative sentinel if it is not stored.
    ///
    /// At every step the contributions of all smaller-label sibling arcs
    /// are summed (their subtree counts, plus one for each final sibling),
    /// and passing through a final arc before the query's last byte adds
    /// one more, since that arc's own sequence precedes every longer
    /// continuation. On an exact match the accumulated sum is the rank.
    ///
    /// The failure sentinels [`NO_MATCH`], [`AUTOMATON_HAS_PREFIX`] and
    /// [`SEQUENCE_IS_A_PREFIX`] are all negative and distinct from any
    /// valid rank, so callers can branch on sign alone.
    ///
    /// # Panics
    ///
    /// Panics if the automaton was built without the numbering extension.
    pub fn perfect_hash(&self, query: &[u8]) -> i64 {
        let fsa = self.fsa;
        let numbers = fsa
            .numbers
            .as_deref()
            .expect("perfect_hash requires an automaton with the numbering extension");
        if query.is_empty() {
            return NO_MATCH;
        }

        let mut hash: i64 = 0;
        let mut node = Some(fsa.root());
        for (i, &byte) in query.iter().enumerate() {
            let Some(current) = node else {
                return AUTOMATON_HAS_PREFIX;
            };
            let is_last = i + 1 == query.len();

            let mut found = None;
            for arc in fsa.arcs(current) {
                let label = fsa.label(arc);
                if label == byte {
                    found = Some(arc);
                    break;
                }
                if label > byte {
                    break;
                }
                // A smaller sibling: its whole subtree precedes the query.
                if fsa.is_final(arc) {
                    hash += 1;
                }
                if let Some(target) = fsa.end_node(arc) {
                    hash += numbers[target.0 as usize] as i64;
                }
            }
            let Some(arc) = found else {
                return NO_MATCH;
            };
            if is_last {
                return if fsa.is_final(arc) {
                    hash
                } else {
                    SEQUENCE_IS_A_PREFIX
                };
            }
            if fsa.is_final(arc) {
                hash += 1;
            }
            node = fsa.end_node(arc);
        }
        unreachable!("loop returns on the query's last byte")
    }
}
