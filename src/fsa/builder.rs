use std::error::Error;

use hashbrown::HashMap;
use mark_last::MarkLastIterator;
use smallvec::SmallVec;

use super::automaton::{ArcSlot, Fsa, NodeSlot, FLAG_FINAL, FLAG_LAST};

/// Trait for types that can be used as an input sequence when building an
/// automaton.
///
/// Implemented for common byte-sequence and string types so that
/// [`FsaBuilder::add`] and [`build_fsa`] accept them directly without manual
/// conversion. Strings contribute their UTF-8 bytes.
pub trait IntoSequence {
    /// Collects this input into a byte buffer.
    fn collect_sequence(self) -> SmallVec<[u8; 32]>;
}

impl IntoSequence for &[u8] {
    fn collect_sequence(self) -> SmallVec<[u8; 32]> {
        self.iter().copied().collect()
    }
}

impl IntoSequence for Vec<u8> {
    fn collect_sequence(self) -> SmallVec<[u8; 32]> {
        self.into_iter().collect()
    }
}

impl IntoSequence for &Vec<u8> {
    fn collect_sequence(self) -> SmallVec<[u8; 32]> {
        self.iter().copied().collect()
    }
}

impl<const N: usize> IntoSequence for [u8; N] {
    fn collect_sequence(self) -> SmallVec<[u8; 32]> {
        self.into_iter().collect()
    }
}

impl<const N: usize> IntoSequence for &[u8; N] {
    fn collect_sequence(self) -> SmallVec<[u8; 32]> {
        self.iter().copied().collect()
    }
}

impl IntoSequence for &str {
    fn collect_sequence(self) -> SmallVec<[u8; 32]> {
        self.bytes().collect()
    }
}

impl IntoSequence for &&str {
    fn collect_sequence(self) -> SmallVec<[u8; 32]> {
        self.bytes().collect()
    }
}

impl IntoSequence for String {
    fn collect_sequence(self) -> SmallVec<[u8; 32]> {
        self.into_bytes().into_iter().collect()
    }
}

impl IntoSequence for &String {
    fn collect_sequence(self) -> SmallVec<[u8; 32]> {
        self.bytes().collect()
    }
}

/// An arc of a node still on the active path.
///
/// `target` stays 0 until the child subtree is frozen; it remains 0 forever
/// for dead-end (terminal) arcs.
struct UnfrozenArc {
    label: u8,
    is_final: bool,
    target: u32,
}

/// A node on the active path, together with the label of its incoming arc.
///
/// The incoming label of the root entry is never read.
struct ActiveState {
    label: u8,
    arcs: SmallVec<[UnfrozenArc; 4]>,
}

impl ActiveState {
    fn new(label: u8) -> Self {
        ActiveState {
            label,
            arcs: SmallVec::new(),
        }
    }
}

/// Builds a minimal acyclic automaton incrementally from sorted input.
///
/// Sequences must be added in strictly increasing [lexicographic
/// order](super::lexical_ordering) with no duplicates. The builder keeps an
/// active path of not-yet-finalized nodes for the previous input's suffix;
/// whenever a new input diverges, the abandoned suffix is frozen bottom-up
/// and deduplicated through a register of canonical nodes, which is what
/// yields minimality in a single pass.
///
/// A build is one-shot: `new` → repeated [`add`](Self::add) →
/// [`finish`](Self::finish). The builder is single-threaded; the finished
/// [`Fsa`] is immutable and freely shareable.
///
/// # Examples
///
/// ```
/// use libfsa::fsa::FsaBuilder;
///
/// let mut builder = FsaBuilder::new(true);
/// builder.add("april").unwrap();
/// builder.add("may").unwrap();
/// builder.add("october").unwrap();
/// let fsa = builder.finish();
///
/// assert_eq!(fsa.right_language_count(fsa.root()), Some(3));
/// ```
pub struct FsaBuilder {
    active: Vec<ActiveState>,
    /// Canonical nodes already frozen, keyed by their full arc signature.
    register: HashMap<Box<[ArcSlot]>, u32>,
    nodes: Vec<NodeSlot>,
    arcs: Vec<ArcSlot>,
    numbers: Option<Vec<u64>>,
}

impl FsaBuilder {
    /// Creates a new builder.
    ///
    /// With `with_numbers` set, the builder also computes right-language
    /// counts bottom-up while freezing, enabling
    /// [`right_language_count`](Fsa::right_language_count) and
    /// [`perfect_hash`](super::Traversal::perfect_hash) on the result.
    pub fn new(with_numbers: bool) -> Self {
        let sentinel_node = NodeSlot {
            first_arc: 0,
            arity: 0,
        };
        let sentinel_arc = ArcSlot {
            label: 0,
            flags: FLAG_LAST,
            target: 0,
        };
        FsaBuilder {
            active: vec![ActiveState::new(0)],
            register: HashMap::new(),
            nodes: vec![sentinel_node],
            arcs: vec![sentinel_arc],
            numbers: with_numbers.then(|| vec![0]),
        }
    }

    /// Adds a sequence to the automaton being constructed.
    ///
    /// The input can be any type implementing [`IntoSequence`], including
    /// `&[u8]`, `Vec<u8>`, fixed-size arrays, and `&str` (as UTF-8 bytes).
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::Order`] if the sequence is not strictly
    /// greater than the previously added one, and [`BuilderError::Empty`]
    /// for a zero-length sequence (the automaton cannot store the empty
    /// sequence). Either error aborts the build; `finish` must not be
    /// called afterwards expecting a usable automaton.
    pub fn add(&mut self, sequence: impl IntoSequence) -> Result<(), BuilderError> {
        let sequence = sequence.collect_sequence();
        self.add_slice(&sequence)
    }

    fn add_slice(&mut self, sequence: &[u8]) -> Result<(), BuilderError> {
        if sequence.is_empty() {
            return Err(BuilderError::Empty);
        }
        let prefix_len = self.prefix_length(sequence)?;
        self.freeze_suffix(prefix_len);
        for (is_last, label) in sequence[prefix_len..].iter().copied().mark_last() {
            let parent = self
                .active
                .last_mut()
                .expect("active path always has at least the root");
            parent.arcs.push(UnfrozenArc {
                label,
                is_final: is_last,
                target: 0,
            });
            self.active.push(ActiveState::new(label));
        }
        Ok(())
    }

    /// Computes the length of the common prefix between the new sequence and
    /// the active path, rejecting out-of-order and duplicate input.
    fn prefix_length(&self, sequence: &[u8]) -> Result<usize, BuilderError> {
        let mut prefix_len = 0;
        for (i, &label) in sequence.iter().enumerate() {
            let is_last = i == sequence.len() - 1;
            if let Some(prev_state) = self.active.get(prefix_len + 1) {
                if label > prev_state.label {
                    break;
                }
                if label < prev_state.label || is_last {
                    // Smaller byte, or the new sequence ends inside the
                    // previous one (duplicate or prefix): not strictly
                    // increasing.
                    return Err(BuilderError::Order(
                        self.previous_sequence(),
                        sequence.to_vec(),
                    ));
                }
                prefix_len += 1;
            } else {
                break;
            }
        }
        Ok(prefix_len)
    }

    /// The previously added sequence, reconstructed from the active path.
    fn previous_sequence(&self) -> Vec<u8> {
        self.active[1..].iter().map(|s| s.label).collect()
    }

    /// Freezes every active-path node deeper than `depth`, deepest first,
    /// rewiring each parent arc to the canonical node.
    fn freeze_suffix(&mut self, depth: usize) {
        while self.active.len() > depth + 1 {
            let state = self
                .active
                .pop()
                .expect("active path always has at least the root");
            // A node with no arcs is a dead end: its incoming arc stays
            // terminal and no node is materialized for it.
            let target = if state.arcs.is_empty() {
                0
            } else {
                self.freeze_node(&state.arcs)
            };
            let parent_arc = self
                .active
                .last_mut()
                .expect("active path always has at least the root")
                .arcs
                .last_mut()
                .expect("parent of a popped state owns its incoming arc");
            debug_assert_eq!(parent_arc.label, state.label);
            parent_arc.target = target;
        }
    }

    /// Looks the node up in the register by its canonical arc signature;
    /// appends it to the automaton arrays only if no equivalent node was
    /// frozen before.
    fn freeze_node(&mut self, unfrozen: &[UnfrozenArc]) -> u32 {
        let mut signature = Vec::with_capacity(unfrozen.len());
        for (is_last, arc) in unfrozen.iter().mark_last() {
            let mut flags = 0;
            if arc.is_final {
                flags |= FLAG_FINAL;
            }
            if is_last {
                flags |= FLAG_LAST;
            }
            signature.push(ArcSlot {
                label: arc.label,
                flags,
                target: arc.target,
            });
        }
        let signature = signature.into_boxed_slice();
        debug_assert!(signature.windows(2).all(|w| w[0].label < w[1].label));

        if let Some(&id) = self.register.get(&signature) {
            return id;
        }

        let first_arc = if signature.is_empty() {
            0
        } else {
            self.arcs.len() as u32
        };
        self.arcs.extend_from_slice(&signature);
        let id = self.nodes.len() as u32;
        self.nodes.push(NodeSlot {
            first_arc,
            arity: signature.len() as u16,
        });
        if let Some(numbers) = &mut self.numbers {
            let count = signature
                .iter()
                .map(|arc| {
                    u64::from(arc.is_final())
                        + if arc.target != 0 {
                            numbers[arc.target as usize]
                        } else {
                            0
                        }
                })
                .sum();
            numbers.push(count);
        }
        self.register.insert(signature, id);
        id
    }

    /// Finalizes construction and returns the automaton.
    ///
    /// Freezes the remaining active path down to the root. With no prior
    /// `add` calls the result is the empty language: a root node with no
    /// arcs.
    pub fn finish(mut self) -> Fsa {
        self.freeze_suffix(0);
        let root_state = self
            .active
            .pop()
            .expect("active path always has at least the root");
        // The root is registered like any other node, including the
        // zero-arc root of an empty automaton.
        let root = self.freeze_node(&root_state.arcs);
        Fsa {
            nodes: self.nodes,
            arcs: self.arcs,
            root,
            numbers: self.numbers,
        }
    }
}

/// Errors that can occur while building an automaton.
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// Input was not strictly increasing.
    ///
    /// Contains the two offending sequences (previous input, current input).
    Order(Vec<u8>, Vec<u8>),
    /// A zero-length sequence was added; the automaton cannot store it.
    Empty,
}

impl std::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuilderError::Order(previous, current) => write!(
                f,
                "OrderError - {previous:?} came before {current:?}, input must be strictly increasing"
            ),
            BuilderError::Empty => write!(f, "empty sequences cannot be stored"),
        }
    }
}

impl Error for BuilderError {}

/// Builds an automaton from an iterator of sequences.
///
/// Each input must implement [`IntoSequence`]. Input **must** be strictly
/// sorted with no duplicates, which allows minimization in a single pass.
/// With `with_numbers` set, the result carries right-language counts (see
/// [`FsaBuilder::new`]).
///
/// # Examples
///
/// ```
/// use libfsa::fsa::build_fsa;
///
/// let fsa = build_fsa(["apple", "banana", "cherry"], false).unwrap();
/// let stored: Vec<Vec<u8>> = fsa.sequences_from_root().collect();
/// assert_eq!(stored.len(), 3);
/// ```
///
/// Byte sequences work the same way:
///
/// ```
/// use libfsa::fsa::build_fsa;
///
/// let input: Vec<Vec<u8>> = vec![vec![1, 2, 3], vec![1, 2, 4], vec![2, 3]];
/// let fsa = build_fsa(&input, false).unwrap();
/// assert_eq!(fsa.sequences_from_root().count(), 3);
/// ```
pub fn build_fsa<S>(
    sequences: impl IntoIterator<Item = S>,
    with_numbers: bool,
) -> Result<Fsa, BuilderError>
where
    S: IntoSequence,
{
    let mut builder = FsaBuilder::new(with_numbers);
    for sequence in sequences {
        builder.add(sequence)?;
    }
    Ok(builder.finish())
}
