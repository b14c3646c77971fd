/// Immutable automaton representation and its read-only query primitives.
pub mod automaton;
/// Incremental builder producing a minimized automaton from sorted input.
pub mod builder;
/// Self-describing binary serialization of a finished automaton.
pub mod codec;
/// Matching and perfect-hash traversal over an automaton.
pub mod matcher;
/// Lazy enumeration of stored sequences.
pub mod sequences;

pub use automaton::{lexical_ordering, ArcId, Arcs, Fsa, NodeId};
pub use builder::{build_fsa, BuilderError, FsaBuilder, IntoSequence};
pub use codec::CodecError;
pub use matcher::{MatchKind, MatchResult, Traversal};
pub use matcher::{AUTOMATON_HAS_PREFIX, NO_MATCH, SEQUENCE_IS_A_PREFIX};
pub use sequences::Sequences;

#[cfg(test)]
mod test {
    use std::collections::{HashMap, HashSet};

    use super::automaton::{Fsa, NodeId};
    use super::builder::build_fsa;
    use super::codec;
    use super::lexical_ordering;
    use super::matcher::{MatchKind, Traversal};

    /// Deterministic xorshift generator, so corpora are reproducible
    /// without an RNG dependency.
    struct XorShift64(u64);

    impl XorShift64 {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    /// Generates a sorted, duplicate-free corpus of random sequences.
    fn generate_random(
        count: usize,
        (min_len, max_len): (usize, usize),
        (min_byte, max_byte): (u8, u8),
    ) -> Vec<Vec<u8>> {
        let mut rnd = XorShift64(0x1122_3344_5566_7788);
        let mut input: Vec<Vec<u8>> = (0..count)
            .map(|_| {
                let len = min_len + rnd.below((max_len - min_len + 1) as u64) as usize;
                (0..len)
                    .map(|_| min_byte + rnd.below(u64::from(max_byte - min_byte) + 1) as u8)
                    .collect()
            })
            .collect();
        input.sort_by(|a, b| lexical_ordering(a, b));
        input.dedup();
        input
    }

    /// The automaton accepts exactly the input set, in order.
    fn check_correct(input: &[Vec<u8>], fsa: &Fsa) {
        let stored: Vec<Vec<u8>> = fsa.sequences_from_root().collect();
        assert_eq!(stored, input);
    }

    /// No two distinct nodes share a right language.
    fn check_minimal(fsa: &Fsa) {
        let mut languages: HashMap<Vec<Vec<u8>>, NodeId> = HashMap::new();
        for node in fsa.node_ids() {
            let language: Vec<Vec<u8>> = fsa.sequences(node).collect();
            if let Some(previous) = languages.insert(language, node) {
                panic!("nodes {previous:?} and {node:?} share a right language");
            }
        }
    }

    /// The two automata are structurally identical at every pair of
    /// corresponding reachable nodes. Iterative, to survive deep graphs.
    fn check_identical(a: &Fsa, b: &Fsa) {
        let mut visited = HashSet::new();
        let mut pending = vec![(a.root(), b.root())];
        while let Some((node_a, node_b)) = pending.pop() {
            if !visited.insert((node_a, node_b)) {
                continue;
            }
            let arcs_a: Vec<_> = a.arcs(node_a).collect();
            let arcs_b: Vec<_> = b.arcs(node_b).collect();
            assert_eq!(arcs_a.len(), arcs_b.len(), "arity differs");
            for (&arc_a, &arc_b) in arcs_a.iter().zip(&arcs_b) {
                assert_eq!(a.label(arc_a), b.label(arc_b), "labels differ");
                assert_eq!(a.is_final(arc_a), b.is_final(arc_b), "final flags differ");
                assert_eq!(
                    a.is_terminal(arc_a),
                    b.is_terminal(arc_b),
                    "terminal flags differ"
                );
                if let (Some(target_a), Some(target_b)) = (a.end_node(arc_a), b.end_node(arc_b)) {
                    pending.push((target_a, target_b));
                }
            }
        }
    }

    #[test]
    fn random_dense_corpus_is_correct_and_minimal() {
        // A narrow alphabet forces heavy suffix sharing.
        let input = generate_random(2000, (1, 8), (b'a', b'e'));
        let fsa = build_fsa(&input, true).unwrap();
        check_correct(&input, &fsa);
        check_minimal(&fsa);
        assert_eq!(
            fsa.right_language_count(fsa.root()),
            Some(input.len() as u64)
        );
    }

    #[test]
    fn random_corpus_perfect_hash_is_a_bijection() {
        let input = generate_random(2000, (1, 8), (b'a', b'e'));
        let fsa = build_fsa(&input, true).unwrap();
        let traversal = Traversal::new(&fsa);
        for (i, seq) in input.iter().enumerate() {
            assert_eq!(traversal.perfect_hash(seq), i as i64, "sequence {seq:?}");
        }
    }

    #[test]
    fn random_corpus_membership_agrees_with_a_set() {
        let input = generate_random(1000, (1, 6), (b'a', b'd'));
        let members: HashSet<&[u8]> = input.iter().map(|s| s.as_slice()).collect();
        let fsa = build_fsa(&input, true).unwrap();
        let traversal = Traversal::new(&fsa);

        // Probe with fresh random sequences; some are stored, most are not.
        let probes = generate_random(1000, (1, 7), (b'a', b'e'));
        for probe in &probes {
            let stored = members.contains(probe.as_slice());
            let hash = traversal.perfect_hash(probe);
            assert_eq!(hash >= 0, stored, "probe {probe:?}");
            let exact = traversal.match_sequence(probe).kind == MatchKind::ExactMatch;
            assert_eq!(exact, stored, "probe {probe:?}");
        }
    }

    #[test]
    fn equal_languages_build_identical_automata() {
        let input = generate_random(1500, (1, 8), (b'a', b'd'));
        let first = build_fsa(&input, false).unwrap();
        let second = build_fsa(&input, false).unwrap();
        check_identical(&first, &second);
        assert_eq!(first.node_count(), second.node_count());
    }

    #[test]
    fn round_trip_preserves_structure_and_numbering() {
        let input = generate_random(800, (1, 12), (0x00, 0xff));
        let original = build_fsa(&input, true).unwrap();
        let decoded = codec::from_bytes(&codec::to_bytes(&original)).unwrap();

        check_identical(&original, &decoded);
        check_correct(&input, &decoded);
        check_minimal(&decoded);

        let traversal = Traversal::new(&decoded);
        for (i, seq) in input.iter().enumerate() {
            assert_eq!(traversal.perfect_hash(seq), i as i64);
        }
    }

    #[test]
    fn wide_alphabet_corpus_is_correct() {
        let input = generate_random(500, (1, 12), (0x00, 0xff));
        let fsa = build_fsa(&input, false).unwrap();
        check_correct(&input, &fsa);
        check_minimal(&fsa);
    }
}
