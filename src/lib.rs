//! # libfsa
//!
//! A compact, minimal, acyclic [finite-state automaton](https://en.wikipedia.org/wiki/Deterministic_acyclic_finite_state_automaton)
//! (FSA) library for storing very large sets of byte sequences.
//!
//! The automaton is a trie with shared suffixes, built in a single pass from
//! sorted input with on-the-fly minimization (states are frozen bottom-up and
//! deduplicated through a register of canonical nodes, following the algorithm
//! of [Daciuk et al. (2000)](https://arxiv.org/abs/cs/0007009v1)).
//!
//! ## Features
//!
//! - **Compact**: suffix sharing minimizes node count; nodes and arcs are
//!   integer handles into flat arrays, not a pointer graph
//! - **Fast**: O(sequence length) membership and prefix queries
//! - **Perfect hashing**: every stored sequence gets a dense rank consistent
//!   with lexicographic order (with the numbering extension enabled)
//! - **Serializable**: a self-describing binary codec round-trips the
//!   automaton without rebuilding
//! - **Thread-safe**: a finished [`Fsa`](fsa::Fsa) is immutable and can be
//!   queried from any number of threads concurrently
//!
//! ## Quick Start
//!
//! Build an automaton from sorted sequences and query it:
//!
//! ```
//! use libfsa::fsa::{build_fsa, MatchKind, Traversal};
//!
//! let fsa = build_fsa(["bake", "cake", "fake", "lake", "make"], false).unwrap();
//! let traversal = Traversal::new(&fsa);
//!
//! assert_eq!(traversal.match_sequence(b"cake").kind, MatchKind::ExactMatch);
//! assert_eq!(traversal.match_sequence(b"cak").kind, MatchKind::SequenceIsAPrefix);
//! assert_eq!(traversal.match_sequence(b"ache").kind, MatchKind::NoMatch);
//! ```
//!
//! With the numbering extension, stored sequences map bijectively onto
//! `0..N` in lexicographic order:
//!
//! ```
//! use libfsa::fsa::{build_fsa, Traversal};
//!
//! let fsa = build_fsa(["bake", "cake", "fake"], true).unwrap();
//! let traversal = Traversal::new(&fsa);
//!
//! assert_eq!(traversal.perfect_hash(b"bake"), 0);
//! assert_eq!(traversal.perfect_hash(b"fake"), 2);
//! assert!(traversal.perfect_hash(b"rake") < 0);
//! ```
//!
//! ## Enumeration
//!
//! All stored sequences can be enumerated lazily, in ascending
//! lexicographic order:
//!
//! ```
//! use libfsa::fsa::build_fsa;
//!
//! let fsa = build_fsa(["ab", "abc", "b"], false).unwrap();
//! let all: Vec<Vec<u8>> = fsa.sequences_from_root().collect();
//! assert_eq!(all, vec![b"ab".to_vec(), b"abc".to_vec(), b"b".to_vec()]);
//! ```

#![warn(missing_docs)]

/// Core FSA data structure: representation, builder, traversal, and codec.
pub mod fsa;
