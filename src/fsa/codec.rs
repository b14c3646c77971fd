//! Binary serialization of a finished automaton.
//!
//! The format is self-describing and little-endian:
//!
//! - header (18 bytes): magic `b"BFSA"`, version `u8`, flags `u8` (bit 0:
//!   right-language counts embedded), node count `u32`, arc count `u32`,
//!   root handle `u32`
//! - arc records, 6 bytes each: label `u8`, flags `u8`, target `u32`
//!   (0 marks a terminal arc)
//! - node records, 6 bytes each: first arc `u32`, arity `u16`
//! - if flagged: one `u64` right-language count per node
//!
//! [`read`] needs no caller-supplied configuration: whether counts are
//! present is recorded in the header. The reserved slot 0 of the node and
//! arc arrays is not serialized; it is reconstructed on read.

use std::io::{self, Read, Write};

use super::automaton::{ArcSlot, Fsa, NodeSlot, FLAG_FINAL, FLAG_LAST};

/// Magic bytes opening every serialized automaton.
pub const MAGIC: [u8; 4] = *b"BFSA";
/// Current format version.
pub const VERSION: u8 = 1;

const FLAG_HAS_NUMBERS: u8 = 0b01;
const HEADER_LEN: usize = 18;

/// Errors that can occur while deserializing an automaton.
///
/// No partially-reconstructed automaton is ever returned; on error the
/// entire [`read`] call fails.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The stream does not start with the `BFSA` magic bytes.
    #[error("invalid magic bytes: expected BFSA")]
    InvalidMagic,
    /// The stream was written by an unknown format version.
    #[error("unsupported format version: {0} (expected {VERSION})")]
    UnsupportedVersion(u8),
    /// The stream ended before the structures it announced.
    #[error("truncated stream")]
    Truncated,
    /// The stream decoded, but the structures it describes are inconsistent.
    #[error("corrupt automaton: {0}")]
    Corrupt(&'static str),
    /// An underlying I/O failure, passed through unchanged.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Serializes the automaton to `sink`.
///
/// I/O failures of the sink propagate unchanged.
pub fn write(fsa: &Fsa, sink: &mut impl Write) -> io::Result<()> {
    sink.write_all(&to_bytes(fsa))
}

/// Serializes the automaton to an owned byte buffer.
pub fn to_bytes(fsa: &Fsa) -> Vec<u8> {
    let node_count = fsa.node_count();
    let arc_count = fsa.arc_count();
    let mut bytes = Vec::with_capacity(
        HEADER_LEN + 6 * (node_count + arc_count) + 8 * node_count * fsa.numbers.is_some() as usize,
    );

    bytes.extend_from_slice(&MAGIC);
    bytes.push(VERSION);
    let mut flags = 0;
    if fsa.numbers.is_some() {
        flags |= FLAG_HAS_NUMBERS;
    }
    bytes.push(flags);
    bytes.extend_from_slice(&(node_count as u32).to_le_bytes());
    bytes.extend_from_slice(&(arc_count as u32).to_le_bytes());
    bytes.extend_from_slice(&fsa.root.to_le_bytes());

    for arc in &fsa.arcs[1..] {
        bytes.push(arc.label);
        bytes.push(arc.flags);
        bytes.extend_from_slice(&arc.target.to_le_bytes());
    }
    for node in &fsa.nodes[1..] {
        bytes.extend_from_slice(&node.first_arc.to_le_bytes());
        bytes.extend_from_slice(&node.arity.to_le_bytes());
    }
    if let Some(numbers) = &fsa.numbers {
        for &count in &numbers[1..] {
            bytes.extend_from_slice(&count.to_le_bytes());
        }
    }
    bytes
}

/// Deserializes an automaton from `source`.
///
/// # Errors
///
/// Fails with [`CodecError::InvalidMagic`] / [`UnsupportedVersion`] on a
/// foreign or future stream, [`Truncated`] if the stream ends early,
/// [`Corrupt`] if the decoded structures are inconsistent, and passes
/// underlying I/O failures through as [`CodecError::Io`].
///
/// [`UnsupportedVersion`]: CodecError::UnsupportedVersion
/// [`Truncated`]: CodecError::Truncated
/// [`Corrupt`]: CodecError::Corrupt
pub fn read(source: &mut impl Read) -> Result<Fsa, CodecError> {
    let mut header = [0u8; HEADER_LEN];
    fill(source, &mut header)?;

    if header[0..4] != MAGIC {
        return Err(CodecError::InvalidMagic);
    }
    if header[4] != VERSION {
        return Err(CodecError::UnsupportedVersion(header[4]));
    }
    let flags = header[5];
    let node_count = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
    let arc_count = u32::from_le_bytes([header[10], header[11], header[12], header[13]]);
    let root = u32::from_le_bytes([header[14], header[15], header[16], header[17]]);

    if root == 0 || root > node_count {
        return Err(CodecError::Corrupt("root handle out of range"));
    }

    let mut arcs = Vec::with_capacity(arc_count as usize + 1);
    arcs.push(ArcSlot {
        label: 0,
        flags: FLAG_LAST,
        target: 0,
    });
    let mut record = [0u8; 6];
    for _ in 0..arc_count {
        fill(source, &mut record)?;
        let target = u32::from_le_bytes([record[2], record[3], record[4], record[5]]);
        if target > node_count {
            return Err(CodecError::Corrupt("arc target out of range"));
        }
        arcs.push(ArcSlot {
            label: record[0],
            flags: record[1] & (FLAG_FINAL | FLAG_LAST),
            target,
        });
    }

    let mut nodes = Vec::with_capacity(node_count as usize + 1);
    nodes.push(NodeSlot {
        first_arc: 0,
        arity: 0,
    });
    for _ in 0..node_count {
        fill(source, &mut record)?;
        let first_arc = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
        let arity = u16::from_le_bytes([record[4], record[5]]);
        check_node(first_arc, arity, &arcs)?;
        nodes.push(NodeSlot { first_arc, arity });
    }

    let numbers = if flags & FLAG_HAS_NUMBERS != 0 {
        let mut numbers = Vec::with_capacity(node_count as usize + 1);
        numbers.push(0);
        let mut record = [0u8; 8];
        for _ in 0..node_count {
            fill(source, &mut record)?;
            numbers.push(u64::from_le_bytes(record));
        }
        Some(numbers)
    } else {
        None
    };

    Ok(Fsa {
        nodes,
        arcs,
        root,
        numbers,
    })
}

/// Deserializes an automaton from an in-memory buffer.
pub fn from_bytes(mut bytes: &[u8]) -> Result<Fsa, CodecError> {
    read(&mut bytes)
}

/// Validates one node record against the arc array it indexes into.
fn check_node(first_arc: u32, arity: u16, arcs: &[ArcSlot]) -> Result<(), CodecError> {
    if arity == 0 {
        if first_arc != 0 {
            return Err(CodecError::Corrupt("zero-arity node with a first arc"));
        }
        return Ok(());
    }
    let first = first_arc as usize;
    let last = first + arity as usize - 1;
    if first == 0 || last >= arcs.len() {
        return Err(CodecError::Corrupt("node arc range out of bounds"));
    }
    let range = &arcs[first..=last];
    if range[..range.len() - 1].iter().any(|a| a.is_last()) || !range[range.len() - 1].is_last() {
        return Err(CodecError::Corrupt("node arc range badly delimited"));
    }
    if !range.windows(2).all(|w| w[0].label < w[1].label) {
        return Err(CodecError::Corrupt("node arcs not sorted by label"));
    }
    Ok(())
}

/// `read_exact` with end-of-stream reported as [`CodecError::Truncated`]
/// instead of a generic I/O error.
fn fill(source: &mut impl Read, buf: &mut [u8]) -> Result<(), CodecError> {
    source.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::Truncated
        } else {
            CodecError::Io(e)
        }
    })
}

#[cfg(test)]
mod test {
    use super::super::builder::build_fsa;
    use super::super::matcher::{MatchKind, Traversal};
    use super::*;

    const LANGUAGE: [&str; 6] = ["a", "aba", "ac", "b", "ba", "c"];

    #[test]
    fn round_trip_preserves_the_language() {
        let original = build_fsa(LANGUAGE, false).unwrap();
        let decoded = from_bytes(&to_bytes(&original)).unwrap();

        let before: Vec<Vec<u8>> = original.sequences_from_root().collect();
        let after: Vec<Vec<u8>> = decoded.sequences_from_root().collect();
        assert_eq!(before, after);
        assert_eq!(original.node_count(), decoded.node_count());
        assert_eq!(original.arc_count(), decoded.arc_count());
    }

    #[test]
    fn round_trip_preserves_numbers_and_hashes() {
        let original = build_fsa(LANGUAGE, true).unwrap();
        let decoded = from_bytes(&to_bytes(&original)).unwrap();

        assert_eq!(decoded.right_language_count(decoded.root()), Some(6));
        let traversal = Traversal::new(&decoded);
        for (i, seq) in LANGUAGE.iter().enumerate() {
            assert_eq!(traversal.perfect_hash(seq.as_bytes()), i as i64);
        }
        assert_eq!(
            traversal.match_sequence(b"abalonger").kind,
            MatchKind::AutomatonHasPrefix
        );
    }

    #[test]
    fn the_header_records_whether_numbers_are_present() {
        let plain = from_bytes(&to_bytes(&build_fsa(LANGUAGE, false).unwrap())).unwrap();
        assert_eq!(plain.right_language_count(plain.root()), None);

        let numbered = from_bytes(&to_bytes(&build_fsa(LANGUAGE, true).unwrap())).unwrap();
        assert!(numbered.right_language_count(numbered.root()).is_some());
    }

    #[test]
    fn round_trip_of_the_empty_automaton() {
        let original = build_fsa::<&str>([], true).unwrap();
        let decoded = from_bytes(&to_bytes(&original)).unwrap();
        assert_eq!(decoded.first_arc(decoded.root()), None);
        assert_eq!(decoded.right_language_count(decoded.root()), Some(0));
    }

    #[test]
    fn write_goes_through_any_sink() {
        let fsa = build_fsa(LANGUAGE, false).unwrap();
        let mut sink = Vec::new();
        write(&fsa, &mut sink).unwrap();
        assert_eq!(sink, to_bytes(&fsa));
    }

    #[test]
    fn invalid_magic_is_rejected() {
        let mut bytes = to_bytes(&build_fsa(LANGUAGE, false).unwrap());
        bytes[0] = b'X';
        assert!(matches!(
            from_bytes(&bytes),
            Err(CodecError::InvalidMagic)
        ));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = to_bytes(&build_fsa(LANGUAGE, false).unwrap());
        bytes[4] = 99;
        assert!(matches!(
            from_bytes(&bytes),
            Err(CodecError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn truncation_is_detected_at_every_boundary() {
        let bytes = to_bytes(&build_fsa(LANGUAGE, true).unwrap());
        // Inside the header, inside the arc records, inside the node
        // records, and inside the trailing counts.
        for cut in [3, HEADER_LEN + 1, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                matches!(from_bytes(&bytes[..cut]), Err(CodecError::Truncated)),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn out_of_range_root_is_rejected() {
        let mut bytes = to_bytes(&build_fsa(LANGUAGE, false).unwrap());
        bytes[14..18].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(from_bytes(&bytes), Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn out_of_range_arc_target_is_rejected() {
        let mut bytes = to_bytes(&build_fsa(LANGUAGE, false).unwrap());
        // First arc record starts right after the header; its target field
        // is at offset +2.
        bytes[HEADER_LEN + 2..HEADER_LEN + 6].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(from_bytes(&bytes), Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn io_failures_pass_through() {
        struct BrokenSink;
        impl std::io::Write for BrokenSink {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("sink failed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let fsa = build_fsa(LANGUAGE, false).unwrap();
        let err = write(&fsa, &mut BrokenSink).unwrap_err();
        assert_eq!(err.to_string(), "sink failed");
    }

    #[test]
    fn codec_error_display() {
        assert_eq!(
            CodecError::InvalidMagic.to_string(),
            "invalid magic bytes: expected BFSA"
        );
        assert!(CodecError::UnsupportedVersion(7).to_string().contains('7'));
        assert_eq!(CodecError::Truncated.to_string(), "truncated stream");
    }
}
