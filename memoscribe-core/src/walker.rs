//! Recursive atom tree traversal.
//!
//! Walks a bounded byte region, descends only into the closed whitelist of
//! container atoms, and captures raw payload bytes for a set of wanted
//! atom types wherever they occur in the nesting.

use std::collections::HashMap;

use bytes::Bytes;

use crate::atom::{self, read_atom_header, FourCc};

/// Container atoms whose payload is itself a sequence of child atoms.
/// Anything not listed here and not wanted is skipped as an opaque block.
pub const CONTAINERS: [FourCc; 8] = [
    atom::MOOV,
    atom::TRAK,
    atom::MDIA,
    atom::MINF,
    atom::STBL,
    atom::UDTA,
    atom::META,
    atom::ILST,
];

// Guards against pathological size fields creating runaway recursion.
const MAX_DEPTH: usize = 16;

/// Collect the payload bytes of every wanted atom within `[start, end)`.
///
/// Duplicate occurrences of a wanted type resolve by last-occurrence-wins
/// in traversal order; see [`merge_last_wins`].
pub fn collect_atoms(data: &Bytes, start: usize, end: usize, wanted: &[FourCc]) -> HashMap<FourCc, Bytes> {
    walk(data, start, end, wanted, 0)
}

/// Merge `from` into `into`, unconditionally overwriting existing keys.
///
/// This is the traversal's precedence rule: when a wanted atom type occurs
/// more than once in the tree, the occurrence visited last is kept.
fn merge_last_wins(into: &mut HashMap<FourCc, Bytes>, from: HashMap<FourCc, Bytes>) {
    for (kind, payload) in from {
        into.insert(kind, payload);
    }
}

fn walk(data: &Bytes, start: usize, end: usize, wanted: &[FourCc], depth: usize) -> HashMap<FourCc, Bytes> {
    let mut found = HashMap::new();
    if depth > MAX_DEPTH {
        tracing::warn!(depth, "atom nesting exceeds depth limit, stopping descent");
        return found;
    }

    let mut cursor = start;
    while cursor < end {
        let Some(header) = read_atom_header(data, cursor, end) else {
            // Truncated trailing bytes end traversal at this level.
            break;
        };

        if wanted.contains(&header.kind) {
            tracing::trace!(kind = %String::from_utf8_lossy(&header.kind), start = header.start, "captured atom");
            found.insert(header.kind, data.slice(header.payload_start()..header.end));
        }

        if CONTAINERS.contains(&header.kind) {
            let mut child_start = header.payload_start();
            // meta carries a 4-byte version/flags prefix before its first
            // child; skipping it keeps descendant offsets aligned.
            if header.kind == atom::META {
                child_start = (child_start + 4).min(header.end);
            }
            let children = walk(data, child_start, header.end, wanted, depth + 1);
            merge_last_wins(&mut found, children);
        }

        cursor = header.end;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&((payload.len() as u32 + 8).to_be_bytes()));
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn captures_target_nested_three_levels_deep() {
        let tsrp = atom(b"tsrp", b"{\"x\":1}");
        let udta = atom(b"udta", &tsrp);
        let trak = atom(b"trak", &udta);
        let moov = atom(b"moov", &trak);
        let data = Bytes::from(moov);

        let found = collect_atoms(&data, 0, data.len(), &[atom::TSRP]);
        assert_eq!(found[&atom::TSRP].as_ref(), b"{\"x\":1}");
    }

    #[test]
    fn does_not_descend_into_non_whitelisted_atoms() {
        // An mdat whose payload happens to contain a well-formed mvhd atom;
        // the walker must treat it as opaque bytes.
        let decoy = atom(b"mvhd", &[0u8; 24]);
        let mdat = atom(b"mdat", &decoy);
        let data = Bytes::from(mdat);

        let found = collect_atoms(&data, 0, data.len(), &[atom::MVHD]);
        assert!(found.is_empty());
    }

    #[test]
    fn skips_meta_version_flags_prefix() {
        let nam = atom(b"\xa9nam", b"title-bytes");
        let mut meta_payload = vec![0u8; 4]; // version/flags
        meta_payload.extend_from_slice(&atom(b"ilst", &nam));
        let meta = atom(b"meta", &meta_payload);
        let data = Bytes::from(meta);

        let found = collect_atoms(&data, 0, data.len(), &[atom::NAM]);
        assert_eq!(found[&atom::NAM].as_ref(), b"title-bytes");
    }

    #[test]
    fn last_occurrence_wins_for_duplicate_targets() {
        let first = atom(b"mdhd", b"first-payload");
        let second = atom(b"mdhd", b"second-payload");
        let trak_a = atom(b"trak", &first);
        let trak_b = atom(b"trak", &second);
        let mut moov_payload = trak_a;
        moov_payload.extend_from_slice(&trak_b);
        let moov = atom(b"moov", &moov_payload);
        let data = Bytes::from(moov);

        let found = collect_atoms(&data, 0, data.len(), &[atom::MDHD]);
        assert_eq!(found[&atom::MDHD].as_ref(), b"second-payload");
    }

    #[test]
    fn truncated_trailing_atom_ends_level_quietly() {
        let mvhd = atom(b"mvhd", &[7u8; 4]);
        let mut top = mvhd;
        top.extend_from_slice(&[0x00, 0x00]); // not enough for a header
        let data = Bytes::from(top);

        let found = collect_atoms(&data, 0, data.len(), &[atom::MVHD]);
        assert_eq!(found[&atom::MVHD].as_ref(), &[7u8; 4]);
    }
}
