//! Minimal MP4/ISOBMFF atom header parsing.
//!
//! Atoms are length-prefixed, type-tagged records: 4-byte big-endian size
//! followed by a 4-byte type code. A declared size of 1 means a 64-bit
//! size follows the type code; a declared size of 0 means the atom runs to
//! the end of the enclosing region.

/// 4-byte atom type code.
pub type FourCc = [u8; 4];

// Container atoms the walker descends into
pub const MOOV: FourCc = *b"moov";
pub const TRAK: FourCc = *b"trak";
pub const MDIA: FourCc = *b"mdia";
pub const MINF: FourCc = *b"minf";
pub const STBL: FourCc = *b"stbl";
pub const UDTA: FourCc = *b"udta";
pub const META: FourCc = *b"meta";
pub const ILST: FourCc = *b"ilst";

// Target atoms carrying voice memo metadata
pub const MVHD: FourCc = *b"mvhd";
pub const TKHD: FourCc = *b"tkhd";
pub const MDHD: FourCc = *b"mdhd";
pub const NAM: FourCc = *b"\xa9nam";
pub const TSRP: FourCc = *b"tsrp";

// Child type inside the display-title sub-structure
pub const DATA: FourCc = *b"data";

/// Immutable view metadata for one atom: a byte range in the source plus
/// its type code. Payload bytes live at `start + header_len .. end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomHeader {
    pub start: usize,
    pub end: usize,
    pub header_len: usize,
    pub kind: FourCc,
}

impl AtomHeader {
    pub fn payload_start(&self) -> usize {
        self.start + self.header_len
    }
}

/// Read one atom header at `cursor` within the region ending at
/// `region_end`.
///
/// Returns `None` when fewer than 8 bytes remain; that is the natural end
/// of traversal at any nesting level, not an error. The declared end is
/// always clamped to `region_end`, and a declared size too small to cover
/// its own header also ends the level.
pub fn read_atom_header(data: &[u8], cursor: usize, region_end: usize) -> Option<AtomHeader> {
    let region_end = region_end.min(data.len());
    if cursor + 8 > region_end {
        return None;
    }

    let size = u32::from_be_bytes(data[cursor..cursor + 4].try_into().ok()?) as u64;
    let kind: FourCc = data[cursor + 4..cursor + 8].try_into().ok()?;

    let (header_len, end) = match size {
        1 => {
            // 64-bit largesize follows the type code
            if cursor + 16 > region_end {
                return None;
            }
            let large = u64::from_be_bytes(data[cursor + 8..cursor + 16].try_into().ok()?);
            (16usize, (cursor as u64).saturating_add(large))
        }
        0 => (8usize, region_end as u64),
        n => (8usize, (cursor as u64).saturating_add(n)),
    };

    let end = (end.min(region_end as u64)) as usize;
    if end < cursor + header_len {
        return None;
    }

    Some(AtomHeader {
        start: cursor,
        end,
        header_len,
        kind,
    })
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
    fn reads_plain_header() {
        let data = atom(b"mvhd", &[0u8; 4]);
        let h = read_atom_header(&data, 0, data.len()).expect("header");
        assert_eq!(h.kind, MVHD);
        assert_eq!(h.start, 0);
        assert_eq!(h.end, 12);
        assert_eq!(h.header_len, 8);
        assert_eq!(h.payload_start(), 8);
    }

    #[test]
    fn reads_extended_64bit_size() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&20u64.to_be_bytes());
        data.extend_from_slice(&[0u8; 4]);
        let h = read_atom_header(&data, 0, data.len()).expect("header");
        assert_eq!(h.header_len, 16);
        assert_eq!(h.end, 20);
        assert_eq!(h.payload_start(), 16);
    }

    #[test]
    fn size_zero_runs_to_region_end() {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&[0xAA; 32]);
        let h = read_atom_header(&data, 0, data.len()).expect("header");
        assert_eq!(h.end, 40);
    }

    #[test]
    fn truncated_header_ends_traversal() {
        let data = [0u8; 7];
        assert!(read_atom_header(&data, 0, data.len()).is_none());
    }

    #[test]
    fn declared_end_is_clamped_to_region() {
        let mut data = Vec::new();
        data.extend_from_slice(&1000u32.to_be_bytes());
        data.extend_from_slice(b"free");
        data.extend_from_slice(&[0u8; 8]);
        let h = read_atom_header(&data, 0, data.len()).expect("header");
        assert_eq!(h.end, data.len());
    }

    #[test]
    fn undersized_declared_length_ends_level() {
        let mut data = Vec::new();
        data.extend_from_slice(&4u32.to_be_bytes());
        data.extend_from_slice(b"free");
        data.extend_from_slice(&[0u8; 8]);
        assert!(read_atom_header(&data, 0, data.len()).is_none());
    }
}
