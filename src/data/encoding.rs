// ============================================================
// Layer 4 — One-Hot Sequence Encoding
// ============================================================
// DNA is encoded as a [4, padded_len] matrix in channel-major
// order (A, C, G, T). Unknown bases such as N get an all-zero
// column. Short sequences are right-padded with zero columns,
// long ones are truncated.

pub const NUM_BASES: usize = 4;

fn base_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' | b'U' => Some(3),
        _ => None,
    }
}

/// True if every character is a nucleotide code (ACGTUN, any case)
pub fn is_nucleotide_string(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'U' | b'N'))
}

/// Flattened one-hot matrix, index = channel * padded_len + position
pub fn one_hot(sequence: &str, padded_len: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; NUM_BASES * padded_len];
    for (pos, base) in sequence.bytes().take(padded_len).enumerate() {
        if let Some(ch) = base_index(base) {
            out[ch * padded_len + pos] = 1.0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_major_layout() {
        let x = one_hot("ACGT", 4);
        // A at pos 0, C at pos 1, G at pos 2, T at pos 3 → identity
        for ch in 0..4 {
            for pos in 0..4 {
                let expected = if ch == pos { 1.0 } else { 0.0 };
                assert_eq!(x[ch * 4 + pos], expected);
            }
        }
    }

    #[test]
    fn test_padding_and_unknown_bases() {
        let x = one_hot("aN", 3);
        assert_eq!(x.len(), 12);
        assert_eq!(x[0], 1.0); // lowercase a
        // N and the padded column are empty
        assert_eq!(x.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn test_truncation() {
        let x = one_hot("GGGGGG", 2);
        assert_eq!(x.iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn test_nucleotide_detection() {
        assert!(is_nucleotide_string("ACGTN"));
        assert!(!is_nucleotide_string("sequence"));
        assert!(!is_nucleotide_string(""));
    }
}
