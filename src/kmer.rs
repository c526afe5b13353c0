//src/kmer.rs

use crate::types::Read;

/// Reads are truncated to this many bases before encoding; shorter reads are rejected.
pub const READ_WINDOW: usize = 150;

/// K-mer size the bundled models were trained with.
pub const DEFAULT_KMER_SIZE: usize = 9;

/// Returns true if the read is long enough and only contains A, C, G or T
/// (either case).
pub fn passes_filter(seq: &str) -> bool {
    seq.len() >= READ_WINDOW
        && seq
            .bytes()
            .all(|b| matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T'))
}

/// Turns the first `READ_WINDOW` bases of `seq` into a space-delimited string
/// of uppercase k-mers, sliding by one base.
///
/// The caller is expected to have checked `passes_filter`; the encoder works
/// on bytes and assumes an ASCII alphabet.
pub fn encode_kmers(seq: &str, k: usize) -> String {
    let bytes = seq.as_bytes();
    let window = bytes[..READ_WINDOW.min(bytes.len())].to_ascii_uppercase();
    if k == 0 || k > window.len() {
        return String::new();
    }

    let n_kmers = window.len() - k + 1;
    let mut out = String::with_capacity(n_kmers * (k + 1));
    for (i, kmer) in window.windows(k).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.extend(kmer.iter().map(|&b| b as char));
    }
    out
}

/// Applies the read filter then the encoder to a chunk.
/// Returns the surviving reads in input order alongside their k-mer strings.
pub fn process_reads(reads: &[Read], k: usize) -> (Vec<&Read>, Vec<String>) {
    let mut kept = Vec::with_capacity(reads.len());
    let mut encoded = Vec::with_capacity(reads.len());

    for read in reads {
        if passes_filter(&read.seq) {
            encoded.push(encode_kmers(&read.seq, k));
            kept.push(read);
        }
    }

    (kept, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(id: &str, seq: &str) -> Read {
        Read {
            id: id.to_string(),
            header_line: id.to_string(),
            seq: seq.to_string(),
        }
    }

    // Deterministic pseudo-random ACGT string with mixed case
    fn mixed_sequence(len: usize, seed: u64) -> String {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let base = [b'A', b'c', b'G', b't', b'a', b'C', b'g', b'T'][(state >> 61) as usize];
                base as char
            })
            .collect()
    }

    #[test]
    fn poly_a_read_gives_142_identical_kmers() {
        let seq = "A".repeat(150);
        let encoded = encode_kmers(&seq, 9);
        let tokens: Vec<&str> = encoded.split(' ').collect();
        assert_eq!(tokens.len(), 142);
        assert!(tokens.iter().all(|t| *t == "AAAAAAAAA"));
    }

    #[test]
    fn token_count_and_content_hold_for_any_valid_read() {
        for (seed, len) in [(1u64, 150usize), (2, 151), (3, 300), (4, 1000)] {
            let seq = mixed_sequence(len, seed);
            assert!(passes_filter(&seq));
            let upper = seq[..150].to_ascii_uppercase();
            for k in [1usize, 4, 9, 31, 150] {
                let encoded = encode_kmers(&seq, k);
                let tokens: Vec<&str> = encoded.split(' ').collect();
                assert_eq!(tokens.len(), 150 - k + 1);
                for (i, token) in tokens.iter().enumerate() {
                    assert_eq!(token.len(), k);
                    assert_eq!(*token, &upper[i..i + k]);
                }
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let seq = mixed_sequence(200, 42);
        assert_eq!(encode_kmers(&seq, 9), encode_kmers(&seq, 9));
    }

    #[test]
    fn rejects_short_reads_and_non_acgt() {
        assert!(!passes_filter(&"A".repeat(149)));
        assert!(passes_filter(&"a".repeat(150)));

        let mut with_n = "ACGT".repeat(50);
        with_n.replace_range(10..11, "N");
        assert!(!passes_filter(&with_n));

        let mut with_lower_n = "ACGT".repeat(50);
        with_lower_n.replace_range(199..200, "n");
        assert!(!passes_filter(&with_lower_n));
    }

    #[test]
    fn process_reads_keeps_order_and_drops_rejects() {
        let reads = vec![
            read("short", &"A".repeat(149)),
            read("ok1", &"C".repeat(150)),
            read("n", &format!("{}N", "G".repeat(160))),
            read("ok2", &"t".repeat(170)),
        ];
        let (kept, encoded) = process_reads(&reads, 9);
        let ids: Vec<&str> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ok1", "ok2"]);
        assert_eq!(encoded.len(), 2);
        assert!(encoded[1].starts_with("TTTTTTTTT "));
    }
}
