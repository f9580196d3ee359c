// distance.rs - Pairwise read distances and the condensed distance matrix

use rayon::prelude::*;

use crate::data::Read;

/// Sentinel stored in the condensed matrix for pairs that can never share a cluster
const NOT_CO_CLUSTERABLE: u32 = u32::MAX;

/// Hamming distance between two UMIs.
/// Returns `None` when the lengths differ: UMIs have a fixed protocol length,
/// so a mismatch means corrupt input rather than a large distance.
pub fn umi_distance(umi1: &[u8], umi2: &[u8]) -> Option<u32> {
    if umi1.len() != umi2.len() {
        return None;
    }
    let mismatches = umi1
        .iter()
        .zip(umi2.iter())
        .filter(|(a, b)| !a.eq_ignore_ascii_case(b))
        .count();
    Some(mismatches as u32)
}

/// True when both ends of the two alignments lie within `window` bases of each other
pub fn within_window(a: &Read, b: &Read, window: u64) -> bool {
    a.start.abs_diff(b.start) <= window && a.end.abs_diff(b.end) <= window
}

/// Distance between two reads.
///
/// The coordinate window is a gate, not a penalty: reads on different contigs or
/// with either end further apart than `window` are not co-clusterable (`None`).
/// Inside the window the distance is the UMI Hamming distance alone.
pub fn read_distance(a: &Read, b: &Read, window: u64) -> Option<u32> {
    if a.contig != b.contig {
        return None;
    }
    if !within_window(a, b, window) {
        return None;
    }
    umi_distance(&a.umi, &b.umi)
}

/// Symmetric, zero-diagonal distance matrix over one read group.
///
/// Only the strict upper triangle is stored, row-major, in the same condensed
/// layout `scipy.spatial.distance.pdist` uses.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    n: usize,
    condensed: Vec<u32>,
}

impl DistanceMatrix {
    /// Compute all pairwise distances. `excluded[i] == true` marks reads that
    /// must stay isolated; every pair involving them is not co-clusterable.
    pub fn build(reads: &[Read], window: u64, excluded: &[bool]) -> Self {
        let n = reads.len();
        debug_assert_eq!(excluded.len(), n);

        // One allocation for the whole triangle, split into disjoint rows for the workers
        let mut condensed = vec![NOT_CO_CLUSTERABLE; n * n.saturating_sub(1) / 2];
        let mut rows: Vec<(usize, &mut [u32])> = Vec::with_capacity(n);
        let mut rest = condensed.as_mut_slice();
        for i in 0..n {
            let (row, tail) = std::mem::take(&mut rest).split_at_mut(n - i - 1);
            rows.push((i, row));
            rest = tail;
        }

        rows.into_par_iter().for_each(|(i, row)| {
            if excluded[i] {
                return;
            }
            for (offset, cell) in row.iter_mut().enumerate() {
                let j = i + 1 + offset;
                if excluded[j] {
                    continue;
                }
                if let Some(distance) = read_distance(&reads[i], &reads[j], window) {
                    *cell = distance;
                }
            }
        });

        Self { n, condensed }
    }

    /// Number of reads covered by the matrix
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    fn condensed_index(&self, i: usize, j: usize) -> usize {
        // i < j
        self.n * i - i * (i + 1) / 2 + (j - i - 1)
    }

    /// Distance between reads `i` and `j`; `None` when they are not co-clusterable
    pub fn get(&self, i: usize, j: usize) -> Option<u32> {
        if i == j {
            return Some(0);
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        match self.condensed[self.condensed_index(lo, hi)] {
            NOT_CO_CLUSTERABLE => None,
            d => Some(d),
        }
    }

    /// Iterate over all pairs `(i, j)` with `i < j` whose distance is at most `threshold`
    pub fn edges_within(&self, threshold: u32) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.n).flat_map(move |i| {
            (i + 1..self.n).filter_map(move |j| match self.get(i, j) {
                Some(d) if d <= threshold => Some((i, j)),
                _ => None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(id: &str, umi: &[u8], start: i64, end: i64) -> Read {
        Read::new(id, umi, b"ACGT", &[30; 4], start, end).on_contig("chr1")
    }

    #[test]
    fn test_umi_distance() {
        assert_eq!(umi_distance(b"AAAA", b"AAAA"), Some(0));
        assert_eq!(umi_distance(b"AAAA", b"AAAT"), Some(1));
        assert_eq!(umi_distance(b"ACGT", b"TGCA"), Some(4));
        assert_eq!(umi_distance(b"acgt", b"ACGT"), Some(0));
        assert_eq!(umi_distance(b"AAAA", b"AAAAA"), None);
    }

    #[test]
    fn test_identical_umis_within_window() {
        let a = read("a", b"AAAA", 100, 200);
        let b = read("b", b"AAAA", 101, 199);
        assert_eq!(read_distance(&a, &b, 5), Some(0));
    }

    #[test]
    fn test_coordinate_gate() {
        let a = read("a", b"AAAA", 100, 200);
        let b = read("b", b"AAAT", 400, 500);
        assert_eq!(read_distance(&a, &b, 5), None);

        // only the end is out of range
        let c = read("c", b"AAAA", 100, 206);
        assert_eq!(read_distance(&a, &c, 5), None);
        assert_eq!(read_distance(&a, &c, 6), Some(0));
    }

    #[test]
    fn test_different_contigs_never_cluster() {
        let a = read("a", b"AAAA", 100, 200);
        let b = read("b", b"AAAA", 100, 200).on_contig("chr2");
        assert_eq!(read_distance(&a, &b, 5), None);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let reads = vec![
            read("a", b"AAAA", 100, 200),
            read("b", b"AAAT", 102, 203),
            read("c", b"AATT", 300, 400),
            read("d", b"AAA", 100, 200),
            read("e", b"CCCC", 95, 195),
        ];
        for a in &reads {
            for b in &reads {
                assert_eq!(read_distance(a, b, 5), read_distance(b, a, 5));
            }
        }
    }

    #[test]
    fn test_matrix_layout() {
        let reads = vec![
            read("a", b"AAAA", 100, 200),
            read("b", b"AAAT", 101, 201),
            read("c", b"TTTT", 100, 200),
            read("d", b"AAAA", 900, 1000),
        ];
        let matrix = DistanceMatrix::build(&reads, 5, &[false; 4]);

        assert_eq!(matrix.len(), 4);
        for i in 0..4 {
            assert_eq!(matrix.get(i, i), Some(0));
            for j in 0..4 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                if i != j {
                    assert_eq!(matrix.get(i, j), read_distance(&reads[i], &reads[j], 5));
                }
            }
        }
        assert_eq!(matrix.get(0, 1), Some(1));
        assert_eq!(matrix.get(0, 2), Some(4));
        assert_eq!(matrix.get(2, 3), None);

        let edges: Vec<_> = matrix.edges_within(1).collect();
        assert_eq!(edges, vec![(0, 1)]);
    }

    #[test]
    fn test_excluded_reads_have_no_edges() {
        let reads = vec![read("a", b"AAAA", 100, 200), read("b", b"AAAA", 100, 200)];
        let matrix = DistanceMatrix::build(&reads, 5, &[false, true]);
        assert_eq!(matrix.get(0, 1), None);
        assert_eq!(matrix.edges_within(10).count(), 0);
    }

    #[test]
    fn test_condensed_rows_match_pairwise_distances() {
        let umis: [&[u8]; 6] = [b"AAAA", b"AAAT", b"AATT", b"CCCC", b"AAAA", b"ACAA"];
        let reads: Vec<Read> = umis
            .iter()
            .enumerate()
            .map(|(i, umi)| read(&format!("r{}", i), umi, 100 + 3 * i as i64, 200 + 3 * i as i64))
            .collect();
        let excluded = vec![false, false, false, false, true, false];
        let matrix = DistanceMatrix::build(&reads, 5, &excluded);

        assert_eq!(matrix.condensed.len(), reads.len() * (reads.len() - 1) / 2);
        for i in 0..reads.len() {
            for j in i + 1..reads.len() {
                let expected = if excluded[i] || excluded[j] {
                    None
                } else {
                    read_distance(&reads[i], &reads[j], 5)
                };
                assert_eq!(matrix.get(i, j), expected, "pair ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = DistanceMatrix::build(&[], 5, &[]);
        assert!(matrix.is_empty());
        assert_eq!(matrix.edges_within(1).count(), 0);
    }
}
