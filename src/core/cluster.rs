// cluster.rs - Single-linkage clustering of reads over the UMI/locus threshold graph

use std::collections::HashMap;

use log::debug;

use crate::core::distance::DistanceMatrix;
use crate::data::{Read, ReadError};

/// Parameters controlling which reads are considered the same molecule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterParams {
    /// Maximum UMI Hamming distance for two reads to be linked
    pub threshold: u32,
    /// Maximum offset of either alignment end for two reads to be linked
    pub window: u64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            threshold: 1,
            window: 5,
        }
    }
}

/// A set of read indices (into the group's read list) that share a molecule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Sorted, non-empty
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Result of clustering one read group
#[derive(Debug, Clone, Default)]
pub struct Clustering {
    /// Ordered by smallest member index
    pub clusters: Vec<Cluster>,
    /// Reads isolated because they failed validation
    pub malformed: Vec<(usize, ReadError)>,
}

/// Disjoint-set forest with path halving and union by size
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

/// Most common UMI length in the group; ties go to the shorter length
fn modal_umi_length(reads: &[Read]) -> Option<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for read in reads.iter().filter(|r| !r.umi.is_empty()) {
        *counts.entry(read.umi.len()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(len_a, count_a), (len_b, count_b)| {
            count_a.cmp(count_b).then_with(|| len_b.cmp(len_a))
        })
        .map(|(len, _)| len)
}

/// Find the reads that must be kept out of every multi-read cluster
fn find_malformed(reads: &[Read]) -> Vec<(usize, ReadError)> {
    let expected_umi_len = modal_umi_length(reads);
    reads
        .iter()
        .enumerate()
        .filter_map(|(i, read)| {
            if let Err(e) = read.validate() {
                return Some((i, e));
            }
            match expected_umi_len {
                Some(expected) if read.umi.len() != expected => Some((
                    i,
                    ReadError::UmiLengthMismatch {
                        id: read.id.clone(),
                        expected,
                        found: read.umi.len(),
                    },
                )),
                _ => None,
            }
        })
        .collect()
}

/// Partition `reads` into clusters.
///
/// Two reads share a cluster iff they are joined by a chain of pairs whose
/// distance is at most `params.threshold`, i.e. clusters are the connected
/// components of the threshold graph. Membership therefore does not depend on
/// the order of the input. Malformed reads become singletons.
pub fn cluster_reads(reads: &[Read], params: &ClusterParams) -> Clustering {
    let n = reads.len();
    if n == 0 {
        return Clustering::default();
    }

    let malformed = find_malformed(reads);
    let mut excluded = vec![false; n];
    for (i, err) in &malformed {
        debug!("Isolating malformed read: {}", err);
        excluded[*i] = true;
    }

    let mut uf = UnionFind::new(n);
    if n > 1 {
        let matrix = DistanceMatrix::build(reads, params.window, &excluded);
        for (i, j) in matrix.edges_within(params.threshold) {
            uf.union(i, j);
        }
    }

    // Group by root, then order clusters by their smallest member
    let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..n {
        let root = uf.find(i);
        by_root.entry(root).or_default().push(i);
    }
    let mut clusters: Vec<Cluster> = by_root
        .into_values()
        .map(|members| Cluster { members })
        .collect();
    clusters.sort_by_key(|c| c.members[0]);

    Clustering { clusters, malformed }
}
