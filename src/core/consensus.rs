// consensus.rs - Quality-weighted consensus calling over one cluster of reads

use log::{debug, warn};
use thiserror::Error;

use crate::core::alignment::{compute_alignment_stats, AlignedPair, Aligner, AlignmentConfig, GAP};
use crate::data::Read;

/// Base emitted where no nucleotide wins a column
pub const NO_CALL_BASE: u8 = b'N';

/// Quality reported for no-call positions
pub const MIN_QUALITY: u8 = 2;

/// Highest quality representable in phred+33 FASTQ
pub const MAX_QUALITY: u8 = 93;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("cannot build a consensus from an empty cluster")]
    EmptyCluster,
}

/// One consensus read per cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusRecord {
    /// Id of the reference (representative) read
    pub id: String,
    pub sequence: Vec<u8>,
    /// Raw Phred values, same length as `sequence`
    pub qualities: Vec<u8>,
    /// Number of reads in the cluster
    pub read_count: usize,
    /// Members left out of the tally because their alignment failed
    pub excluded: usize,
    pub contig: String,
    pub start: i64,
    pub end: i64,
}

impl ConsensusRecord {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Header description used by the FASTQ/FASTA writers
    pub fn description(&self) -> String {
        format!(
            "cluster_size={} locus={}:{}-{}",
            self.read_count, self.contig, self.start, self.end
        )
    }
}

// Tally slots, in tie-break priority order
const SLOT_A: usize = 0;
const SLOT_C: usize = 1;
const SLOT_G: usize = 2;
const SLOT_T: usize = 3;
const SLOT_NO_CALL: usize = 4;
const SLOT_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

fn slot_of(base: u8) -> usize {
    match base.to_ascii_uppercase() {
        b'A' => SLOT_A,
        b'C' => SLOT_C,
        b'G' => SLOT_G,
        b'T' => SLOT_T,
        _ => SLOT_NO_CALL,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ColumnTally {
    weight: [u64; 5],
    count: [u32; 5],
    max_quality: [u8; 5],
}

impl ColumnTally {
    fn add(&mut self, slot: usize, quality: u8) {
        self.weight[slot] += u64::from(quality);
        self.count[slot] += 1;
        self.max_quality[slot] = self.max_quality[slot].max(quality);
    }

    fn total_count(&self) -> u32 {
        self.count.iter().sum()
    }

    /// Highest weight, then highest count, then slot priority
    fn winner(&self) -> usize {
        let mut best = SLOT_A;
        for slot in 1..5 {
            let key = (self.weight[slot], self.count[slot]);
            if key > (self.weight[best], self.count[best]) {
                best = slot;
            }
        }
        best
    }

    fn call(&self) -> (u8, u8) {
        if self.total_count() == 0 {
            return (NO_CALL_BASE, MIN_QUALITY);
        }
        match self.winner() {
            SLOT_NO_CALL => (NO_CALL_BASE, MIN_QUALITY),
            slot => (SLOT_BASES[slot], self.max_quality[slot].min(MAX_QUALITY)),
        }
    }
}

/// Quality of the nearest candidate base before and after every aligned column.
///
/// Inserted bases carry no quality in the pair, so only bases placed against the
/// reference count as flanks.
fn flanking_qualities(pair: &AlignedPair) -> (Vec<Option<u8>>, Vec<Option<u8>>) {
    let n = pair.len();
    let mut before = vec![None; n];
    let mut after = vec![None; n];

    let mut last = None;
    for k in 0..n {
        before[k] = last;
        if pair.candidate_qualities[k].is_some() {
            last = pair.candidate_qualities[k];
        }
    }
    last = None;
    for k in (0..n).rev() {
        after[k] = last;
        if pair.candidate_qualities[k].is_some() {
            last = pair.candidate_qualities[k];
        }
    }
    (before, after)
}

/// Weight of a deletion: the weaker of the two flanking candidate bases
fn gap_weight(before: Option<u8>, after: Option<u8>) -> u8 {
    match (before, after) {
        (Some(a), Some(b)) => a.min(b),
        (Some(q), None) | (None, Some(q)) => q,
        (None, None) => 0,
    }
}

/// Builds a consensus read from a cluster by aligning every member to a reference read
#[derive(Debug, Clone, Default)]
pub struct ConsensusBuilder {
    aligner: Aligner,
}

impl ConsensusBuilder {
    pub fn new(config: AlignmentConfig) -> Self {
        Self {
            aligner: Aligner::new(config),
        }
    }

    /// Index of the longest read; ties go to the earliest one
    fn reference_index(reads: &[&Read]) -> usize {
        let mut best = 0;
        for (i, read) in reads.iter().enumerate().skip(1) {
            if read.len() > reads[best].len() {
                best = i;
            }
        }
        best
    }

    /// Tally one aligned member into the reference-frame columns
    fn tally_member(columns: &mut [ColumnTally], pair: &AlignedPair) {
        let (before, after) = flanking_qualities(pair);
        let mut ref_pos = 0;

        for k in 0..pair.len() {
            if pair.reference[k] == GAP {
                // insertion relative to the reference
                continue;
            }
            match pair.candidate_qualities[k] {
                Some(quality) => columns[ref_pos].add(slot_of(pair.candidate[k]), quality),
                None => columns[ref_pos].add(SLOT_NO_CALL, gap_weight(before[k], after[k])),
            }
            ref_pos += 1;
        }
    }

    /// Build the consensus for the reads of one cluster.
    ///
    /// A single read is returned unchanged. Otherwise every column of the
    /// reference read is called by quality-weighted vote, so the consensus
    /// always has the reference's length.
    pub fn build(&self, reads: &[&Read]) -> Result<ConsensusRecord, ConsensusError> {
        let reference = match reads {
            [] => return Err(ConsensusError::EmptyCluster),
            [only] => {
                return Ok(ConsensusRecord {
                    id: only.id.clone(),
                    sequence: only.sequence.clone(),
                    qualities: only.qualities.clone(),
                    read_count: 1,
                    excluded: 0,
                    contig: only.contig.clone(),
                    start: only.start,
                    end: only.end,
                })
            }
            _ => reads[Self::reference_index(reads)],
        };

        let mut columns = vec![ColumnTally::default(); reference.len()];
        for (pos, &base) in reference.sequence.iter().enumerate() {
            let quality = reference.qualities.get(pos).copied().unwrap_or(0);
            columns[pos].add(slot_of(base), quality);
        }

        let mut excluded = 0;
        for member in reads.iter().filter(|r| !std::ptr::eq(**r, reference)) {
            match self.aligner.align(reference, member) {
                Ok(pair) => {
                    let (snps, indel_events, indel_bases) =
                        compute_alignment_stats(&pair.candidate, &pair.reference);
                    debug!(
                        "Aligned {} to {}: score {}, {} mismatches, {} indels ({} bases)",
                        member.id, reference.id, pair.score, snps, indel_events, indel_bases
                    );
                    Self::tally_member(&mut columns, &pair);
                }
                Err(e) => {
                    warn!("Excluding {} from consensus of {}: {}", member.id, reference.id, e);
                    excluded += 1;
                }
            }
        }

        let (sequence, qualities): (Vec<u8>, Vec<u8>) = columns.iter().map(ColumnTally::call).unzip();

        Ok(ConsensusRecord {
            id: reference.id.clone(),
            sequence,
            qualities,
            read_count: reads.len(),
            excluded,
            contig: reference.contig.clone(),
            start: reference.start,
            end: reference.end,
        })
    }
}
