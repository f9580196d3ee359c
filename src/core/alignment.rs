// alignment.rs - Needleman-Wunsch global alignment of cluster members against a reference read

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::Read;

/// Gap symbol used in aligned rows
pub const GAP: u8 = b'-';

/// Configuration for sequence alignment (linear gap cost)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    pub match_score: i32,
    pub mismatch_penalty: i32,
    pub gap_penalty: i32,
    pub description: Option<String>,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            match_score: 1,
            mismatch_penalty: -1,
            gap_penalty: -1,
            description: Some("Unit-cost global alignment".to_string()),
        }
    }
}

impl AlignmentConfig {
    /// Create configuration from mode string
    pub fn from_mode(mode: &str) -> Result<Self, String> {
        match mode {
            "nw" => Ok(Self::default()),
            "nw-strict" => Ok(Self {
                match_score: 2,
                mismatch_penalty: -3,
                gap_penalty: -2,
                description: Some("Strict global alignment (higher penalties)".to_string()),
            }),
            _ => Err(format!("Unknown alignment mode: {}. Use: nw, nw-strict", mode)),
        }
    }

    /// Create custom configuration
    pub fn custom(match_score: i32, mismatch_penalty: i32, gap_penalty: i32) -> Self {
        Self {
            match_score,
            mismatch_penalty,
            gap_penalty,
            description: Some("Custom alignment parameters".to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("cannot align '{id}': empty sequence")]
    EmptySequence { id: String },

    #[error("cannot align '{id}': {qualities} quality values for {bases} bases")]
    QualityLengthMismatch {
        id: String,
        bases: usize,
        qualities: usize,
    },

    #[error("traceback for '{id}' stopped at ({row}, {col}) instead of the origin")]
    InconsistentTraceback { id: String, row: usize, col: usize },
}

/// Two gapped rows of equal length plus the candidate's qualities per column.
///
/// `candidate_qualities[k]` is `Some` only where a candidate base sits against a
/// reference base. Columns where either row holds a gap carry `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    pub reference: Vec<u8>,
    pub candidate: Vec<u8>,
    pub candidate_qualities: Vec<Option<u8>>,
    pub score: i64,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }
}

// Traceback moves
const DIAG: u8 = 0;
const UP: u8 = 1; // candidate base against a reference gap
const LEFT: u8 = 2; // reference base against a candidate gap

/// Global aligner with a fixed, deterministic tie-break: diagonal, then up, then left
#[derive(Debug, Clone, Default)]
pub struct Aligner {
    config: AlignmentConfig,
}

impl Aligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    fn substitution(&self, a: u8, b: u8) -> i32 {
        if a.eq_ignore_ascii_case(&b) {
            self.config.match_score
        } else {
            self.config.mismatch_penalty
        }
    }

    /// Align `candidate` against `reference`.
    ///
    /// The DP matrices are flat arenas of `(candidate_len + 1) * (reference_len + 1)`
    /// cells; rows follow the candidate, columns follow the reference.
    pub fn align(&self, reference: &Read, candidate: &Read) -> Result<AlignedPair, AlignmentError> {
        let ref_seq = &reference.sequence;
        let cand_seq = &candidate.sequence;
        let cand_quals = &candidate.qualities;

        if ref_seq.is_empty() {
            return Err(AlignmentError::EmptySequence { id: reference.id.clone() });
        }
        if cand_seq.is_empty() {
            return Err(AlignmentError::EmptySequence { id: candidate.id.clone() });
        }
        if cand_quals.len() != cand_seq.len() {
            return Err(AlignmentError::QualityLengthMismatch {
                id: candidate.id.clone(),
                bases: cand_seq.len(),
                qualities: cand_quals.len(),
            });
        }

        let rows = cand_seq.len() + 1;
        let cols = ref_seq.len() + 1;
        let gap = i64::from(self.config.gap_penalty);

        let mut scores = vec![0i64; rows * cols];
        let mut trace = vec![DIAG; rows * cols];

        for c in 1..cols {
            scores[c] = gap * c as i64;
            trace[c] = LEFT;
        }
        for r in 1..rows {
            scores[r * cols] = gap * r as i64;
            trace[r * cols] = UP;
        }

        for r in 1..rows {
            let cand_base = cand_seq[r - 1];
            for c in 1..cols {
                let diagonal = scores[(r - 1) * cols + (c - 1)] + i64::from(self.substitution(cand_base, ref_seq[c - 1]));
                let up = scores[(r - 1) * cols + c] + gap;
                let left = scores[r * cols + (c - 1)] + gap;

                let idx = r * cols + c;
                if diagonal >= up && diagonal >= left {
                    scores[idx] = diagonal;
                    trace[idx] = DIAG;
                } else if up >= left {
                    scores[idx] = up;
                    trace[idx] = UP;
                } else {
                    scores[idx] = left;
                    trace[idx] = LEFT;
                }
            }
        }

        let capacity = rows + cols;
        let mut aligned_ref = Vec::with_capacity(capacity);
        let mut aligned_cand = Vec::with_capacity(capacity);
        let mut aligned_quals = Vec::with_capacity(capacity);

        let (mut r, mut c) = (rows - 1, cols - 1);
        while r > 0 || c > 0 {
            match trace[r * cols + c] {
                DIAG if r > 0 && c > 0 => {
                    aligned_ref.push(ref_seq[c - 1]);
                    aligned_cand.push(cand_seq[r - 1]);
                    aligned_quals.push(Some(cand_quals[r - 1]));
                    r -= 1;
                    c -= 1;
                }
                UP if r > 0 => {
                    aligned_ref.push(GAP);
                    aligned_cand.push(cand_seq[r - 1]);
                    aligned_quals.push(None);
                    r -= 1;
                }
                LEFT if c > 0 => {
                    aligned_ref.push(ref_seq[c - 1]);
                    aligned_cand.push(GAP);
                    aligned_quals.push(None);
                    c -= 1;
                }
                _ => {
                    return Err(AlignmentError::InconsistentTraceback {
                        id: candidate.id.clone(),
                        row: r,
                        col: c,
                    })
                }
            }
        }

        aligned_ref.reverse();
        aligned_cand.reverse();
        aligned_quals.reverse();

        Ok(AlignedPair {
            reference: aligned_ref,
            candidate: aligned_cand,
            candidate_qualities: aligned_quals,
            score: scores[rows * cols - 1],
        })
    }
}

/// Compute alignment statistics from aligned rows: (mismatches, indel events, indel bases)
pub fn compute_alignment_stats(query: &[u8], reference: &[u8]) -> (usize, usize, usize) {
    let mut snps = 0;
    let mut indel_events = 0;
    let mut indel_bases = 0;
    let mut in_gap = false;

    for (&q, &r) in query.iter().zip(reference.iter()) {
        if q == GAP || r == GAP {
            if !in_gap {
                indel_events += 1;
                in_gap = true;
            }
            indel_bases += 1;
        } else {
            in_gap = false;
            if !q.eq_ignore_ascii_case(&r) {
                snps += 1;
            }
        }
    }

    (snps, indel_events, indel_bases)
}
