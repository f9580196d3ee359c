// read.rs - Read model shared by the loader, the clustering engine and the consensus builder

use thiserror::Error;

/// Reasons a read cannot take part in clustering or consensus calling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("read '{id}' has an empty sequence")]
    EmptySequence { id: String },

    #[error("read '{id}' has {qualities} quality values for {bases} bases")]
    QualityLengthMismatch {
        id: String,
        bases: usize,
        qualities: usize,
    },

    #[error("read '{id}' has no UMI")]
    EmptyUmi { id: String },

    #[error("read '{id}' has a UMI of length {found}, expected {expected}")]
    UmiLengthMismatch {
        id: String,
        expected: usize,
        found: usize,
    },
}

/// A single aligned read as seen by the core.
///
/// Qualities are raw Phred values (no ASCII offset). Coordinates are the
/// 1-based inclusive alignment span on `contig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub id: String,
    pub umi: Vec<u8>,
    pub sequence: Vec<u8>,
    pub qualities: Vec<u8>,
    pub start: i64,
    pub end: i64,
    pub contig: String,
    pub reverse: bool,
}

impl Read {
    pub fn new(
        id: impl Into<String>,
        umi: &[u8],
        sequence: &[u8],
        qualities: &[u8],
        start: i64,
        end: i64,
    ) -> Self {
        Self {
            id: id.into(),
            umi: umi.to_ascii_uppercase(),
            sequence: sequence.to_vec(),
            qualities: qualities.to_vec(),
            start,
            end,
            contig: String::new(),
            reverse: false,
        }
    }

    /// Set the contig name
    pub fn on_contig(mut self, contig: impl Into<String>) -> Self {
        self.contig = contig.into();
        self
    }

    /// Mark the read as aligned to the reverse strand
    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Check the per-read invariants. UMI length consistency is a group-level
    /// property and is checked by the clustering engine.
    pub fn validate(&self) -> Result<(), ReadError> {
        if self.sequence.is_empty() {
            return Err(ReadError::EmptySequence { id: self.id.clone() });
        }
        if self.qualities.len() != self.sequence.len() {
            return Err(ReadError::QualityLengthMismatch {
                id: self.id.clone(),
                bases: self.sequence.len(),
                qualities: self.qualities.len(),
            });
        }
        if self.umi.is_empty() {
            return Err(ReadError::EmptyUmi { id: self.id.clone() });
        }
        Ok(())
    }
}

/// All reads of one contig, in input order
#[derive(Debug, Clone, Default)]
pub struct ReadGroup {
    pub contig: String,
    pub reads: Vec<Read>,
}

impl ReadGroup {
    pub fn new(contig: impl Into<String>, reads: Vec<Read>) -> Self {
        Self {
            contig: contig.into(),
            reads,
        }
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_umi_is_uppercased() {
        let read = Read::new("r1", b"acgt", b"ACGT", &[30; 4], 1, 4);
        assert_eq!(read.umi, b"ACGT");
    }

    #[test]
    fn test_validate_accepts_well_formed_read() {
        let read = Read::new("r1", b"ACGT", b"ACGTAC", &[30; 6], 10, 15).on_contig("chr1");
        assert!(read.validate().is_ok());
        assert_eq!(read.len(), 6);
        assert_eq!(read.contig, "chr1");
    }

    #[test]
    fn test_validate_rejects_malformed_reads() {
        let empty = Read::new("e", b"ACGT", b"", &[], 1, 1);
        assert_eq!(
            empty.validate(),
            Err(ReadError::EmptySequence { id: "e".to_string() })
        );

        let short_quals = Read::new("q", b"ACGT", b"ACGT", &[30; 3], 1, 4);
        assert!(matches!(
            short_quals.validate(),
            Err(ReadError::QualityLengthMismatch { bases: 4, qualities: 3, .. })
        ));

        let no_umi = Read::new("u", b"", b"ACGT", &[30; 4], 1, 4);
        assert!(matches!(no_umi.validate(), Err(ReadError::EmptyUmi { .. })));
    }

    #[test]
    fn test_error_messages() {
        let err = ReadError::UmiLengthMismatch {
            id: "r7".to_string(),
            expected: 8,
            found: 6,
        };
        let msg = err.to_string();
        assert!(msg.contains("r7"));
        assert!(msg.contains("expected 8"));
    }
}
