// lib.rs - umiclusterer library root

//! # umiclusterer - UMI and locus aware clustering and consensus calling for long reads
//!
//! Reads carrying a unique molecular identifier (UMI) are grouped by contig,
//! linked when both their UMIs and their alignment ends agree, and every
//! resulting cluster is collapsed into one quality-weighted consensus read.
//!
//! ## Features
//!
//! - **Single-linkage clustering**: UMI Hamming distance gated by a coordinate window
//! - **Consensus calling**: Needleman-Wunsch alignment to a reference read and quality-weighted voting
//! - **Parallel**: groups and clusters processed with rayon
//! - **SAM/BAM input**: UMIs from the read name or a SAM tag
//! - **Reports**: FASTQ/FASTA consensus, per-read cluster TSV, JSON metrics
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use umiclusterer::prelude::*;
//!
//! let groups = load_read_groups(std::path::Path::new("reads.bam"), &LoaderOptions::default())?;
//! let builder = ConsensusBuilder::new(AlignmentConfig::default());
//! let results = process_groups(&groups, &ClusterParams::default(), &builder, false);
//!
//! for group in results.iter().flatten() {
//!     for record in &group.records {
//!         println!("{} {}", record.id, record.description());
//!     }
//! }
//! # Ok::<(), umiclusterer::UmiClusterError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod errors;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{cluster_reads, process_group, process_groups, read_distance};
    pub use crate::core::{AlignmentConfig, Aligner, ClusterParams, ConsensusBuilder, ConsensusRecord};
    pub use crate::core::{GroupResult, RunSummary};
    pub use crate::data::{load_read_groups, LoaderOptions, Read, ReadGroup, UmiSource};
    pub use crate::errors::UmiClusterError;
    pub use crate::output::{write_cluster_report, write_metrics, ConsensusWriter, OutputFormat, RunMetrics};
}

// Re-export main types at the root level for convenience
pub use cli::{Args, ValidationResult};
pub use core::{AlignmentConfig, ClusterParams, ConsensusBuilder, ConsensusRecord};
pub use data::{Read, ReadGroup};
pub use errors::UmiClusterError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "umiclusterer v{} - UMI clustering and consensus calling for long reads",
        VERSION
    )
}
