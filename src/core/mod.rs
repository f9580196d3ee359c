// mod.rs - Core logic module

pub mod alignment;
pub mod cluster;
pub mod consensus;
pub mod distance;
pub mod pipeline;

// Re-export main types for convenience
pub use alignment::{compute_alignment_stats, AlignedPair, Aligner, AlignmentConfig, AlignmentError};
pub use cluster::{cluster_reads, Cluster, ClusterParams, Clustering};
pub use consensus::{ConsensusBuilder, ConsensusError, ConsensusRecord};
pub use distance::{read_distance, umi_distance, DistanceMatrix};
pub use pipeline::{process_group, process_groups, GroupFailure, GroupResult, GroupSummary, ReadAssignment, RunSummary};
