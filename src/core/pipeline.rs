// pipeline.rs - Per-group clustering and consensus, dispatched across groups with rayon

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error};
use rayon::prelude::*;
use serde::Serialize;

use crate::core::cluster::{cluster_reads, Cluster, ClusterParams};
use crate::core::consensus::{ConsensusBuilder, ConsensusError, ConsensusRecord};
use crate::data::{Read, ReadGroup};

/// Cluster membership of one read, as written to the cluster report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAssignment {
    pub read_id: String,
    pub contig: String,
    pub start: i64,
    pub end: i64,
    pub umi: String,
    /// Position of the cluster within its group
    pub cluster_index: usize,
    pub cluster_size: usize,
}

impl ReadAssignment {
    pub fn cluster_id(&self) -> String {
        format!("{}:{}", self.contig, self.cluster_index)
    }
}

/// Counters for one processed group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub reads: usize,
    pub clusters: usize,
    pub singletons: usize,
    pub malformed: usize,
    pub excluded: usize,
    pub largest_cluster: usize,
}

/// Output of one successfully processed group
#[derive(Debug, Clone)]
pub struct GroupResult {
    pub contig: String,
    /// One record per cluster, in cluster order
    pub records: Vec<ConsensusRecord>,
    /// One entry per read, in input order
    pub assignments: Vec<ReadAssignment>,
    pub summary: GroupSummary,
}

/// A group whose consensus could not be built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFailure {
    pub contig: String,
    pub error: ConsensusError,
}

/// Totals over a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_reads: usize,
    pub groups: usize,
    pub clusters: usize,
    pub singletons: usize,
    pub consensus_records: usize,
    pub malformed_reads: usize,
    pub excluded_members: usize,
    pub failed_groups: usize,
    pub largest_cluster: usize,
}

impl RunSummary {
    pub fn from_results(results: &[Result<GroupResult, GroupFailure>]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.groups += 1;
            match result {
                Ok(group) => {
                    let s = &group.summary;
                    summary.total_reads += s.reads;
                    summary.clusters += s.clusters;
                    summary.singletons += s.singletons;
                    summary.consensus_records += group.records.len();
                    summary.malformed_reads += s.malformed;
                    summary.excluded_members += s.excluded;
                    summary.largest_cluster = summary.largest_cluster.max(s.largest_cluster);
                }
                Err(_) => summary.failed_groups += 1,
            }
        }
        summary
    }
}

fn assignments_for(reads: &[Read], clusters: &[Cluster]) -> Vec<ReadAssignment> {
    let mut slots: Vec<Option<ReadAssignment>> = vec![None; reads.len()];
    for (index, cluster) in clusters.iter().enumerate() {
        for &i in &cluster.members {
            let read = &reads[i];
            slots[i] = Some(ReadAssignment {
                read_id: read.id.clone(),
                contig: read.contig.clone(),
                start: read.start,
                end: read.end,
                umi: String::from_utf8_lossy(&read.umi).into_owned(),
                cluster_index: index,
                cluster_size: cluster.len(),
            });
        }
    }
    slots.into_iter().flatten().collect()
}

/// Cluster one group and build a consensus record per cluster
pub fn process_group(
    group: &ReadGroup,
    params: &ClusterParams,
    builder: &ConsensusBuilder,
) -> Result<GroupResult, GroupFailure> {
    let clustering = cluster_reads(&group.reads, params);

    let records = clustering
        .clusters
        .par_iter()
        .map(|cluster| {
            let members: Vec<&Read> = cluster.members.iter().map(|&i| &group.reads[i]).collect();
            builder.build(&members)
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| GroupFailure {
            contig: group.contig.clone(),
            error,
        })?;

    let summary = GroupSummary {
        reads: group.len(),
        clusters: clustering.clusters.len(),
        singletons: clustering.clusters.iter().filter(|c| c.is_singleton()).count(),
        malformed: clustering.malformed.len(),
        excluded: records.iter().map(|r| r.excluded).sum(),
        largest_cluster: clustering.clusters.iter().map(Cluster::len).max().unwrap_or(0),
    };
    debug!(
        "{}: {} reads -> {} clusters ({} singletons, {} malformed)",
        group.contig, summary.reads, summary.clusters, summary.singletons, summary.malformed
    );

    Ok(GroupResult {
        contig: group.contig.clone(),
        records,
        assignments: assignments_for(&group.reads, &clustering.clusters),
        summary,
    })
}

/// Process every group in parallel; results come back in input order
pub fn process_groups(
    groups: &[ReadGroup],
    params: &ClusterParams,
    builder: &ConsensusBuilder,
    show_progress: bool,
) -> Vec<Result<GroupResult, GroupFailure>> {
    let pb = if show_progress {
        let pb = ProgressBar::new(groups.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} ETA: {eta}",
        ) {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<_> = groups
        .par_iter()
        .map(|group| {
            let result = process_group(group, params, builder);
            if let Err(failure) = &result {
                error!("Group {} failed: {}", failure.contig, failure.error);
            }
            pb.inc(1);
            result
        })
        .collect();

    pb.finish_and_clear();
    results
}
