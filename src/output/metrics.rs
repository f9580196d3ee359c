// metrics.rs - Run metrics (JSON)

use std::fs::File;
use std::io::{BufWriter, Write};

use serde::{Deserialize, Serialize};

use crate::core::pipeline::RunSummary;
use crate::errors::UmiClusterError;
use crate::output::ensure_parent_dir;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub total_reads: usize,
    pub groups: usize,
    pub clusters: usize,
    pub singletons: usize,
    pub consensus_records: usize,
    pub malformed_reads: usize,
    pub excluded_members: usize,
    pub failed_groups: usize,
    pub largest_cluster: usize,
    pub elapsed_seconds: f64,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl RunMetrics {
    pub fn new(summary: &RunSummary, elapsed_seconds: f64) -> Self {
        Self {
            total_reads: summary.total_reads,
            groups: summary.groups,
            clusters: summary.clusters,
            singletons: summary.singletons,
            consensus_records: summary.consensus_records,
            malformed_reads: summary.malformed_reads,
            excluded_members: summary.excluded_members,
            failed_groups: summary.failed_groups,
            largest_cluster: summary.largest_cluster,
            elapsed_seconds,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}

pub fn write_metrics(file_path: &str, metrics: &RunMetrics) -> Result<(), UmiClusterError> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path).map_err(|e| UmiClusterError::output(file_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, metrics).map_err(|e| UmiClusterError::output(file_path, e))?;
    writer.flush().map_err(|e| UmiClusterError::output(file_path, e))?;
    log::info!("✅ Metrics written to: {}", file_path);
    Ok(())
}
