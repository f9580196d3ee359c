// report.rs - Per-read cluster assignment report (TSV)

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};

use serde::{Deserialize, Serialize};

use crate::core::pipeline::ReadAssignment;
use crate::errors::UmiClusterError;
use crate::output::ensure_parent_dir;

/// One row of the cluster report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub read_id: String,
    pub contig: String,
    pub start: i64,
    pub end: i64,
    pub umi: String,
    pub cluster_id: String,
    pub cluster_size: usize,
}

impl From<&ReadAssignment> for ReportRow {
    fn from(a: &ReadAssignment) -> Self {
        Self {
            read_id: a.read_id.clone(),
            contig: a.contig.clone(),
            start: a.start,
            end: a.end,
            umi: a.umi.clone(),
            cluster_id: a.cluster_id(),
            cluster_size: a.cluster_size,
        }
    }
}

/// Write the cluster report with the usual `#` provenance header
pub fn write_cluster_report<'a, I>(
    file_path: &str,
    assignments: I,
    command_line: &str,
) -> Result<usize, UmiClusterError>
where
    I: IntoIterator<Item = &'a ReadAssignment>,
{
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path).map_err(|e| UmiClusterError::output(file_path, e))?;
    let mut writer = BufWriter::new(file);

    // Write command header
    writeln!(writer, "# Command: {}", command_line).map_err(|e| UmiClusterError::output(file_path, e))?;
    writeln!(writer, "# Generated: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))
        .map_err(|e| UmiClusterError::output(file_path, e))?;
    writeln!(writer, "# umiclusterer v{}", env!("CARGO_PKG_VERSION")).map_err(|e| UmiClusterError::output(file_path, e))?;

    let mut tsv = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    let mut rows = 0;
    for assignment in assignments {
        tsv.serialize(ReportRow::from(assignment))
            .map_err(|e| UmiClusterError::output(file_path, e))?;
        rows += 1;
    }
    tsv.flush().map_err(|e| UmiClusterError::output(file_path, e))?;

    log::info!("✅ Cluster report written to: {} ({} reads)", file_path, rows);
    Ok(rows)
}

/// Read a cluster report written by [`write_cluster_report`]
pub fn read_cluster_report(file_path: &str) -> Result<Vec<ReportRow>, UmiClusterError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .from_path(file_path)
        .map_err(|e| UmiClusterError::Parse {
            path: file_path.into(),
            message: e.to_string(),
        })?;

    reader
        .deserialize()
        .collect::<Result<Vec<ReportRow>, _>>()
        .map_err(|e| UmiClusterError::Parse {
            path: file_path.into(),
            message: e.to_string(),
        })
}

/// Number of clusters per family size
pub fn family_size_histogram(rows: &[ReportRow]) -> BTreeMap<usize, usize> {
    let mut sizes: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *sizes.entry(row.cluster_id.as_str()).or_default() += 1;
    }
    let mut histogram = BTreeMap::new();
    for size in sizes.into_values() {
        *histogram.entry(size).or_default() += 1;
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(read_id: &str, contig: &str, index: usize, size: usize) -> ReadAssignment {
        ReadAssignment {
            read_id: read_id.to_string(),
            contig: contig.to_string(),
            start: 100,
            end: 200,
            umi: "ACGT".to_string(),
            cluster_index: index,
            cluster_size: size,
        }
    }

    #[test]
    fn test_report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.tsv");
        let path = path.to_str().unwrap();

        let assignments = vec![
            assignment("r1", "chr1", 0, 2),
            assignment("r2", "chr1", 0, 2),
            assignment("r3", "chr1", 1, 1),
            assignment("s1", "chr2", 0, 1),
        ];
        let rows = write_cluster_report(path, &assignments, "umiclusterer --input reads.bam").unwrap();
        assert_eq!(rows, 4);

        let content = std::fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("# Command: umiclusterer --input reads.bam"));
        assert!(lines.next().unwrap().starts_with("# Generated: "));
        assert!(lines.next().unwrap().starts_with("# umiclusterer v"));
        assert_eq!(lines.next(), Some("read_id\tcontig\tstart\tend\tumi\tcluster_id\tcluster_size"));
        assert_eq!(lines.next(), Some("r1\tchr1\t100\t200\tACGT\tchr1:0\t2"));

        let parsed = read_cluster_report(path).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[3].cluster_id, "chr2:0");

        let histogram = family_size_histogram(&parsed);
        assert_eq!(histogram.get(&1), Some(&2));
        assert_eq!(histogram.get(&2), Some(&1));
    }

    #[test]
    fn test_read_missing_report() {
        assert!(matches!(
            read_cluster_report("/nonexistent/clusters.tsv"),
            Err(UmiClusterError::Parse { .. })
        ));
    }
}
