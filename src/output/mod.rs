// mod.rs - Output writers module

pub mod metrics;
pub mod report;

use std::fs::{create_dir_all, File};
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use bio::io::{fasta, fastq};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{info, warn};

use crate::core::consensus::{ConsensusRecord, MAX_QUALITY};
use crate::errors::UmiClusterError;

pub use metrics::{write_metrics, RunMetrics};
pub use report::{family_size_histogram, read_cluster_report, write_cluster_report, ReportRow};

/// Offset of phred+33 quality encoding
const PHRED_OFFSET: u8 = 33;

/// Ensure parent directory exists before creating file
pub(crate) fn ensure_parent_dir(file_path: &str) -> Result<(), UmiClusterError> {
    if let Some(parent) = Path::new(file_path).parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|e| {
                UmiClusterError::output(file_path, format!("failed to create parent directory '{}': {}", parent.display(), e))
            })?;
        }
    }
    Ok(())
}

/// Consensus output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Fastq,
    Fasta,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fastq" | "fq" => Ok(OutputFormat::Fastq),
            "fasta" | "fa" => Ok(OutputFormat::Fasta),
            _ => Err(format!("Unknown output format: {}. Use: fastq, fasta", s)),
        }
    }
}

/// Destination of the consensus records
pub enum OutputSink {
    Gzip(GzEncoder<File>),
    Plain(File),
    Stdout(io::Stdout),
}

impl OutputSink {
    /// Open `path` for writing; `-` is stdout and a `.gz`/`.gzip` suffix enables compression
    pub fn open(path: &str) -> Result<Self, UmiClusterError> {
        if path == "-" {
            return Ok(OutputSink::Stdout(io::stdout()));
        }
        ensure_parent_dir(path)?;
        let file = File::create(path).map_err(|e| UmiClusterError::output(path, e))?;
        let compressed = matches!(
            Path::new(path).extension().and_then(|e| e.to_str()),
            Some("gz") | Some("gzip")
        );
        if compressed {
            Ok(OutputSink::Gzip(GzEncoder::new(file, Compression::default())))
        } else {
            Ok(OutputSink::Plain(file))
        }
    }

    /// Flush everything and write the gzip trailer
    pub fn finish(self) -> io::Result<()> {
        match self {
            OutputSink::Gzip(encoder) => encoder.finish()?.flush(),
            OutputSink::Plain(mut file) => file.flush(),
            OutputSink::Stdout(mut stdout) => stdout.flush(),
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Gzip(backer) => backer.write(buf),
            OutputSink::Plain(backer) => backer.write(buf),
            OutputSink::Stdout(backer) => backer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Gzip(backer) => backer.flush(),
            OutputSink::Plain(backer) => backer.flush(),
            OutputSink::Stdout(backer) => backer.flush(),
        }
    }
}

/// Encode raw Phred values as phred+33 text
fn encode_qualities(qualities: &[u8]) -> Vec<u8> {
    qualities.iter().map(|&q| q.min(MAX_QUALITY) + PHRED_OFFSET).collect()
}

/// Streams consensus records to FASTQ or FASTA
pub struct ConsensusWriter {
    sink: OutputSink,
    format: OutputFormat,
    path: String,
    written: usize,
    skipped: usize,
}

impl ConsensusWriter {
    pub fn create(path: &str, format: OutputFormat) -> Result<Self, UmiClusterError> {
        Ok(Self::from_sink(OutputSink::open(path)?, format, path))
    }

    pub fn from_sink(sink: OutputSink, format: OutputFormat, path: &str) -> Self {
        Self {
            sink,
            format,
            path: path.to_string(),
            written: 0,
            skipped: 0,
        }
    }

    /// Write one batch of records, returning how many were written
    pub fn write_records(&mut self, records: &[ConsensusRecord]) -> Result<usize, UmiClusterError> {
        let before = self.written;
        match self.format {
            OutputFormat::Fastq => {
                let mut writer = fastq::Writer::new(&mut self.sink);
                for record in records {
                    if record.qualities.len() != record.sequence.len() {
                        warn!(
                            "Skipping {}: {} qualities for {} bases",
                            record.id,
                            record.qualities.len(),
                            record.sequence.len()
                        );
                        self.skipped += 1;
                        continue;
                    }
                    let description = record.description();
                    writer
                        .write(&record.id, Some(&description), &record.sequence, &encode_qualities(&record.qualities))
                        .map_err(|e| UmiClusterError::output(&self.path, e))?;
                    self.written += 1;
                }
                writer.flush().map_err(|e| UmiClusterError::output(&self.path, e))?;
            }
            OutputFormat::Fasta => {
                let mut writer = fasta::Writer::new(&mut self.sink);
                for record in records {
                    let description = record.description();
                    writer
                        .write(&record.id, Some(&description), &record.sequence)
                        .map_err(|e| UmiClusterError::output(&self.path, e))?;
                    self.written += 1;
                }
                writer.flush().map_err(|e| UmiClusterError::output(&self.path, e))?;
            }
        }
        Ok(self.written - before)
    }

    /// Close the output; returns (written, skipped) record counts
    pub fn finish(self) -> Result<(usize, usize), UmiClusterError> {
        let (written, skipped) = (self.written, self.skipped);
        self.sink.finish().map_err(|e| UmiClusterError::output(&self.path, e))?;
        if self.path != "-" {
            info!("✅ {} consensus records written to: {}", written, self.path);
        }
        Ok((written, skipped))
    }
}
