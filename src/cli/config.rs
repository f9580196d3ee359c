// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::UmiClusterError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub input: Option<String>,
    pub output: Option<String>,
    pub format: Option<String>,
    pub cluster_report: Option<String>,
    pub metrics: Option<String>,

    // Clustering
    pub threshold: Option<u32>,
    pub window: Option<u64>,
    pub umi_tag: Option<String>,
    pub umi_separator: Option<char>,

    // Contig filtering
    pub include_contigs: Option<String>,
    pub exclude_contigs: Option<String>,

    // Alignment settings
    pub alignment_mode: Option<String>,
    pub match_score: Option<i32>,
    pub mismatch_penalty: Option<i32>,
    pub gap_penalty: Option<i32>,

    // Performance and logging
    pub threads: Option<usize>,
    pub debug: Option<bool>,
    pub log_file: Option<String>,
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, UmiClusterError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            UmiClusterError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| UmiClusterError::Config(format!("Failed to parse config file '{}': {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# umiclusterer.toml - Configuration file for umiclusterer
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Input alignment file (.sam or .bam), single-end reads
input = "/path/to/reads.bam"

# Output consensus file ("-" for stdout, .gz suffix for gzip)
output = "consensus.fastq.gz"

# Output format: fastq, fasta
format = "fastq"

# Per-read cluster assignments (TSV)
# cluster_report = "clusters.tsv"

# Run metrics (JSON)
# metrics = "metrics.json"

# =============================================================================
# CLUSTERING
# =============================================================================

# Maximum UMI Hamming distance for two reads to be linked
threshold = 1

# Maximum offset in bases of either alignment end
window = 5

# Read the UMI from a SAM tag instead of the read name
# umi_tag = "RX"

# Separator before the UMI at the end of the read name
umi_separator = "_"

# =============================================================================
# CONTIG FILTERING
# =============================================================================

# Include only contigs matching regex pattern
# include_contigs = "^chr[0-9XY]+$"

# Exclude contigs matching regex pattern
# exclude_contigs = "^chrM$"

# =============================================================================
# ALIGNMENT SETTINGS
# =============================================================================

# Alignment mode: nw, nw-strict
alignment_mode = "nw"

# Custom alignment scores (overrides preset mode)
# match_score = 1
# mismatch_penalty = -1
# gap_penalty = -1

# =============================================================================
# PERFORMANCE AND LOGGING
# =============================================================================

# Number of threads (omit for auto-detection)
# threads = 8

# Enable debug logging
debug = false

# Write log messages to a file instead of stderr
# log_file = "umiclusterer.log"

# Validate inputs without clustering (dry run)
dry_run = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config = Config::from_toml(&Config::generate_sample()).unwrap();
        assert_eq!(config.threshold, Some(1));
        assert_eq!(config.window, Some(5));
        assert_eq!(config.umi_separator, Some('_'));
        assert_eq!(config.alignment_mode.as_deref(), Some("nw"));
        assert_eq!(config.umi_tag, None);
    }

    #[test]
    fn test_unknown_types_are_rejected() {
        assert!(Config::from_toml("threshold = \"one\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "window = 20\nformat = \"fasta\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.window, Some(20));
        assert_eq!(config.format.as_deref(), Some("fasta"));

        let missing = Config::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(UmiClusterError::Config(_))));
    }
}
