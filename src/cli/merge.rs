// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};
use crate::errors::UmiClusterError;

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.input.is_none() {
            self.input = config.input;
        }
        if self.output == "-" {
            if let Some(output) = config.output {
                self.output = output;
            }
        }
        if self.format == "fastq" {
            if let Some(format) = config.format {
                self.format = format;
            }
        }
        if self.cluster_report.is_none() {
            self.cluster_report = config.cluster_report;
        }
        if self.metrics.is_none() {
            self.metrics = config.metrics;
        }

        // Clustering (only override defaults, not explicit CLI values)
        if self.threshold == 1 {
            if let Some(threshold) = config.threshold {
                self.threshold = threshold;
            }
        }
        if self.window == 5 {
            if let Some(window) = config.window {
                self.window = window;
            }
        }
        if self.umi_tag.is_none() {
            self.umi_tag = config.umi_tag;
        }
        if self.umi_separator == '_' {
            if let Some(separator) = config.umi_separator {
                self.umi_separator = separator;
            }
        }

        // Contig filtering
        if self.include_contigs.is_none() {
            self.include_contigs = config.include_contigs;
        }
        if self.exclude_contigs.is_none() {
            self.exclude_contigs = config.exclude_contigs;
        }

        // Alignment settings (only override default "nw")
        if self.alignment_mode == "nw" {
            if let Some(mode) = config.alignment_mode {
                self.alignment_mode = mode;
            }
        }
        if self.match_score.is_none() {
            self.match_score = config.match_score;
        }
        if self.mismatch_penalty.is_none() {
            self.mismatch_penalty = config.mismatch_penalty;
        }
        if self.gap_penalty.is_none() {
            self.gap_penalty = config.gap_penalty;
        }

        // Performance and logging
        if self.threads.is_none() {
            self.threads = config.threads;
        }
        if self.log_file.is_none() {
            self.log_file = config.log_file;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.debug && config.debug.unwrap_or(false) {
            self.debug = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, UmiClusterError> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["umiclusterer"], args).unwrap_or_else(|e| panic!("{}", e.output))
    }

    #[test]
    fn test_config_fills_unset_values() {
        let config = Config {
            input: Some("reads.bam".to_string()),
            threshold: Some(2),
            window: Some(10),
            umi_tag: Some("RX".to_string()),
            gap_penalty: Some(-3),
            dry_run: Some(true),
            ..Default::default()
        };
        let args = parse(&[]).merge_with_config(config);
        assert_eq!(args.input.as_deref(), Some("reads.bam"));
        assert_eq!(args.threshold, 2);
        assert_eq!(args.window, 10);
        assert_eq!(args.umi_tag.as_deref(), Some("RX"));
        assert_eq!(args.gap_penalty, Some(-3));
        assert!(args.dry_run);
        assert_eq!(args.output, "-");
    }

    #[test]
    fn test_cli_values_win() {
        let config = Config {
            input: Some("config.bam".to_string()),
            threshold: Some(3),
            format: Some("fasta".to_string()),
            alignment_mode: Some("nw-strict".to_string()),
            ..Default::default()
        };
        let args = parse(&["--input", "cli.bam", "--threshold", "0", "--alignment-mode", "nw-strict"])
            .merge_with_config(config);
        assert_eq!(args.input.as_deref(), Some("cli.bam"));
        assert_eq!(args.threshold, 0);
        assert_eq!(args.format, "fasta");
        assert_eq!(args.alignment_mode, "nw-strict");
    }

    #[test]
    fn test_with_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("umiclusterer.toml");
        std::fs::write(&path, "window = 12\nexclude_contigs = \"^chrM$\"\n").unwrap();

        let args = parse(&["--window", "7"])
            .with_config_file(path.to_str().unwrap())
            .unwrap();
        assert_eq!(args.window, 7);
        assert_eq!(args.exclude_contigs.as_deref(), Some("^chrM$"));
    }
}
