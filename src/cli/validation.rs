// validation.rs - Input validation utilities

use std::str::FromStr;

use regex::Regex;

use crate::cli::args::Args;
use crate::core::{AlignmentConfig, ClusterParams};
use crate::data::{LoaderOptions, UmiSource};
use crate::errors::UmiClusterError;
use crate::output::OutputFormat;

/// Largest accepted magnitude for a match score or penalty
pub const MAX_SCORE_MAGNITUDE: i32 = 1000;

#[derive(Debug)]
pub struct ValidationResult {
    pub input: String,
    pub output_format: OutputFormat,
    pub cluster_params: ClusterParams,
    pub alignment_config: AlignmentConfig,
    pub loader_options: LoaderOptions,
}

fn invalid(message: impl Into<String>) -> UmiClusterError {
    UmiClusterError::InvalidParameter(message.into())
}

fn compile_filter(pattern: &Option<String>, name: &str) -> Result<Option<Regex>, UmiClusterError> {
    pattern
        .as_deref()
        .map(|p| Regex::new(p).map_err(|e| invalid(format!("Invalid {} regex: {}", name, e))))
        .transpose()
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, UmiClusterError> {
    let input = args.input.clone().ok_or_else(|| invalid("--input is required"))?;

    let output_format = OutputFormat::from_str(&args.format).map_err(invalid)?;

    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err(invalid("--threads must be at least 1"));
        }
    }

    // Validate and create alignment config
    let alignment_config = if args.match_score.is_some() || args.mismatch_penalty.is_some() || args.gap_penalty.is_some() {
        // Custom mode, unset scores fall back to the default preset
        let preset = AlignmentConfig::default();
        AlignmentConfig::custom(
            args.match_score.unwrap_or(preset.match_score),
            args.mismatch_penalty.unwrap_or(preset.mismatch_penalty),
            args.gap_penalty.unwrap_or(preset.gap_penalty),
        )
    } else {
        // Preset mode
        AlignmentConfig::from_mode(&args.alignment_mode).map_err(invalid)?
    };
    if alignment_config.match_score <= 0 {
        return Err(invalid("Match score must be positive"));
    }
    if alignment_config.mismatch_penalty > 0 || alignment_config.gap_penalty > 0 {
        return Err(invalid("Mismatch and gap penalties must be zero or negative"));
    }
    let scores = [
        alignment_config.match_score,
        alignment_config.mismatch_penalty,
        alignment_config.gap_penalty,
    ];
    if scores.iter().any(|score| score.unsigned_abs() > MAX_SCORE_MAGNITUDE.unsigned_abs()) {
        return Err(invalid(format!(
            "Alignment scores must lie within ±{}",
            MAX_SCORE_MAGNITUDE
        )));
    }

    let umi_source = match &args.umi_tag {
        Some(tag) => UmiSource::tag(tag)?,
        None => UmiSource::ReadName {
            separator: args.umi_separator,
        },
    };

    let loader_options = LoaderOptions {
        umi_source,
        include_contigs: compile_filter(&args.include_contigs, "include_contigs")?,
        exclude_contigs: compile_filter(&args.exclude_contigs, "exclude_contigs")?,
    };

    Ok(ValidationResult {
        input,
        output_format,
        cluster_params: ClusterParams {
            threshold: args.threshold,
            window: args.window,
        },
        alignment_config,
        loader_options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["umiclusterer"], args).unwrap_or_else(|e| panic!("{}", e.output))
    }

    #[test]
    fn test_defaults() {
        let result = validate_args(&parse(&["--input", "reads.bam"])).unwrap();
        assert_eq!(result.input, "reads.bam");
        assert_eq!(result.output_format, OutputFormat::Fastq);
        assert_eq!(result.cluster_params, ClusterParams::default());
        assert_eq!(result.alignment_config, AlignmentConfig::default());
        assert_eq!(result.loader_options.umi_source, UmiSource::ReadName { separator: '_' });
        assert!(result.loader_options.include_contigs.is_none());
    }

    #[test]
    fn test_input_is_required() {
        assert!(matches!(validate_args(&parse(&[])), Err(UmiClusterError::InvalidParameter(_))));
    }

    #[test]
    fn test_custom_scores_override_preset() {
        let args = parse(&["--input", "r.bam", "--alignment-mode", "nw-strict", "--gap-penalty", "-4"]);
        let config = validate_args(&args).unwrap().alignment_config;
        assert_eq!((config.match_score, config.mismatch_penalty, config.gap_penalty), (1, -1, -4));
    }

    #[test]
    fn test_invalid_values() {
        assert!(validate_args(&parse(&["--input", "r.bam", "--format", "bam"])).is_err());
        assert!(validate_args(&parse(&["--input", "r.bam", "--alignment-mode", "sw"])).is_err());
        assert!(validate_args(&parse(&["--input", "r.bam", "--include-contigs", "chr("])).is_err());
        assert!(validate_args(&parse(&["--input", "r.bam", "--umi-tag", "RXX"])).is_err());
        assert!(validate_args(&parse(&["--input", "r.bam", "--threads", "0"])).is_err());
        assert!(validate_args(&parse(&["--input", "r.bam", "--match-score", "0"])).is_err());
        assert!(validate_args(&parse(&["--input", "r.bam", "--gap-penalty", "2"])).is_err());
    }

    #[test]
    fn test_score_magnitude_is_bounded() {
        assert!(validate_args(&parse(&["--input", "r.bam", "--match-score", "100000000"])).is_err());
        let limit = MAX_SCORE_MAGNITUDE.to_string();
        let result = validate_args(&parse(&["--input", "r.bam", "--match-score", &limit])).unwrap();
        assert_eq!(result.alignment_config.match_score, MAX_SCORE_MAGNITUDE);
    }

    #[test]
    fn test_umi_tag_and_filters() {
        let args = parse(&["--input", "r.bam", "--umi-tag", "RX", "--exclude-contigs", "^chrM$"]);
        let result = validate_args(&args).unwrap();
        assert_eq!(result.loader_options.umi_source, UmiSource::Tag(*b"RX"));
        let exclude = result.loader_options.exclude_contigs.unwrap();
        assert!(exclude.is_match("chrM"));
        assert!(!exclude.is_match("chrMT"));
    }
}
