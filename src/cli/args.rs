// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs, Debug)]
/// umiclusterer - UMI and locus aware clustering and consensus calling for long reads
pub struct Args {
    /// input alignment file (.sam or .bam), single-end reads only
    #[argh(option)]
    pub input: Option<String>,

    /// output consensus file, '-' for stdout; a .gz suffix enables gzip (default: -)
    #[argh(option, default = "String::from(\"-\")")]
    pub output: String,

    /// output format: fastq, fasta (default: fastq)
    #[argh(option, default = "String::from(\"fastq\")")]
    pub format: String,

    /// maximum UMI Hamming distance for two reads to be linked (default: 1)
    #[argh(option, default = "1")]
    pub threshold: u32,

    /// maximum offset in bases of either alignment end for two reads to be linked (default: 5)
    #[argh(option, default = "5")]
    pub window: u64,

    /// read the UMI from this two-letter SAM tag instead of the read name
    #[argh(option)]
    pub umi_tag: Option<String>,

    /// separator before the UMI at the end of the read name (default: _)
    #[argh(option, default = "'_'")]
    pub umi_separator: char,

    /// include only contigs matching regex pattern
    #[argh(option)]
    pub include_contigs: Option<String>,

    /// exclude contigs matching regex pattern
    #[argh(option)]
    pub exclude_contigs: Option<String>,

    /// alignment mode: nw, nw-strict (default: nw)
    #[argh(option, default = "String::from(\"nw\")")]
    pub alignment_mode: String,

    /// custom match score (overrides preset mode, enables custom mode)
    #[argh(option)]
    pub match_score: Option<i32>,

    /// custom mismatch penalty (overrides preset mode, enables custom mode)
    #[argh(option)]
    pub mismatch_penalty: Option<i32>,

    /// custom gap penalty per gap column (overrides preset mode, enables custom mode)
    #[argh(option)]
    pub gap_penalty: Option<i32>,

    /// write per-read cluster assignments to this TSV file
    #[argh(option)]
    pub cluster_report: Option<String>,

    /// write run metrics to this JSON file
    #[argh(option)]
    pub metrics: Option<String>,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// enable debug logging
    #[argh(switch)]
    pub debug: bool,

    /// write log messages to this file instead of stderr
    #[argh(option)]
    pub log_file: Option<String>,

    /// validate inputs and load reads without clustering (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
