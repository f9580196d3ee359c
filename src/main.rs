// main.rs - CLI entry point

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use env_logger::Env;
use log::{error, info, warn};

use umiclusterer::cli::Config;
use umiclusterer::prelude::*;

fn main() {
    let result = run_main();
    log::logger().flush();
    if let Err(e) = result {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) -> Result<(), UmiClusterError> {
    let default_level = if args.debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_level));
    if let Some(path) = &args.log_file {
        let file = File::create(path).map_err(|e| UmiClusterError::output(path, e))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn configure_threads(requested: Option<usize>) -> Result<(), UmiClusterError> {
    let Some(requested) = requested else {
        info!("🧵 Threads: {} (auto-detected)", rayon::current_num_threads());
        return Ok(());
    };

    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let threads = if requested > available {
        warn!(
            "Requested {} threads but only {} cores are available, using {}",
            requested, available, available
        );
        available
    } else {
        requested
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .map_err(|e| UmiClusterError::InvalidParameter(format!("Failed to configure thread pool: {}", e)))?;
    info!("🧵 Threads: {}", threads);
    Ok(())
}

fn run_main() -> Result<(), UmiClusterError> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    init_logging(&args)?;
    info!("🚀 {}", umiclusterer::get_info());
    if let Some(config_path) = &args.config {
        info!("📄 Loaded configuration from: {}", config_path);
    }

    // Validate all arguments
    let validation = validate_args(&args)?;
    configure_threads(args.threads)?;

    let total_start = Instant::now();

    // Load reads
    info!("📂 Loading reads from: {}", validation.input);
    let groups = load_read_groups(Path::new(&validation.input), &validation.loader_options)?;

    if args.dry_run {
        info!("✅ Dry run completed successfully");
        return Ok(());
    }

    info!(
        "🧬 Clustering {} groups (threshold: {}, window: {}, alignment: {})",
        groups.len(),
        validation.cluster_params.threshold,
        validation.cluster_params.window,
        validation
            .alignment_config
            .description
            .as_deref()
            .unwrap_or("custom")
    );
    let builder = ConsensusBuilder::new(validation.alignment_config.clone());
    let results = process_groups(&groups, &validation.cluster_params, &builder, true);
    let summary = RunSummary::from_results(&results);

    // Write consensus records of every successful group
    let mut writer = ConsensusWriter::create(&args.output, validation.output_format)?;
    for group in results.iter().flatten() {
        writer.write_records(&group.records)?;
    }
    let (written, skipped) = writer.finish()?;
    if skipped > 0 {
        warn!("{} consensus records skipped because of malformed qualities", skipped);
    }

    if let Some(report_path) = &args.cluster_report {
        let assignments = results.iter().flatten().flat_map(|group| group.assignments.iter());
        write_cluster_report(report_path, assignments, &command_line)?;
    }

    let elapsed = total_start.elapsed();
    if let Some(metrics_path) = &args.metrics {
        write_metrics(metrics_path, &RunMetrics::new(&summary, elapsed.as_secs_f64()))?;
    }

    info!("📊 Summary:");
    info!("   Reads: {}", summary.total_reads);
    info!("   Groups: {}", summary.groups);
    info!(
        "   Clusters: {} ({} singletons, largest {})",
        summary.clusters, summary.singletons, summary.largest_cluster
    );
    info!("   Consensus records written: {}", written);
    info!(
        "   Malformed reads: {}, excluded members: {}",
        summary.malformed_reads, summary.excluded_members
    );
    info!("⏱️  Total time: {:.2}s", elapsed.as_secs_f64());

    if summary.failed_groups > 0 {
        for failure in results.iter().filter_map(|r| r.as_ref().err()) {
            error!("Group {} produced no output: {}", failure.contig, failure.error);
        }
        return Err(UmiClusterError::GroupsFailed(summary.failed_groups));
    }

    Ok(())
}
