// cluster_report.rs - Family-size summary of an umiclusterer cluster report

use clap::{Arg, Command};

use umiclusterer::output::{family_size_histogram, read_cluster_report};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("cluster-report")
        .version(umiclusterer::VERSION)
        .about("Summarizes family sizes from an umiclusterer --cluster-report TSV")
        .arg(Arg::new("report")
            .value_name("FILE")
            .help("Cluster report written with --cluster-report")
            .required(true))
        .arg(Arg::new("max-size")
            .long("max-size")
            .value_name("N")
            .help("Fold families larger than N into a single '>N' bucket")
            .value_parser(clap::value_parser!(usize)))
        .get_matches();

    let report_path = matches
        .get_one::<String>("report")
        .ok_or("missing report path")?;
    let max_size = matches.get_one::<usize>("max-size").copied();

    let rows = read_cluster_report(report_path)?;
    let histogram = family_size_histogram(&rows);
    let clusters: usize = histogram.values().sum();

    println!("📊 Cluster report: {}", report_path);
    println!("   Reads: {}", rows.len());
    println!("   Clusters: {}", clusters);
    if clusters > 0 {
        println!("   Mean family size: {:.2}", rows.len() as f64 / clusters as f64);
    }
    println!();
    println!("family_size\tclusters\treads");

    let mut overflow = (0usize, 0usize);
    for (&size, &count) in &histogram {
        match max_size {
            Some(max) if size > max => {
                overflow.0 += count;
                overflow.1 += size * count;
            }
            _ => println!("{}\t{}\t{}", size, count, size * count),
        }
    }
    if let Some(max) = max_size {
        if overflow.0 > 0 {
            println!(">{}\t{}\t{}", max, overflow.0, overflow.1);
        }
    }

    Ok(())
}
