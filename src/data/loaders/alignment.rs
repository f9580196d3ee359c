// alignment.rs - SAM/BAM loader producing per-contig read groups

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use log::{debug, info};
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::{bam, sam};
use regex::Regex;

use crate::data::{Read, ReadGroup};
use crate::errors::{Result, UmiClusterError};

/// Where the UMI of each record is found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UmiSource {
    /// Last `separator`-delimited token of the read name
    ReadName { separator: char },
    /// A two-letter string tag (e.g. `RX`)
    Tag([u8; 2]),
}

impl Default for UmiSource {
    fn default() -> Self {
        UmiSource::ReadName { separator: '_' }
    }
}

impl UmiSource {
    /// Parse a two-letter tag name
    pub fn tag(name: &str) -> Result<Self> {
        match name.as_bytes() {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphanumeric() => Ok(UmiSource::Tag([*a, *b])),
            _ => Err(UmiClusterError::InvalidParameter(format!(
                "UMI tag must be two characters (letter + alphanumeric), got '{}'",
                name
            ))),
        }
    }

    fn extract(&self, id: &str, record: &RecordBuf) -> Vec<u8> {
        match self {
            UmiSource::ReadName { separator } => id
                .rsplit_once(*separator)
                .map(|(_, umi)| umi.as_bytes().to_vec())
                .unwrap_or_default(),
            UmiSource::Tag(tag) => match record.data().get(&Tag::from(*tag)) {
                Some(Value::String(s)) => s.to_vec(),
                _ => Vec::new(),
            },
        }
    }
}

/// Options controlling which records become reads
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    pub umi_source: UmiSource,
    pub include_contigs: Option<Regex>,
    pub exclude_contigs: Option<Regex>,
}

impl LoaderOptions {
    fn contig_selected(&self, name: &str) -> bool {
        if let Some(include) = &self.include_contigs {
            if !include.is_match(name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude_contigs {
            if exclude.is_match(name) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Default)]
struct LoadStats {
    records: usize,
    unmapped: usize,
    secondary: usize,
    filtered: usize,
}

/// Load a SAM or BAM file, chosen by extension, into one group per contig.
///
/// Groups follow the reference-sequence order of the header and reads keep
/// file order within a group. Unmapped, secondary and supplementary records
/// are skipped; any segmented (paired) record aborts the load.
pub fn load_read_groups(path: &Path, options: &LoaderOptions) -> Result<Vec<ReadGroup>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("sam") => {
            let mut reader = File::open(path)
                .map(BufReader::new)
                .map(sam::io::Reader::new)?;
            let header = reader.read_header().map_err(|e| parse_error(path, e))?;
            collect_groups(path, &header, reader.record_bufs(&header), options)
        }
        Some("bam") => {
            let mut reader = File::open(path).map(bam::io::Reader::new)?;
            let header = reader.read_header().map_err(|e| parse_error(path, e))?;
            collect_groups(path, &header, reader.record_bufs(&header), options)
        }
        Some(ext) => Err(UmiClusterError::UnsupportedFormat(ext.to_string())),
        None => Err(UmiClusterError::UnsupportedFormat(path.display().to_string())),
    }
}

fn parse_error(path: &Path, err: io::Error) -> UmiClusterError {
    UmiClusterError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn collect_groups<I>(
    path: &Path,
    header: &sam::Header,
    records: I,
    options: &LoaderOptions,
) -> Result<Vec<ReadGroup>>
where
    I: Iterator<Item = io::Result<RecordBuf>>,
{
    let contigs: Vec<String> = header
        .reference_sequences()
        .keys()
        .map(|name| name.to_string())
        .collect();
    let selected: Vec<bool> = contigs.iter().map(|c| options.contig_selected(c)).collect();
    let mut buckets: Vec<Vec<Read>> = vec![Vec::new(); contigs.len()];
    let mut stats = LoadStats::default();

    for result in records {
        let record = result.map_err(|e| parse_error(path, e))?;
        stats.records += 1;

        let flags = record.flags();
        let id = record
            .name()
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();

        if flags.is_unmapped() {
            stats.unmapped += 1;
            continue;
        }
        if flags.is_segmented() {
            return Err(UmiClusterError::PairedEndInput { read_id: id });
        }
        if flags.is_secondary() || flags.is_supplementary() {
            stats.secondary += 1;
            continue;
        }

        let (Some(ref_id), Some(start), Some(end)) = (
            record.reference_sequence_id(),
            record.alignment_start(),
            record.alignment_end(),
        ) else {
            debug!("Skipping {}: no alignment coordinates", id);
            stats.unmapped += 1;
            continue;
        };

        if ref_id >= contigs.len() || !selected[ref_id] {
            stats.filtered += 1;
            continue;
        }

        let umi = options.umi_source.extract(&id, &record);
        let read = Read::new(
            id,
            &umi,
            record.sequence().as_ref(),
            record.quality_scores().as_ref(),
            usize::from(start) as i64,
            usize::from(end) as i64,
        )
        .on_contig(contigs[ref_id].clone())
        .reversed(flags.is_reverse_complemented());
        buckets[ref_id].push(read);
    }

    let groups: Vec<ReadGroup> = contigs
        .into_iter()
        .zip(buckets)
        .filter(|(_, reads)| !reads.is_empty())
        .map(|(contig, reads)| ReadGroup::new(contig, reads))
        .collect();
    let total: usize = groups.iter().map(ReadGroup::len).sum();

    info!(
        "Loaded {} reads in {} groups from {} records ({} unmapped, {} secondary/supplementary, {} outside selected contigs)",
        total,
        groups.len(),
        stats.records,
        stats.unmapped,
        stats.secondary,
        stats.filtered
    );

    if total == 0 {
        return Err(UmiClusterError::NoReads {
            path: path.to_path_buf(),
        });
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "@HD\tVN:1.6\tSO:coordinate\n@SQ\tSN:chr1\tLN:10000\n@SQ\tSN:chr2\tLN:10000\n@SQ\tSN:chrM\tLN:16569\n";

    fn sam_file(body: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".sam").tempfile().unwrap();
        write!(file, "{}{}", HEADER, body).unwrap();
        file.flush().unwrap();
        file
    }

    fn record(name: &str, flag: u16, contig: &str, pos: u32, seq: &str, extra: &str) -> String {
        let qual = "I".repeat(seq.len());
        let cigar = format!("{}M", seq.len());
        let mut line = format!("{name}\t{flag}\t{contig}\t{pos}\t60\t{cigar}\t*\t0\t0\t{seq}\t{qual}");
        if !extra.is_empty() {
            line.push('\t');
            line.push_str(extra);
        }
        line.push('\n');
        line
    }

    #[test]
    fn test_load_groups_by_contig() {
        let body = [
            record("r1_AAAA", 0, "chr2", 100, "ACGTACGT", ""),
            record("r2_AAAT", 16, "chr1", 200, "ACGTAC", ""),
            record("r3_CCCC", 0, "chr1", 150, "ACGT", ""),
            "r4_GGGG\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII\n".to_string(),
            record("r5_TTTT", 256, "chr1", 100, "ACGT", ""),
            record("r6_TTTT", 2048, "chr1", 100, "ACGT", ""),
        ]
        .concat();
        let file = sam_file(&body);

        let groups = load_read_groups(file.path(), &LoaderOptions::default()).unwrap();
        let contigs: Vec<&str> = groups.iter().map(|g| g.contig.as_str()).collect();
        assert_eq!(contigs, vec!["chr1", "chr2"]);

        let chr1: Vec<&str> = groups[0].reads.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(chr1, vec!["r2_AAAT", "r3_CCCC"]);

        let r2 = &groups[0].reads[0];
        assert_eq!(r2.umi, b"AAAT");
        assert_eq!((r2.start, r2.end), (200, 205));
        assert!(r2.reverse);
        assert_eq!(r2.qualities, vec![40; 6]);
        assert_eq!(r2.contig, "chr1");
    }

    #[test]
    fn test_umi_from_tag() {
        let body = record("read1", 0, "chr1", 10, "ACGT", "RX:Z:acgtac");
        let file = sam_file(&body);
        let options = LoaderOptions {
            umi_source: UmiSource::tag("RX").unwrap(),
            ..Default::default()
        };
        let groups = load_read_groups(file.path(), &options).unwrap();
        assert_eq!(groups[0].reads[0].umi, b"ACGTAC");
    }

    #[test]
    fn test_custom_separator_and_missing_umi() {
        let body = [
            record("read:1:GATTACA", 0, "chr1", 10, "ACGT", ""),
            record("plainname", 0, "chr1", 10, "ACGT", ""),
        ]
        .concat();
        let file = sam_file(&body);
        let options = LoaderOptions {
            umi_source: UmiSource::ReadName { separator: ':' },
            ..Default::default()
        };
        let groups = load_read_groups(file.path(), &options).unwrap();
        assert_eq!(groups[0].reads[0].umi, b"GATTACA");
        assert!(groups[0].reads[1].umi.is_empty());
    }

    #[test]
    fn test_contig_filters() {
        let body = [
            record("a_AAAA", 0, "chr1", 10, "ACGT", ""),
            record("b_AAAA", 0, "chr2", 10, "ACGT", ""),
            record("c_AAAA", 0, "chrM", 10, "ACGT", ""),
        ]
        .concat();
        let file = sam_file(&body);
        let options = LoaderOptions {
            include_contigs: Some(Regex::new("^chr").unwrap()),
            exclude_contigs: Some(Regex::new("^chrM$").unwrap()),
            ..Default::default()
        };
        let groups = load_read_groups(file.path(), &options).unwrap();
        let contigs: Vec<&str> = groups.iter().map(|g| g.contig.as_str()).collect();
        assert_eq!(contigs, vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_paired_input_is_rejected() {
        let body = record("pair_AAAA", 1 | 64, "chr1", 10, "ACGT", "");
        let file = sam_file(&body);
        let err = load_read_groups(file.path(), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, UmiClusterError::PairedEndInput { .. }));
    }

    #[test]
    fn test_unmapped_paired_records_are_skipped() {
        let body = [
            "mate_CCCC\t69\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII\n".to_string(),
            record("r1_AAAA", 0, "chr1", 10, "ACGT", ""),
        ]
        .concat();
        let file = sam_file(&body);

        let groups = load_read_groups(file.path(), &LoaderOptions::default()).unwrap();
        assert_eq!(groups.len(), 1);
        let ids: Vec<&str> = groups[0].reads.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1_AAAA"]);
    }

    #[test]
    fn test_no_usable_reads() {
        let body = "r_AAAA\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII\n";
        let file = sam_file(body);
        let err = load_read_groups(file.path(), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, UmiClusterError::NoReads { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".cram").tempfile().unwrap();
        let err = load_read_groups(file.path(), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, UmiClusterError::UnsupportedFormat(ext) if ext == "cram"));
    }

    #[test]
    fn test_umi_tag_validation() {
        assert_eq!(UmiSource::tag("RX").unwrap(), UmiSource::Tag(*b"RX"));
        assert!(UmiSource::tag("R").is_err());
        assert!(UmiSource::tag("1X").is_err());
    }
}
