use anyhow::{anyhow, bail, Context, Result};
use rust_htslib::bam::{self, Read};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

use super::{BaseQualityHistogram, Nucleotide, PileupColumn};

/// Maximum per-position depth handed out by htslib pileups.
pub const MAX_PILEUP_DEPTH: u32 = 1_000_000;

/// One row of a histogram table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramRecord {
    /// Contig name.
    pub chrom: String,
    /// Column and its observations.
    pub column: PileupColumn,
    /// Reference base as written in the table.
    pub ref_base: u8,
}

/// Parse one line of a histogram table.
///
/// Columns are tab separated: `chrom pos ref A C G T`, with a 1-based `pos`
/// and each base field either `.` or comma-separated `quality:count` pairs.
pub fn parse_histogram_line(line: &str) -> Result<HistogramRecord> {
    let fields: Vec<&str> = line.trim_end_matches(&['\r', '\n'][..]).split('\t').collect();
    if fields.len() != 7 {
        bail!("expected 7 tab-separated fields, found {}", fields.len());
    }

    let chrom = fields[0].to_string();
    let pos: u32 = fields[1]
        .parse()
        .with_context(|| format!("invalid position '{}'", fields[1]))?;
    if pos == 0 {
        bail!("positions are 1-based, got 0");
    }
    let ref_base = match fields[2].as_bytes() {
        [base] => *base,
        _ => bail!("reference must be a single base, got '{}'", fields[2]),
    };

    let mut histogram = BaseQualityHistogram::new();
    for (base, field) in Nucleotide::ALL.into_iter().zip(&fields[3..]) {
        parse_base_field(&mut histogram, base, field)
            .with_context(|| format!("invalid {base} field '{field}'"))?;
    }

    Ok(HistogramRecord {
        chrom,
        column: PileupColumn::new(pos - 1, histogram),
        ref_base,
    })
}

fn parse_base_field(histogram: &mut BaseQualityHistogram, base: Nucleotide, field: &str) -> Result<()> {
    if field == "." {
        return Ok(());
    }
    for pair in field.split(',') {
        let (quality, count) = pair
            .split_once(':')
            .ok_or_else(|| anyhow!("expected quality:count, got '{pair}'"))?;
        let quality: u8 = quality.parse()?;
        let count: u32 = count.parse()?;
        if count == 0 {
            bail!("count for quality {quality} must be positive");
        }
        histogram.add(base, quality, count);
    }
    Ok(())
}

/// Read a histogram table, skipping blank lines and `#` comments.
pub fn read_histogram_table<P: AsRef<Path>>(path: P) -> Result<Vec<HistogramRecord>> {
    let path = path.as_ref();
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
    );

    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let record = parse_histogram_line(&line)
            .with_context(|| format!("{}:{}", path.display(), line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Read a single-contig reference (FASTA without further headers or raw sequence).
pub fn read_reference<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let contents = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read reference from {}", path.as_ref().display()))?;
    let sequence: String = contents
        .lines()
        .filter(|line| !line.starts_with('>') && !line.trim().is_empty())
        .map(str::trim)
        .collect();
    Ok(sequence.to_ascii_uppercase().into_bytes())
}

/// Quality byte htslib stores when a read has no base qualities (SAM `*`).
pub const MISSING_QUALITY: u8 = 0xff;

/// Stream per-column histograms for `chrom` from an indexed BAM file.
///
/// Each covered column is handed to `on_column` as soon as it is built, in
/// coordinate order. Deletions, reference skips, reads below `min_mapq`,
/// non-ACGT read bases and bases without a stored quality are left out.
/// Columns without any retained observation are not emitted. Returns the
/// number of emitted columns.
pub fn pileup_bam<P, F>(
    path: P,
    chrom: &str,
    region: Option<Range<u32>>,
    min_mapq: u8,
    mut on_column: F,
) -> Result<usize>
where
    P: AsRef<Path>,
    F: FnMut(PileupColumn) -> Result<()>,
{
    let path = path.as_ref();
    let mut reader = bam::IndexedReader::from_path(path)
        .with_context(|| format!("failed to open indexed BAM {}", path.display()))?;

    let header = reader.header().to_owned();
    let tid = header
        .tid(chrom.as_bytes())
        .ok_or_else(|| anyhow!("contig {chrom} not found in BAM header"))?;
    let contig_len = header
        .target_len(tid)
        .ok_or_else(|| anyhow!("contig {chrom} has no length in BAM header"))?;
    let region = region.unwrap_or(0..contig_len as u32);
    reader.fetch((tid, region.start as i64, region.end as i64))?;

    let mut pileups = reader.pileup();
    pileups.set_max_depth(MAX_PILEUP_DEPTH);

    let mut emitted = 0usize;
    let mut missing_quality = 0u64;
    for pileup in pileups {
        let pileup = pileup?;
        if !region.contains(&pileup.pos()) {
            continue;
        }

        let mut histogram = BaseQualityHistogram::new();
        for alignment in pileup.alignments() {
            if alignment.is_del() || alignment.is_refskip() {
                continue;
            }
            let record = alignment.record();
            if record.mapq() < min_mapq {
                continue;
            }
            let Some(qpos) = alignment.qpos() else {
                continue;
            };
            let quality = record.qual()[qpos];
            if quality == MISSING_QUALITY {
                missing_quality += 1;
                continue;
            }
            if let Some(base) = Nucleotide::from_ascii(record.seq()[qpos]) {
                histogram.observe(base, quality);
            }
        }

        if histogram.is_empty() {
            continue;
        }
        on_column(PileupColumn::new(pileup.pos(), histogram))?;
        emitted += 1;
    }

    if missing_quality > 0 {
        warn!(chrom, missing_quality, "ignored bases without base qualities");
    }
    if emitted == 0 {
        warn!(chrom, "no covered columns in BAM region");
    }
    debug!(chrom, columns = emitted, "streamed pileup histograms");
    Ok(emitted)
}
