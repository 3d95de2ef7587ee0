use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use qualsnv::genomics::{
    pileup_bam, read_histogram_table, read_reference, CallerConfig, ColumnVariantCaller,
    NonConsensusQuality, PoissonBinomialEstimator, VcfWriter, DEFAULT_IGN_BASES_BELOW_Q,
    DEFAULT_NONCONS_DEFAULT_QUAL, DEFAULT_NONCONS_FILTER_QUAL, DEFAULT_SIG_THRESH,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "qualsnv", about = "Quality-aware SNV calling per pileup column")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Call variants from a table of per-column base/quality histograms.
    Columns {
        /// Tab-separated table (`chrom pos ref A C G T`, fields `q:count,...` or `.`).
        table: PathBuf,
        #[command(flatten)]
        caller: CallerArgs,
    },
    /// Call variants from an indexed BAM file against a single-contig reference.
    Bam {
        /// Reference genome (FASTA with a single record or raw sequence).
        reference: PathBuf,
        /// Coordinate-sorted, indexed BAM file.
        bam: PathBuf,
        /// Contig name in the BAM header matching the reference.
        #[arg(long, default_value = "chr1")]
        chrom: String,
        /// Ignore reads with mapping quality below this value.
        #[arg(long, default_value_t = 0)]
        min_mapq: u8,
        #[command(flatten)]
        caller: CallerArgs,
    },
}

#[derive(Args, Debug)]
struct CallerArgs {
    /// Quality assumed for non-consensus bases: an integer or `median`.
    #[arg(long, default_value_t = NonConsensusQuality::Fixed(DEFAULT_NONCONS_DEFAULT_QUAL))]
    noncons_default_qual: NonConsensusQuality,
    /// Ignore non-consensus bases below this quality.
    #[arg(long, default_value_t = DEFAULT_NONCONS_FILTER_QUAL)]
    noncons_filter_qual: u8,
    /// Ignore any base below this quality.
    #[arg(long, default_value_t = DEFAULT_IGN_BASES_BELOW_Q)]
    ign_bases_below_q: u8,
    /// Bonferroni correction factor.
    #[arg(long, default_value_t = 1)]
    bonf: u64,
    /// Significance threshold for corrected p-values.
    #[arg(long, default_value_t = DEFAULT_SIG_THRESH)]
    sig: f64,
    /// Output VCF (default: stdout).
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl CallerArgs {
    fn build_caller(&self) -> Result<ColumnVariantCaller<PoissonBinomialEstimator>> {
        let config = CallerConfig::new(
            self.noncons_default_qual,
            self.noncons_filter_qual,
            self.ign_bases_below_q,
            self.bonf,
            self.sig,
        )
        .context("invalid caller configuration")?;
        Ok(ColumnVariantCaller::new(config, PoissonBinomialEstimator::new()))
    }

    fn open_output(&self) -> Result<Box<dyn Write>> {
        Ok(match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?,
            )),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Columns { table, caller } => run_columns(table, caller)?,
        Commands::Bam {
            reference,
            bam,
            chrom,
            min_mapq,
            caller,
        } => run_bam(reference, bam, chrom, min_mapq, caller)?,
    }

    Ok(())
}

fn run_columns(table: PathBuf, args: CallerArgs) -> Result<()> {
    let caller = args.build_caller()?;
    let records = read_histogram_table(&table)?;
    let mut vcf = VcfWriter::new(args.open_output()?)?;

    for record in &records {
        let calls = caller
            .call(record.column.position, &record.column.histogram, record.ref_base)
            .with_context(|| {
                format!(
                    "variant calling failed at {}:{}",
                    record.chrom,
                    record.column.position + 1
                )
            })?;
        vcf.write_calls(&record.chrom, &calls)?;
    }

    info!(columns = records.len(), variants = vcf.records(), "done");
    vcf.finish()?;
    Ok(())
}

fn run_bam(
    reference_path: PathBuf,
    bam_path: PathBuf,
    chrom: String,
    min_mapq: u8,
    args: CallerArgs,
) -> Result<()> {
    let caller = args.build_caller()?;
    let reference = read_reference(&reference_path)?;
    if reference.is_empty() {
        bail!("reference {} is empty", reference_path.display());
    }
    let region = 0..reference.len() as u32;
    let mut vcf = VcfWriter::new(args.open_output()?)?;

    let mut skipped = 0usize;
    let columns = pileup_bam(&bam_path, &chrom, Some(region), min_mapq, |column| {
        let Some(&ref_base) = reference.get(column.position as usize) else {
            bail!("column {} lies outside the reference", column.position + 1);
        };
        if !matches!(ref_base, b'A' | b'C' | b'G' | b'T') {
            skipped += 1;
            return Ok(());
        }
        let calls = caller
            .call(column.position, &column.histogram, ref_base)
            .with_context(|| {
                format!("variant calling failed at {}:{}", chrom, column.position + 1)
            })?;
        vcf.write_calls(&chrom, &calls)
    })?;

    if skipped > 0 {
        warn!(skipped, "skipped columns with ambiguous reference base");
    }
    info!(columns, variants = vcf.records(), "done");
    vcf.finish()?;
    Ok(())
}
