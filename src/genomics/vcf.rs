use anyhow::{anyhow, Result};
use std::io::Write;

use super::statistics::pvalue_to_phred;
use super::{Nucleotide, VariantCall};

const HEADER: &str = "##fileformat=VCFv4.3\n\
##source=qualsnv\n\
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Coverage after quality filtering\">\n\
##INFO=<ID=AF,Number=1,Type=Float,Description=\"Alternate allele frequency\">\n\
##INFO=<ID=PV,Number=1,Type=Float,Description=\"Uncorrected p-value\">\n\
##INFO=<ID=BC,Number=4,Type=Integer,Description=\"Filtered counts of A, C, G and T\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";

/// Streaming VCF writer for column calls.
#[derive(Debug)]
pub struct VcfWriter<W: Write> {
    inner: W,
    records: usize,
}

impl<W: Write> VcfWriter<W> {
    /// Wrap `inner` and emit the header.
    pub fn new(mut inner: W) -> Result<Self> {
        inner.write_all(HEADER.as_bytes())?;
        Ok(Self { inner, records: 0 })
    }

    /// Append calls made on `chrom`.
    pub fn write_calls(&mut self, chrom: &str, calls: &[VariantCall]) -> Result<()> {
        for call in calls {
            let [a, c, g, t] = Nucleotide::ALL.map(|base| call.info.base_count(base));
            let line = format!(
                "{chrom}\t{pos}\t.\t{ref_base}\t{alt_base}\t{qual:.2}\tPASS\tDP={depth};AF={af:.6};PV={pv:.3e};BC={a},{c},{g},{t}\n",
                pos = call.column + 1,
                ref_base = call.reference,
                alt_base = call.alternate,
                qual = pvalue_to_phred(call.info.pvalue),
                depth = call.info.coverage,
                af = call.frequency,
                pv = call.info.pvalue,
            );
            self.inner.write_all(line.as_bytes())?;
            self.records += 1;
        }
        Ok(())
    }

    /// Number of records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Write calls for a single contig as a complete VCF.
pub fn write_vcf<W: Write>(writer: W, chrom: &str, calls: &[VariantCall]) -> Result<()> {
    let mut vcf = VcfWriter::new(writer)?;
    vcf.write_calls(chrom, calls)?;
    vcf.finish()?;
    Ok(())
}

/// Render calls into a VCF string (useful for tests and snapshots).
pub fn render_vcf(chrom: &str, calls: &[VariantCall]) -> Result<String> {
    let mut buffer = Vec::new();
    write_vcf(&mut buffer, chrom, calls)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered VCF is not valid UTF-8"))
}
