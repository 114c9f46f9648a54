//! Shared helpers for building small matrix tables in unit tests
//!

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::matrix_table::{
    MATRIX_TABLE_FORMAT_VERSION, MATRIX_TABLE_METADATA_FILENAME, MatrixTableMetadata,
};

const TEST_VCF_META_LINES: &str = r#"##fileformat=VCFv4.2
##contig=<ID=chr1,length=10000>
##contig=<ID=chr2,length=5000>
##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description="Read depth">
##FORMAT=<ID=GQ,Number=1,Type=Integer,Description="Genotype quality">
##FORMAT=<ID=AD,Number=R,Type=Integer,Description="Allelic depths">
##FORMAT=<ID=END,Number=1,Type=Integer,Description="End position of the reference block">
##FORMAT=<ID=QUALapprox,Number=1,Type=Integer,Description="Approximate QUAL">
##FORMAT=<ID=VarDP,Number=1,Type=Integer,Description="Variant depth">
##FORMAT=<ID=ReadPosRankSum,Number=1,Type=Float,Description="Read position rank sum">
##FORMAT=<ID=MQRankSum,Number=1,Type=Float,Description="Mapping quality rank sum">
##FORMAT=<ID=SB,Number=4,Type=Integer,Description="Strand bias table">
##FORMAT=<ID=RAW_MQandDP,Number=2,Type=Integer,Description="Raw mapping quality and depth">
"#;

/// Tempdir handle must be kept alive for the lifetime of the returned path
pub fn get_test_dir() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, path)
}

/// Build VCF text from sample names and tab-delimited record lines
///
/// Each record line starts at CHROM and includes the FORMAT column and all sample columns.
///
pub fn get_test_vcf(samples: &[&str], records: &[&str]) -> String {
    let mut vcf = TEST_VCF_META_LINES.to_string();
    vcf.push_str("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT");
    for sample in samples {
        vcf.push('\t');
        vcf.push_str(sample);
    }
    vcf.push('\n');
    for record in records {
        vcf.push_str(record);
        vcf.push('\n');
    }
    vcf
}

/// Write a complete matrix table directory named `{name}.mt` under `dir`
pub fn write_test_matrix_table(dir: &Utf8Path, name: &str, vcf_text: &str) -> Utf8PathBuf {
    let mt_dir = dir.join(format!("{name}.mt"));
    std::fs::create_dir_all(&mt_dir).unwrap();

    let entries = "entries.vcf";
    std::fs::write(mt_dir.join(entries), vcf_text).unwrap();

    let metadata = MatrixTableMetadata {
        format_version: MATRIX_TABLE_FORMAT_VERSION,
        reference_genome: "GRCh38".to_string(),
        entries: entries.to_string(),
    };
    let f = std::fs::File::create(mt_dir.join(MATRIX_TABLE_METADATA_FILENAME)).unwrap();
    serde_json::to_writer_pretty(&f, &metadata).unwrap();

    mt_dir
}
