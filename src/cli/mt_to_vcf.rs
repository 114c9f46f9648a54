use camino::Utf8PathBuf;
use clap::Args;
use simple_error::{SimpleResult, bail};

use super::utils::{check_output_file_parent_dir, check_required_dir};
use crate::matrix_table::MATRIX_TABLE_METADATA_FILENAME;
use crate::sites_vcf_output::SitesVcfFormat;

/// Environment variable used for the billing project when --hail-billing is not given
pub const BILLING_PROJECT_ENV_VAR: &str = "HAIL_BILLING_PROJECT";

pub const DEFAULT_N_PARTITIONS: usize = 5000;

#[derive(Args)]
pub struct MtToVcfSettings {
    /// Input matrix table directory, with a '.mt' extension
    #[arg(long = "mt", value_name = "DIR")]
    pub mt_dir: Utf8PathBuf,

    /// Output sites-only VCF. Format is selected by extension: '.vcf', '.vcf.gz', '.vcf.bgz' or '.bcf'
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Utf8PathBuf,

    /// Local scratch directory, this is created if it does not exist. The log file is written here.
    #[arg(long, value_name = "DIR")]
    pub local_tmp_dir: Option<Utf8PathBuf>,

    /// Recompute the output even if it already exists
    #[arg(long, overrides_with = "reuse")]
    pub overwrite: bool,

    /// Skip all computation if the output already exists. This is the default.
    #[arg(long, overrides_with = "overwrite")]
    pub reuse: bool,

    /// Billing project identifier for this run. Defaults to the value of the HAIL_BILLING_PROJECT
    /// environment variable.
    #[arg(long = "hail-billing", value_name = "PROJECT")]
    pub billing_project: Option<String>,

    /// Maximum number of partitions used to compute site INFO fields
    #[arg(long, default_value_t = DEFAULT_N_PARTITIONS)]
    pub n_partitions: usize,

    /// Build an index for compressed output, a '.tbi' index for VCF or '.csi' for BCF
    #[arg(long)]
    pub tabix: bool,

    /// Write run statistics in JSON format to this file
    #[arg(long, value_name = "FILE")]
    pub run_stats: Option<Utf8PathBuf>,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_mt_to_vcf_settings(
    mut settings: MtToVcfSettings,
) -> SimpleResult<MtToVcfSettings> {
    if settings.reuse {
        settings.overwrite = false;
    }

    check_required_dir(&settings.mt_dir, "matrix table")?;
    if settings.mt_dir.extension() != Some("mt") {
        bail!(
            "Matrix table path does not have a '.mt' extension: '{}'",
            settings.mt_dir
        );
    }
    if !settings.mt_dir.join(MATRIX_TABLE_METADATA_FILENAME).is_file() {
        bail!(
            "Matrix table directory does not contain a '{MATRIX_TABLE_METADATA_FILENAME}' file: '{}'",
            settings.mt_dir
        );
    }

    let format = match SitesVcfFormat::from_path(&settings.output) {
        Some(x) => x,
        None => bail!(
            "Output path '{}' does not have a recognized extension, expected one of: {}",
            settings.output,
            SitesVcfFormat::SUPPORTED_EXTENSIONS.join(" ")
        ),
    };
    check_output_file_parent_dir(&settings.output, "output")?;
    if settings.tabix && !format.is_indexable() {
        bail!("--tabix requires compressed output, but output is uncompressed VCF: '{}'", settings.output);
    }

    if settings.n_partitions == 0 {
        bail!("--n-partitions argument must be greater than 0");
    }

    if let Some(run_stats) = &settings.run_stats {
        check_output_file_parent_dir(run_stats, "run statistics")?;
    }

    if settings.billing_project.is_none() {
        settings.billing_project = std::env::var(BILLING_PROJECT_ENV_VAR)
            .ok()
            .filter(|x| !x.is_empty());
    }

    Ok(settings)
}
