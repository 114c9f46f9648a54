//! Run all steps of the matrix table to sites-only VCF conversion
//!

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use simple_error::SimpleResult;
use thousands::Separable;

use crate::cli::MtToVcfSettings;
use crate::compute_info::{ComputeInfoStats, create_info_table};
use crate::exec_context::ExecutionContext;
use crate::globals::PROGRAM_VERSION;
use crate::matrix_table::{MatrixTable, read_matrix_table};
use crate::run_stats::{MtToVcfRunStats, write_run_stats};
use crate::site_filter::{SiteFilterStats, filter_rows_and_add_tags};
use crate::sites_vcf_output::{SitesVcfSettings, VcfStats, write_sites_only_vcf};
use crate::vcf_types::{VcfSiteTable, adjust_vcf_incompatible_types};

/// Stats from the table transformation steps
#[derive(Default)]
pub struct SitesOnlyTableStats {
    pub site_filter_stats: SiteFilterStats,
    pub compute_info_stats: ComputeInfoStats,
}

/// Transform the matrix table into a sites-only table with VCF-compatible INFO values
///
pub fn mt_to_sites_only_table(
    ctx: &ExecutionContext,
    mt: MatrixTable,
    n_partitions: usize,
) -> (VcfSiteTable, SitesOnlyTableStats) {
    info!("Filtering matrix table to non-reference sites");
    let (tagged_mt, site_filter_stats) = filter_rows_and_add_tags(mt);

    let (site_table, compute_info_stats) = create_info_table(ctx, &tagged_mt, n_partitions);

    info!("Adjusting INFO field types for VCF output");
    let vcf_site_table = adjust_vcf_incompatible_types(site_table);

    let stats = SitesOnlyTableStats {
        site_filter_stats,
        compute_info_stats,
    };
    (vcf_site_table, stats)
}

/// Transform the matrix table into a sites-only table and write it out as VCF
///
/// Returns the output path with stats from all steps
///
pub fn export_sites_only_vcf(
    ctx: &ExecutionContext,
    mt: MatrixTable,
    n_partitions: usize,
    vcf_settings: &SitesVcfSettings,
) -> SimpleResult<(Utf8PathBuf, SitesOnlyTableStats, VcfStats)> {
    let (vcf_site_table, table_stats) = mt_to_sites_only_table(ctx, mt, n_partitions);
    let vcf_stats = write_sites_only_vcf(vcf_settings, &vcf_site_table)?;
    Ok((vcf_settings.output_path.clone(), table_stats, vcf_stats))
}

fn is_reusable_output(output: &Utf8Path, overwrite: bool) -> bool {
    !overwrite && output.exists()
}

/// Run the full conversion from command-line settings
///
/// When the output already exists and overwrite is not requested, no computation is performed.
///
pub fn run_mt_to_vcf(ctx: &ExecutionContext, settings: &MtToVcfSettings) -> SimpleResult<Utf8PathBuf> {
    if is_reusable_output(&settings.output, settings.overwrite) {
        info!(
            "Reusing existing output file: '{}'. Use --overwrite to recompute it",
            settings.output
        );
        return Ok(settings.output.clone());
    }

    let vcf_settings =
        SitesVcfSettings::new(&settings.output, settings.tabix, ctx.thread_count())?;

    info!("Reading matrix table: '{}'", settings.mt_dir);
    let mt = read_matrix_table(&settings.mt_dir)?;

    let (output, table_stats, vcf_stats) =
        export_sites_only_vcf(ctx, mt, settings.n_partitions, &vcf_settings)?;

    if let Some(run_stats_filename) = &settings.run_stats {
        let run_stats = MtToVcfRunStats {
            program_version: PROGRAM_VERSION.to_string(),
            billing_project: ctx.billing_project().map(|x| x.to_string()),
            site_filter_stats: table_stats.site_filter_stats,
            compute_info_stats: table_stats.compute_info_stats,
            vcf_stats,
        };
        write_run_stats(run_stats_filename, &run_stats)?;
    } else {
        info!(
            "Converted matrix table to {} sites-only VCF records",
            vcf_stats.output_record_count.separate_with_commas()
        );
    }

    Ok(output)
}
