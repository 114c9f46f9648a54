mod cli;
mod compute_info;
mod exec_context;
mod globals;
mod info_field;
mod logger;
mod matrix_table;
mod mt_to_vcf;
mod os_utils;
mod prob_utils;
mod run_stats;
mod site_filter;
mod site_table;
mod sites_vcf_output;
mod vcf_types;
mod vcf_utils;

#[cfg(test)]
mod test_utils;

use std::{error, process};

use hhmmss::Hhmmss;
use log::info;

use crate::exec_context::ExecutionContext;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_local_tmp_dir_and_logger;
use crate::mt_to_vcf::run_mt_to_vcf;

/// Run system configuration steps prior to starting any other program logic
///
fn system_configuration_prelude() {
    os_utils::attempt_max_open_file_limit();
}

fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    info!("Running on {} threads", settings.shared.thread_count);

    let start = std::time::Instant::now();

    let mt_to_vcf_settings = &settings.mt_to_vcf;
    let ctx = ExecutionContext::init(
        settings.shared.thread_count,
        mt_to_vcf_settings.local_tmp_dir.as_deref(),
        mt_to_vcf_settings.billing_project.as_deref(),
    )?;

    let output = run_mt_to_vcf(&ctx, mt_to_vcf_settings)?;
    info!("Sites-only VCF output: '{output}'");

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    system_configuration_prelude();

    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    // Setup logger, including creation of the local scratch directory for the log file:
    setup_local_tmp_dir_and_logger(
        settings.mt_to_vcf.local_tmp_dir.as_deref(),
        settings.shared.debug,
    );

    if let Err(err) = run(&settings) {
        eprintln!("{err}");
        process::exit(2);
    }
}
