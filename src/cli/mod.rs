mod mt_to_vcf;
mod shared;
mod utils;

use clap::Parser;
use simple_error::SimpleResult;

pub use self::mt_to_vcf::MtToVcfSettings;
use self::mt_to_vcf::validate_and_fix_mt_to_vcf_settings;
pub use self::shared::SharedSettings;
use self::shared::validate_and_fix_shared_settings;

#[derive(Parser)]
#[command(
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(flatten)]
    pub mt_to_vcf: MtToVcfSettings,
}

/// Validate settings and update parameters that can't be processed by clap
///
/// Assumes no logger has been configured yet
///
fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;
    settings.mt_to_vcf = validate_and_fix_mt_to_vcf_settings(settings.mt_to_vcf)?;
    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}
