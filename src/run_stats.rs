//! Track stats for the whole run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, map_err_with};

use crate::compute_info::ComputeInfoStats;
use crate::site_filter::SiteFilterStats;
use crate::sites_vcf_output::VcfStats;

#[derive(Deserialize, Serialize)]
pub struct MtToVcfRunStats {
    pub program_version: String,
    pub billing_project: Option<String>,
    pub site_filter_stats: SiteFilterStats,
    pub compute_info_stats: ComputeInfoStats,
    pub vcf_stats: VcfStats,
}

/// Write run_stats structure out in json format
pub fn write_run_stats(filename: &Utf8Path, run_stats: &MtToVcfRunStats) -> SimpleResult<()> {
    info!("Writing run statistics to file: '{filename}'");

    let f = map_err_with!(
        File::create(filename),
        "Unable to create run statistics json file: '{}'",
        filename
    )?;

    map_err_with!(
        serde_json::to_writer_pretty(&f, &run_stats),
        "Unable to write run statistics json file: '{}'",
        filename
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::get_test_dir;

    #[test]
    fn test_write_run_stats() {
        let (_dir, dir_path) = get_test_dir();
        let filename = dir_path.join("run_stats.json");
        let run_stats = MtToVcfRunStats {
            program_version: "0.0.0".to_string(),
            billing_project: Some("test-project".to_string()),
            site_filter_stats: SiteFilterStats {
                retained_row_count: 3,
                ..Default::default()
            },
            compute_info_stats: ComputeInfoStats::default(),
            vcf_stats: VcfStats {
                output_record_count: 3,
            },
        };
        write_run_stats(&filename, &run_stats).unwrap();

        let f = File::open(&filename).unwrap();
        let json: serde_json::Value = serde_json::from_reader(f).unwrap();
        assert_eq!(json["billing_project"], "test-project");
        assert_eq!(json["site_filter_stats"]["retained_row_count"], 3);
        assert_eq!(json["vcf_stats"]["output_record_count"], 3);
    }
}
