//! Densify the matrix table, restrict it to non-reference sites, and tag each site with depth and
//! allele-number summaries
//!

use log::info;
use serde::{Deserialize, Serialize};
use thousands::Separable;

use crate::matrix_table::{Entry, MatrixRow, MatrixTable, MatrixTableHeader, densify};

/// A retained matrix row with its site-level tags
pub struct TaggedRow {
    pub row: MatrixRow,

    /// Sum of DP over all samples, missing DP values add nothing
    pub site_dp: i64,

    /// Twice the number of samples with a defined genotype call
    pub ans: i64,
}

pub struct TaggedMatrixTable {
    pub header: MatrixTableHeader,
    pub rows: Vec<TaggedRow>,
}

#[derive(Default, Deserialize, Serialize)]
pub struct SiteFilterStats {
    pub input_row_count: usize,
    pub densified_entry_count: usize,

    /// Rows removed because they have only the reference allele
    pub single_allele_row_count: usize,

    /// Multi-allelic rows removed because no sample has a non-reference call
    ///
    /// These are typically spanning deletion sites where all calls were filtered out upstream
    pub no_non_ref_call_row_count: usize,

    pub retained_row_count: usize,
}

fn has_non_ref_call(entries: &[Option<Entry>]) -> bool {
    entries.iter().flatten().any(|x| x.has_non_ref_call())
}

pub fn get_site_dp(entries: &[Option<Entry>]) -> i64 {
    entries
        .iter()
        .flatten()
        .filter_map(|x| x.dp)
        .map(i64::from)
        .sum()
}

/// Allele number surrogate, assuming every sample with a defined call is diploid
pub fn get_ans(entries: &[Option<Entry>]) -> i64 {
    let called_sample_count = entries
        .iter()
        .flatten()
        .filter(|x| x.gt.is_some())
        .count() as i64;
    called_sample_count * 2
}

/// Densify the matrix table, then keep only rows with more than one allele and at least one
/// non-reference call, tagging each retained row with site_dp and ANS
///
pub fn filter_rows_and_add_tags(mt: MatrixTable) -> (TaggedMatrixTable, SiteFilterStats) {
    let mut stats = SiteFilterStats {
        input_row_count: mt.rows.len(),
        ..Default::default()
    };

    let (mt, densified_entry_count) = densify(mt);
    stats.densified_entry_count = densified_entry_count;

    let mut rows = Vec::new();
    for row in mt.rows {
        if row.key.alleles.len() < 2 {
            stats.single_allele_row_count += 1;
            continue;
        }
        if !has_non_ref_call(&row.entries) {
            stats.no_non_ref_call_row_count += 1;
            continue;
        }

        let site_dp = get_site_dp(&row.entries);
        let ans = get_ans(&row.entries);
        rows.push(TaggedRow { row, site_dp, ans });
    }
    stats.retained_row_count = rows.len();

    info!(
        "Retained {} of {} matrix table rows as non-reference sites ({} single-allele rows and {} rows without a non-reference call removed, {} entries densified)",
        stats.retained_row_count.separate_with_commas(),
        stats.input_row_count.separate_with_commas(),
        stats.single_allele_row_count.separate_with_commas(),
        stats.no_non_ref_call_row_count.separate_with_commas(),
        stats.densified_entry_count.separate_with_commas(),
    );

    let tagged_mt = TaggedMatrixTable {
        header: mt.header,
        rows,
    };
    (tagged_mt, stats)
}
