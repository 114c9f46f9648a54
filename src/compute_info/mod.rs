//! Aggregate per-sample entries into site-level INFO fields
//!

mod allele_counts;
mod allele_specific_info;
mod site_info;
mod strand_bias;

use std::collections::HashMap;
use std::ops::Range;
use std::sync::mpsc::channel;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thousands::Separable;

use self::allele_counts::get_allele_counts;
use self::allele_specific_info::{
    add_allele_specific_info, get_allele_specific_info_fields, get_allele_specific_lowqual,
};
use self::site_info::{add_site_info, get_site_info_fields, is_lowqual_site};
use crate::exec_context::ExecutionContext;
use crate::info_field::{InfoField, InfoMap, InfoValue};
use crate::matrix_table::{EntryFieldAvailability, RowKey};
use crate::site_filter::{TaggedMatrixTable, TaggedRow};
use crate::site_table::{SiteRow, SiteTable};

pub const DEFAULT_LOWQUAL_INDEL_PHRED_HET_PRIOR: f64 = 40.0;

pub struct ComputeInfoSettings {
    /// If true, compute all site-level annotations in addition to allele counts
    pub site_annotations: bool,

    /// If true, compute allele-specific annotations by aggregating entry values separately for
    /// each alt allele
    pub allele_specific_annotations: bool,

    /// Maximum number of partitions to split the rows into for parallel processing
    pub n_partitions: usize,

    /// Phred-scaled het prior added to the indel threshold of the low quality site test
    pub lowqual_indel_phred_het_prior: f64,
}

impl ComputeInfoSettings {
    pub fn new(site_annotations: bool, n_partitions: usize) -> Self {
        Self {
            site_annotations,
            allele_specific_annotations: true,
            n_partitions,
            lowqual_indel_phred_het_prior: DEFAULT_LOWQUAL_INDEL_PHRED_HET_PRIOR,
        }
    }
}

#[derive(Default, Deserialize, Serialize)]
pub struct ComputeInfoStats {
    pub partition_count: usize,
    pub site_count: usize,
    pub lowqual_site_count: usize,

    /// Sites where at least one alt allele fails the allele-specific quality threshold
    pub as_lowqual_site_count: usize,
}

/// Get all INFO fields which may be produced for the given entry fields, in output order
pub fn get_info_schema(
    entry_fields: &EntryFieldAvailability,
    settings: &ComputeInfoSettings,
) -> Vec<InfoField> {
    let mut schema = vec![InfoField::Ac, InfoField::AcRaw, InfoField::Ans];
    if settings.site_annotations {
        schema.extend(get_site_info_fields(entry_fields));
    }
    if settings.allele_specific_annotations {
        schema.extend(get_allele_specific_info_fields(entry_fields));
    }
    schema.sort();
    schema.dedup();
    schema
}

/// Split `row_count` rows into at most `n_partitions` contiguous ranges of equal size
///
/// Only the final range may be shorter than the others.
///
pub fn get_partition_ranges(row_count: usize, n_partitions: usize) -> Vec<Range<usize>> {
    assert!(n_partitions > 0);
    if row_count == 0 {
        return Vec::new();
    }
    let chunk_size = row_count.div_ceil(n_partitions);
    (0..row_count)
        .step_by(chunk_size)
        .map(|start| start..std::cmp::min(start + chunk_size, row_count))
        .collect()
}

fn compute_row_info(
    entry_fields: &EntryFieldAvailability,
    settings: &ComputeInfoSettings,
    tagged_row: &TaggedRow,
) -> SiteRow {
    let row = &tagged_row.row;
    let mut info = InfoMap::new();

    let (ac, ac_raw) = get_allele_counts(row.key.alt_allele_count(), &row.entries);
    info.insert(InfoField::Ac, InfoValue::IntArray(ac));
    info.insert(InfoField::AcRaw, InfoValue::IntArray(ac_raw));
    info.insert(InfoField::Ans, InfoValue::Int(tagged_row.ans));

    let mut lowqual = None;
    if settings.site_annotations {
        add_site_info(entry_fields, &row.entries, &mut info);
        if let Some(&InfoValue::Int(qual_approx)) = info.get(&InfoField::QualApprox) {
            lowqual = Some(is_lowqual_site(
                &row.key.alleles,
                qual_approx as f64,
                settings.lowqual_indel_phred_het_prior,
            ));
        }
    }

    let mut as_lowqual = None;
    if settings.allele_specific_annotations {
        add_allele_specific_info(
            entry_fields,
            row.key.alt_allele_count(),
            &row.entries,
            &mut info,
        );
        if let Some(InfoValue::IntArray(as_qual_approx)) = info.get(&InfoField::AsQualApprox) {
            as_lowqual = Some(get_allele_specific_lowqual(
                &row.key.alleles,
                as_qual_approx,
                settings.lowqual_indel_phred_het_prior,
            ));
        }
    }

    SiteRow {
        key: row.key.clone(),
        info,
        lowqual,
        as_lowqual,
    }
}

/// Aggregate entries into allele counts and, optionally, all site-level INFO annotations
///
/// Rows are processed in contiguous partitions on the worker pool, output rows are in input
/// order regardless of partition count.
///
pub fn default_compute_info(
    ctx: &ExecutionContext,
    mt: &TaggedMatrixTable,
    settings: &ComputeInfoSettings,
) -> SiteTable {
    let partition_ranges = get_partition_ranges(mt.rows.len(), settings.n_partitions);
    let partition_count = partition_ranges.len();
    debug!(
        "Computing INFO fields for {} rows in {} partitions",
        mt.rows.len().separate_with_commas(),
        partition_count.separate_with_commas()
    );

    let entry_fields = &mt.header.entry_fields;
    let (tx, rx) = channel();
    ctx.worker_pool().scope(move |scope| {
        for (partition_index, range) in partition_ranges.into_iter().enumerate() {
            let tx = tx.clone();
            let partition_rows = &mt.rows[range];
            scope.spawn(move |_| {
                let site_rows = partition_rows
                    .iter()
                    .map(|x| compute_row_info(entry_fields, settings, x))
                    .collect::<Vec<_>>();
                tx.send((partition_index, site_rows)).unwrap();
            });
        }
    });

    let mut partitions = rx.into_iter().collect::<Vec<_>>();
    partitions.sort_by_key(|x| x.0);
    let rows = partitions.into_iter().flat_map(|x| x.1).collect();

    SiteTable {
        reference_genome: mt.header.reference_genome.clone(),
        contigs: mt.header.contigs.clone(),
        schema: get_info_schema(entry_fields, settings),
        rows,
        partition_count,
    }
}

/// Compute all INFO fields for the tagged matrix table, replacing INFO DP with the site_dp tag
///
pub fn create_info_table(
    ctx: &ExecutionContext,
    mt: &TaggedMatrixTable,
    n_partitions: usize,
) -> (SiteTable, ComputeInfoStats) {
    info!("Computing site INFO fields");
    let settings = ComputeInfoSettings::new(true, n_partitions);
    let mut site_table = default_compute_info(ctx, mt, &settings);

    let site_dp = mt
        .rows
        .iter()
        .map(|x| (&x.row.key, x.site_dp))
        .collect::<HashMap<&RowKey, i64>>();
    for row in site_table.rows.iter_mut() {
        if let Some(&dp) = site_dp.get(&row.key) {
            row.info.insert(InfoField::Dp, InfoValue::Int(dp));
        }
    }
    if !site_table.schema.contains(&InfoField::Dp) {
        site_table.schema.push(InfoField::Dp);
        site_table.schema.sort();
    }

    let stats = ComputeInfoStats {
        partition_count: site_table.partition_count,
        site_count: site_table.rows.len(),
        lowqual_site_count: site_table.lowqual_site_count(),
        as_lowqual_site_count: site_table.as_lowqual_site_count(),
    };
    info!(
        "Finished computing INFO fields for {} sites ({} low quality, {} with a low quality allele)",
        stats.site_count.separate_with_commas(),
        stats.lowqual_site_count.separate_with_commas(),
        stats.as_lowqual_site_count.separate_with_commas()
    );

    (site_table, stats)
}
