//! Sites-only table produced by INFO aggregation
//!

use crate::info_field::{InfoField, InfoMap};
use crate::matrix_table::{ContigInfo, RowKey};

pub struct SiteRow {
    pub key: RowKey,
    pub info: InfoMap,

    /// Low quality site flag, this is None when the site quality could not be assessed
    pub lowqual: Option<bool>,

    /// Low quality flag for each alt allele, this is None when allele quality could not be assessed
    pub as_lowqual: Option<Vec<bool>>,
}

pub struct SiteTable {
    pub reference_genome: String,
    pub contigs: Vec<ContigInfo>,

    /// All INFO fields which may be present on any row, in output order
    pub schema: Vec<InfoField>,

    pub rows: Vec<SiteRow>,

    /// Number of partitions the rows were processed in
    pub partition_count: usize,
}

impl SiteTable {
    pub fn lowqual_site_count(&self) -> usize {
        self.rows.iter().filter(|x| x.lowqual == Some(true)).count()
    }

    pub fn as_lowqual_site_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|x| x.as_lowqual.as_ref().is_some_and(|v| v.contains(&true)))
            .count()
    }
}
