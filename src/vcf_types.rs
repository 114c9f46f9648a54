//! Conversion of site INFO values to types representable in VCF
//!

use log::debug;
use rust_htslib::bcf::record::Numeric;
use thousands::Separable;

use crate::info_field::{InfoField, InfoValue};
use crate::matrix_table::{ContigInfo, RowKey};
use crate::site_table::SiteTable;
use crate::vcf_utils::MISSING_INTEGER;

/// Smallest valid VCF integer value, lower values are reserved by BCF for special values
pub const VCF_MIN_INTEGER: i32 = i32::MIN + 8;

/// INFO values in htslib representation
///
/// Missing array elements are stored as the htslib missing value of each type.
///
#[derive(Clone, Debug, PartialEq)]
pub enum VcfInfoValue {
    Integer(Vec<i32>),
    Float(Vec<f32>),
}

pub struct VcfSiteRow {
    pub key: RowKey,

    /// INFO values in schema order
    pub info: Vec<(InfoField, VcfInfoValue)>,
}

pub struct VcfSiteTable {
    pub reference_genome: String,
    pub contigs: Vec<ContigInfo>,
    pub schema: Vec<InfoField>,
    pub rows: Vec<VcfSiteRow>,
}

fn clamp_vcf_integer(value: i64) -> i32 {
    value.clamp(VCF_MIN_INTEGER as i64, i32::MAX as i64) as i32
}

/// Convert to f32, returning None if the result is not finite
fn to_vcf_float(value: f64) -> Option<f32> {
    let value = value as f32;
    if value.is_finite() { Some(value) } else { None }
}

/// Convert an INFO value to its VCF representation
///
/// Returns None if a scalar value can't be represented, in which case the field should be dropped
/// from the record. Array elements which can't be represented are set to missing.
///
fn to_vcf_info_value(value: &InfoValue) -> Option<VcfInfoValue> {
    match value {
        InfoValue::Int(x) => Some(VcfInfoValue::Integer(vec![clamp_vcf_integer(*x)])),
        InfoValue::IntArray(x) => Some(VcfInfoValue::Integer(
            x.iter().map(|&v| clamp_vcf_integer(v)).collect(),
        )),
        InfoValue::Float(x) => to_vcf_float(*x).map(|v| VcfInfoValue::Float(vec![v])),
        InfoValue::NullableIntArray(x) => Some(VcfInfoValue::Integer(
            x.iter()
                .map(|v| v.map_or(MISSING_INTEGER, clamp_vcf_integer))
                .collect(),
        )),
        InfoValue::NullableFloatArray(x) => Some(VcfInfoValue::Float(
            x.iter()
                .map(|v| v.and_then(to_vcf_float).unwrap_or_else(f32::missing))
                .collect(),
        )),
    }
}

/// Convert all INFO values to VCF-compatible integer and float types
///
/// Integers are clamped to the VCF integer range, floats are narrowed to single precision, and
/// any float which is not finite after narrowing is dropped from its row.
///
pub fn adjust_vcf_incompatible_types(site_table: SiteTable) -> VcfSiteTable {
    let mut dropped_value_count = 0usize;
    let rows = site_table
        .rows
        .into_iter()
        .map(|row| {
            let mut info = Vec::new();
            for (field, value) in row.info.iter() {
                match to_vcf_info_value(value) {
                    Some(x) => info.push((*field, x)),
                    None => dropped_value_count += 1,
                }
            }
            VcfSiteRow { key: row.key, info }
        })
        .collect();

    if dropped_value_count > 0 {
        debug!(
            "Dropped {} non-finite INFO values during VCF type conversion",
            dropped_value_count.separate_with_commas()
        );
    }

    VcfSiteTable {
        reference_genome: site_table.reference_genome,
        contigs: site_table.contigs,
        schema: site_table.schema,
        rows,
    }
}
