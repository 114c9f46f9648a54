//! Site-level INFO annotations aggregated over the genotypes of one site
//!

use super::strand_bias::{fs_from_sb, sor_from_sb};
use crate::info_field::{InfoField, InfoMap, InfoValue};
use crate::matrix_table::{Entry, EntryFieldAvailability};
use crate::prob_utils::lower_median;

/// Minimum site QUALapprox for SNVs, as the sum of the SNV phred threshold and het prior
const LOWQUAL_SNV_MIN_QUAL: f64 = 30.0 + 30.0;

const LOWQUAL_INDEL_PHRED_THRESHOLD: f64 = 30.0;

/// Element-wise sum of all defined fixed-size arrays, or None if no array is defined
pub fn sum_arrays<const N: usize>(arrays: impl Iterator<Item = [i32; N]>) -> Option<[i64; N]> {
    arrays.fold(None, |sum, x| {
        let mut sum = sum.unwrap_or([0; N]);
        for (s, v) in sum.iter_mut().zip(x) {
            *s += v as i64;
        }
        Some(sum)
    })
}

/// List the site INFO fields which can be computed given the available entry fields
pub fn get_site_info_fields(fields: &EntryFieldAvailability) -> Vec<InfoField> {
    use InfoField::*;
    let mut info_fields = vec![Dp];
    if fields.qual_approx {
        info_fields.push(QualApprox);
    }
    if fields.var_dp {
        info_fields.push(VarDp);
    }
    if fields.qual_approx && fields.var_dp {
        info_fields.push(Qd);
    }
    if fields.sb {
        info_fields.extend([Sb, Fs, Sor]);
    }
    if fields.raw_mq_and_dp {
        info_fields.extend([RawMq, MqDp, Mq]);
    }
    if fields.read_pos_rank_sum {
        info_fields.push(ReadPosRankSum);
    }
    if fields.mq_rank_sum {
        info_fields.push(MqRankSum);
    }
    info_fields
}

/// Add all site-level INFO annotations which can be computed from the available entry fields
///
/// DP is aggregated over all genotypes, every other annotation is aggregated over non-reference
/// genotypes only.
///
pub fn add_site_info(fields: &EntryFieldAvailability, entries: &[Option<Entry>], info: &mut InfoMap) {
    use InfoField::*;

    let dp = entries
        .iter()
        .flatten()
        .filter_map(|x| x.dp)
        .map(i64::from)
        .sum::<i64>();
    info.insert(Dp, InfoValue::Int(dp));

    let non_ref_entries = entries
        .iter()
        .flatten()
        .filter(|x| x.has_non_ref_call())
        .collect::<Vec<_>>();

    let qual_approx = non_ref_entries
        .iter()
        .filter_map(|x| x.qual_approx)
        .map(i64::from)
        .sum::<i64>();
    let var_dp = non_ref_entries
        .iter()
        .filter_map(|x| x.var_dp)
        .map(i64::from)
        .sum::<i64>();

    if fields.qual_approx {
        info.insert(QualApprox, InfoValue::Int(qual_approx));
    }
    if fields.var_dp {
        info.insert(VarDp, InfoValue::Int(var_dp));
    }
    if fields.qual_approx && fields.var_dp && var_dp > 0 {
        info.insert(Qd, InfoValue::Float(qual_approx as f64 / var_dp as f64));
    }

    if fields.sb {
        if let Some(sb) = sum_arrays(non_ref_entries.iter().filter_map(|x| x.sb)) {
            info.insert(Sb, InfoValue::IntArray(sb.to_vec()));
            if let Some(fs) = fs_from_sb(&sb) {
                info.insert(Fs, InfoValue::Float(fs));
            }
            info.insert(Sor, InfoValue::Float(sor_from_sb(&sb)));
        }
    }

    if fields.raw_mq_and_dp {
        if let Some([raw_mq, mq_dp]) =
            sum_arrays(non_ref_entries.iter().filter_map(|x| x.raw_mq_and_dp))
        {
            info.insert(RawMq, InfoValue::Float(raw_mq as f64));
            info.insert(MqDp, InfoValue::Int(mq_dp));
            if mq_dp > 0 {
                info.insert(Mq, InfoValue::Float((raw_mq as f64 / mq_dp as f64).sqrt()));
            }
        }
    }

    let mut add_median = |enabled: bool, field: InfoField, get_value: fn(&Entry) -> Option<f32>| {
        if !enabled {
            return;
        }
        let values = non_ref_entries
            .iter()
            .filter_map(|x| get_value(x))
            .map(f64::from)
            .collect::<Vec<_>>();
        if let Some(median) = lower_median(values) {
            info.insert(field, InfoValue::Float(median));
        }
    };
    add_median(fields.read_pos_rank_sum, ReadPosRankSum, |x| x.read_pos_rank_sum);
    add_median(fields.mq_rank_sum, MqRankSum, |x| x.mq_rank_sum);
}

/// An alt allele is an SNV when it has the same length as the reference allele and differs from
/// it at exactly one base
fn is_snv(ref_allele: &[u8], alt_allele: &[u8]) -> bool {
    alt_allele != b"*"
        && ref_allele.len() == alt_allele.len()
        && ref_allele
            .iter()
            .zip(alt_allele)
            .filter(|(r, a)| r != a)
            .count()
            == 1
}

/// Test whether the quality of one alt allele is below its SNV or indel threshold
pub fn is_lowqual_allele(
    ref_allele: &[u8],
    alt_allele: &[u8],
    qual_approx: f64,
    indel_phred_het_prior: f64,
) -> bool {
    let min_qual = if is_snv(ref_allele, alt_allele) {
        LOWQUAL_SNV_MIN_QUAL
    } else {
        LOWQUAL_INDEL_PHRED_THRESHOLD + indel_phred_het_prior
    };
    qual_approx < min_qual
}

/// Test whether the site quality is too low for any of its alt alleles
///
/// # Arguments
/// * `alleles` - Reference allele followed by all alt alleles
/// * `qual_approx` - Site QUALapprox value
/// * `indel_phred_het_prior` - Phred-scaled het prior added to the indel quality threshold
///
pub fn is_lowqual_site(alleles: &[Vec<u8>], qual_approx: f64, indel_phred_het_prior: f64) -> bool {
    let Some((ref_allele, alt_alleles)) = alleles.split_first() else {
        return false;
    };
    alt_alleles
        .iter()
        .any(|x| is_lowqual_allele(ref_allele, x, qual_approx, indel_phred_het_prior))
}
