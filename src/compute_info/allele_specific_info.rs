//! Allele-specific INFO annotations
//!
//! Each alt allele is annotated by aggregating the per-sample values over the genotypes which
//! carry that allele.
//!

use super::site_info::{is_lowqual_allele, sum_arrays};
use super::strand_bias::{fs_from_sb, sor_from_sb};
use crate::info_field::{InfoField, InfoMap, InfoValue};
use crate::matrix_table::{Entry, EntryFieldAvailability};
use crate::prob_utils::lower_median;

/// List the allele-specific INFO fields which can be computed given the available entry fields
pub fn get_allele_specific_info_fields(fields: &EntryFieldAvailability) -> Vec<InfoField> {
    use InfoField::*;
    let mut info_fields = Vec::new();
    if fields.qual_approx {
        info_fields.push(AsQualApprox);
    }
    if fields.var_dp {
        info_fields.push(AsVarDp);
    }
    if fields.sb {
        info_fields.extend([AsSbTable, AsFs, AsSor]);
    }
    if fields.raw_mq_and_dp {
        info_fields.extend([AsRawMq, AsMqDp, AsMq]);
    }
    if fields.read_pos_rank_sum {
        info_fields.push(AsReadPosRankSum);
    }
    if fields.mq_rank_sum {
        info_fields.push(AsMqRankSum);
    }
    info_fields
}

/// Group entries by each alt allele present in their genotype call
///
/// An entry with a het call of two alt alleles is included in the group of both alleles.
///
fn get_alt_allele_entries(alt_allele_count: usize, entries: &[Option<Entry>]) -> Vec<Vec<&Entry>> {
    let mut allele_entries = vec![Vec::new(); alt_allele_count];
    for entry in entries.iter().flatten() {
        let Some(gt) = &entry.gt else {
            continue;
        };
        for (alt_index, alt_entries) in allele_entries.iter_mut().enumerate() {
            if gt.allele_copies(alt_index as u32 + 1) > 0 {
                alt_entries.push(entry);
            }
        }
    }
    allele_entries
}

fn sum_values(entries: &[&Entry], get_value: fn(&Entry) -> Option<i32>) -> i64 {
    entries
        .iter()
        .filter_map(|x| get_value(x))
        .map(i64::from)
        .sum()
}

/// Build the flattened AS_SB_TABLE
///
/// The reference pair is summed over all non-reference genotypes, and each alt allele pair is
/// summed over the genotypes carrying that allele. Returns the reference pair, the alt pairs and
/// the flattened table.
///
fn get_as_sb_table(
    entries: &[Option<Entry>],
    allele_entries: &[Vec<&Entry>],
) -> (Option<[i64; 2]>, Vec<Option<[i64; 2]>>, Vec<Option<i64>>) {
    let ref_sb = sum_arrays(
        entries
            .iter()
            .flatten()
            .filter(|x| x.has_non_ref_call())
            .filter_map(|x| x.sb)
            .map(|sb| [sb[0], sb[1]]),
    );
    let alt_sbs = allele_entries
        .iter()
        .map(|alt_entries| {
            sum_arrays(
                alt_entries
                    .iter()
                    .filter_map(|x| x.sb)
                    .map(|sb| [sb[2], sb[3]]),
            )
        })
        .collect::<Vec<_>>();

    let sb_table = std::iter::once(ref_sb)
        .chain(alt_sbs.iter().copied())
        .flat_map(|x| match x {
            Some([fwd, rev]) => [Some(fwd), Some(rev)],
            None => [None, None],
        })
        .collect();

    (ref_sb, alt_sbs, sb_table)
}

/// Add all allele-specific INFO annotations which can be computed from the available entry fields
///
pub fn add_allele_specific_info(
    fields: &EntryFieldAvailability,
    alt_allele_count: usize,
    entries: &[Option<Entry>],
    info: &mut InfoMap,
) {
    use InfoField::*;

    let allele_entries = get_alt_allele_entries(alt_allele_count, entries);

    let mut add_sums = |enabled: bool, field: InfoField, get_value: fn(&Entry) -> Option<i32>| {
        if !enabled {
            return;
        }
        let sums = allele_entries
            .iter()
            .map(|x| sum_values(x, get_value))
            .collect();
        info.insert(field, InfoValue::IntArray(sums));
    };
    add_sums(fields.qual_approx, AsQualApprox, |x| x.qual_approx);
    add_sums(fields.var_dp, AsVarDp, |x| x.var_dp);

    if fields.sb {
        let (ref_sb, alt_sbs, sb_table) = get_as_sb_table(entries, &allele_entries);
        info.insert(AsSbTable, InfoValue::NullableIntArray(sb_table));

        let allele_sbs = alt_sbs
            .iter()
            .map(|alt_sb| match (ref_sb, alt_sb) {
                (Some([ref_fwd, ref_rev]), Some([alt_fwd, alt_rev])) => {
                    Some([ref_fwd, ref_rev, *alt_fwd, *alt_rev])
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        let as_fs = allele_sbs
            .iter()
            .map(|x| x.as_ref().and_then(fs_from_sb))
            .collect();
        let as_sor = allele_sbs
            .iter()
            .map(|x| x.as_ref().map(sor_from_sb))
            .collect();
        info.insert(AsFs, InfoValue::NullableFloatArray(as_fs));
        info.insert(AsSor, InfoValue::NullableFloatArray(as_sor));
    }

    if fields.raw_mq_and_dp {
        let raw_mq_and_dps = allele_entries
            .iter()
            .map(|x| sum_arrays(x.iter().filter_map(|e| e.raw_mq_and_dp)))
            .collect::<Vec<_>>();
        let as_raw_mq = raw_mq_and_dps
            .iter()
            .map(|x| x.map(|[raw_mq, _]| raw_mq as f64))
            .collect();
        let as_mq_dp = raw_mq_and_dps
            .iter()
            .map(|x| x.map(|[_, mq_dp]| mq_dp))
            .collect();
        let as_mq = raw_mq_and_dps
            .iter()
            .map(|x| match x {
                Some([raw_mq, mq_dp]) if *mq_dp > 0 => Some((*raw_mq as f64 / *mq_dp as f64).sqrt()),
                _ => None,
            })
            .collect();
        info.insert(AsRawMq, InfoValue::NullableFloatArray(as_raw_mq));
        info.insert(AsMqDp, InfoValue::NullableIntArray(as_mq_dp));
        info.insert(AsMq, InfoValue::NullableFloatArray(as_mq));
    }

    let mut add_medians = |enabled: bool, field: InfoField, get_value: fn(&Entry) -> Option<f32>| {
        if !enabled {
            return;
        }
        let medians = allele_entries
            .iter()
            .map(|alt_entries| {
                let values = alt_entries
                    .iter()
                    .filter_map(|x| get_value(x))
                    .map(f64::from)
                    .collect::<Vec<_>>();
                lower_median(values)
            })
            .collect();
        info.insert(field, InfoValue::NullableFloatArray(medians));
    };
    add_medians(fields.read_pos_rank_sum, AsReadPosRankSum, |x| x.read_pos_rank_sum);
    add_medians(fields.mq_rank_sum, AsMqRankSum, |x| x.mq_rank_sum);
}

/// Test each alt allele for low quality using its own AS_QUALapprox value
///
/// # Arguments
/// * `alleles` - Reference allele followed by all alt alleles
/// * `as_qual_approx` - AS_QUALapprox value of each alt allele
/// * `indel_phred_het_prior` - Phred-scaled het prior added to the indel quality threshold
///
pub fn get_allele_specific_lowqual(
    alleles: &[Vec<u8>],
    as_qual_approx: &[i64],
    indel_phred_het_prior: f64,
) -> Vec<bool> {
    let Some((ref_allele, alt_alleles)) = alleles.split_first() else {
        return Vec::new();
    };
    alt_alleles
        .iter()
        .zip(as_qual_approx)
        .map(|(alt_allele, &qual_approx)| {
            is_lowqual_allele(ref_allele, alt_allele, qual_approx as f64, indel_phred_het_prior)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_ulps_eq;

    use crate::matrix_table::Call;

    fn all_fields() -> EntryFieldAvailability {
        EntryFieldAvailability {
            gq: true,
            ad: true,
            end: true,
            qual_approx: true,
            var_dp: true,
            read_pos_rank_sum: true,
            mq_rank_sum: true,
            sb: true,
            raw_mq_and_dp: true,
        }
    }

    fn get_entry(alleles: &[u32], qual_approx: i32, var_dp: i32, sb: [i32; 4]) -> Option<Entry> {
        Some(Entry {
            gt: Some(Call::new(alleles.to_vec())),
            dp: Some(var_dp),
            qual_approx: Some(qual_approx),
            var_dp: Some(var_dp),
            sb: Some(sb),
            ..Default::default()
        })
    }

    /// Tri-allelic site with genotypes 0/1, 1/2, 0/0 and an absent entry
    fn get_multi_allelic_entries() -> Vec<Option<Entry>> {
        vec![
            Some(Entry {
                raw_mq_and_dp: Some([36000, 10]),
                read_pos_rank_sum: Some(1.0),
                mq_rank_sum: Some(-0.5),
                ..get_entry(&[0, 1], 100, 10, [3, 4, 5, 6]).unwrap()
            }),
            Some(Entry {
                raw_mq_and_dp: Some([40000, 25]),
                read_pos_rank_sum: Some(2.0),
                ..get_entry(&[1, 2], 40, 20, [1, 1, 10, 12]).unwrap()
            }),
            get_entry(&[0, 0], 500, 30, [50, 50, 0, 0]),
            None,
        ]
    }

    #[test]
    fn test_get_allele_specific_info_fields() {
        let fields = get_allele_specific_info_fields(&EntryFieldAvailability::default());
        assert!(fields.is_empty());

        let fields = get_allele_specific_info_fields(&all_fields());
        assert_eq!(fields.len(), 10);
        assert!(fields.contains(&InfoField::AsSbTable));
        assert!(fields.contains(&InfoField::AsMqRankSum));
    }

    #[test]
    fn test_get_alt_allele_entries() {
        let entries = get_multi_allelic_entries();
        let allele_entries = get_alt_allele_entries(2, &entries);
        assert_eq!(allele_entries.len(), 2);
        assert_eq!(allele_entries[0].len(), 2);
        assert_eq!(allele_entries[1].len(), 1);
        assert_eq!(allele_entries[1][0].qual_approx, Some(40));
    }

    #[test]
    fn test_add_allele_specific_info_multi_allelic() {
        let entries = get_multi_allelic_entries();
        let mut info = InfoMap::new();
        add_allele_specific_info(&all_fields(), 2, &entries, &mut info);

        // Reference genotype values are not included in any allele
        assert_eq!(info[&InfoField::AsQualApprox], InfoValue::IntArray(vec![140, 40]));
        assert_eq!(info[&InfoField::AsVarDp], InfoValue::IntArray(vec![30, 20]));

        assert_eq!(
            info[&InfoField::AsSbTable],
            InfoValue::NullableIntArray(vec![
                Some(4),
                Some(5),
                Some(15),
                Some(18),
                Some(10),
                Some(12)
            ])
        );
        match &info[&InfoField::AsSor] {
            InfoValue::NullableFloatArray(x) => {
                assert_eq!(x.len(), 2);
                assert_ulps_eq!(x[0].unwrap(), sor_from_sb(&[4, 5, 15, 18]));
                assert_ulps_eq!(x[1].unwrap(), sor_from_sb(&[4, 5, 10, 12]));
            }
            _ => panic!("Unexpected AS_SOR type"),
        }
        assert_eq!(
            info[&InfoField::AsFs],
            InfoValue::NullableFloatArray(vec![
                fs_from_sb(&[4, 5, 15, 18]),
                fs_from_sb(&[4, 5, 10, 12])
            ])
        );

        assert_eq!(
            info[&InfoField::AsRawMq],
            InfoValue::NullableFloatArray(vec![Some(76000.0), Some(40000.0)])
        );
        assert_eq!(
            info[&InfoField::AsMqDp],
            InfoValue::NullableIntArray(vec![Some(35), Some(25)])
        );
        match &info[&InfoField::AsMq] {
            InfoValue::NullableFloatArray(x) => {
                assert_ulps_eq!(x[0].unwrap(), (76000.0f64 / 35.0).sqrt());
                assert_ulps_eq!(x[1].unwrap(), 40.0);
            }
            _ => panic!("Unexpected AS_MQ type"),
        }

        assert_eq!(
            info[&InfoField::AsReadPosRankSum],
            InfoValue::NullableFloatArray(vec![Some(1.0), Some(2.0)])
        );
        assert_eq!(
            info[&InfoField::AsMqRankSum],
            InfoValue::NullableFloatArray(vec![Some(-0.5), None])
        );
    }

    #[test]
    fn test_add_allele_specific_info_unsupported_allele() {
        // No genotype carries the second alt allele
        let entries = vec![get_entry(&[0, 1], 100, 10, [3, 4, 5, 6])];
        let mut info = InfoMap::new();
        add_allele_specific_info(&all_fields(), 2, &entries, &mut info);

        assert_eq!(info[&InfoField::AsQualApprox], InfoValue::IntArray(vec![100, 0]));
        assert_eq!(
            info[&InfoField::AsSbTable],
            InfoValue::NullableIntArray(vec![Some(3), Some(4), Some(5), Some(6), None, None])
        );
        assert_eq!(
            info[&InfoField::AsSor],
            InfoValue::NullableFloatArray(vec![Some(sor_from_sb(&[3, 4, 5, 6])), None])
        );
        assert_eq!(
            info[&InfoField::AsMqDp],
            InfoValue::NullableIntArray(vec![None, None])
        );
        assert_eq!(
            info[&InfoField::AsMq],
            InfoValue::NullableFloatArray(vec![None, None])
        );
    }

    #[test]
    fn test_get_allele_specific_lowqual() {
        let alleles = vec![b"A".to_vec(), b"G".to_vec(), b"AT".to_vec()];
        assert_eq!(
            get_allele_specific_lowqual(&alleles, &[65, 65], 40.0),
            vec![false, true]
        );
        assert_eq!(
            get_allele_specific_lowqual(&alleles, &[59, 70], 40.0),
            vec![true, false]
        );
    }
}
