use crate::matrix_table::Entry;

/// Minimum GQ for a genotype to be considered adj
const ADJ_GQ: i32 = 20;

/// Minimum DP for a diploid genotype to be considered adj
const ADJ_DP: i32 = 10;

/// Minimum DP for a haploid genotype to be considered adj
const ADJ_HAPLOID_DP: i32 = 5;

/// Minimum allele balance of each non-reference allele in a het genotype to be considered adj
const ADJ_AB: f64 = 0.2;

/// Test whether the entry passes the standard genotype quality thresholds
///
/// Any missing value required by the test causes the entry to fail.
///
pub fn is_adj_genotype(entry: &Entry) -> bool {
    let (Some(gt), Some(gq), Some(dp)) = (&entry.gt, entry.gq, entry.dp) else {
        return false;
    };

    if gq < ADJ_GQ {
        return false;
    }

    let min_dp = if gt.is_haploid() {
        ADJ_HAPLOID_DP
    } else {
        ADJ_DP
    };
    if dp < min_dp {
        return false;
    }

    if !gt.is_het() {
        return true;
    }

    let Some(ad) = &entry.ad else {
        return false;
    };
    gt.alleles.iter().filter(|&&x| x > 0).all(|&allele| {
        match ad.get(allele as usize).copied().flatten() {
            Some(allele_depth) => (allele_depth as f64 / dp as f64) >= ADJ_AB,
            None => false,
        }
    })
}

/// Get the per alt-allele counts over all defined calls (AC_raw) and over adj calls only (AC)
///
/// Returns (AC, AC_raw), each with one value per alt allele
///
pub fn get_allele_counts(alt_allele_count: usize, entries: &[Option<Entry>]) -> (Vec<i64>, Vec<i64>) {
    let mut ac = vec![0i64; alt_allele_count];
    let mut ac_raw = vec![0i64; alt_allele_count];
    for entry in entries.iter().flatten() {
        let Some(gt) = &entry.gt else {
            continue;
        };
        let is_adj = is_adj_genotype(entry);
        for (alt_index, (ac, ac_raw)) in ac.iter_mut().zip(ac_raw.iter_mut()).enumerate() {
            let copies = gt.allele_copies(alt_index as u32 + 1) as i64;
            *ac_raw += copies;
            if is_adj {
                *ac += copies;
            }
        }
    }
    (ac, ac_raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::matrix_table::Call;

    fn get_entry(alleles: &[u32], gq: i32, dp: i32, ad: &[i32]) -> Entry {
        Entry {
            gt: Some(Call::new(alleles.to_vec())),
            gq: Some(gq),
            dp: Some(dp),
            ad: Some(ad.iter().map(|&x| Some(x)).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_adj_genotype() {
        assert!(is_adj_genotype(&get_entry(&[0, 0], 20, 10, &[10])));
        assert!(!is_adj_genotype(&get_entry(&[0, 0], 19, 10, &[10])));
        assert!(!is_adj_genotype(&get_entry(&[0, 0], 20, 9, &[9])));

        // Haploid depth threshold
        assert!(is_adj_genotype(&get_entry(&[1], 30, 5, &[0, 5])));
        assert!(!is_adj_genotype(&get_entry(&[1], 30, 4, &[0, 4])));

        // Het allele balance
        assert!(is_adj_genotype(&get_entry(&[0, 1], 30, 10, &[8, 2])));
        assert!(!is_adj_genotype(&get_entry(&[0, 1], 30, 10, &[9, 1])));
        assert!(is_adj_genotype(&get_entry(&[1, 2], 30, 10, &[0, 5, 5])));
        assert!(!is_adj_genotype(&get_entry(&[1, 2], 30, 10, &[0, 9, 1])));

        // Missing values
        let mut entry = get_entry(&[0, 1], 30, 10, &[5, 5]);
        entry.ad = None;
        assert!(!is_adj_genotype(&entry));
        entry.gq = None;
        assert!(!is_adj_genotype(&entry));
    }

    #[test]
    fn test_get_allele_counts() {
        let entries = vec![
            Some(get_entry(&[0, 1], 30, 20, &[10, 10])),
            Some(get_entry(&[1, 2], 5, 20, &[0, 10, 10])),
            Some(get_entry(&[2, 2], 30, 20, &[0, 0, 20])),
            Some(Entry {
                dp: Some(5),
                ..Default::default()
            }),
            None,
        ];
        let (ac, ac_raw) = get_allele_counts(2, &entries);
        assert_eq!(ac_raw, vec![2, 3]);
        assert_eq!(ac, vec![1, 2]);
    }
}
