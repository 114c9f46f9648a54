//! Strand bias statistics computed from the summed SB table
//!

use crate::prob_utils::{fisher_exact_test_two_sided, prob_to_phred};

/// SB tables with a total count at or below this value have no FS value
const FS_MIN_COUNT: i64 = 4;

/// Larger SB tables are scaled down so that their total is close to 2 * FS_MIN_CELL_COUNT
const FS_MIN_CELL_COUNT: i64 = 200;

const FS_MIN_P_VALUE: f64 = 1e-320;

/// Scale down tables with very large counts, which would otherwise make FS too sensitive
fn normalize_sb(sb: &[i64; 4]) -> [i64; 4] {
    let sum = sb.iter().sum::<i64>();
    if sum <= 2 * FS_MIN_CELL_COUNT {
        *sb
    } else {
        let factor = sum as f64 / FS_MIN_CELL_COUNT as f64;
        sb.map(|x| (x as f64 / factor) as i64)
    }
}

/// Phred-scaled Fisher's exact test p-value for strand bias
///
/// `sb` order is: ref forward, ref reverse, alt forward, alt reverse.
///
/// Returns None if the total count in the table is too low.
///
pub fn fs_from_sb(sb: &[i64; 4]) -> Option<f64> {
    if sb.iter().sum::<i64>() <= FS_MIN_COUNT {
        return None;
    }

    let [a, b, c, d] = normalize_sb(sb).map(|x| x.max(0) as u64);
    let p_value = fisher_exact_test_two_sided(a, b, c, d);
    Some(prob_to_phred(p_value, FS_MIN_P_VALUE).max(0.0))
}

/// Symmetric strand odds ratio, computed with a pseudo-count of 1 in each cell
pub fn sor_from_sb(sb: &[i64; 4]) -> f64 {
    let [ref_fw, ref_rv, alt_fw, alt_rv] = sb.map(|x| x as f64 + 1.0);
    let symmetrical_ratio = (ref_fw * alt_rv) / (alt_fw * ref_rv) + (alt_fw * ref_rv) / (ref_fw * alt_rv);
    let ref_ratio = ref_rv.min(ref_fw) / ref_rv.max(ref_fw);
    let alt_ratio = alt_fw.min(alt_rv) / alt_fw.max(alt_rv);
    symmetrical_ratio.ln() + ref_ratio.ln() - alt_ratio.ln()
}
