use statrs::distribution::{Discrete, Hypergeometric};

/// Convert a probability to phred scale, the probability is floored at `min_prob`
pub fn prob_to_phred(prob: f64, min_prob: f64) -> f64 {
    -10f64 * prob.max(min_prob).log10()
}

/// Relative tolerance used to group tables with the same probability as the observed table
const FISHER_RELATIVE_TOLERANCE: f64 = 1e-7;

/// Two-sided Fisher's exact test p-value for the 2x2 table [[a, b], [c, d]]
///
/// The p-value is the summed probability of all tables with the same margins which are no more
/// likely than the observed table.
///
pub fn fisher_exact_test_two_sided(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let population = a + b + c + d;
    let successes = a + c;
    let draws = a + b;
    if population == 0 {
        return 1.0;
    }

    let dist = match Hypergeometric::new(population, successes, draws) {
        Ok(x) => x,
        Err(_) => return 1.0,
    };

    let min_x = (successes + draws).saturating_sub(population);
    let max_x = std::cmp::min(successes, draws);
    let observed_prob = dist.pmf(a);
    let threshold = observed_prob * (1.0 + FISHER_RELATIVE_TOLERANCE);

    let p_value = (min_x..=max_x)
        .map(|x| dist.pmf(x))
        .filter(|&p| p <= threshold)
        .sum::<f64>();
    p_value.min(1.0)
}

/// Median of values, selecting the lower of the two middle values for even-length input
///
/// Returns None for empty input
///
pub fn lower_median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Some(values[(values.len() - 1) / 2])
}
