// Temperature-scaled categorical sampling.
//
// The temperature transform rescales log-probabilities and renormalizes:
//
//     p'_i = exp(ln(p_i) / T) / sum_j exp(ln(p_j) / T)
//
// T = 1 leaves the distribution unchanged, T -> 0 collapses it onto the most
// likely index, and T -> infinity flattens it toward uniform over the indices
// that had non-zero probability (zero stays zero: ln 0 = -inf).
//
// The exponentials are computed relative to the largest scaled log so that
// extreme temperatures (1e-6 divides log-probabilities into the -1e6 range)
// neither underflow to 0/0 nor overflow.

use crate::error::GenerateError;
use rand::Rng;

/// Reject temperatures that are not finite and strictly positive.
pub fn validate_temperature(temperature: f64) -> Result<(), GenerateError> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(GenerateError::InvalidTemperature(temperature))
    }
}

/// Apply the temperature transform to a probability vector.
pub fn apply_temperature(probabilities: &[f64], temperature: f64) -> Result<Vec<f64>, GenerateError> {
    validate_temperature(temperature)?;

    let scaled: Vec<f64> = probabilities.iter().map(|&p| p.ln() / temperature).collect();
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(GenerateError::PredictorContractViolation(
            "distribution has no positive probability".to_string(),
        ));
    }

    let weights: Vec<f64> = scaled.iter().map(|&s| (s - max).exp()).collect();
    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}

/// Draw an index with probability proportional to its weight. Zero-weight
/// indices are never returned. `None` if there is no positive weight.
pub fn sample_index(weights: &[f64], rng: &mut impl Rng) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return None;
    }

    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > target {
            return Some(i);
        }
    }
    // Rounding left `target` just past the final partial sum.
    weights.iter().rposition(|&w| w > 0.0)
}

/// Temperature transform followed by one categorical draw.
pub fn sample_with_temperature(
    probabilities: &[f64],
    temperature: f64,
    rng: &mut impl Rng,
) -> Result<usize, GenerateError> {
    let reweighted = apply_temperature(probabilities, temperature)?;
    sample_index(&reweighted, rng).ok_or_else(|| {
        GenerateError::PredictorContractViolation("distribution has no positive probability".to_string())
    })
}
