//! Tools for converting between rational musical time and floats.

use fraction::Fraction;

/// Truncate (quantize) Fraction to the provided denominator.
///
/// By default library uses 1/1920.
pub fn limit_denominator(
    frac: Fraction,
    limit: u64,
) -> Result<Fraction, String> {
    if limit < 1 {
        return Err(format!(
            "denominator shouldn't be less that one. input:{}",
            limit
        ));
    }
    let (num, denom) = (
        *frac
            .numer()
            .ok_or("Can not get numerator from fraction".to_string())?
            as f64,
        *frac
            .denom()
            .ok_or("Can not get denominator from fraction".to_string())?
            as f64,
    );
    let limit_f64 = limit as f64;
    let quantized =
        Fraction::new((num * limit_f64 / denom).round() as u64, limit);
    match frac.is_sign_negative() {
        true => Ok(-quantized),
        false => Ok(quantized),
    }
}

/// Build a fraction from float, quantized to `limit` denominator.
///
/// # Example
///
/// ```
/// # use fraction::Fraction;
/// # use score_sync::primitives::fraction_from_f64;
/// assert_eq!(
///     fraction_from_f64(0.333333, 3).unwrap(),
///     Fraction::new(1u64, 3u64)
/// );
/// assert!(fraction_from_f64(f64::NAN, 3).is_err());
/// ```
pub fn fraction_from_f64(value: f64, limit: u64) -> Result<Fraction, String> {
    if !value.is_finite() {
        return Err(format!("Can not make fraction from {}", value));
    }
    limit_denominator(Fraction::from(value), limit)
}

/// Convert fraction to float. NaN and infinities are kept as is.
pub fn fraction_to_f64(frac: Fraction) -> f64 {
    match (frac.numer(), frac.denom()) {
        (Some(num), Some(denom)) => {
            let value = *num as f64 / *denom as f64;
            match frac.is_sign_negative() {
                true => -value,
                false => value,
            }
        }
        _ if frac.is_nan() => f64::NAN,
        _ if frac.is_sign_negative() => f64::NEG_INFINITY,
        _ => f64::INFINITY,
    }
}
