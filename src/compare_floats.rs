/// Clamp a computed quantity at zero, e.g. a net demand where gains outweigh losses.
pub(crate) fn clamp_non_negative(value: f64) -> f64 {
    value.max(0.)
}

/// Whether a value is zero within the tolerance used for guarding divisions.
pub(crate) fn is_effectively_zero(value: f64) -> bool {
    is_close!(value, 0., rel_tol = 1e-09, abs_tol = 1e-12)
}

/// Divide, returning `None` where the denominator is (effectively) zero or the result
/// is not finite.
pub(crate) fn guarded_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if is_effectively_zero(denominator) {
        return None;
    }
    let ratio = numerator / denominator;
    ratio.is_finite().then_some(ratio)
}
