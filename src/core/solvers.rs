use roots::{find_root_brent, SimpleConvergency};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub(crate) enum RootFindingError {
    #[error("No sign change found between {lower} and {upper}")]
    NoSignChange { lower: f64, upper: f64 },
    #[error("Root finder did not converge: {0}")]
    ConvergenceFailure(String),
}

/// Find the lowest root of `func` in `[lower, upper]`.
///
/// The interval is scanned in `scan_steps` equal subintervals for the first sign change,
/// which is then refined with Brent's method (bisection combined with secant and inverse
/// quadratic steps). Non-finite function values are skipped while scanning.
///
/// Arguments:
/// * `func` - function whose root is sought
/// * `lower`, `upper` - bounds of the search interval
/// * `scan_steps` - number of subintervals inspected for a sign change
/// * `tolerance` - convergence tolerance on both x and f(x)
/// * `max_iter` - iteration budget for the refinement step
pub(crate) fn bracketed_root(
    func: impl Fn(f64) -> f64,
    lower: f64,
    upper: f64,
    scan_steps: usize,
    tolerance: f64,
    max_iter: usize,
) -> Result<f64, RootFindingError> {
    let step = (upper - lower) / scan_steps.max(1) as f64;

    let mut previous: Option<(f64, f64)> = None;
    for i in 0..=scan_steps.max(1) {
        let x = lower + step * i as f64;
        let y = func(x);
        if !y.is_finite() {
            continue;
        }
        if y == 0. {
            return Ok(x);
        }
        if let Some((x_prev, y_prev)) = previous {
            if y_prev.signum() != y.signum() {
                let mut convergency = SimpleConvergency {
                    eps: tolerance,
                    max_iter,
                };
                return find_root_brent::<f64, _>(x_prev, x, &func, &mut convergency)
                    .map_err(|e| RootFindingError::ConvergenceFailure(e.to_string()));
            }
        }
        previous = Some((x, y));
    }

    Err(RootFindingError::NoSignChange { lower, upper })
}
