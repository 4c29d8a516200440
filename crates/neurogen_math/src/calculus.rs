//! Numerical calculus helpers: derivative estimation and quadrature.
//!
//! These back the activation functions that lack closed-form derivatives
//! (the numeric fallback) and the GELU error function.

/// Fixed step for numerical differentiation.
pub const H: f64 = 1e-4;

/// Default subdivision count for quadrature.
pub const DEFAULT_STEPS: usize = 64;

/// Central-difference estimate of `f'(x)` with step [`H`].
pub fn derivative(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    (f(x + H) - f(x - H)) / (2.0 * H)
}

/// Trapezoidal-rule integral of `f` over `[a, b]` with `n` subdivisions.
pub fn integrate_trapezoid(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
    let n = n.max(1);
    let dx = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for i in 1..n {
        sum += 2.0 * f(a + i as f64 * dx);
    }
    (dx / 2.0) * sum
}

/// Simpson's-rule integral of `f` over `[a, b]` with `n` subdivisions
/// (rounded up to even).
pub fn integrate_simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
    let n = {
        let n = n.max(2);
        if n % 2 == 1 {
            n + 1
        } else {
            n
        }
    };
    let dx = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for i in 1..n {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(a + i as f64 * dx);
    }
    (dx / 3.0) * sum
}

/// Error function via Simpson quadrature of the Gaussian kernel.
pub fn erf(x: f64) -> f64 {
    let integral = integrate_simpson(|t| (-t * t).exp(), 0.0, x, DEFAULT_STEPS);
    (2.0 / std::f64::consts::PI.sqrt()) * integral
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivative_of_square() {
        let df = derivative(|x| x * x, 3.0);
        assert!((df - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_derivative_of_sin() {
        let df = derivative(f64::sin, 0.0);
        assert!((df - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_simpson_polynomial_exact() {
        // Simpson's rule is exact for cubics.
        let integral = integrate_simpson(|x| x * x * x, 0.0, 2.0, 8);
        assert!((integral - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_trapezoid_linear_exact() {
        let integral = integrate_trapezoid(|x| 2.0 * x + 1.0, 0.0, 3.0, 4);
        assert!((integral - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_erf_reference_values() {
        assert!(erf(0.0).abs() < 1e-12);
        assert!((erf(1.0) - 0.8427007929).abs() < 1e-4);
        assert!((erf(-1.0) + 0.8427007929).abs() < 1e-4);
        assert!((erf(3.0) - 0.9999779095).abs() < 1e-4);
    }
}
