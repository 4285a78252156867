//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the range (-pi, pi].
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    if angle > -pi_t && angle <= pi_t {
        return angle;
    }

    let wrapped = rem_euclid(angle + pi_t, tau_t) - pi_t;

    // The remainder lands on -pi for odd multiples of pi, which belongs to
    // the other end of the range
    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else {
        wrapped
    }
}

/// Generate `num` evenly spaced values over `[start, stop]`, both ends
/// included.
pub fn linspace<T>(start: T, stop: T, num: usize) -> Vec<T>
where
    T: Float
{
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let last = T::from(num - 1).unwrap();
            (0..num)
                .map(|i| lin_map((T::zero(), last), (start, stop), T::from(i).unwrap()))
                .collect()
        }
    }
}

/// Piecewise-linear interpolation of `(xs, ys)` at `x`.
///
/// `xs` must be increasing. Outside of the sampled range the value of the
/// nearest end point is returned. `None` is returned if there are no samples
/// or the slices have different lengths.
pub fn interp<T>(xs: &[T], ys: &[T], x: T) -> Option<T>
where
    T: Float
{
    if xs.is_empty() || xs.len() != ys.len() {
        return None;
    }

    let last = xs.len() - 1;

    if x.is_nan() {
        return Some(x);
    }
    if x <= xs[0] {
        return Some(ys[0]);
    }
    if x >= xs[last] {
        return Some(ys[last]);
    }

    // Index of the first sample above x, which must be in 1..=last here
    let hi = xs.partition_point(|v| *v <= x);
    let lo = hi - 1;

    Some(lin_map((xs[lo], xs[hi]), (ys[lo], ys[hi]), x))
}

/// Arithmetic mean of a slice, `None` if it's empty.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float
{
    if values.is_empty() {
        return None;
    }

    let sum = values.iter().fold(T::zero(), |acc, v| acc + *v);

    Some(sum / T::from(values.len()).unwrap())
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_wrap_to_pi_range() {
        let mut angles = vec![
            0.0, PI, -PI, TAU, -TAU, 3.0 * PI, -3.0 * PI, 1e-12, -1e-12,
            1234.5678, -1234.5678, 1e9, -1e9
        ];
        angles.extend((-400..400).map(|i| i as f64 * 0.05));

        for a in angles {
            let w = wrap_to_pi(a);
            assert!(w > -PI && w <= PI, "wrap_to_pi({}) = {}", a, w);
            assert_eq!(wrap_to_pi(w), w, "wrap_to_pi not idempotent for {}", a);
        }
    }

    #[test]
    fn test_wrap_to_pi_values() {
        assert_eq!(wrap_to_pi(PI), PI);
        assert_eq!(wrap_to_pi(-PI), PI);
        assert!((wrap_to_pi(TAU + 0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_to_pi(-TAU - 0.5) + 0.5).abs() < 1e-12);
        assert!((wrap_to_pi(1.5 * PI) + 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());

        let xs = linspace(0.0, 20.0, 400);
        assert_eq!(xs.len(), 400);
        assert_eq!(xs[0], 0.0);
        assert!((xs[399] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_interp() {
        let xs = [0.0, 1.0, 2.0, 4.0];
        let ys = [0.0, 10.0, 20.0, 0.0];

        assert_eq!(interp(&xs, &ys, 0.5), Some(5.0));
        assert_eq!(interp(&xs, &ys, 1.0), Some(10.0));
        assert_eq!(interp(&xs, &ys, 3.0), Some(10.0));

        // Clamped outside the range
        assert_eq!(interp(&xs, &ys, -1.0), Some(0.0));
        assert_eq!(interp(&xs, &ys, 10.0), Some(0.0));

        assert_eq!(interp::<f64>(&[], &[], 1.0), None);
        assert_eq!(interp(&xs, &ys[..2], 1.0), None);
        assert!(interp(&xs, &ys, f64::NAN).unwrap().is_nan());
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 6.0]), Some(3.0));
        assert_eq!(mean::<f64>(&[]), None);
    }
}
