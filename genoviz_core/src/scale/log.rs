// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Base-10 logarithmic transform, ticks and rounding.

use super::Domain;
use super::linear;

pub(super) fn forward(value: f64) -> f64 {
    value.log10()
}

pub(super) fn backward(t: f64) -> f64 {
    10_f64.powf(t)
}

/// Clamps the domain minimum to 1 and widens a degenerate domain by one
/// decade.
pub(super) fn clamp_domain(domain: Domain) -> Domain {
    let min = if domain.min.is_finite() {
        domain.min.max(1.0)
    } else {
        1.0
    };
    let max = if domain.max.is_finite() && domain.max > min {
        domain.max
    } else {
        min * 10.0
    };
    Domain::new(min, max)
}

pub(super) fn is_power_of_ten(v: f64) -> bool {
    if v <= 0.0 || !v.is_finite() {
        return false;
    }
    let p = v.log10().round();
    (backward(p) - v).abs() <= v * 1e-9
}

/// Rounds the bounds outward to powers of ten.
pub(super) fn nice(min: f64, max: f64) -> (f64, f64) {
    let min = min.max(f64::MIN_POSITIVE);
    let max = max.max(min);
    (
        backward(forward(min).floor()),
        backward(forward(max).ceil()),
    )
}

/// Log ticks: every `k × 10ⁿ` (`k` in `1..=9`) inside the domain when it
/// spans fewer decades than `count`, otherwise powers of ten chosen by the
/// linear rule on the exponents.
pub(super) fn ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    let (u, v) = if min <= max { (min, max) } else { (max, min) };
    if u <= 0.0 || !v.is_finite() || count == 0 {
        return Vec::new();
    }
    let i = forward(u);
    let j = forward(v);
    let mut out = Vec::new();
    if j - i < count as f64 {
        let (lo, hi) = (i.floor(), j.ceil());
        let mut p = lo;
        'decades: while p <= hi {
            for k in 1..10 {
                let k = f64::from(k);
                let t = if p < 0.0 {
                    k / backward(-p)
                } else {
                    k * backward(p)
                };
                if t < u {
                    continue;
                }
                if t > v {
                    break 'decades;
                }
                out.push(t);
            }
            p += 1.0;
        }
        if out.len() * 2 < count {
            out = linear::ticks(u, v, count);
        }
    } else {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "decade counts are small"
        )]
        let n = (j - i).min(count as f64) as usize;
        out = linear::ticks(i, j, n.max(1))
            .into_iter()
            .map(backward)
            .collect();
    }
    if min > max {
        out.reverse();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_ticks_for_few_decades() {
        let t = ticks(1.0, 100.0, 10);
        assert_eq!(t.first(), Some(&1.0));
        assert_eq!(t.last(), Some(&100.0));
        assert_eq!(t.len(), 19, "1..9, 10..90, 100");
        assert!(t.windows(2).all(|w| w[0] < w[1]), "ascending");
    }

    #[test]
    fn sparse_ticks_for_many_decades() {
        let t = ticks(1.0, 1e12, 4);
        assert!(t.iter().all(|&v| is_power_of_ten(v)), "only powers of ten: {t:?}");
        assert_eq!(t.first(), Some(&1.0));
    }

    #[test]
    fn nice_rounds_to_decades() {
        assert_eq!(nice(3.0, 420.0), (1.0, 1000.0));
        assert_eq!(nice(1.0, 10.0), (1.0, 10.0));
    }

    #[test]
    fn power_of_ten_detection() {
        assert!(is_power_of_ten(1.0));
        assert!(is_power_of_ten(1000.0));
        assert!(is_power_of_ten(0.01));
        assert!(!is_power_of_ten(20.0));
        assert!(!is_power_of_ten(0.0));
    }
}
