// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear tick steps and nice rounding.
//!
//! Steps are chosen from `{1, 2, 5} × 10ⁿ`. For sub-unit steps the step is
//! carried as its inverse so tick values are computed by division, which
//! keeps values like `0.3` exact instead of `0.30000000000000004`.

const E10: f64 = 7.071_067_811_865_475_5; // sqrt(50)
const E5: f64 = 3.162_277_660_168_379_5; // sqrt(10)
const E2: f64 = 1.414_213_562_373_095_1; // sqrt(2)

/// A tick step. Positive values are the step itself; negative values are the
/// negated inverse of the step.
pub(super) fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    if count == 0 || !(start.is_finite() && stop.is_finite()) {
        return 0.0;
    }
    let step = (stop - start) / count as f64;
    if step <= 0.0 {
        return 0.0;
    }
    let power = step.log10().floor();
    let error = step / 10_f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10_f64.powf(power)
    } else {
        -10_f64.powf(-power) / factor
    }
}

/// Ticks between `min` and `max` (either order), ascending when
/// `min <= max`.
pub(super) fn ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite()) || count == 0 {
        return Vec::new();
    }
    if min == max {
        return vec![min];
    }
    let reverse = max < min;
    let (lo, hi) = if reverse { (max, min) } else { (min, max) };
    let inc = tick_increment(lo, hi, count);
    if inc == 0.0 {
        return Vec::new();
    }
    let (i1, i2) = if inc > 0.0 {
        ((lo / inc).ceil(), (hi / inc).floor())
    } else {
        ((lo * -inc).ceil(), (hi * -inc).floor())
    };
    if i2 < i1 {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut i = i1;
    while i <= i2 {
        out.push(if inc > 0.0 { i * inc } else { i / -inc });
        i += 1.0;
    }
    if reverse {
        out.reverse();
    }
    out
}

/// Extends `[min, max]` outward to multiples of the tick step, repeating
/// until the step is stable.
pub(super) fn nice(min: f64, max: f64, count: usize) -> (f64, f64) {
    let reverse = max < min;
    let (mut start, mut stop) = if reverse { (max, min) } else { (min, max) };
    let mut prestep: Option<f64> = None;
    for _ in 0..10 {
        let step = tick_increment(start, stop, count);
        if prestep == Some(step) {
            break;
        }
        if step > 0.0 {
            start = (start / step).floor() * step;
            stop = (stop / step).ceil() * step;
        } else if step < 0.0 {
            start = (start * step).ceil() / step;
            stop = (stop * step).floor() / step;
        } else {
            break;
        }
        prestep = Some(step);
    }
    if reverse { (stop, start) } else { (start, stop) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_use_round_steps() {
        assert_eq!(
            ticks(0.0, 1000.0, 10),
            vec![0.0, 100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 900.0, 1000.0]
        );
        assert_eq!(ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn fractional_ticks_are_exact() {
        assert_eq!(ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert!(ticks(0.0, 1.0, 10).contains(&0.3), "0.3 computed by division");
    }

    #[test]
    fn reversed_and_degenerate_ticks() {
        assert_eq!(ticks(10.0, 0.0, 5), vec![10.0, 8.0, 6.0, 4.0, 2.0, 0.0]);
        assert_eq!(ticks(3.0, 3.0, 5), vec![3.0]);
        assert!(ticks(0.0, f64::NAN, 5).is_empty());
    }

    #[test]
    fn nice_extends_outward() {
        assert_eq!(nice(0.3, 9.7, 10), (0.0, 10.0));
        assert_eq!(nice(1.0, 997.0, 10), (0.0, 1000.0));
        assert_eq!(nice(0.0, 1000.0, 10), (0.0, 1000.0), "already nice");
        assert_eq!(nice(9.7, 0.3, 10), (10.0, 0.0), "reversed stays reversed");
    }
}
