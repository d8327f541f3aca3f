// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis geometry as keyed element specs.

use genoviz_core::color::Color;
use genoviz_core::scale::Scale;
use genoviz_core::scene::{ElementSpec, Shape, Style, TextAnchor};
use kurbo::{Line, Point};

const TICK_SIZE: f64 = 6.0;
const TICK_PADDING: f64 = 3.0;
const LABEL_FONT: f64 = 10.0;
const TITLE_OFFSET: f64 = 35.0;

/// Which side of the plot an axis is drawn on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Bottom,
    Left,
}

/// One axis: the domain line, a tick per value and a label per major tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Axis<'a> {
    pub(crate) side: Side,
    pub(crate) scale: &'a Scale,
    pub(crate) ticks: &'a [f64],
    /// Cross-axis position of the domain line.
    pub(crate) at: f64,
    pub(crate) title: Option<&'a str>,
}

impl Axis<'_> {
    pub(crate) fn specs(&self) -> Vec<ElementSpec> {
        let prefix = match self.side {
            Side::Bottom => "x-axis",
            Side::Left => "y-axis",
        };
        let line = Style::stroke(Color::BLACK, 1.0).with_class("domain");
        let (r0, r1) = self.scale.range();
        let mut out = vec![ElementSpec::new(
            format!("{prefix}-domain"),
            Shape::Line(self.line(r0, r1, 0.0)),
            line.clone(),
        )];

        for &tick in self.ticks {
            let label = format_tick(tick);
            let p = self.scale.map(tick);
            if !p.is_finite() {
                continue;
            }
            out.push(ElementSpec::new(
                format!("{prefix}-tick-{label}"),
                Shape::Line(self.line(p, p, TICK_SIZE)),
                line.clone().with_class("tick"),
            ));
            if !self.scale.is_major_tick(tick) {
                continue;
            }
            let (origin, style) = match self.side {
                Side::Bottom => (
                    Point::new(p, self.at + TICK_SIZE + TICK_PADDING + LABEL_FONT),
                    Style {
                        text_anchor: TextAnchor::Middle,
                        ..label_style()
                    },
                ),
                Side::Left => (
                    Point::new(self.at - TICK_SIZE - TICK_PADDING, p),
                    Style {
                        text_anchor: TextAnchor::End,
                        middle_baseline: true,
                        ..label_style()
                    },
                ),
            };
            out.push(ElementSpec::new(
                format!("{prefix}-label-{label}"),
                Shape::Text {
                    origin,
                    content: label,
                },
                style,
            ));
        }

        if let Some(title) = self.title.filter(|t| !t.is_empty()) {
            let mid = (r0 + r1) / 2.0;
            let (origin, rotation) = match self.side {
                Side::Bottom => (Point::new(mid, self.at + TITLE_OFFSET), 0.0),
                Side::Left => (Point::new(self.at - TITLE_OFFSET, mid), -90.0),
            };
            out.push(ElementSpec::new(
                format!("{prefix}-title"),
                Shape::Text {
                    origin,
                    content: title.to_owned(),
                },
                Style {
                    text_anchor: TextAnchor::Middle,
                    text_rotation: rotation,
                    ..Style::fill(Color::BLACK).with_class("axis-title")
                },
            ));
        }
        out
    }

    /// A segment from `a` to `b` along the axis, pushed `outward` away from
    /// the plot.
    fn line(&self, a: f64, b: f64, outward: f64) -> Line {
        match self.side {
            Side::Bottom => Line::new((a, self.at), (b, self.at + outward)),
            Side::Left => Line::new((self.at, a), (self.at - outward, b)),
        }
    }
}

fn label_style() -> Style {
    Style {
        font_size: LABEL_FONT,
        ..Style::fill(Color::BLACK).with_class("tick-label")
    }
}

/// Formats a tick value: integers without a fraction, everything else with
/// at most six decimals and no trailing zeros.
pub(crate) fn format_tick(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{value:.0}");
    }
    let s = format!("{value:.6}");
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}

#[cfg(test)]
mod tests {
    use genoviz_core::scale::{Domain, ScaleKind};

    use super::*;

    #[test]
    fn ticks_format_compactly() {
        assert_eq!(format_tick(10.0), "10");
        assert_eq!(format_tick(0.25), "0.25");
        assert_eq!(format_tick(1.0 / 3.0), "0.333333");
    }

    #[test]
    fn log_axis_labels_powers_of_ten_only() {
        let scale = Scale::new(ScaleKind::Log, Domain::new(1.0, 100.0), (0.0, 200.0));
        let ticks = scale.ticks(10);
        let specs = Axis {
            side: Side::Left,
            scale: &scale,
            ticks: &ticks,
            at: 0.0,
            title: Some("count"),
        }
        .specs();
        let labels: Vec<&str> = specs
            .iter()
            .filter(|s| s.key.as_str().starts_with("y-axis-label-"))
            .map(|s| s.key.as_str())
            .collect();
        assert_eq!(labels, ["y-axis-label-1", "y-axis-label-10", "y-axis-label-100"]);
        assert!(specs.iter().any(|s| s.key.as_str() == "y-axis-title"));
    }

    #[test]
    fn bottom_ticks_hang_below_the_line() {
        let scale = Scale::linear(Domain::new(0.0, 10.0), (0.0, 100.0));
        let specs = Axis {
            side: Side::Bottom,
            scale: &scale,
            ticks: &[5.0],
            at: 40.0,
            title: None,
        }
        .specs();
        let tick = specs
            .iter()
            .find(|s| s.key.as_str() == "x-axis-tick-5")
            .map(|s| s.shape.clone());
        assert_eq!(
            tick,
            Some(Shape::Line(Line::new((50.0, 40.0), (50.0, 46.0))))
        );
    }
}
