// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds.

use std::io::Write;

use genoviz_core::time::HostTime;
use genoviz_core::trace::{
    DiagnosticEvent, HitIndexEvent, PhaseBeginEvent, PhaseEndEvent, ReconcileEvent, Severity,
    TraceSink, TransitionEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.micros() as f64 / 1000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] {} {} at {:.3}ms",
            e.chart,
            e.phase.name(),
            ms(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] {} {} at {:.3}ms",
            e.chart,
            e.phase.name(),
            ms(e.timestamp),
        );
    }

    fn on_reconcile(&mut self, e: &ReconcileEvent) {
        let _ = writeln!(
            self.writer,
            "[reconcile] {} enter={} update={} exit={}",
            e.chart, e.enter, e.update, e.exit,
        );
    }

    fn on_hit_index(&mut self, e: &HitIndexEvent) {
        let _ = writeln!(
            self.writer,
            "[index] {} {:?} entries={}",
            e.chart, e.kind, e.entries,
        );
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        let state = if e.animating { "running" } else { "idle" };
        let _ = writeln!(
            self.writer,
            "[transition] {} {state} at {:.3}ms",
            e.chart,
            ms(e.timestamp),
        );
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        let level = match e.severity {
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
        };
        let _ = writeln!(self.writer, "[{level}] {}: {}", e.chart, e.message);
    }
}

#[cfg(test)]
mod tests {
    use genoviz_core::trace::{IndexKind, PhaseKind};

    use super::*;

    #[test]
    fn phase_lines_carry_chart_and_time() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_phase_begin(&PhaseBeginEvent {
            chart: "heatmap",
            phase: PhaseKind::Layout,
            timestamp: HostTime(1_500),
        });
        sink.on_hit_index(&HitIndexEvent {
            chart: "heatmap",
            kind: IndexKind::Grid,
            entries: 12,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(
            output.contains("[phase:begin] heatmap layout at 1.500ms"),
            "got: {output}"
        );
        assert!(output.contains("Grid entries=12"), "got: {output}");
    }

    #[test]
    fn diagnostics_show_severity() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_diagnostic(&DiagnosticEvent {
            chart: "tidy_tree",
            severity: Severity::Error,
            message: "option 'attribute' is not defined",
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert_eq!(
            output,
            "[ERROR] tidy_tree: option 'attribute' is not defined\n"
        );
    }
}
