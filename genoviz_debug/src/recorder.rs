// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each led by a one-byte tag. Chart
//! names and diagnostic messages are length-prefixed UTF-8. [`decode`] reads
//! the records back as an iterator of [`RecordedEvent`].

use genoviz_core::time::HostTime;
use genoviz_core::trace::{
    DiagnosticEvent, HitIndexEvent, IndexKind, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    ReconcileEvent, Severity, TraceSink, TransitionEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_RECONCILE: u8 = 3;
const TAG_HIT_INDEX: u8 = 4;
const TAG_TRANSITION: u8 = 5;
const TAG_DIAGNOSTIC: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "counts are capped at u32::MAX for recording"
    )]
    fn write_count(&mut self, v: usize) {
        self.write_u32(v.min(u32::MAX as usize) as u32);
    }

    fn write_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let len = bytes.len().min(u32::MAX as usize);
        self.write_count(len);
        self.buf.extend_from_slice(&bytes[..len]);
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Layout => 0,
            PhaseKind::Reconcile => 1,
            PhaseKind::Evaluate => 2,
            PhaseKind::Present => 3,
            PhaseKind::Export => 4,
        });
    }

    fn write_index_kind(&mut self, k: IndexKind) {
        self.write_u8(match k {
            IndexKind::Interval => 0,
            IndexKind::Grid => 1,
            IndexKind::Point => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_str(e.chart);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.micros());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_str(e.chart);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.micros());
    }

    fn on_reconcile(&mut self, e: &ReconcileEvent) {
        self.write_u8(TAG_RECONCILE);
        self.write_str(e.chart);
        self.write_count(e.enter);
        self.write_count(e.update);
        self.write_count(e.exit);
        self.write_u64(e.timestamp.micros());
    }

    fn on_hit_index(&mut self, e: &HitIndexEvent) {
        self.write_u8(TAG_HIT_INDEX);
        self.write_str(e.chart);
        self.write_index_kind(e.kind);
        self.write_count(e.entries);
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        self.write_u8(TAG_TRANSITION);
        self.write_str(e.chart);
        self.write_u8(u8::from(e.animating));
        self.write_u64(e.timestamp.micros());
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent<'_>) {
        self.write_u8(TAG_DIAGNOSTIC);
        self.write_str(e.chart);
        self.write_u8(match e.severity {
            Severity::Warning => 0,
            Severity::Error => 1,
        });
        self.write_str(e.message);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin {
        /// Engine name.
        chart: String,
        /// Phase.
        phase: PhaseKind,
        /// Start time.
        timestamp: HostTime,
    },
    /// A [`PhaseEndEvent`].
    PhaseEnd {
        /// Engine name.
        chart: String,
        /// Phase.
        phase: PhaseKind,
        /// End time.
        timestamp: HostTime,
    },
    /// A [`ReconcileEvent`].
    Reconcile {
        /// Engine name.
        chart: String,
        /// Entering keys.
        enter: u32,
        /// Updated keys.
        update: u32,
        /// Exiting keys.
        exit: u32,
        /// Time of the reconcile.
        timestamp: HostTime,
    },
    /// A [`HitIndexEvent`].
    HitIndex {
        /// Engine name.
        chart: String,
        /// Index kind.
        kind: IndexKind,
        /// Indexed entries.
        entries: u32,
    },
    /// A [`TransitionEvent`].
    Transition {
        /// Engine name.
        chart: String,
        /// Whether transitions were still running.
        animating: bool,
        /// Time of the step.
        timestamp: HostTime,
    },
    /// A [`DiagnosticEvent`].
    Diagnostic {
        /// Engine name.
        chart: String,
        /// Severity.
        severity: Severity,
        /// Message.
        message: String,
    },
}

impl RecordedEvent {
    /// Returns the engine that emitted the event.
    #[must_use]
    pub fn chart(&self) -> &str {
        match self {
            Self::PhaseBegin { chart, .. }
            | Self::PhaseEnd { chart, .. }
            | Self::Reconcile { chart, .. }
            | Self::HitIndex { chart, .. }
            | Self::Transition { chart, .. }
            | Self::Diagnostic { chart, .. } => chart,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Decoding stops at the first truncated or unknown record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_str(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Layout,
            1 => PhaseKind::Reconcile,
            2 => PhaseKind::Evaluate,
            3 => PhaseKind::Present,
            _ => PhaseKind::Export,
        })
    }

    fn read_index_kind(&mut self) -> Option<IndexKind> {
        Some(match self.read_u8()? {
            0 => IndexKind::Interval,
            1 => IndexKind::Grid,
            _ => IndexKind::Point,
        })
    }

    fn read_severity(&mut self) -> Option<Severity> {
        Some(match self.read_u8()? {
            0 => Severity::Warning,
            _ => Severity::Error,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PHASE_BEGIN => Some(RecordedEvent::PhaseBegin {
                chart: self.read_str()?,
                phase: self.read_phase()?,
                timestamp: self.read_time()?,
            }),
            TAG_PHASE_END => Some(RecordedEvent::PhaseEnd {
                chart: self.read_str()?,
                phase: self.read_phase()?,
                timestamp: self.read_time()?,
            }),
            TAG_RECONCILE => Some(RecordedEvent::Reconcile {
                chart: self.read_str()?,
                enter: self.read_u32()?,
                update: self.read_u32()?,
                exit: self.read_u32()?,
                timestamp: self.read_time()?,
            }),
            TAG_HIT_INDEX => Some(RecordedEvent::HitIndex {
                chart: self.read_str()?,
                kind: self.read_index_kind()?,
                entries: self.read_u32()?,
            }),
            TAG_TRANSITION => Some(RecordedEvent::Transition {
                chart: self.read_str()?,
                animating: self.read_u8()? != 0,
                timestamp: self.read_time()?,
            }),
            TAG_DIAGNOSTIC => Some(RecordedEvent::Diagnostic {
                chart: self.read_str()?,
                severity: self.read_severity()?,
                message: self.read_str()?,
            }),
            _ => {
                self.pos = self.data.len();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase_pair(rec: &mut RecorderSink) {
        rec.on_phase_begin(&PhaseBeginEvent {
            chart: "histogram",
            phase: PhaseKind::Reconcile,
            timestamp: HostTime(1_000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            chart: "histogram",
            phase: PhaseKind::Reconcile,
            timestamp: HostTime(1_250),
        });
    }

    #[test]
    fn phase_events_decode_in_order() {
        let mut rec = RecorderSink::new();
        phase_pair(&mut rec);
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            [
                RecordedEvent::PhaseBegin {
                    chart: "histogram".into(),
                    phase: PhaseKind::Reconcile,
                    timestamp: HostTime(1_000),
                },
                RecordedEvent::PhaseEnd {
                    chart: "histogram".into(),
                    phase: PhaseKind::Reconcile,
                    timestamp: HostTime(1_250),
                },
            ]
        );
    }

    #[test]
    fn mixed_stream_keeps_every_field() {
        let mut rec = RecorderSink::new();
        rec.on_reconcile(&ReconcileEvent {
            chart: "tidy_tree",
            enter: 4,
            update: 1,
            exit: 2,
            timestamp: HostTime(7),
        });
        rec.on_hit_index(&HitIndexEvent {
            chart: "heatmap",
            kind: IndexKind::Grid,
            entries: 120,
        });
        rec.on_transition(&TransitionEvent {
            chart: "tidy_tree",
            animating: true,
            timestamp: HostTime(9),
        });
        rec.on_diagnostic(&DiagnosticEvent {
            chart: "tidy_tree",
            severity: Severity::Error,
            message: "option 'attribute' is not defined",
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            RecordedEvent::Reconcile { enter: 4, update: 1, exit: 2, .. }
        ));
        assert!(matches!(
            events[1],
            RecordedEvent::HitIndex { kind: IndexKind::Grid, entries: 120, .. }
        ));
        assert!(matches!(
            events[2],
            RecordedEvent::Transition { animating: true, timestamp: HostTime(9), .. }
        ));
        assert_eq!(
            events[3],
            RecordedEvent::Diagnostic {
                chart: "tidy_tree".into(),
                severity: Severity::Error,
                message: "option 'attribute' is not defined".into(),
            }
        );
        assert_eq!(events[1].chart(), "heatmap");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        phase_pair(&mut rec);
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(decode(cut).count(), 1, "only the complete record survives");
    }

    #[test]
    fn unknown_tag_ends_the_stream() {
        let mut rec = RecorderSink::new();
        phase_pair(&mut rec);
        let mut bytes = vec![0xff];
        bytes.extend_from_slice(rec.as_bytes());
        assert_eq!(decode(&bytes).count(), 0);
    }
}
