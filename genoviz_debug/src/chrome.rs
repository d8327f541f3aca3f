// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//! Each chart gets its own thread lane, named after the chart.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Assigns thread ids to chart names in order of first appearance.
#[derive(Debug, Default)]
struct Lanes {
    names: Vec<String>,
}

impl Lanes {
    fn tid(&mut self, chart: &str, events: &mut Vec<Value>) -> usize {
        if let Some(tid) = self.names.iter().position(|n| n == chart) {
            return tid;
        }
        let tid = self.names.len();
        self.names.push(chart.to_owned());
        events.push(json!({
            "ph": "M",
            "name": "thread_name",
            "pid": 0,
            "tid": tid,
            "args": { "name": chart },
        }));
        tid
    }
}

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Timestamps are host microseconds. Hit-index events carry no timestamp
/// and are placed at the time of the latest timed event on their lane.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut lanes = Lanes::default();
    let mut last_ts = 0_u64;

    for recorded in decode(bytes) {
        let tid = lanes.tid(recorded.chart(), &mut events);
        match recorded {
            RecordedEvent::PhaseBegin {
                phase, timestamp, ..
            } => {
                last_ts = timestamp.micros();
                events.push(json!({
                    "ph": "B",
                    "name": phase.name(),
                    "cat": "Phase",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": tid,
                }));
            }
            RecordedEvent::PhaseEnd {
                phase, timestamp, ..
            } => {
                last_ts = timestamp.micros();
                events.push(json!({
                    "ph": "E",
                    "name": phase.name(),
                    "cat": "Phase",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": tid,
                }));
            }
            RecordedEvent::Reconcile {
                enter,
                update,
                exit,
                timestamp,
                ..
            } => {
                last_ts = timestamp.micros();
                events.push(json!({
                    "ph": "i",
                    "name": "Reconcile",
                    "cat": "Scene",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": tid,
                    "s": "t",
                    "args": { "enter": enter, "update": update, "exit": exit },
                }));
            }
            RecordedEvent::HitIndex { kind, entries, .. } => {
                events.push(json!({
                    "ph": "i",
                    "name": "HitIndex",
                    "cat": "Interaction",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": tid,
                    "s": "t",
                    "args": { "kind": format!("{kind:?}"), "entries": entries },
                }));
            }
            RecordedEvent::Transition {
                animating,
                timestamp,
                ..
            } => {
                last_ts = timestamp.micros();
                events.push(json!({
                    "ph": "C",
                    "name": "Animating",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": tid,
                    "args": { "animating": u8::from(animating) },
                }));
            }
            RecordedEvent::Diagnostic {
                severity, message, ..
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{severity:?}"),
                    "cat": "Diagnostic",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": tid,
                    "s": "p",
                    "args": { "message": message },
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use genoviz_core::time::HostTime;
    use genoviz_core::trace::{
        HitIndexEvent, IndexKind, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
    };

    use super::*;
    use crate::recorder::RecorderSink;

    fn parse(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            chart: "heatmap",
            phase: PhaseKind::Layout,
            timestamp: HostTime(1_000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            chart: "heatmap",
            phase: PhaseKind::Layout,
            timestamp: HostTime(1_100),
        });
        rec.on_hit_index(&HitIndexEvent {
            chart: "heatmap",
            kind: IndexKind::Grid,
            entries: 12,
        });

        let parsed = parse(&rec);
        assert_eq!(parsed.len(), 4, "thread name plus three events");

        assert_eq!(parsed[0]["ph"], "M");
        assert_eq!(parsed[0]["args"]["name"], "heatmap");

        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "layout");
        assert_eq!(parsed[1]["ts"], 1_000);

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[3]["name"], "HitIndex");
        assert_eq!(parsed[3]["ts"], 1_100, "untimed events follow the last stamp");
        assert_eq!(parsed[3]["args"]["entries"], 12);
    }

    #[test]
    fn charts_get_separate_lanes() {
        let mut rec = RecorderSink::new();
        for chart in ["histogram", "genome", "histogram"] {
            rec.on_phase_begin(&PhaseBeginEvent {
                chart,
                phase: PhaseKind::Reconcile,
                timestamp: HostTime(5),
            });
        }
        let parsed = parse(&rec);
        let tids: Vec<_> = parsed
            .iter()
            .filter(|e| e["ph"] == "B")
            .map(|e| e["tid"].as_u64())
            .collect();
        assert_eq!(tids, [Some(0), Some(1), Some(0)]);
        assert_eq!(parsed.iter().filter(|e| e["ph"] == "M").count(), 2);
    }

    #[test]
    fn export_empty_recording() {
        let parsed = parse(&RecorderSink::new());
        assert!(parsed.is_empty());
    }
}
