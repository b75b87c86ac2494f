// Copyright 2026 the DPP Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each channel is a thread of process 0; its `ON` periods are duration
//! slices. Ring-clock reference counts become counter tracks.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use dpp_core::event::{EventKind, PowerState};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for record in decode(bytes) {
        let ts = ns_to_us(record.at_ns);
        match record.event {
            RecordedEvent::Check { channel, rejection } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Check",
                    "cat": "Validate",
                    "ts": ts,
                    "pid": 0,
                    "tid": channel.0,
                    "s": "t",
                    "args": {
                        "ok": rejection.is_none(),
                        "rejection": rejection,
                    }
                }));
            }
            RecordedEvent::StateChange(e) => {
                events.push(json!({
                    "ph": match e.to {
                        PowerState::On => "B",
                        PowerState::Off => "E",
                    },
                    "name": "ON",
                    "cat": "Channel",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.channel.0,
                }));
            }
            RecordedEvent::Protection(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Protection",
                    "cat": "Channel",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.channel.0,
                    "s": "t",
                    "args": {
                        "enable": e.enable,
                        "accepted": e.accepted,
                    }
                }));
            }
            RecordedEvent::Apply(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Apply",
                    "cat": "Channel",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.channel.0,
                    "s": "t",
                    "args": {
                        "groups": e.groups,
                        "protected": e.protected,
                    }
                }));
            }
            RecordedEvent::Clock(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": format!("block{} clock", e.block.0),
                    "cat": "Clock",
                    "ts": ts,
                    "pid": 0,
                    "args": {
                        "refs": e.refs,
                    }
                }));
            }
            RecordedEvent::Hardware(e) => {
                let mut args = json!({ "fatal": e.kind.is_fatal() });
                match &e.kind {
                    EventKind::RecoveryTriggered { count } => {
                        args["count"] = json!(count);
                    }
                    EventKind::ConfigError {
                        dma_state,
                        dpp_state,
                        ..
                    } => {
                        args["dma_state"] = json!(dma_state);
                        args["dpp_state"] = json!(dpp_state);
                    }
                    EventKind::Dma(fault) => {
                        args["fault"] = json!(format!("{fault:?}"));
                    }
                    _ => {}
                }
                events.push(json!({
                    "ph": "i",
                    "name": e.kind.name(),
                    "cat": "Hardware",
                    "ts": ts,
                    "pid": 0,
                    "tid": e.channel.0,
                    "s": if e.kind.is_fatal() { "g" } else { "t" },
                    "args": args,
                }));
            }
        }
    }

    serde_json::to_writer_pretty(&mut *writer, &events).map_err(io::Error::other)?;
    writer.flush()?;
    Ok(())
}

#[expect(
    clippy::cast_precision_loss,
    reason = "trace timestamps tolerate sub-microsecond rounding"
)]
fn ns_to_us(ns: u64) -> f64 {
    ns as f64 / 1000.0
}
