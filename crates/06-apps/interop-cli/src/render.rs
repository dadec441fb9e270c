//! Text rendering for command output.

use std::collections::BTreeSet;
use std::fmt::Write;

use hub::{DispatchReport, InteropConfig, Reply};
use interop_common::Registration;
use message_abi::{MessageType, SizeDiscrepancy, TrainingApplication};

/// One declared interface with its registration sets.
pub fn plugin(config: &InteropConfig, registration: &Registration) -> String {
    let mut out = String::new();
    writeln!(out, "[{}] {}", config.ref_id, config.name).expect("write header");
    writeln!(out, "  implementation: {}", config.implementation).expect("write impl");
    writeln!(
        out,
        "  application:    {} ({} input)",
        config.training_application,
        config.input.kind()
    )
    .expect("write application");
    writeln!(out, "  supports:       {}", types(registration.supported()))
        .expect("write supported");
    writeln!(out, "  produces:       {}", types(registration.produced()))
        .expect("write produced");
    writeln!(out, "  requires:       {}", applications(registration.required_applications()))
        .expect("write required");
    out
}

/// Declared interface skipped at load time.
pub fn skipped(config: &InteropConfig) -> String {
    format!(
        "[{}] {}\n  implementation: {}\n  unavailable; not loaded\n",
        config.ref_id, config.name, config.implementation
    )
}

/// One frame of a binary log, followed by a warning line for a size mismatch.
pub fn frame(
    index: usize,
    message_type: MessageType,
    json: &str,
    discrepancy: Option<SizeDiscrepancy>,
) -> String {
    let mut out = format!("#{index} {message_type} {json}\n");
    if let Some(SizeDiscrepancy { declared, actual }) = discrepancy {
        writeln!(
            out,
            "   ! dataSize declares {declared} timers but the batch carries {actual}"
        )
        .expect("write discrepancy");
    }
    out
}

pub fn report(report: &DispatchReport) -> String {
    let handled = if report.handled_by.is_empty() {
        String::new()
    } else {
        format!(" [{}]", report.handled_by.join(", "))
    };
    match &report.reply {
        Some(Reply::Ack) => format!("-> ack{handled}\n"),
        Some(Reply::Nack(reason)) => {
            let mut out = format!("-> nack{handled}\n");
            for line in reason.lines() {
                writeln!(out, "   {line}").expect("write nack reason");
            }
            out
        }
        None => format!("-> no reply{handled}\n"),
    }
}

pub fn produced(json: &str) -> String {
    format!("<- {json}\n")
}

fn types(set: &BTreeSet<MessageType>) -> String {
    if set.is_empty() {
        return "-".to_string();
    }
    set.iter()
        .map(|ty| ty.wire_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn applications(set: &BTreeSet<TrainingApplication>) -> String {
    if set.is_empty() {
        return "-".to_string();
    }
    set.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
