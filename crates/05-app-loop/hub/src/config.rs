//! `[[interop]]` configuration entries.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use interop_common::InteropInput;
use message_abi::TrainingApplication;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HubError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteropConfig {
    pub ref_id: u32,
    pub name: String,
    pub implementation: String,
    pub training_application: TrainingApplication,
    #[serde(default = "yes")]
    pub available: bool,
    pub input: InteropInput,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    interop: Vec<InteropConfig>,
}

/// Parses a configuration document. Duplicate ref ids are renumbered.
pub fn parse_config(text: &str) -> Result<Vec<InteropConfig>, HubError> {
    let file: ConfigFile = toml::from_str(text)?;
    let mut configs = file.interop;
    renumber(&mut configs);
    Ok(configs)
}

pub fn read_config(path: &Path) -> Result<Vec<InteropConfig>, HubError> {
    let text = fs::read_to_string(path).map_err(|source| HubError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

/// Gives every repeated ref id the next id no entry declares, wrapping past
/// `u32::MAX`. A config file never holds enough entries to exhaust the range.
fn renumber(configs: &mut [InteropConfig]) {
    let mut taken: BTreeSet<u32> = configs.iter().map(|config| config.ref_id).collect();
    let mut seen = BTreeSet::new();
    for config in configs.iter_mut() {
        if seen.insert(config.ref_id) {
            continue;
        }
        let mut next = config.ref_id.wrapping_add(1);
        while taken.contains(&next) {
            next = next.wrapping_add(1);
        }
        info!(
            interop = %config.name,
            declared = config.ref_id,
            assigned = next,
            "duplicate interop ref id renumbered"
        );
        taken.insert(next);
        seen.insert(next);
        config.ref_id = next;
    }
}

fn yes() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use interop_common::InputKind;

    use super::*;

    #[test]
    fn sample_config_parses_and_renumbers() {
        let configs = parse_config(testdata::SAMPLE_CONFIG).unwrap();
        let ids: Vec<u32> = configs.iter().map(|c| c.ref_id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(configs[1].name, "Triage Simulator");
        assert_eq!(configs[1].input.kind(), InputKind::Packet);
        assert_eq!(configs[2].training_application, TrainingApplication::BatchLauncher);
        assert!(configs[0].available);
        assert!(!configs[2].available);
    }

    #[test]
    fn renumbering_skips_ids_declared_later() {
        let mut configs = parse_config(testdata::SAMPLE_CONFIG).unwrap();
        for (config, id) in configs.iter_mut().zip([5, 5, 6]) {
            config.ref_id = id;
        }
        renumber(&mut configs);
        let ids: Vec<u32> = configs.iter().map(|c| c.ref_id).collect();
        assert_eq!(ids, [5, 7, 6]);
    }

    #[test]
    fn renumbering_wraps_past_the_largest_id() {
        let mut configs = parse_config(testdata::SAMPLE_CONFIG).unwrap();
        for (config, id) in configs.iter_mut().zip([u32::MAX, u32::MAX, 0]) {
            config.ref_id = id;
        }
        renumber(&mut configs);
        let ids: Vec<u32> = configs.iter().map(|c| c.ref_id).collect();
        assert_eq!(ids, [u32::MAX, 1, 0]);
    }

    #[test]
    fn duplicate_largest_id_in_a_document_is_renumbered() {
        let entry = r#"
            [[interop]]
            ref_id = 4294967295
            name = "Triage Simulator"
            implementation = "interop_triage"
            training_application = "triage-sim"
            [interop.input]
            kind = "packet"
            local_port = 1
            peer_port = 2
            "#;
        let configs = parse_config(&entry.repeat(2)).unwrap();
        let ids: Vec<u32> = configs.iter().map(|c| c.ref_id).collect();
        assert_eq!(ids, [u32::MAX, 0]);
    }

    #[test]
    fn missing_field_is_named() {
        let err = parse_config(
            r#"
            [[interop]]
            ref_id = 1
            implementation = "x"
            training_application = "triage-sim"
            [interop.input]
            kind = "packet"
            local_port = 1
            peer_port = 2
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("name"), "{err}");
    }

    #[test]
    fn empty_document_declares_nothing() {
        assert!(parse_config("").unwrap().is_empty());
    }
}
