//! Scenario trees survive every encoding and the log format intact.

use std::fs::File;
use std::io::{BufReader, BufWriter};

use message_abi::{Message, Payload};
use testdata::scenario_message;
use transport_codecs::{BinaryMessageCodec, JsonMessageCodec};

fn assert_tree(message: &Message) {
    let Payload::ScenarioDefinition(scenario) = message.payload() else {
        panic!("expected scenario definition, got {:?}", message.message_type());
    };
    assert_eq!(scenario.trainees.len(), 2);
    for trainee in &scenario.trainees {
        assert_eq!(trainee.areas.len(), 1, "trainee {}", trainee.id);
    }
    assert_eq!(scenario.trainees[0].areas[0].label, "rally point");
    assert_eq!(scenario.trainees[1].areas[0].label, "overwatch");
}

#[test]
fn scenario_tree_survives_binary_then_json() {
    let original = scenario_message();
    let bytes = BinaryMessageCodec.encode_frame(&original).unwrap();
    let decoded = BinaryMessageCodec.decode_frame(&bytes).unwrap();
    assert_tree(&decoded);

    let text = JsonMessageCodec.encode_string(&decoded).unwrap();
    let again = JsonMessageCodec.decode_str(&text).unwrap();
    assert_tree(&again);
    assert_eq!(again, original);
}

#[test]
fn scenario_tree_survives_a_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.frames");
    let messages = [scenario_message(), scenario_message().with_scenario_event(2)];

    let written = BinaryMessageCodec
        .write_log(BufWriter::new(File::create(&path).unwrap()), &messages)
        .unwrap();
    assert_eq!(written, 2);

    let read: Vec<Message> = BinaryMessageCodec
        .read_log(BufReader::new(File::open(&path).unwrap()))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(read, messages);
    read.iter().for_each(assert_tree);
}
