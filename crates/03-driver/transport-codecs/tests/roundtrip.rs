//! Round-trip coverage for the binary and JSON message codecs.

use message_abi::{Message, Payload};
use serde_json::Value;
use testdata::{every_message, scenario_message, triage};
use transport_codecs::{BinaryMessageCodec, JsonMessageCodec};
use transport_fabric::Codec;

fn roundtrip_binary(msg: &Message) -> Message {
    let codec = BinaryMessageCodec;
    let encoded = codec.encode(msg).expect("encode");
    codec.decode(&encoded).expect("decode")
}

fn roundtrip_json(msg: &Message) -> Message {
    let codec = JsonMessageCodec;
    let text = codec.encode_string(msg).expect("encode");
    codec.decode_str(&text).expect("decode")
}

#[test]
fn every_message_type_roundtrips_binary() {
    for msg in every_message() {
        assert_eq!(roundtrip_binary(&msg), msg, "{}", msg.message_type());
    }
}

#[test]
fn every_message_type_roundtrips_json() {
    for msg in every_message() {
        assert_eq!(roundtrip_json(&msg), msg, "{}", msg.message_type());
    }
}

#[test]
fn decode_encode_decode_is_stable_across_encodings() {
    for msg in every_message() {
        let once = roundtrip_json(&roundtrip_binary(&msg));
        let twice = roundtrip_binary(&roundtrip_json(&once));
        assert_eq!(once, twice);
    }
}

#[test]
fn absent_actions_leave_no_trace_on_the_wire() {
    let msg = Message::new(triage(None)).at(1);
    let wire = JsonMessageCodec.encode(&msg).expect("encode");
    let payload = wire.get("payload").expect("payload");
    assert!(payload.get("actionsPerformed").is_none());

    for decoded in [roundtrip_json(&msg), roundtrip_binary(&msg)] {
        match decoded.payload() {
            Payload::Triage(triage) => assert_eq!(triage.actions, None),
            other => panic!("unexpected payload {other:?}"),
        }
    }
}

#[test]
fn all_false_actions_stay_present() {
    let msg = Message::new(triage(Some(Default::default()))).at(1);
    let wire = JsonMessageCodec.encode(&msg).expect("encode");
    assert!(matches!(
        wire.pointer("/payload/actionsPerformed"),
        Some(Value::Object(_))
    ));
    match roundtrip_binary(&msg).payload() {
        Payload::Triage(triage) => assert_eq!(triage.actions, Some(Default::default())),
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn scenario_tree_counts_survive_reencoding() {
    let msg = scenario_message();
    let again = roundtrip_binary(&roundtrip_json(&roundtrip_binary(&msg)));
    let Payload::ScenarioDefinition(scenario) = again.payload() else {
        panic!("expected scenario");
    };
    assert_eq!(scenario.trainees.len(), 2);
    for trainee in &scenario.trainees {
        assert_eq!(trainee.areas.len(), 1);
    }
    assert_eq!(scenario.objects[0].areas.len(), 2);
    assert_eq!(scenario.casualties.len(), 2);
    assert_eq!(scenario.area_count(), 5);
}

#[test]
fn frame_log_preserves_message_order() {
    let messages = every_message();
    let mut log = Vec::new();
    let written = BinaryMessageCodec
        .write_log(&mut log, &messages)
        .expect("write log");
    assert_eq!(written as usize, messages.len());

    let read: Vec<Message> = BinaryMessageCodec
        .read_log(log.as_slice())
        .collect::<Result<_, _>>()
        .expect("read log");
    assert_eq!(read, messages);
}
