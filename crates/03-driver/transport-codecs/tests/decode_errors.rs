//! Malformed input must fail loudly and name what was wrong.

use std::sync::Arc;

use message_abi::{EnvironmentAdaptation, EnvironmentControl, Location, Message, Payload};
use serde_json::json;
use testdata::{display_feedback, every_message, scenario, scenario_message, timer_batch};
use transport::Envelope;
use transport_codecs::{binary, tag_for, BinaryMessageCodec, JsonMessageCodec};
use transport_fabric::{Codec, CodecError, Encoded};

#[test]
fn truncated_frame_is_a_decode_failure() {
    let bytes = BinaryMessageCodec
        .encode_frame(&scenario_message())
        .expect("encode");
    let err = BinaryMessageCodec
        .decode_frame(&bytes[..bytes.len() - 3])
        .expect_err("truncated");
    assert!(matches!(err, CodecError::Frame(_)), "{err}");
}

#[test]
fn truncated_payload_fails_validation() {
    let encoded = BinaryMessageCodec.encode(&scenario_message()).expect("encode");
    let cut = Encoded::new(encoded.envelope, encoded.payload[..encoded.payload.len() / 2].to_vec());
    let err = BinaryMessageCodec.decode(&cut).expect_err("cut payload");
    assert_eq!(err.path(), Some("payload"));
}

#[test]
fn envelope_tag_must_match_payload_variant() {
    let msg = Message::new(display_feedback("hello")).at(1);
    let encoded = BinaryMessageCodec.encode(&msg).expect("encode");
    let lying = Encoded::new(
        Envelope::new(tag_for(message_abi::MessageType::Triage), encoded.envelope.ver),
        encoded.payload,
    );
    match BinaryMessageCodec.decode(&lying) {
        Err(CodecError::TypeMismatch { declared, actual }) => {
            assert_eq!(declared, "Triage");
            assert_eq!(actual, "DisplayFeedback");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn unknown_tag_and_version_are_rejected() {
    let encoded = BinaryMessageCodec
        .encode(&every_message()[0])
        .expect("encode");
    let unknown = Encoded::new(Envelope::new(0xEE, 1), encoded.payload.clone());
    assert!(matches!(
        BinaryMessageCodec.decode(&unknown),
        Err(CodecError::UnknownTag(0xEE))
    ));
    let future = Encoded::new(Envelope::new(encoded.envelope.tag, 9), encoded.payload);
    assert!(matches!(
        BinaryMessageCodec.decode(&future),
        Err(CodecError::Version { found: 9, .. })
    ));
}

#[test]
fn missing_required_json_key_names_full_path() {
    let mut wire = JsonMessageCodec.encode(&scenario_message()).expect("encode");
    wire["payload"]["trainees"][1]["areas"][0]
        .as_object_mut()
        .expect("area object")
        .remove("interestType");
    let err = JsonMessageCodec.decode(&wire).expect_err("missing key");
    assert_eq!(err.path(), Some("payload.trainees[1].areas[0].interestType"));
}

#[test]
fn json_payload_of_the_wrong_shape_is_rejected() {
    let wire = json!({
        "type": "Triage",
        "sourceSessionId": 1,
        "scenarioEventId": 1,
        "timestamp": 1,
        "payload": { "text": "I am display feedback" },
    });
    let err = JsonMessageCodec.decode(&wire).expect_err("wrong shape");
    assert_eq!(err.path(), Some("payload.session"));
}

#[test]
fn unknown_json_type_is_reported() {
    let wire = json!({ "type": "Telemetry", "payload": {} });
    assert!(matches!(
        JsonMessageCodec.decode(&wire),
        Err(CodecError::UnknownType(name)) if name == "Telemetry"
    ));
}

#[test]
fn timer_batch_size_mismatch_is_advisory() {
    let mut batch = timer_batch();
    batch.data_size = 7;
    let msg = Message::new(batch).at(1);

    for decoded in [
        BinaryMessageCodec
            .decode(&BinaryMessageCodec.encode(&msg).expect("encode"))
            .expect("binary decode"),
        JsonMessageCodec
            .decode(&JsonMessageCodec.encode(&msg).expect("encode"))
            .expect("json decode"),
    ] {
        let Payload::TimerBatch(batch) = decoded.payload() else {
            panic!("expected timer batch");
        };
        let gap = batch.size_discrepancy().expect("discrepancy exposed");
        assert_eq!(gap.declared, 7);
        assert_eq!(gap.actual, 2);
    }
}

#[test]
fn non_finite_pose_sample_cannot_be_written_as_json() {
    let mut batch = timer_batch();
    batch.timers[0].trainee_layer.trainees[0].head = vec![0.5, f64::NAN, f64::INFINITY];
    let msg = Message::new(batch).at(1);

    let relayed = BinaryMessageCodec
        .decode(&BinaryMessageCodec.encode(&msg).expect("binary encode"))
        .expect("binary decode");
    let err = JsonMessageCodec.encode(&relayed).expect_err("NaN has no JSON form");
    assert!(matches!(err, CodecError::Encode { .. }), "{err}");
    assert_eq!(
        err.path(),
        Some("payload.timers[0].traineeLayer.trainees[0].head[1]")
    );
}

#[test]
fn non_finite_teleport_heading_cannot_be_written_as_json() {
    let control = EnvironmentControl::from(EnvironmentAdaptation::Teleport {
        marking: "Medic".to_string(),
        location: Location::from_slice(&[1.0, f64::NEG_INFINITY]),
        heading: Some(90.0),
    });
    let err = JsonMessageCodec
        .encode(&Message::new(control).at(1))
        .expect_err("infinite coordinate");
    assert_eq!(err.path(), Some("payload.adaptation.location[1]"));
}

#[test]
fn empty_area_label_is_refused_by_both_encodings() {
    let mut blank = (*scenario()).clone();
    blank.trainees[0].areas[0].label.clear();
    let msg = Message::new(Payload::ScenarioDefinition(Arc::new(blank))).at(1);

    let from_binary = BinaryMessageCodec.encode(&msg).expect_err("binary encode");
    let from_json = JsonMessageCodec.encode(&msg).expect_err("json encode");
    for err in [from_binary, from_json] {
        assert!(matches!(err, CodecError::Encode { .. }), "{err}");
        assert_eq!(err.path(), Some("payload.trainees[0].areas[0].label"));
    }

    let mut wire = JsonMessageCodec.encode(&scenario_message()).expect("encode");
    wire["payload"]["trainees"][0]["areas"][0]["label"] = json!("");
    let err = JsonMessageCodec.decode(&wire).expect_err("json decode");
    assert!(matches!(err, CodecError::Decode { .. }), "{err}");
    assert_eq!(err.path(), Some("payload.trainees[0].areas[0].label"));

    let mut schema = binary::ScenarioCodec.encode(&scenario()).expect("encode");
    schema.trainees[0].areas[0].label.clear();
    let err = binary::ScenarioCodec.decode(&schema).expect_err("binary decode");
    assert!(matches!(err, CodecError::Decode { .. }), "{err}");
    assert_eq!(err.path(), Some("trainees[0].areas[0].label"));
}
