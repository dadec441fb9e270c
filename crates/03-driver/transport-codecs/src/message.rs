//! Message-level codecs: envelope handling on top of the payload codecs.

use std::io::{Read, Write};

use message_abi::{Message, MessageType};
use rkyv::{
    api::high::{HighDeserializer, HighSerializer, HighValidator},
    bytecheck::CheckBytes,
    rancor::Error,
    ser::allocator::ArenaHandle,
    util::AlignedVec,
    Archive, Deserialize, Serialize,
};
use serde_json::{json, Value};
use transport::schema::*;
use transport::{Envelope, Frame, FrameReader, FrameWriter};
use transport_fabric::{Codec, CodecError, CodecResult, Encoded};

use crate::{binary, json as tree};

/// Tag table indexed by `MessageType` discriminant.
const TAGS: [(MessageType, u8); 10] = [
    (MessageType::Siman, TAG_SIMAN),
    (MessageType::EnvironmentControl, TAG_ENVIRONMENT_CONTROL),
    (MessageType::ScenarioDefinition, TAG_SCENARIO_DEFINITION),
    (MessageType::TimerBatch, TAG_TIMER_BATCH),
    (MessageType::Triage, TAG_TRIAGE),
    (MessageType::TrainingEvent, TAG_TRAINING_EVENT),
    (MessageType::AppState, TAG_APP_STATE),
    (MessageType::DisplayFeedback, TAG_DISPLAY_FEEDBACK),
    (MessageType::StopFreeze, TAG_STOP_FREEZE),
    (MessageType::LessonCompleted, TAG_LESSON_COMPLETED),
];

/// Envelope tag for `ty`.
pub fn tag_for(ty: MessageType) -> u8 {
    TAGS[ty as usize].1
}

/// Message type carried under `tag`, if any.
pub fn type_for_tag(tag: u8) -> Option<MessageType> {
    TAGS.iter()
        .find(|(_, candidate)| *candidate == tag)
        .map(|(ty, _)| *ty)
}

/// `Message` <-> envelope + rkyv payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryMessageCodec;

impl Codec for BinaryMessageCodec {
    type Wire = Encoded;
    type Domain = Message;

    fn decode(&self, wire: &Encoded) -> CodecResult<Message> {
        let declared = type_for_tag(wire.envelope.tag)
            .ok_or(CodecError::UnknownTag(wire.envelope.tag))?;
        if wire.envelope.ver != SCHEMA_VERSION_V1 {
            return Err(CodecError::Version {
                found: wire.envelope.ver,
                expected: SCHEMA_VERSION_V1,
            });
        }
        let message = deserialize::<MessageV1>(&wire.payload)?;
        let carried = type_for_tag(message.payload.tag())
            .ok_or(CodecError::UnknownTag(message.payload.tag()))?;
        if carried != declared {
            return Err(CodecError::TypeMismatch {
                declared: declared.to_string(),
                actual: carried.to_string(),
            });
        }
        let payload = binary::PayloadCodec
            .decode(&message.payload)
            .map_err(|err| err.within("payload"))?;
        Ok(Message::new(payload)
            .with_session(message.source_session_id)
            .with_scenario_event(message.scenario_event_id)
            .at(message.timestamp))
    }

    fn encode(&self, value: &Message) -> CodecResult<Encoded> {
        let schema = MessageV1 {
            source_session_id: value.source_session_id(),
            scenario_event_id: value.scenario_event_id(),
            timestamp: value.timestamp(),
            payload: binary::PayloadCodec
                .encode(value.payload())
                .map_err(|err| err.within("payload"))?,
        };
        let payload = serialize(&schema)?;
        Ok(Encoded::new(
            Envelope::new(tag_for(value.message_type()), SCHEMA_VERSION_V1),
            payload,
        ))
    }
}

impl BinaryMessageCodec {
    /// Encodes one message as a standalone length-prefixed frame.
    pub fn encode_frame(&self, message: &Message) -> CodecResult<Vec<u8>> {
        let encoded = self.encode(message)?;
        Ok(Frame::new(encoded.envelope, encoded.payload).to_bytes()?)
    }

    /// Decodes one standalone frame, such as a received datagram.
    pub fn decode_frame(&self, bytes: &[u8]) -> CodecResult<Message> {
        let frame = Frame::from_bytes(bytes)?;
        self.decode(&Encoded::new(frame.envelope, frame.payload))
    }

    /// Appends `messages` to a frame log. Returns the number of frames written.
    pub fn write_log<'a, W: Write>(
        &self,
        out: W,
        messages: impl IntoIterator<Item = &'a Message>,
    ) -> CodecResult<u64> {
        let mut writer = FrameWriter::new(out);
        for message in messages {
            let encoded = self.encode(message)?;
            writer.write_frame(encoded.envelope, &encoded.payload)?;
        }
        writer.flush()?;
        Ok(writer.frames_written())
    }

    /// Lazily decodes every frame of a log.
    pub fn read_log<R: Read>(&self, input: R) -> impl Iterator<Item = CodecResult<Message>> {
        let codec = *self;
        FrameReader::new(input).map(move |frame| {
            let frame = frame?;
            codec.decode(&Encoded::new(frame.envelope, frame.payload))
        })
    }
}

/// `Message` <-> `{"type", "sourceSessionId", "scenarioEventId", "timestamp", "payload"}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMessageCodec;

impl Codec for JsonMessageCodec {
    type Wire = Value;
    type Domain = Message;

    fn decode(&self, wire: &Value) -> CodecResult<Message> {
        let object = wire
            .as_object()
            .ok_or_else(|| CodecError::decode("", "expected object"))?;
        let type_name = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| CodecError::missing("type"))?;
        let message_type = type_name
            .parse::<MessageType>()
            .map_err(|_| CodecError::UnknownType(type_name.to_string()))?;
        let number = |key: &str| -> CodecResult<u64> {
            match object.get(key) {
                None | Some(Value::Null) => Err(CodecError::missing(key)),
                Some(value) => value
                    .as_u64()
                    .ok_or_else(|| CodecError::decode(key, "expected unsigned integer")),
            }
        };
        let payload_wire = object
            .get("payload")
            .filter(|value| !value.is_null())
            .ok_or_else(|| CodecError::missing("payload"))?;
        let payload = tree::PayloadCodec { message_type }
            .decode(payload_wire)
            .map_err(|err| err.within("payload"))?;
        Ok(Message::new(payload)
            .with_session(number("sourceSessionId")?)
            .with_scenario_event(number("scenarioEventId")?)
            .at(number("timestamp")?))
    }

    fn encode(&self, value: &Message) -> CodecResult<Value> {
        let message_type = value.message_type();
        let payload = tree::PayloadCodec { message_type }
            .encode(value.payload())
            .map_err(|err| err.within("payload"))?;
        Ok(json!({
            "type": message_type.wire_name(),
            "sourceSessionId": value.source_session_id(),
            "scenarioEventId": value.scenario_event_id(),
            "timestamp": value.timestamp(),
            "payload": payload,
        }))
    }
}

impl JsonMessageCodec {
    pub fn decode_str(&self, text: &str) -> CodecResult<Message> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| CodecError::decode("", format!("invalid JSON: {err}")))?;
        self.decode(&value)
    }

    pub fn encode_string(&self, message: &Message) -> CodecResult<String> {
        let value = self.encode(message)?;
        serde_json::to_string(&value).map_err(|err| CodecError::encode("", err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use message_abi::ALL_MESSAGE_TYPES;

    use super::*;

    #[test]
    fn tags_are_indexed_by_discriminant() {
        for (idx, (ty, _)) in TAGS.iter().enumerate() {
            assert_eq!(*ty as usize, idx);
        }
        for ty in ALL_MESSAGE_TYPES {
            assert_eq!(type_for_tag(tag_for(ty)), Some(ty));
        }
        assert_eq!(type_for_tag(0xFF), None);
    }
}

fn serialize<T>(value: &T) -> CodecResult<Vec<u8>>
where
    T: Archive,
    T: for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, Error>>,
{
    rkyv::to_bytes::<Error>(value)
        .map(|aligned| aligned.into_vec())
        .map_err(|err| CodecError::encode("", format!("serialize failure: {err}")))
}

/// Validates then deserializes an owned schema value.
///
/// Payloads read off a socket or a log carry no alignment guarantee, so they
/// are copied into an aligned buffer before access.
fn deserialize<T>(payload: &[u8]) -> CodecResult<T>
where
    T: Archive,
    T::Archived: for<'a> CheckBytes<HighValidator<'a, Error>> + Deserialize<T, HighDeserializer<Error>>,
{
    let mut aligned = AlignedVec::<16>::with_capacity(payload.len());
    aligned.extend_from_slice(payload);
    rkyv::from_bytes::<T, Error>(&aligned)
        .map_err(|err| CodecError::decode("payload", format!("validation failure: {err}")))
}
