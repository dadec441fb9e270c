use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::environment::EnvironmentControl;
use crate::events::{AppState, DisplayFeedback, LessonCompleted, StopFreeze, TrainingEvent};
use crate::scenario::Scenario;
use crate::siman::Siman;
use crate::timer::TimerBatch;
use crate::triage::Triage;

/// Closed set of message kinds understood by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Siman,
    EnvironmentControl,
    ScenarioDefinition,
    TimerBatch,
    Triage,
    TrainingEvent,
    AppState,
    DisplayFeedback,
    StopFreeze,
    LessonCompleted,
}

/// Every message type, in declaration order.
pub const ALL_MESSAGE_TYPES: [MessageType; 10] = [
    MessageType::Siman,
    MessageType::EnvironmentControl,
    MessageType::ScenarioDefinition,
    MessageType::TimerBatch,
    MessageType::Triage,
    MessageType::TrainingEvent,
    MessageType::AppState,
    MessageType::DisplayFeedback,
    MessageType::StopFreeze,
    MessageType::LessonCompleted,
];

impl MessageType {
    /// Stable name used by textual encodings and diagnostics.
    pub const fn wire_name(self) -> &'static str {
        match self {
            MessageType::Siman => "Siman",
            MessageType::EnvironmentControl => "EnvironmentControl",
            MessageType::ScenarioDefinition => "ScenarioDefinition",
            MessageType::TimerBatch => "TimerBatch",
            MessageType::Triage => "Triage",
            MessageType::TrainingEvent => "TrainingEvent",
            MessageType::AppState => "AppState",
            MessageType::DisplayFeedback => "DisplayFeedback",
            MessageType::StopFreeze => "StopFreeze",
            MessageType::LessonCompleted => "LessonCompleted",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown message type `{0}`")]
pub struct ParseMessageTypeError(pub String);

impl FromStr for MessageType {
    type Err = ParseMessageTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_MESSAGE_TYPES
            .iter()
            .copied()
            .find(|ty| ty.wire_name() == s)
            .ok_or_else(|| ParseMessageTypeError(s.to_string()))
    }
}

/// Typed payload. The variant determines the message type, so the two can
/// never disagree once a [`Message`] exists.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Siman(Siman),
    EnvironmentControl(EnvironmentControl),
    /// Scenario trees are shared, never mutated after decode.
    ScenarioDefinition(Arc<Scenario>),
    TimerBatch(TimerBatch),
    Triage(Triage),
    TrainingEvent(TrainingEvent),
    AppState(AppState),
    DisplayFeedback(DisplayFeedback),
    StopFreeze(StopFreeze),
    LessonCompleted(LessonCompleted),
}

impl Payload {
    pub fn message_type(&self) -> MessageType {
        match self {
            Payload::Siman(_) => MessageType::Siman,
            Payload::EnvironmentControl(_) => MessageType::EnvironmentControl,
            Payload::ScenarioDefinition(_) => MessageType::ScenarioDefinition,
            Payload::TimerBatch(_) => MessageType::TimerBatch,
            Payload::Triage(_) => MessageType::Triage,
            Payload::TrainingEvent(_) => MessageType::TrainingEvent,
            Payload::AppState(_) => MessageType::AppState,
            Payload::DisplayFeedback(_) => MessageType::DisplayFeedback,
            Payload::StopFreeze(_) => MessageType::StopFreeze,
            Payload::LessonCompleted(_) => MessageType::LessonCompleted,
        }
    }
}

impl From<Scenario> for Payload {
    fn from(scenario: Scenario) -> Self {
        Payload::ScenarioDefinition(Arc::new(scenario))
    }
}

/// Immutable message envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    payload: Payload,
    source_session_id: u64,
    scenario_event_id: u64,
    timestamp: u64,
}

impl Message {
    /// Wraps `payload`, stamped with the current wall-clock time.
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self {
            payload: payload.into(),
            source_session_id: 0,
            scenario_event_id: 0,
            timestamp: now_millis(),
        }
    }

    pub fn with_session(mut self, source_session_id: u64) -> Self {
        self.source_session_id = source_session_id;
        self
    }

    pub fn with_scenario_event(mut self, scenario_event_id: u64) -> Self {
        self.scenario_event_id = scenario_event_id;
        self
    }

    /// Overrides the timestamp (milliseconds since the Unix epoch).
    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    pub fn source_session_id(&self) -> u64 {
        self.source_session_id
    }

    pub fn scenario_event_id(&self) -> u64 {
        self.scenario_event_id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

macro_rules! payload_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Payload {
                fn from(value: $ty) -> Self {
                    Payload::$variant(value)
                }
            }
        )*
    };
}

payload_from!(
    Siman(Siman),
    EnvironmentControl(EnvironmentControl),
    TimerBatch(TimerBatch),
    Triage(Triage),
    TrainingEvent(TrainingEvent),
    AppState(AppState),
    DisplayFeedback(DisplayFeedback),
    StopFreeze(StopFreeze),
    LessonCompleted(LessonCompleted),
);

/// Milliseconds since the Unix epoch, saturating at zero for pre-epoch clocks.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
