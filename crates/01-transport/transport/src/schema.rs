//! Transport-visible message schema frozen for rkyv serialization.
//!
//! `rkyv` expands `Archive` derives into generated archived structs that inherit `#[allow(missing_docs)]`.
//! To avoid sprinkling the allowance on every generated type mirror, we permit missing docs at
//! the module level and keep human-authored documentation on the source types concise.
#![allow(missing_docs)]
//!
//! Types in this module define the stable binary representation of every
//! message payload exchanged with external training applications. Optional
//! fields are `Option<_>` so presence survives the wire; repeated fields are
//! `Vec<_>` and keep their order. Any backward-incompatible change must bump
//! [`SCHEMA_VERSION_V1`].

use rkyv::{Archive, Deserialize, Serialize};
use std::string::String;
use std::vec::Vec;

/// Schema version for transport-visible messages.
pub const SCHEMA_VERSION_V1: u8 = 1;

/// Envelope tag for SIMAN directives.
pub const TAG_SIMAN: u8 = 0x01;
/// Envelope tag for environment control requests.
pub const TAG_ENVIRONMENT_CONTROL: u8 = 0x02;
/// Envelope tag for scenario definitions.
pub const TAG_SCENARIO_DEFINITION: u8 = 0x03;
/// Envelope tag for timer batches.
pub const TAG_TIMER_BATCH: u8 = 0x04;
/// Envelope tag for triage reports.
pub const TAG_TRIAGE: u8 = 0x05;
/// Envelope tag for generic training events.
pub const TAG_TRAINING_EVENT: u8 = 0x06;
/// Envelope tag for application state blobs.
pub const TAG_APP_STATE: u8 = 0x07;
/// Envelope tag for feedback display requests.
pub const TAG_DISPLAY_FEEDBACK: u8 = 0x08;
/// Envelope tag for stop/freeze notices.
pub const TAG_STOP_FREEZE: u8 = 0x09;
/// Envelope tag for lesson completion notices.
pub const TAG_LESSON_COMPLETED: u8 = 0x0A;

/// Ordered key/value parameter.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `ParamV1`."),
    bytecheck()
)]
pub struct ParamV1 {
    pub key: String,
    pub value: String,
}

/// SIMAN directive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `SimanKindV1`."),
    bytecheck()
)]
pub enum SimanKindV1 {
    Load,
    Start,
    Pause,
    Resume,
    Restart,
    Stop,
}

/// Load arguments addressed to one interop implementation.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `LoadArgsV1`."),
    bytecheck()
)]
pub struct LoadArgsV1 {
    /// Implementation identity the arguments belong to.
    pub implementation: String,
    pub params: Vec<ParamV1>,
}

/// SIMAN directive payload.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `SimanV1`."),
    bytecheck()
)]
pub struct SimanV1 {
    pub kind: SimanKindV1,
    pub load_args: Vec<LoadArgsV1>,
}

/// Time-of-day presets understood by environment control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `TimeOfDayV1`."),
    bytecheck()
)]
pub enum TimeOfDayV1 {
    Dawn,
    Midday,
    Dusk,
    Midnight,
}

/// Environment adaptation requested of the external application.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(
        allow(missing_docs),
        doc = "Archived representation of `EnvironmentAdaptationV1`."
    ),
    bytecheck()
)]
pub enum EnvironmentAdaptationV1 {
    Fog {
        density: f64,
        red: u8,
        green: u8,
        blue: u8,
    },
    TimeOfDay(TimeOfDayV1),
    Script {
        text: String,
    },
    RemoveActors {
        markings: Vec<String>,
    },
    Teleport {
        marking: String,
        location: Vec<f64>,
        heading: Option<f64>,
    },
}

/// Environment control payload.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(
        allow(missing_docs),
        doc = "Archived representation of `EnvironmentControlV1`."
    ),
    bytecheck()
)]
pub struct EnvironmentControlV1 {
    pub adaptation: EnvironmentAdaptationV1,
}

/// Area of interest attached to any scenario entity.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(
        allow(missing_docs),
        doc = "Archived representation of `AreaOfInterestV1`."
    ),
    bytecheck()
)]
pub struct AreaOfInterestV1 {
    pub label: String,
    pub area_type: String,
    pub interest_type: String,
    pub description: Option<String>,
}

/// Casualty entity. Casualties carry no location.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `CasualtyV1`."),
    bytecheck()
)]
pub struct CasualtyV1 {
    pub id: u32,
    pub name: String,
    pub areas: Vec<AreaOfInterestV1>,
}

/// Located scenario entity: trainee, object, region or NPC.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(
        allow(missing_docs),
        doc = "Archived representation of `LocatedEntityV1`."
    ),
    bytecheck()
)]
pub struct LocatedEntityV1 {
    pub id: u32,
    pub name: String,
    pub location: Vec<f64>,
    pub areas: Vec<AreaOfInterestV1>,
}

/// Scenario definition tree.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `ScenarioV1`."),
    bytecheck()
)]
pub struct ScenarioV1 {
    pub id: u32,
    pub title: String,
    pub description: Option<String>,
    pub timestamp: u64,
    pub casualties: Vec<CasualtyV1>,
    pub trainees: Vec<LocatedEntityV1>,
    pub objects: Vec<LocatedEntityV1>,
    pub regions: Vec<LocatedEntityV1>,
    pub npcs: Vec<LocatedEntityV1>,
}

/// `(id, status)` pair in a casualty layer.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(
        allow(missing_docs),
        doc = "Archived representation of `CasualtyStatusV1`."
    ),
    bytecheck()
)]
pub struct CasualtyStatusV1 {
    pub id: u32,
    pub status: String,
}

/// Per-trainee behavioural channels sampled by one timer.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(
        allow(missing_docs),
        doc = "Archived representation of `TraineeChannelsV1`."
    ),
    bytecheck()
)]
pub struct TraineeChannelsV1 {
    pub trainee_id: u32,
    pub communicating: bool,
    pub watched_objects: Vec<u32>,
    pub watched_regions: Vec<u32>,
    pub head: Vec<f64>,
    pub hand: Vec<f64>,
    pub foot: Vec<f64>,
}

/// One timer record.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `TimerV1`."),
    bytecheck()
)]
pub struct TimerV1 {
    pub elapsed_ms: u64,
    pub casualties: Vec<CasualtyStatusV1>,
    pub trainees: Vec<TraineeChannelsV1>,
}

/// Batch of timers. `data_size` is advisory.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `TimerBatchV1`."),
    bytecheck()
)]
pub struct TimerBatchV1 {
    pub timestamp: u64,
    pub data_size: u32,
    pub timers: Vec<TimerV1>,
}

/// Identification flags recorded during triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(
        allow(missing_docs),
        doc = "Archived representation of `ActionsPerformedV1`."
    ),
    bytecheck()
)]
pub struct ActionsPerformedV1 {
    pub exit_wound: bool,
    pub airway_obstruction: bool,
    pub shock: bool,
    pub hypothermia: bool,
    pub bleeding: bool,
    pub respiratory_distress: bool,
    pub severe_pain: bool,
    pub wound_area: bool,
}

/// Triage report.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `TriageV1`."),
    bytecheck()
)]
pub struct TriageV1 {
    pub session: u64,
    pub scenario_event: u64,
    pub timestamp: u64,
    pub trainee_id: u32,
    pub casualty_id: u32,
    pub subtype_id: u32,
    pub actions: Option<ActionsPerformedV1>,
}

/// Named training event with free-form attributes.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(
        allow(missing_docs),
        doc = "Archived representation of `TrainingEventV1`."
    ),
    bytecheck()
)]
pub struct TrainingEventV1 {
    pub name: String,
    pub attributes: Vec<ParamV1>,
}

/// Application-specific state blob.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `AppStateV1`."),
    bytecheck()
)]
pub struct AppStateV1 {
    pub application: String,
    pub content: String,
}

/// Stop/freeze notice raised by an external application.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `StopFreezeV1`."),
    bytecheck()
)]
pub struct StopFreezeV1 {
    pub real_world_time: u64,
    pub reason: String,
    pub frozen_behavior: u8,
    pub request_id: u32,
}

/// Payload carried by a single frame. The variant must agree with the envelope tag.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `PayloadV1`."),
    bytecheck()
)]
pub enum PayloadV1 {
    Siman(SimanV1),
    EnvironmentControl(EnvironmentControlV1),
    ScenarioDefinition(ScenarioV1),
    TimerBatch(TimerBatchV1),
    Triage(TriageV1),
    TrainingEvent(TrainingEventV1),
    AppState(AppStateV1),
    DisplayFeedback { text: String },
    StopFreeze(StopFreezeV1),
    LessonCompleted { reason: String },
}

impl PayloadV1 {
    /// Envelope tag matching this payload variant.
    pub fn tag(&self) -> u8 {
        match self {
            PayloadV1::Siman(_) => TAG_SIMAN,
            PayloadV1::EnvironmentControl(_) => TAG_ENVIRONMENT_CONTROL,
            PayloadV1::ScenarioDefinition(_) => TAG_SCENARIO_DEFINITION,
            PayloadV1::TimerBatch(_) => TAG_TIMER_BATCH,
            PayloadV1::Triage(_) => TAG_TRIAGE,
            PayloadV1::TrainingEvent(_) => TAG_TRAINING_EVENT,
            PayloadV1::AppState(_) => TAG_APP_STATE,
            PayloadV1::DisplayFeedback { .. } => TAG_DISPLAY_FEEDBACK,
            PayloadV1::StopFreeze(_) => TAG_STOP_FREEZE,
            PayloadV1::LessonCompleted { .. } => TAG_LESSON_COMPLETED,
        }
    }
}

/// Full message as carried in one frame payload.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(
    attr(allow(missing_docs), doc = "Archived representation of `MessageV1`."),
    bytecheck()
)]
pub struct MessageV1 {
    pub source_session_id: u64,
    pub scenario_event_id: u64,
    pub timestamp: u64,
    pub payload: PayloadV1,
}
