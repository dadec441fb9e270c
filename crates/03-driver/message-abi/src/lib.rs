//! Canonical message model shared by codecs, interop plugins and the hub.
//!
//! This crate defines the encoding-independent boundary: every wire format is
//! converted into these types and back, and no type in here knows how it is
//! encoded.

#![allow(missing_docs)]

mod application;
mod environment;
mod events;
mod message;
mod query;
mod scenario;
mod siman;
mod timer;
mod triage;

pub use application::{InteractionMode, TrainingApplication};
pub use environment::{EnvironmentAdaptation, EnvironmentControl, Rgb, TimeOfDay};
pub use events::{AppState, DisplayFeedback, LessonCompleted, StopFreeze, TrainingEvent};
pub use message::{
    now_millis, Message, MessageType, ParseMessageTypeError, Payload, ALL_MESSAGE_TYPES,
};
pub use query::{ObjectKind, ScenarioMetadata, ScenarioSummary, SelectableObject};
pub use scenario::{
    AreaOfInterest, Casualty, LocatedEntity, Location, Npc, ObjectOfInterest, RegionOfInterest,
    Scenario, Trainee,
};
pub use siman::{LoadArgs, Siman, SimanKind};
pub use timer::{
    CasualtyLayer, CasualtyStatus, SizeDiscrepancy, Timer, TimerBatch, TraineeChannels,
    TraineeLayer,
};
pub use triage::{ActionsPerformed, Triage};
