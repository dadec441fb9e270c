//! Codecs between the rkyv wire schema and the message model.
//!
//! One unit struct per wire type. Composite codecs call the nested type's
//! codec and never map its fields inline; in particular every scenario entity
//! goes through [`AreaOfInterestCodec`].

use std::collections::BTreeMap;
use std::sync::Arc;

use message_abi::{
    ActionsPerformed, AppState, AreaOfInterest, Casualty, CasualtyLayer, CasualtyStatus,
    DisplayFeedback, EnvironmentAdaptation, EnvironmentControl, LessonCompleted, LoadArgs,
    LocatedEntity, Location, Payload, Rgb, Scenario, Siman, SimanKind, StopFreeze, TimeOfDay,
    Timer, TimerBatch, TraineeChannels, TraineeLayer, TrainingEvent, Triage,
};
use tracing::warn;
use transport::schema::*;
use transport_fabric::{Codec, CodecError, CodecResult};

/// Shared by casualties, trainees, objects, regions and NPCs.
#[derive(Clone, Copy, Debug, Default)]
pub struct AreaOfInterestCodec;

impl Codec for AreaOfInterestCodec {
    type Wire = AreaOfInterestV1;
    type Domain = AreaOfInterest;

    fn decode(&self, wire: &AreaOfInterestV1) -> CodecResult<AreaOfInterest> {
        if wire.label.is_empty() {
            return Err(CodecError::decode("label", crate::EMPTY_LABEL));
        }
        Ok(AreaOfInterest {
            label: wire.label.clone(),
            area_type: wire.area_type.clone(),
            interest_type: wire.interest_type.clone(),
            description: wire.description.clone(),
        })
    }

    fn encode(&self, value: &AreaOfInterest) -> CodecResult<AreaOfInterestV1> {
        if value.label.is_empty() {
            return Err(CodecError::encode("label", crate::EMPTY_LABEL));
        }
        Ok(AreaOfInterestV1 {
            label: value.label.clone(),
            area_type: value.area_type.clone(),
            interest_type: value.interest_type.clone(),
            description: value.description.clone(),
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CasualtyCodec;

impl Codec for CasualtyCodec {
    type Wire = CasualtyV1;
    type Domain = Casualty;

    fn decode(&self, wire: &CasualtyV1) -> CodecResult<Casualty> {
        Ok(Casualty {
            id: wire.id,
            name: wire.name.clone(),
            areas: AreaOfInterestCodec.decode_seq("areas", &wire.areas)?,
        })
    }

    fn encode(&self, value: &Casualty) -> CodecResult<CasualtyV1> {
        Ok(CasualtyV1 {
            id: value.id,
            name: value.name.clone(),
            areas: AreaOfInterestCodec.encode_seq("areas", &value.areas)?,
        })
    }
}

/// Trainees, objects, regions and NPCs share one wire shape.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocatedEntityCodec;

impl Codec for LocatedEntityCodec {
    type Wire = LocatedEntityV1;
    type Domain = LocatedEntity;

    fn decode(&self, wire: &LocatedEntityV1) -> CodecResult<LocatedEntity> {
        Ok(LocatedEntity {
            id: wire.id,
            name: wire.name.clone(),
            location: Location::from_slice(&wire.location),
            areas: AreaOfInterestCodec.decode_seq("areas", &wire.areas)?,
        })
    }

    fn encode(&self, value: &LocatedEntity) -> CodecResult<LocatedEntityV1> {
        Ok(LocatedEntityV1 {
            id: value.id,
            name: value.name.clone(),
            location: value.location.to_vec(),
            areas: AreaOfInterestCodec.encode_seq("areas", &value.areas)?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScenarioCodec;

impl Codec for ScenarioCodec {
    type Wire = ScenarioV1;
    type Domain = Scenario;

    fn decode(&self, wire: &ScenarioV1) -> CodecResult<Scenario> {
        Ok(Scenario {
            id: wire.id,
            title: wire.title.clone(),
            description: wire.description.clone(),
            timestamp: wire.timestamp,
            casualties: CasualtyCodec.decode_seq("casualties", &wire.casualties)?,
            trainees: LocatedEntityCodec.decode_seq("trainees", &wire.trainees)?,
            objects: LocatedEntityCodec.decode_seq("objects", &wire.objects)?,
            regions: LocatedEntityCodec.decode_seq("regions", &wire.regions)?,
            npcs: LocatedEntityCodec.decode_seq("npcs", &wire.npcs)?,
        })
    }

    fn encode(&self, value: &Scenario) -> CodecResult<ScenarioV1> {
        Ok(ScenarioV1 {
            id: value.id,
            title: value.title.clone(),
            description: value.description.clone(),
            timestamp: value.timestamp,
            casualties: CasualtyCodec.encode_seq("casualties", &value.casualties)?,
            trainees: LocatedEntityCodec.encode_seq("trainees", &value.trainees)?,
            objects: LocatedEntityCodec.encode_seq("objects", &value.objects)?,
            regions: LocatedEntityCodec.encode_seq("regions", &value.regions)?,
            npcs: LocatedEntityCodec.encode_seq("npcs", &value.npcs)?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CasualtyStatusCodec;

impl Codec for CasualtyStatusCodec {
    type Wire = CasualtyStatusV1;
    type Domain = CasualtyStatus;

    fn decode(&self, wire: &CasualtyStatusV1) -> CodecResult<CasualtyStatus> {
        Ok(CasualtyStatus {
            id: wire.id,
            status: wire.status.clone(),
        })
    }

    fn encode(&self, value: &CasualtyStatus) -> CodecResult<CasualtyStatusV1> {
        Ok(CasualtyStatusV1 {
            id: value.id,
            status: value.status.clone(),
        })
    }
}

/// Pose channels are copied sample by sample; order is meaningful.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraineeChannelsCodec;

impl Codec for TraineeChannelsCodec {
    type Wire = TraineeChannelsV1;
    type Domain = TraineeChannels;

    fn decode(&self, wire: &TraineeChannelsV1) -> CodecResult<TraineeChannels> {
        Ok(TraineeChannels {
            trainee_id: wire.trainee_id,
            communicating: wire.communicating,
            watched_objects: wire.watched_objects.clone(),
            watched_regions: wire.watched_regions.clone(),
            head: wire.head.clone(),
            hand: wire.hand.clone(),
            foot: wire.foot.clone(),
        })
    }

    fn encode(&self, value: &TraineeChannels) -> CodecResult<TraineeChannelsV1> {
        Ok(TraineeChannelsV1 {
            trainee_id: value.trainee_id,
            communicating: value.communicating,
            watched_objects: value.watched_objects.clone(),
            watched_regions: value.watched_regions.clone(),
            head: value.head.clone(),
            hand: value.hand.clone(),
            foot: value.foot.clone(),
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TimerCodec;

impl Codec for TimerCodec {
    type Wire = TimerV1;
    type Domain = Timer;

    fn decode(&self, wire: &TimerV1) -> CodecResult<Timer> {
        Ok(Timer {
            elapsed_ms: wire.elapsed_ms,
            casualty_layer: CasualtyLayer {
                entries: CasualtyStatusCodec.decode_seq("casualties", &wire.casualties)?,
            },
            trainee_layer: TraineeLayer {
                trainees: TraineeChannelsCodec.decode_seq("trainees", &wire.trainees)?,
            },
        })
    }

    fn encode(&self, value: &Timer) -> CodecResult<TimerV1> {
        Ok(TimerV1 {
            elapsed_ms: value.elapsed_ms,
            casualties: CasualtyStatusCodec
                .encode_seq("casualties", &value.casualty_layer.entries)?,
            trainees: TraineeChannelsCodec.encode_seq("trainees", &value.trainee_layer.trainees)?,
        })
    }
}

/// A declared size that disagrees with the timer count is logged and kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimerBatchCodec;

impl Codec for TimerBatchCodec {
    type Wire = TimerBatchV1;
    type Domain = TimerBatch;

    fn decode(&self, wire: &TimerBatchV1) -> CodecResult<TimerBatch> {
        let batch = TimerBatch {
            timestamp: wire.timestamp,
            data_size: wire.data_size,
            timers: TimerCodec.decode_seq("timers", &wire.timers)?,
        };
        if let Some(gap) = batch.size_discrepancy() {
            warn!(
                declared = gap.declared,
                actual = gap.actual,
                "timer batch dataSize disagrees with timer count"
            );
        }
        Ok(batch)
    }

    fn encode(&self, value: &TimerBatch) -> CodecResult<TimerBatchV1> {
        Ok(TimerBatchV1 {
            timestamp: value.timestamp,
            data_size: value.data_size,
            timers: TimerCodec.encode_seq("timers", &value.timers)?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ActionsPerformedCodec;

impl Codec for ActionsPerformedCodec {
    type Wire = ActionsPerformedV1;
    type Domain = ActionsPerformed;

    fn decode(&self, wire: &ActionsPerformedV1) -> CodecResult<ActionsPerformed> {
        Ok(ActionsPerformed {
            exit_wound: wire.exit_wound,
            airway_obstruction: wire.airway_obstruction,
            shock: wire.shock,
            hypothermia: wire.hypothermia,
            bleeding: wire.bleeding,
            respiratory_distress: wire.respiratory_distress,
            severe_pain: wire.severe_pain,
            wound_area: wire.wound_area,
        })
    }

    fn encode(&self, value: &ActionsPerformed) -> CodecResult<ActionsPerformedV1> {
        Ok(ActionsPerformedV1 {
            exit_wound: value.exit_wound,
            airway_obstruction: value.airway_obstruction,
            shock: value.shock,
            hypothermia: value.hypothermia,
            bleeding: value.bleeding,
            respiratory_distress: value.respiratory_distress,
            severe_pain: value.severe_pain,
            wound_area: value.wound_area,
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TriageCodec;

impl Codec for TriageCodec {
    type Wire = TriageV1;
    type Domain = Triage;

    fn decode(&self, wire: &TriageV1) -> CodecResult<Triage> {
        Ok(Triage {
            session: wire.session,
            scenario_event: wire.scenario_event,
            timestamp: wire.timestamp,
            trainee_id: wire.trainee_id,
            casualty_id: wire.casualty_id,
            subtype_id: wire.subtype_id,
            actions: ActionsPerformedCodec
                .decode_opt(wire.actions.as_ref())
                .map_err(|err| err.within("actions"))?,
        })
    }

    fn encode(&self, value: &Triage) -> CodecResult<TriageV1> {
        Ok(TriageV1 {
            session: value.session,
            scenario_event: value.scenario_event,
            timestamp: value.timestamp,
            trainee_id: value.trainee_id,
            casualty_id: value.casualty_id,
            subtype_id: value.subtype_id,
            actions: ActionsPerformedCodec
                .encode_opt(value.actions.as_ref())
                .map_err(|err| err.within("actions"))?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SimanCodec;

impl Codec for SimanCodec {
    type Wire = SimanV1;
    type Domain = Siman;

    fn decode(&self, wire: &SimanV1) -> CodecResult<Siman> {
        let mut load_args = BTreeMap::new();
        for (idx, entry) in wire.load_args.iter().enumerate() {
            let args = params_to_map(&entry.params)
                .map_err(|err| err.within(format!("load_args[{idx}].params")))?;
            let args: LoadArgs = args.into_iter().collect();
            if load_args
                .insert(entry.implementation.clone(), args)
                .is_some()
            {
                return Err(CodecError::decode(
                    format!("load_args[{idx}].implementation"),
                    format!("duplicate implementation `{}`", entry.implementation),
                ));
            }
        }
        Ok(Siman {
            kind: match wire.kind {
                SimanKindV1::Load => SimanKind::Load,
                SimanKindV1::Start => SimanKind::Start,
                SimanKindV1::Pause => SimanKind::Pause,
                SimanKindV1::Resume => SimanKind::Resume,
                SimanKindV1::Restart => SimanKind::Restart,
                SimanKindV1::Stop => SimanKind::Stop,
            },
            load_args,
        })
    }

    fn encode(&self, value: &Siman) -> CodecResult<SimanV1> {
        Ok(SimanV1 {
            kind: match value.kind {
                SimanKind::Load => SimanKindV1::Load,
                SimanKind::Start => SimanKindV1::Start,
                SimanKind::Pause => SimanKindV1::Pause,
                SimanKind::Resume => SimanKindV1::Resume,
                SimanKind::Restart => SimanKindV1::Restart,
                SimanKind::Stop => SimanKindV1::Stop,
            },
            load_args: value
                .load_args
                .iter()
                .map(|(implementation, args)| LoadArgsV1 {
                    implementation: implementation.clone(),
                    params: map_to_params(args.iter()),
                })
                .collect(),
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EnvironmentControlCodec;

impl Codec for EnvironmentControlCodec {
    type Wire = EnvironmentControlV1;
    type Domain = EnvironmentControl;

    fn decode(&self, wire: &EnvironmentControlV1) -> CodecResult<EnvironmentControl> {
        let adaptation = match &wire.adaptation {
            EnvironmentAdaptationV1::Fog {
                density,
                red,
                green,
                blue,
            } => {
                if !(0.0..=1.0).contains(density) {
                    return Err(CodecError::decode(
                        "adaptation.density",
                        format!("{density} outside 0..=1"),
                    ));
                }
                EnvironmentAdaptation::Fog {
                    density: *density,
                    color: Rgb {
                        red: *red,
                        green: *green,
                        blue: *blue,
                    },
                }
            }
            EnvironmentAdaptationV1::TimeOfDay(tod) => EnvironmentAdaptation::TimeOfDay(match tod {
                TimeOfDayV1::Dawn => TimeOfDay::Dawn,
                TimeOfDayV1::Midday => TimeOfDay::Midday,
                TimeOfDayV1::Dusk => TimeOfDay::Dusk,
                TimeOfDayV1::Midnight => TimeOfDay::Midnight,
            }),
            EnvironmentAdaptationV1::Script { text } => {
                EnvironmentAdaptation::Script { text: text.clone() }
            }
            EnvironmentAdaptationV1::RemoveActors { markings } => {
                EnvironmentAdaptation::RemoveActors {
                    markings: markings.clone(),
                }
            }
            EnvironmentAdaptationV1::Teleport {
                marking,
                location,
                heading,
            } => EnvironmentAdaptation::Teleport {
                marking: marking.clone(),
                location: Location::from_slice(location),
                heading: *heading,
            },
        };
        Ok(EnvironmentControl { adaptation })
    }

    fn encode(&self, value: &EnvironmentControl) -> CodecResult<EnvironmentControlV1> {
        let adaptation = match &value.adaptation {
            EnvironmentAdaptation::Fog { density, color } => EnvironmentAdaptationV1::Fog {
                density: *density,
                red: color.red,
                green: color.green,
                blue: color.blue,
            },
            EnvironmentAdaptation::TimeOfDay(tod) => EnvironmentAdaptationV1::TimeOfDay(match tod {
                TimeOfDay::Dawn => TimeOfDayV1::Dawn,
                TimeOfDay::Midday => TimeOfDayV1::Midday,
                TimeOfDay::Dusk => TimeOfDayV1::Dusk,
                TimeOfDay::Midnight => TimeOfDayV1::Midnight,
            }),
            EnvironmentAdaptation::Script { text } => {
                EnvironmentAdaptationV1::Script { text: text.clone() }
            }
            EnvironmentAdaptation::RemoveActors { markings } => {
                EnvironmentAdaptationV1::RemoveActors {
                    markings: markings.clone(),
                }
            }
            EnvironmentAdaptation::Teleport {
                marking,
                location,
                heading,
            } => EnvironmentAdaptationV1::Teleport {
                marking: marking.clone(),
                location: location.to_vec(),
                heading: *heading,
            },
        };
        Ok(EnvironmentControlV1 { adaptation })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TrainingEventCodec;

impl Codec for TrainingEventCodec {
    type Wire = TrainingEventV1;
    type Domain = TrainingEvent;

    fn decode(&self, wire: &TrainingEventV1) -> CodecResult<TrainingEvent> {
        Ok(TrainingEvent {
            name: wire.name.clone(),
            attributes: params_to_map(&wire.attributes).map_err(|err| err.within("attributes"))?,
        })
    }

    fn encode(&self, value: &TrainingEvent) -> CodecResult<TrainingEventV1> {
        Ok(TrainingEventV1 {
            name: value.name.clone(),
            attributes: map_to_params(
                value
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            ),
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StopFreezeCodec;

impl Codec for StopFreezeCodec {
    type Wire = StopFreezeV1;
    type Domain = StopFreeze;

    fn decode(&self, wire: &StopFreezeV1) -> CodecResult<StopFreeze> {
        Ok(StopFreeze {
            real_world_time: wire.real_world_time,
            reason: wire.reason.clone(),
            frozen_behavior: wire.frozen_behavior,
            request_id: wire.request_id,
        })
    }

    fn encode(&self, value: &StopFreeze) -> CodecResult<StopFreezeV1> {
        Ok(StopFreezeV1 {
            real_world_time: value.real_world_time,
            reason: value.reason.clone(),
            frozen_behavior: value.frozen_behavior,
            request_id: value.request_id,
        })
    }
}

/// Sum-type dispatch over every payload variant.
#[derive(Clone, Copy, Debug, Default)]
pub struct PayloadCodec;

impl Codec for PayloadCodec {
    type Wire = PayloadV1;
    type Domain = Payload;

    fn decode(&self, wire: &PayloadV1) -> CodecResult<Payload> {
        Ok(match wire {
            PayloadV1::Siman(v) => Payload::Siman(SimanCodec.decode(v)?),
            PayloadV1::EnvironmentControl(v) => {
                Payload::EnvironmentControl(EnvironmentControlCodec.decode(v)?)
            }
            PayloadV1::ScenarioDefinition(v) => {
                Payload::ScenarioDefinition(Arc::new(ScenarioCodec.decode(v)?))
            }
            PayloadV1::TimerBatch(v) => Payload::TimerBatch(TimerBatchCodec.decode(v)?),
            PayloadV1::Triage(v) => Payload::Triage(TriageCodec.decode(v)?),
            PayloadV1::TrainingEvent(v) => Payload::TrainingEvent(TrainingEventCodec.decode(v)?),
            PayloadV1::AppState(v) => Payload::AppState(AppState {
                application: v.application.clone(),
                content: v.content.clone(),
            }),
            PayloadV1::DisplayFeedback { text } => {
                Payload::DisplayFeedback(DisplayFeedback { text: text.clone() })
            }
            PayloadV1::StopFreeze(v) => Payload::StopFreeze(StopFreezeCodec.decode(v)?),
            PayloadV1::LessonCompleted { reason } => Payload::LessonCompleted(LessonCompleted {
                reason: reason.clone(),
            }),
        })
    }

    fn encode(&self, value: &Payload) -> CodecResult<PayloadV1> {
        Ok(match value {
            Payload::Siman(v) => PayloadV1::Siman(SimanCodec.encode(v)?),
            Payload::EnvironmentControl(v) => {
                PayloadV1::EnvironmentControl(EnvironmentControlCodec.encode(v)?)
            }
            Payload::ScenarioDefinition(v) => {
                PayloadV1::ScenarioDefinition(ScenarioCodec.encode(v)?)
            }
            Payload::TimerBatch(v) => PayloadV1::TimerBatch(TimerBatchCodec.encode(v)?),
            Payload::Triage(v) => PayloadV1::Triage(TriageCodec.encode(v)?),
            Payload::TrainingEvent(v) => PayloadV1::TrainingEvent(TrainingEventCodec.encode(v)?),
            Payload::AppState(v) => PayloadV1::AppState(AppStateV1 {
                application: v.application.clone(),
                content: v.content.clone(),
            }),
            Payload::DisplayFeedback(v) => PayloadV1::DisplayFeedback {
                text: v.text.clone(),
            },
            Payload::StopFreeze(v) => PayloadV1::StopFreeze(StopFreezeCodec.encode(v)?),
            Payload::LessonCompleted(v) => PayloadV1::LessonCompleted {
                reason: v.reason.clone(),
            },
        })
    }
}

fn params_to_map(params: &[ParamV1]) -> CodecResult<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for (idx, param) in params.iter().enumerate() {
        if map.insert(param.key.clone(), param.value.clone()).is_some() {
            return Err(CodecError::decode(
                format!("[{idx}].key"),
                format!("duplicate key `{}`", param.key),
            ));
        }
    }
    Ok(map)
}

fn map_to_params<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<ParamV1> {
    entries
        .map(|(key, value)| ParamV1 {
            key: key.to_string(),
            value: value.to_string(),
        })
        .collect()
}
