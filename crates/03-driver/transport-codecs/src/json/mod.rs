//! Codecs between the JSON tree encoding and the message model.
//!
//! Keys are camelCase. Required keys must be present and non-null; optional
//! keys are omitted on encode when the value is absent.

mod fields;

use std::collections::BTreeMap;
use std::sync::Arc;

use message_abi::{
    ActionsPerformed, AppState, AreaOfInterest, Casualty, CasualtyLayer, CasualtyStatus,
    DisplayFeedback, EnvironmentAdaptation, EnvironmentControl, LessonCompleted, LoadArgs,
    LocatedEntity, Location, MessageType, Payload, Rgb, Scenario, Siman, SimanKind, StopFreeze,
    TimeOfDay, Timer, TimerBatch, TraineeChannels, TraineeLayer, TrainingEvent, Triage,
};
use serde_json::{json, Map, Value};
use tracing::warn;
use transport_fabric::{Codec, CodecError, CodecResult};

use fields::Fields;

/// Shared by casualties, trainees, objects, regions and NPCs.
#[derive(Clone, Copy, Debug, Default)]
pub struct AreaOfInterestCodec;

impl Codec for AreaOfInterestCodec {
    type Wire = Value;
    type Domain = AreaOfInterest;

    fn decode(&self, wire: &Value) -> CodecResult<AreaOfInterest> {
        let f = Fields::of(wire)?;
        let label = f.string("label")?;
        if label.is_empty() {
            return Err(CodecError::decode("label", crate::EMPTY_LABEL));
        }
        Ok(AreaOfInterest {
            label,
            area_type: f.string("areaType")?,
            interest_type: f.string("interestType")?,
            description: f.opt_string("description")?,
        })
    }

    fn encode(&self, value: &AreaOfInterest) -> CodecResult<Value> {
        if value.label.is_empty() {
            return Err(CodecError::encode("label", crate::EMPTY_LABEL));
        }
        let mut out = Map::new();
        out.insert("label".into(), json!(value.label));
        out.insert("areaType".into(), json!(value.area_type));
        out.insert("interestType".into(), json!(value.interest_type));
        if let Some(description) = &value.description {
            out.insert("description".into(), json!(description));
        }
        Ok(Value::Object(out))
    }
}

/// Coordinate array shared by every located entity and teleport requests.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocationCodec;

impl Codec for LocationCodec {
    type Wire = Value;
    type Domain = Location;

    fn decode(&self, wire: &Value) -> CodecResult<Location> {
        fields::array(wire)?
            .iter()
            .enumerate()
            .map(|(idx, value)| fields::number(value).map_err(|err| err.within(format!("[{idx}]"))))
            .collect()
    }

    fn encode(&self, value: &Location) -> CodecResult<Value> {
        fields::finite_seq(value.as_slice())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CasualtyCodec;

impl Codec for CasualtyCodec {
    type Wire = Value;
    type Domain = Casualty;

    fn decode(&self, wire: &Value) -> CodecResult<Casualty> {
        let f = Fields::of(wire)?;
        Ok(Casualty {
            id: f.u32("id")?,
            name: f.string("name")?,
            areas: AreaOfInterestCodec.decode_seq("areas", f.array("areas")?)?,
        })
    }

    fn encode(&self, value: &Casualty) -> CodecResult<Value> {
        Ok(json!({
            "id": value.id,
            "name": value.name,
            "areas": AreaOfInterestCodec.encode_seq("areas", &value.areas)?,
        }))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LocatedEntityCodec;

impl Codec for LocatedEntityCodec {
    type Wire = Value;
    type Domain = LocatedEntity;

    fn decode(&self, wire: &Value) -> CodecResult<LocatedEntity> {
        let f = Fields::of(wire)?;
        Ok(LocatedEntity {
            id: f.u32("id")?,
            name: f.string("name")?,
            location: LocationCodec
                .decode(f.required("location")?)
                .map_err(|err| err.within("location"))?,
            areas: AreaOfInterestCodec.decode_seq("areas", f.array("areas")?)?,
        })
    }

    fn encode(&self, value: &LocatedEntity) -> CodecResult<Value> {
        Ok(json!({
            "id": value.id,
            "name": value.name,
            "location": LocationCodec
                .encode(&value.location)
                .map_err(|err| err.within("location"))?,
            "areas": AreaOfInterestCodec.encode_seq("areas", &value.areas)?,
        }))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScenarioCodec;

impl Codec for ScenarioCodec {
    type Wire = Value;
    type Domain = Scenario;

    fn decode(&self, wire: &Value) -> CodecResult<Scenario> {
        let f = Fields::of(wire)?;
        Ok(Scenario {
            id: f.u32("id")?,
            title: f.string("title")?,
            description: f.opt_string("description")?,
            timestamp: f.u64("timestamp")?,
            casualties: CasualtyCodec.decode_seq("casualties", f.array("casualties")?)?,
            trainees: LocatedEntityCodec.decode_seq("trainees", f.array("trainees")?)?,
            objects: LocatedEntityCodec.decode_seq("objects", f.array("objects")?)?,
            regions: LocatedEntityCodec.decode_seq("regions", f.array("regions")?)?,
            npcs: LocatedEntityCodec.decode_seq("npcs", f.array("npcs")?)?,
        })
    }

    fn encode(&self, value: &Scenario) -> CodecResult<Value> {
        let mut out = Map::new();
        out.insert("id".into(), json!(value.id));
        out.insert("title".into(), json!(value.title));
        if let Some(description) = &value.description {
            out.insert("description".into(), json!(description));
        }
        out.insert("timestamp".into(), json!(value.timestamp));
        out.insert(
            "casualties".into(),
            Value::Array(CasualtyCodec.encode_seq("casualties", &value.casualties)?),
        );
        for (key, list) in [
            ("trainees", &value.trainees),
            ("objects", &value.objects),
            ("regions", &value.regions),
            ("npcs", &value.npcs),
        ] {
            out.insert(
                key.into(),
                Value::Array(LocatedEntityCodec.encode_seq(key, list)?),
            );
        }
        Ok(Value::Object(out))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CasualtyStatusCodec;

impl Codec for CasualtyStatusCodec {
    type Wire = Value;
    type Domain = CasualtyStatus;

    fn decode(&self, wire: &Value) -> CodecResult<CasualtyStatus> {
        let f = Fields::of(wire)?;
        Ok(CasualtyStatus {
            id: f.u32("id")?,
            status: f.string("status")?,
        })
    }

    fn encode(&self, value: &CasualtyStatus) -> CodecResult<Value> {
        Ok(json!({ "id": value.id, "status": value.status }))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TraineeChannelsCodec;

impl Codec for TraineeChannelsCodec {
    type Wire = Value;
    type Domain = TraineeChannels;

    fn decode(&self, wire: &Value) -> CodecResult<TraineeChannels> {
        let f = Fields::of(wire)?;
        Ok(TraineeChannels {
            trainee_id: f.u32("traineeId")?,
            communicating: f.bool("communicating")?,
            watched_objects: f.u32_seq("watchedObjects")?,
            watched_regions: f.u32_seq("watchedRegions")?,
            head: f.f64_seq("head")?,
            hand: f.f64_seq("hand")?,
            foot: f.f64_seq("foot")?,
        })
    }

    fn encode(&self, value: &TraineeChannels) -> CodecResult<Value> {
        Ok(json!({
            "traineeId": value.trainee_id,
            "communicating": value.communicating,
            "watchedObjects": value.watched_objects,
            "watchedRegions": value.watched_regions,
            "head": fields::finite_seq(&value.head).map_err(|err| err.within("head"))?,
            "hand": fields::finite_seq(&value.hand).map_err(|err| err.within("hand"))?,
            "foot": fields::finite_seq(&value.foot).map_err(|err| err.within("foot"))?,
        }))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TimerCodec;

impl Codec for TimerCodec {
    type Wire = Value;
    type Domain = Timer;

    fn decode(&self, wire: &Value) -> CodecResult<Timer> {
        let f = Fields::of(wire)?;
        let casualty = Fields::of(f.required("casualtyLayer")?)
            .map_err(|err| err.within("casualtyLayer"))?;
        let trainee = Fields::of(f.required("traineeLayer")?)
            .map_err(|err| err.within("traineeLayer"))?;
        let entries = casualty
            .array("entries")
            .and_then(|items| CasualtyStatusCodec.decode_seq("entries", items))
            .map_err(|err| err.within("casualtyLayer"))?;
        let trainees = trainee
            .array("trainees")
            .and_then(|items| TraineeChannelsCodec.decode_seq("trainees", items))
            .map_err(|err| err.within("traineeLayer"))?;
        Ok(Timer {
            elapsed_ms: f.u64("elapsedMs")?,
            casualty_layer: CasualtyLayer { entries },
            trainee_layer: TraineeLayer { trainees },
        })
    }

    fn encode(&self, value: &Timer) -> CodecResult<Value> {
        let entries = CasualtyStatusCodec
            .encode_seq("entries", &value.casualty_layer.entries)
            .map_err(|err| err.within("casualtyLayer"))?;
        let trainees = TraineeChannelsCodec
            .encode_seq("trainees", &value.trainee_layer.trainees)
            .map_err(|err| err.within("traineeLayer"))?;
        Ok(json!({
            "elapsedMs": value.elapsed_ms,
            "casualtyLayer": { "entries": entries },
            "traineeLayer": { "trainees": trainees },
        }))
    }
}

/// A declared size that disagrees with the timer count is logged and kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimerBatchCodec;

impl Codec for TimerBatchCodec {
    type Wire = Value;
    type Domain = TimerBatch;

    fn decode(&self, wire: &Value) -> CodecResult<TimerBatch> {
        let f = Fields::of(wire)?;
        let batch = TimerBatch {
            timestamp: f.u64("timestamp")?,
            data_size: f.u32("dataSize")?,
            timers: TimerCodec.decode_seq("timers", f.array("timers")?)?,
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

    fn encode(&self, value: &TimerBatch) -> CodecResult<Value> {
        Ok(json!({
            "timestamp": value.timestamp,
            "dataSize": value.data_size,
            "timers": TimerCodec.encode_seq("timers", &value.timers)?,
        }))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ActionsPerformedCodec;

impl Codec for ActionsPerformedCodec {
    type Wire = Value;
    type Domain = ActionsPerformed;

    fn decode(&self, wire: &Value) -> CodecResult<ActionsPerformed> {
        let f = Fields::of(wire)?;
        Ok(ActionsPerformed {
            exit_wound: f.bool("exitWound")?,
            airway_obstruction: f.bool("airwayObstruction")?,
            shock: f.bool("shock")?,
            hypothermia: f.bool("hypothermia")?,
            bleeding: f.bool("bleeding")?,
            respiratory_distress: f.bool("respiratoryDistress")?,
            severe_pain: f.bool("severePain")?,
            wound_area: f.bool("woundArea")?,
        })
    }

    fn encode(&self, value: &ActionsPerformed) -> CodecResult<Value> {
        Ok(json!({
            "exitWound": value.exit_wound,
            "airwayObstruction": value.airway_obstruction,
            "shock": value.shock,
            "hypothermia": value.hypothermia,
            "bleeding": value.bleeding,
            "respiratoryDistress": value.respiratory_distress,
            "severePain": value.severe_pain,
            "woundArea": value.wound_area,
        }))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TriageCodec;

impl TriageCodec {
    const ACTIONS_KEY: &'static str = "actionsPerformed";
}

impl Codec for TriageCodec {
    type Wire = Value;
    type Domain = Triage;

    fn decode(&self, wire: &Value) -> CodecResult<Triage> {
        let f = Fields::of(wire)?;
        Ok(Triage {
            session: f.u64("session")?,
            scenario_event: f.u64("scenarioEvent")?,
            timestamp: f.u64("timestamp")?,
            trainee_id: f.u32("traineeId")?,
            casualty_id: f.u32("casualtyId")?,
            subtype_id: f.u32("subtypeId")?,
            actions: ActionsPerformedCodec
                .decode_opt(f.optional(Self::ACTIONS_KEY))
                .map_err(|err| err.within(Self::ACTIONS_KEY))?,
        })
    }

    fn encode(&self, value: &Triage) -> CodecResult<Value> {
        let mut out = Map::new();
        out.insert("session".into(), json!(value.session));
        out.insert("scenarioEvent".into(), json!(value.scenario_event));
        out.insert("timestamp".into(), json!(value.timestamp));
        out.insert("traineeId".into(), json!(value.trainee_id));
        out.insert("casualtyId".into(), json!(value.casualty_id));
        out.insert("subtypeId".into(), json!(value.subtype_id));
        if let Some(actions) = ActionsPerformedCodec
            .encode_opt(value.actions.as_ref())
            .map_err(|err| err.within(Self::ACTIONS_KEY))?
        {
            out.insert(Self::ACTIONS_KEY.into(), actions);
        }
        Ok(Value::Object(out))
    }
}

/// `loadArgs` may be omitted for directives other than LOAD.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimanCodec;

impl Codec for SimanCodec {
    type Wire = Value;
    type Domain = Siman;

    fn decode(&self, wire: &Value) -> CodecResult<Siman> {
        let f = Fields::of(wire)?;
        let kind_name = f.string("kind")?;
        let kind = SimanKind::from_name(&kind_name).ok_or_else(|| {
            CodecError::decode("kind", format!("unknown SIMAN kind `{kind_name}`"))
        })?;
        let mut load_args = BTreeMap::new();
        if let Some(args) = f.optional("loadArgs") {
            let by_impl = Fields::of(args).map_err(|err| err.within("loadArgs"))?;
            for (implementation, params) in by_impl.entries() {
                let params = fields::string_map(params)
                    .map_err(|err| err.within(implementation).within("loadArgs"))?;
                load_args.insert(implementation.clone(), params.into_iter().collect::<LoadArgs>());
            }
        }
        Ok(Siman { kind, load_args })
    }

    fn encode(&self, value: &Siman) -> CodecResult<Value> {
        let load_args: Map<String, Value> = value
            .load_args
            .iter()
            .map(|(implementation, args)| {
                let params: Map<String, Value> = args
                    .iter()
                    .map(|(k, v)| (k.to_string(), json!(v)))
                    .collect();
                (implementation.clone(), Value::Object(params))
            })
            .collect();
        Ok(json!({ "kind": value.kind.as_str(), "loadArgs": load_args }))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EnvironmentControlCodec;

impl Codec for EnvironmentControlCodec {
    type Wire = Value;
    type Domain = EnvironmentControl;

    fn decode(&self, wire: &Value) -> CodecResult<EnvironmentControl> {
        let f = Fields::of(wire)?;
        decode_adaptation(f.required("adaptation")?)
            .map(EnvironmentControl::from)
            .map_err(|err| err.within("adaptation"))
    }

    fn encode(&self, value: &EnvironmentControl) -> CodecResult<Value> {
        let adaptation =
            encode_adaptation(&value.adaptation).map_err(|err| err.within("adaptation"))?;
        Ok(json!({ "adaptation": adaptation }))
    }
}

fn encode_adaptation(adaptation: &EnvironmentAdaptation) -> CodecResult<Value> {
    let value = match adaptation {
        EnvironmentAdaptation::Fog { density, color } => json!({
            "kind": "Fog",
            "density": fields::finite(*density).map_err(|err| err.within("density"))?,
            "color": { "red": color.red, "green": color.green, "blue": color.blue },
        }),
        EnvironmentAdaptation::TimeOfDay(tod) => {
            json!({ "kind": "TimeOfDay", "timeOfDay": tod.as_str() })
        }
        EnvironmentAdaptation::Script { text } => json!({ "kind": "Script", "text": text }),
        EnvironmentAdaptation::RemoveActors { markings } => {
            json!({ "kind": "RemoveActors", "markings": markings })
        }
        EnvironmentAdaptation::Teleport {
            marking,
            location,
            heading,
        } => {
            let mut out = Map::new();
            out.insert("kind".into(), json!("Teleport"));
            out.insert("marking".into(), json!(marking));
            out.insert(
                "location".into(),
                LocationCodec
                    .encode(location)
                    .map_err(|err| err.within("location"))?,
            );
            if let Some(heading) = heading {
                out.insert(
                    "heading".into(),
                    fields::finite(*heading).map_err(|err| err.within("heading"))?,
                );
            }
            Value::Object(out)
        }
    };
    Ok(value)
}

fn decode_adaptation(wire: &Value) -> CodecResult<EnvironmentAdaptation> {
    let f = Fields::of(wire)?;
    let kind = f.string("kind")?;
    Ok(match kind.as_str() {
        "Fog" => {
            let density = f.f64("density")?;
            if !(0.0..=1.0).contains(&density) {
                return Err(CodecError::decode(
                    "density",
                    format!("{density} outside 0..=1"),
                ));
            }
            let color = Fields::of(f.required("color")?).map_err(|err| err.within("color"))?;
            let channel = |key: &str| color.u8(key).map_err(|err| err.within("color"));
            EnvironmentAdaptation::Fog {
                density,
                color: Rgb {
                    red: channel("red")?,
                    green: channel("green")?,
                    blue: channel("blue")?,
                },
            }
        }
        "TimeOfDay" => {
            let name = f.string("timeOfDay")?;
            EnvironmentAdaptation::TimeOfDay(TimeOfDay::from_name(&name).ok_or_else(|| {
                CodecError::decode("timeOfDay", format!("unknown time of day `{name}`"))
            })?)
        }
        "Script" => EnvironmentAdaptation::Script {
            text: f.string("text")?,
        },
        "RemoveActors" => EnvironmentAdaptation::RemoveActors {
            markings: f.string_seq("markings")?,
        },
        "Teleport" => EnvironmentAdaptation::Teleport {
            marking: f.string("marking")?,
            location: LocationCodec
                .decode(f.required("location")?)
                .map_err(|err| err.within("location"))?,
            heading: f.opt_f64("heading")?,
        },
        other => {
            return Err(CodecError::decode(
                "kind",
                format!("unknown adaptation `{other}`"),
            ))
        }
    })
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TrainingEventCodec;

impl Codec for TrainingEventCodec {
    type Wire = Value;
    type Domain = TrainingEvent;

    fn decode(&self, wire: &Value) -> CodecResult<TrainingEvent> {
        let f = Fields::of(wire)?;
        Ok(TrainingEvent {
            name: f.string("name")?,
            attributes: f.string_map("attributes")?,
        })
    }

    fn encode(&self, value: &TrainingEvent) -> CodecResult<Value> {
        Ok(json!({ "name": value.name, "attributes": value.attributes }))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StopFreezeCodec;

impl Codec for StopFreezeCodec {
    type Wire = Value;
    type Domain = StopFreeze;

    fn decode(&self, wire: &Value) -> CodecResult<StopFreeze> {
        let f = Fields::of(wire)?;
        Ok(StopFreeze {
            real_world_time: f.u64("realWorldTime")?,
            reason: f.string("reason")?,
            frozen_behavior: f.u8("frozenBehavior")?,
            request_id: f.u32("requestId")?,
        })
    }

    fn encode(&self, value: &StopFreeze) -> CodecResult<Value> {
        Ok(json!({
            "realWorldTime": value.real_world_time,
            "reason": value.reason,
            "frozenBehavior": value.frozen_behavior,
            "requestId": value.request_id,
        }))
    }
}

/// Payload codec selected by message type.
///
/// The JSON tree does not self-describe its payload variant, so the caller
/// supplies the declared type and the payload is decoded as exactly that type.
#[derive(Clone, Copy, Debug)]
pub struct PayloadCodec {
    pub message_type: MessageType,
}

impl Codec for PayloadCodec {
    type Wire = Value;
    type Domain = Payload;

    fn decode(&self, wire: &Value) -> CodecResult<Payload> {
        Ok(match self.message_type {
            MessageType::Siman => Payload::Siman(SimanCodec.decode(wire)?),
            MessageType::EnvironmentControl => {
                Payload::EnvironmentControl(EnvironmentControlCodec.decode(wire)?)
            }
            MessageType::ScenarioDefinition => {
                Payload::ScenarioDefinition(Arc::new(ScenarioCodec.decode(wire)?))
            }
            MessageType::TimerBatch => Payload::TimerBatch(TimerBatchCodec.decode(wire)?),
            MessageType::Triage => Payload::Triage(TriageCodec.decode(wire)?),
            MessageType::TrainingEvent => Payload::TrainingEvent(TrainingEventCodec.decode(wire)?),
            MessageType::AppState => {
                let f = Fields::of(wire)?;
                Payload::AppState(AppState {
                    application: f.string("application")?,
                    content: f.string("content")?,
                })
            }
            MessageType::DisplayFeedback => Payload::DisplayFeedback(DisplayFeedback {
                text: Fields::of(wire)?.string("text")?,
            }),
            MessageType::StopFreeze => Payload::StopFreeze(StopFreezeCodec.decode(wire)?),
            MessageType::LessonCompleted => Payload::LessonCompleted(LessonCompleted {
                reason: Fields::of(wire)?.string("reason")?,
            }),
        })
    }

    fn encode(&self, value: &Payload) -> CodecResult<Value> {
        if value.message_type() != self.message_type {
            return Err(CodecError::TypeMismatch {
                declared: self.message_type.to_string(),
                actual: value.message_type().to_string(),
            });
        }
        match value {
            Payload::Siman(v) => SimanCodec.encode(v),
            Payload::EnvironmentControl(v) => EnvironmentControlCodec.encode(v),
            Payload::ScenarioDefinition(v) => ScenarioCodec.encode(v),
            Payload::TimerBatch(v) => TimerBatchCodec.encode(v),
            Payload::Triage(v) => TriageCodec.encode(v),
            Payload::TrainingEvent(v) => TrainingEventCodec.encode(v),
            Payload::AppState(v) => {
                Ok(json!({ "application": v.application, "content": v.content }))
            }
            Payload::DisplayFeedback(v) => Ok(json!({ "text": v.text })),
            Payload::StopFreeze(v) => StopFreezeCodec.encode(v),
            Payload::LessonCompleted(v) => Ok(json!({ "reason": v.reason })),
        }
    }
}
