use std::sync::Arc;

use message_abi::{
    ActionsPerformed, AppState, AreaOfInterest, Casualty, CasualtyLayer, CasualtyStatus,
    DisplayFeedback, EnvironmentAdaptation, EnvironmentControl, LessonCompleted, LoadArgs,
    LocatedEntity, Location, Message, Payload, Rgb, Scenario, Siman, SimanKind, StopFreeze, Timer,
    TimerBatch, TraineeChannels, TraineeLayer, TrainingEvent, Triage,
};
use once_cell::sync::Lazy;

/// Implementation identity used for simple-example load arguments.
pub const SIMPLE_IMPL: &str = "SimpleExample";
/// Implementation identity used for triage simulator load arguments.
pub const TRIAGE_IMPL: &str = "TriageSim";

const T0: u64 = 1_700_000_000_000;

static SCENARIO: Lazy<Arc<Scenario>> = Lazy::new(|| Arc::new(build_scenario()));

fn area(label: &str, description: Option<&str>) -> AreaOfInterest {
    AreaOfInterest {
        label: label.to_string(),
        area_type: "polygon".to_string(),
        interest_type: "assessment".to_string(),
        description: description.map(str::to_string),
    }
}

fn located(id: u32, name: &str, location: &[f64], areas: Vec<AreaOfInterest>) -> LocatedEntity {
    LocatedEntity {
        id,
        name: name.to_string(),
        location: Location::from_slice(location),
        areas,
    }
}

fn build_scenario() -> Scenario {
    Scenario {
        id: 42,
        title: "Convoy ambush".to_string(),
        description: Some("Two trainees triage casualties after an IED strike".to_string()),
        timestamp: T0,
        casualties: vec![
            Casualty {
                id: 100,
                name: "Casualty A".to_string(),
                areas: vec![area("left leg", Some("arterial bleed"))],
            },
            Casualty {
                id: 101,
                name: "Casualty B".to_string(),
                areas: Vec::new(),
            },
        ],
        trainees: vec![
            located(1, "Medic", &[10.0, 0.5, -3.25], vec![area("rally point", None)]),
            located(2, "Rifleman", &[12.0, 0.5, -1.0], vec![area("overwatch", None)]),
        ],
        objects: vec![located(
            200,
            "Burning vehicle",
            &[15.5, 0.0, 4.0],
            vec![area("blast radius", Some("stay clear")), area("cover", None)],
        )],
        regions: vec![located(300, "Casualty collection point", &[0.0, 0.0, 0.0], Vec::new())],
        npcs: vec![located(400, "Convoy commander", &[3.0, 0.0, 9.0], Vec::new())],
    }
}

/// Scenario with two trainees carrying one area of interest each.
pub fn scenario() -> Arc<Scenario> {
    Arc::clone(&SCENARIO)
}

pub fn scenario_message() -> Message {
    Message::new(Payload::ScenarioDefinition(scenario()))
        .with_session(7)
        .with_scenario_event(1)
        .at(T0)
}

/// Two timers; the second trainee's head channel is deliberately unsorted.
pub fn timer_batch() -> TimerBatch {
    let channels = |trainee_id, head: &[f64]| TraineeChannels {
        trainee_id,
        communicating: trainee_id == 1,
        watched_objects: vec![200],
        watched_regions: vec![300, 300],
        head: head.to_vec(),
        hand: vec![0.25, 0.5],
        foot: Vec::new(),
    };
    TimerBatch::new(
        T0 + 500,
        vec![
            Timer {
                elapsed_ms: 0,
                casualty_layer: CasualtyLayer {
                    entries: vec![CasualtyStatus {
                        id: 100,
                        status: "urgent".to_string(),
                    }],
                },
                trainee_layer: TraineeLayer {
                    trainees: vec![channels(1, &[0.1, 0.2, 0.3])],
                },
            },
            Timer {
                elapsed_ms: 250,
                casualty_layer: CasualtyLayer::default(),
                trainee_layer: TraineeLayer {
                    trainees: vec![channels(1, &[0.3, 0.2]), channels(2, &[3.0, 1.0, 2.0, 1.0])],
                },
            },
        ],
    )
}

pub fn triage(actions: Option<ActionsPerformed>) -> Triage {
    Triage {
        session: 7,
        scenario_event: 3,
        timestamp: T0 + 900,
        trainee_id: 1,
        casualty_id: 100,
        subtype_id: 2,
        actions,
    }
}

pub fn siman(kind: SimanKind) -> Siman {
    Siman::directive(kind)
}

/// LOAD directive addressing both bundled RPC and packet plugins.
pub fn siman_load(scenario: &str) -> Siman {
    Siman::load()
        .with_load_args(SIMPLE_IMPL, LoadArgs::new().with(LoadArgs::SCENARIO_KEY, scenario))
        .with_load_args(
            TRIAGE_IMPL,
            LoadArgs::new()
                .with(LoadArgs::SCENARIO_KEY, scenario)
                .with("difficulty", "hard"),
        )
}

pub fn environment_fog() -> EnvironmentControl {
    EnvironmentAdaptation::Fog {
        density: 0.75,
        color: Rgb {
            red: 200,
            green: 200,
            blue: 210,
        },
    }
    .into()
}

pub fn display_feedback(text: &str) -> DisplayFeedback {
    DisplayFeedback {
        text: text.to_string(),
    }
}

pub fn stop_freeze() -> StopFreeze {
    StopFreeze {
        real_world_time: T0 + 60_000,
        reason: "learner closed the application".to_string(),
        frozen_behavior: 1,
        request_id: 9,
    }
}

pub fn lesson_completed() -> LessonCompleted {
    LessonCompleted {
        reason: "course finished".to_string(),
    }
}

/// One message per message type, plus a triage report without actions.
pub fn every_message() -> Vec<Message> {
    let payloads: Vec<Payload> = vec![
        siman_load("intro").into(),
        siman(SimanKind::Pause).into(),
        environment_fog().into(),
        EnvironmentControl::from(EnvironmentAdaptation::Teleport {
            marking: "Medic".to_string(),
            location: Location::from_slice(&[1.0, 2.0, 3.0]),
            heading: None,
        })
        .into(),
        Payload::ScenarioDefinition(scenario()),
        timer_batch().into(),
        triage(Some(ActionsPerformed {
            bleeding: true,
            shock: true,
            ..ActionsPerformed::default()
        }))
        .into(),
        triage(None).into(),
        TrainingEvent::new("object-selected")
            .with("object", "200")
            .into(),
        AppState {
            application: "simple-example".to_string(),
            content: "{\"level\":2}".to_string(),
        }
        .into(),
        display_feedback("Check the casualty's airway").into(),
        stop_freeze().into(),
        lesson_completed().into(),
    ];
    payloads
        .into_iter()
        .enumerate()
        .map(|(idx, payload)| {
            Message::new(payload)
                .with_session(7)
                .with_scenario_event(idx as u64)
                .at(T0 + idx as u64)
        })
        .collect()
}
