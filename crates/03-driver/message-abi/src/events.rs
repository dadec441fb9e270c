use std::collections::BTreeMap;

/// Named event with free-form attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrainingEvent {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl TrainingEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Opaque state reported by an external application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppState {
    pub application: String,
    pub content: String,
}

/// Text the external application should show the learner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFeedback {
    pub text: String,
}

/// The external application stopped or froze the simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopFreeze {
    pub real_world_time: u64,
    pub reason: String,
    pub frozen_behavior: u8,
    pub request_id: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonCompleted {
    pub reason: String,
}
