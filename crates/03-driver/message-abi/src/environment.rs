use crate::scenario::Location;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    Dawn,
    Midday,
    Dusk,
    Midnight,
}

impl TimeOfDay {
    pub const fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Dawn => "Dawn",
            TimeOfDay::Midday => "Midday",
            TimeOfDay::Dusk => "Dusk",
            TimeOfDay::Midnight => "Midnight",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            TimeOfDay::Dawn,
            TimeOfDay::Midday,
            TimeOfDay::Dusk,
            TimeOfDay::Midnight,
        ]
        .into_iter()
        .find(|tod| tod.as_str() == name)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Change to the simulated environment.
#[derive(Clone, Debug, PartialEq)]
pub enum EnvironmentAdaptation {
    /// `density` is in `0.0..=1.0`.
    Fog { density: f64, color: Rgb },
    TimeOfDay(TimeOfDay),
    Script { text: String },
    RemoveActors { markings: Vec<String> },
    Teleport {
        marking: String,
        location: Location,
        heading: Option<f64>,
    },
}

impl EnvironmentAdaptation {
    pub fn kind_name(&self) -> &'static str {
        match self {
            EnvironmentAdaptation::Fog { .. } => "Fog",
            EnvironmentAdaptation::TimeOfDay(_) => "TimeOfDay",
            EnvironmentAdaptation::Script { .. } => "Script",
            EnvironmentAdaptation::RemoveActors { .. } => "RemoveActors",
            EnvironmentAdaptation::Teleport { .. } => "Teleport",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentControl {
    pub adaptation: EnvironmentAdaptation,
}

impl From<EnvironmentAdaptation> for EnvironmentControl {
    fn from(adaptation: EnvironmentAdaptation) -> Self {
        Self { adaptation }
    }
}
