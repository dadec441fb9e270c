use crate::scenario::Location;

/// Entry in a scenario listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioSummary {
    pub id: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioMetadata {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Casualty,
    Trainee,
    Object,
    Region,
    Npc,
}

/// Object an external application lets the user pick.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectableObject {
    pub id: String,
    pub name: String,
    pub kind: ObjectKind,
    pub location: Option<Location>,
}
