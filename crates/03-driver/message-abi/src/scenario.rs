use smallvec::SmallVec;

use crate::query::{ObjectKind, ScenarioMetadata, SelectableObject};

/// Ordered coordinate scalars. Most scenarios use three.
pub type Location = SmallVec<[f64; 3]>;

/// Authoring annotation attached to any scenario entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AreaOfInterest {
    pub label: String,
    pub area_type: String,
    pub interest_type: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Casualty {
    pub id: u32,
    pub name: String,
    pub areas: Vec<AreaOfInterest>,
}

/// Entity with a position in the simulated world.
#[derive(Clone, Debug, PartialEq)]
pub struct LocatedEntity {
    pub id: u32,
    pub name: String,
    pub location: Location,
    pub areas: Vec<AreaOfInterest>,
}

pub type Trainee = LocatedEntity;
pub type ObjectOfInterest = LocatedEntity;
pub type RegionOfInterest = LocatedEntity;
pub type Npc = LocatedEntity;

/// Scenario definition tree. Built from one decode and never edited afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    pub id: u32,
    pub title: String,
    pub description: Option<String>,
    pub timestamp: u64,
    pub casualties: Vec<Casualty>,
    pub trainees: Vec<Trainee>,
    pub objects: Vec<ObjectOfInterest>,
    pub regions: Vec<RegionOfInterest>,
    pub npcs: Vec<Npc>,
}

impl Scenario {
    pub fn metadata(&self) -> ScenarioMetadata {
        ScenarioMetadata {
            id: self.id.to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }

    /// Every entity a learner or author can select, grouped by kind.
    pub fn selectable_objects(&self) -> Vec<SelectableObject> {
        let casualties = self.casualties.iter().map(|c| SelectableObject {
            id: c.id.to_string(),
            name: c.name.clone(),
            kind: ObjectKind::Casualty,
            location: None,
        });
        let located = [
            (ObjectKind::Trainee, &self.trainees),
            (ObjectKind::Object, &self.objects),
            (ObjectKind::Region, &self.regions),
            (ObjectKind::Npc, &self.npcs),
        ]
        .into_iter()
        .flat_map(|(kind, entities)| {
            entities.iter().map(move |e| SelectableObject {
                id: e.id.to_string(),
                name: e.name.clone(),
                kind,
                location: Some(e.location.clone()),
            })
        });
        casualties.chain(located).collect()
    }

    /// Total areas of interest across all entity lists.
    pub fn area_count(&self) -> usize {
        self.casualties.iter().map(|c| c.areas.len()).sum::<usize>()
            + [&self.trainees, &self.objects, &self.regions, &self.npcs]
                .iter()
                .flat_map(|list| list.iter())
                .map(|e| e.areas.len())
                .sum::<usize>()
    }
}
