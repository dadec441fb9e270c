/// Identification flags a trainee recorded for a casualty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionsPerformed {
    pub exit_wound: bool,
    pub airway_obstruction: bool,
    pub shock: bool,
    pub hypothermia: bool,
    pub bleeding: bool,
    pub respiratory_distress: bool,
    pub severe_pain: bool,
    pub wound_area: bool,
}

/// Triage report. `actions` is `None` when the source never recorded any,
/// which is not the same as every flag being false.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Triage {
    pub session: u64,
    pub scenario_event: u64,
    pub timestamp: u64,
    pub trainee_id: u32,
    pub casualty_id: u32,
    pub subtype_id: u32,
    pub actions: Option<ActionsPerformed>,
}
