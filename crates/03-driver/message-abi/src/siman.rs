use std::collections::BTreeMap;
use std::fmt;

/// Simulation-management directive kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimanKind {
    Load,
    Start,
    Pause,
    Resume,
    Restart,
    Stop,
}

impl SimanKind {
    pub const ALL: [SimanKind; 6] = [
        SimanKind::Load,
        SimanKind::Start,
        SimanKind::Pause,
        SimanKind::Resume,
        SimanKind::Restart,
        SimanKind::Stop,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SimanKind::Load => "Load",
            SimanKind::Start => "Start",
            SimanKind::Pause => "Pause",
            SimanKind::Resume => "Resume",
            SimanKind::Restart => "Restart",
            SimanKind::Stop => "Stop",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for SimanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered string parameters addressed to one interop implementation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadArgs {
    params: BTreeMap<String, String>,
}

impl LoadArgs {
    /// Parameter naming the scenario to load.
    pub const SCENARIO_KEY: &'static str = "scenario";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.params.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn scenario(&self) -> Option<&str> {
        self.get(Self::SCENARIO_KEY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl FromIterator<(String, String)> for LoadArgs {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

/// SIMAN directive with optional per-implementation load arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Siman {
    pub kind: SimanKind,
    /// Keyed by interop implementation identity.
    pub load_args: BTreeMap<String, LoadArgs>,
}

impl Siman {
    pub fn directive(kind: SimanKind) -> Self {
        Self {
            kind,
            load_args: BTreeMap::new(),
        }
    }

    pub fn load() -> Self {
        Self::directive(SimanKind::Load)
    }

    pub fn with_load_args(mut self, implementation: impl Into<String>, args: LoadArgs) -> Self {
        self.load_args.insert(implementation.into(), args);
        self
    }

    /// Load arguments whose key is contained in `implementation`.
    ///
    /// Keys are usually short implementation names while interfaces report
    /// fully qualified identities, hence the containment match.
    pub fn load_args_for(&self, implementation: &str) -> Option<&LoadArgs> {
        self.load_args
            .get(implementation)
            .or_else(|| {
                self.load_args
                    .iter()
                    .find(|(key, _)| implementation.contains(key.as_str()))
                    .map(|(_, args)| args)
            })
    }
}
