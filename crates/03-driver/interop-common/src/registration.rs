use std::collections::BTreeSet;

use message_abi::{MessageType, TrainingApplication};

/// What an interface consumes, produces, and drives. Built once per instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    implementation: String,
    display_name: String,
    supported: BTreeSet<MessageType>,
    produced: BTreeSet<MessageType>,
    required_applications: BTreeSet<TrainingApplication>,
}

impl Registration {
    pub fn builder(
        implementation: impl Into<String>,
        display_name: impl Into<String>,
    ) -> RegistrationBuilder {
        RegistrationBuilder {
            inner: Registration {
                implementation: implementation.into(),
                display_name: display_name.into(),
                supported: BTreeSet::new(),
                produced: BTreeSet::new(),
                required_applications: BTreeSet::new(),
            },
        }
    }

    /// Fully qualified implementation identity.
    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn supported(&self) -> &BTreeSet<MessageType> {
        &self.supported
    }

    pub fn produced(&self) -> &BTreeSet<MessageType> {
        &self.produced
    }

    pub fn required_applications(&self) -> &BTreeSet<TrainingApplication> {
        &self.required_applications
    }

    pub fn supports(&self, message_type: MessageType) -> bool {
        self.supported.contains(&message_type)
    }
}

#[derive(Debug)]
pub struct RegistrationBuilder {
    inner: Registration,
}

impl RegistrationBuilder {
    pub fn supports(mut self, types: impl IntoIterator<Item = MessageType>) -> Self {
        self.inner.supported.extend(types);
        self
    }

    pub fn produces(mut self, types: impl IntoIterator<Item = MessageType>) -> Self {
        self.inner.produced.extend(types);
        self
    }

    pub fn requires(mut self, application: TrainingApplication) -> Self {
        self.inner.required_applications.insert(application);
        self
    }

    pub fn build(self) -> Registration {
        self.inner
    }
}
