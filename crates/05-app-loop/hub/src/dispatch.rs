use message_abi::MessageType;

/// Types nobody is required to handle.
pub const OPTIONAL_MESSAGE_TYPES: [MessageType; 2] =
    [MessageType::DisplayFeedback, MessageType::LessonCompleted];

/// Reply owed to the sender of a dispatched message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Ack,
    Nack(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// `None` when an interface replied itself or the type was optional and unhandled.
    pub reply: Option<Reply>,
    /// Interfaces that handled the message without error, in registration order.
    pub handled_by: Vec<String>,
}

impl DispatchReport {
    pub fn is_nack(&self) -> bool {
        matches!(self.reply, Some(Reply::Nack(_)))
    }
}
