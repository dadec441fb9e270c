//! Capabilities the host hands to each plugin instance.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Sender;
use message_abi::Message;
use tracing::debug;
use transport_fabric::ProcessLauncher;

use crate::interface::InteropInterface;

/// Where interfaces deliver the messages they produce.
#[derive(Clone, Debug)]
pub struct MessageSink {
    tx: Sender<Message>,
}

impl MessageSink {
    pub fn new(tx: Sender<Message>) -> Self {
        Self { tx }
    }

    /// Returns `false` when nobody is listening any more.
    pub fn deliver(&self, message: Message) -> bool {
        let message_type = message.message_type();
        match self.tx.send(message) {
            Ok(()) => true,
            Err(_) => {
                debug!(%message_type, "message sink closed; dropping produced message");
                false
            }
        }
    }
}

/// Desktop window actions performed on SIMAN START/RESUME/PAUSE.
pub trait WindowControl: Send + Sync {
    fn foreground(&self, interface: &str) -> Result<(), String>;
    fn background(&self, interface: &str) -> Result<(), String>;
}

/// Headless hosts have no windows to move.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopWindow;

impl WindowControl for NoopWindow {
    fn foreground(&self, _interface: &str) -> Result<(), String> {
        Ok(())
    }

    fn background(&self, _interface: &str) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct PluginContext {
    pub launcher: Arc<dyn ProcessLauncher>,
    pub sink: MessageSink,
    pub window: Arc<dyn WindowControl>,
}

impl PluginContext {
    pub fn new(launcher: Arc<dyn ProcessLauncher>, sink: MessageSink) -> Self {
        Self {
            launcher,
            sink,
            window: Arc::new(NoopWindow),
        }
    }

    pub fn with_window(mut self, window: Arc<dyn WindowControl>) -> Self {
        self.window = window;
        self
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

/// Builds interface instances for one implementation identity.
pub trait PluginFactory: Send + Sync {
    fn implementation(&self) -> &str;

    fn create(&self, name: &str, ctx: PluginContext) -> Box<dyn InteropInterface>;
}
