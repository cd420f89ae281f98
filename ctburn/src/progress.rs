use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::info;

/// Append-only progress feed from the burn worker to whoever is watching.
///
/// Every line is also emitted as a tracing event, so a disabled log still
/// shows up in the subscriber output.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    tx: Option<UnboundedSender<String>>,
}

impl ProgressLog {
    /// A log together with the receiving end for the interactive side
    pub fn channel() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A log that only forwards to tracing
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn line(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "ctburn::progress", "{message}");
        if let Some(tx) = &self.tx {
            // A closed receiver only means nobody is watching any more
            let _ = tx.send(message);
        }
    }
}
