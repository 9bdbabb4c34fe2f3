//! The venue ingestion flow: a conversational agent that collects the
//! fields of a new venue, starting from a map link it extracts
//! coordinates from, and hands the completed draft to the catalog store.
//!
//! The dialogue logic is a pure state machine (`session`); transport and
//! persistence live at the edges (`telegram`, `flow`).

pub mod flow;
pub mod session;
pub mod telegram;

pub use flow::{IngestFlow, Messenger};
pub use session::{Session, SessionInput, SessionState, Step, VenueDraft};

use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Messenger that only logs, for running without bot credentials.
pub struct NoopMessenger;

#[async_trait]
impl Messenger for NoopMessenger {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        info!("(no messenger) to {}: {}", chat_id, text);
        Ok(())
    }

    async fn send_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[(String, String)],
    ) -> Result<()> {
        info!(
            "(no messenger) to {}: {} [{} choices]",
            chat_id,
            text,
            choices.len()
        );
        Ok(())
    }
}
