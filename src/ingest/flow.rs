//! Drives ingestion sessions: routes webhook updates through the pure
//! state machine and interprets the resulting steps against the store and
//! the outbound messenger.

use crate::domain::NewVenue;
use crate::error::{CatalogError, Result};
use crate::ingest::session::{advance, Session, SessionInput, Step, VenueDraft};
use crate::ingest::telegram::Update;
use crate::storage::CatalogStore;
use crate::taxonomy::Taxonomy;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Outbound message delivery. Fallible and possibly latent; the flow
/// treats failures as errors to report, never as fatal conditions.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    /// A prompt with tappable choices; each choice is `(label, callback data)`.
    async fn send_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[(String, String)],
    ) -> Result<()>;
}

pub struct IngestFlow {
    store: Arc<dyn CatalogStore>,
    messenger: Arc<dyn Messenger>,
    taxonomy: Arc<Taxonomy>,
    sessions: Mutex<HashMap<i64, Session>>,
}

impl IngestFlow {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        messenger: Arc<dyn Messenger>,
        taxonomy: Arc<Taxonomy>,
    ) -> Self {
        Self {
            store,
            messenger,
            taxonomy,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Handles one webhook update. Updates without usable content are
    /// ignored rather than failed, so the webhook can always ack.
    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        if let Some(message) = &update.message {
            let Some(user) = &message.from else {
                debug!("update {} has no sender, ignoring", update.update_id);
                return Ok(());
            };
            let Some(text) = message.text.as_deref() else {
                debug!("update {} has no text, ignoring", update.update_id);
                return Ok(());
            };
            return self
                .handle_input(user.id, message.chat.id, SessionInput::Text(text))
                .await;
        }

        if let Some(callback) = &update.callback_query {
            let chat_id = callback
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(callback.from.id);
            let Some(data) = callback.data.as_deref() else {
                return Ok(());
            };
            let input = if let Some(id) = data.strip_prefix("category_") {
                SessionInput::Category(id)
            } else if let Some(id) = data.strip_prefix("city_") {
                SessionInput::City(id)
            } else {
                warn!("unrecognized callback data: {}", data);
                return Ok(());
            };
            return self.handle_input(callback.from.id, chat_id, input).await;
        }

        debug!("update {} carries nothing actionable", update.update_id);
        Ok(())
    }

    pub async fn handle_input(
        &self,
        user_id: i64,
        chat_id: i64,
        input: SessionInput<'_>,
    ) -> Result<()> {
        let current = {
            let sessions = self.sessions.lock().unwrap();
            sessions.get(&user_id).cloned().unwrap_or_default()
        };

        let (next, steps) = advance(&current, &input, &self.taxonomy);

        {
            let mut sessions = self.sessions.lock().unwrap();
            sessions.insert(user_id, next);
        }

        for step in steps {
            self.run_step(chat_id, step).await?;
        }
        Ok(())
    }

    async fn run_step(&self, chat_id: i64, step: Step) -> Result<()> {
        match step {
            Step::Reply(text) => self.messenger.send_message(chat_id, &text).await,
            Step::PromptCategories(text) => {
                let choices: Vec<(String, String)> = self
                    .taxonomy
                    .storable_categories()
                    .map(|c| (c.name.clone(), format!("category_{}", c.id)))
                    .collect();
                self.messenger.send_choices(chat_id, &text, &choices).await
            }
            Step::PromptCities(text) => {
                let choices: Vec<(String, String)> = self
                    .taxonomy
                    .cities
                    .iter()
                    .map(|c| (c.name.clone(), format!("city_{}", c.id)))
                    .collect();
                self.messenger.send_choices(chat_id, &text, &choices).await
            }
            Step::Save(draft) => self.save_draft(chat_id, draft).await,
        }
    }

    async fn save_draft(&self, chat_id: i64, draft: VenueDraft) -> Result<()> {
        let Some(venue) = draft_to_new_venue(draft) else {
            warn!("completed draft is missing fields, dropping");
            return self
                .messenger
                .send_message(chat_id, "Something went wrong, please start over with a map link.")
                .await;
        };

        let name = venue.name.clone();
        let category_id = venue.category_id.clone();
        match self.store.create(venue).await {
            Ok(record) => {
                debug!("ingested venue {} into {}", record.id, record.category_id);
                self.messenger
                    .send_message(
                        chat_id,
                        &format!("Added \"{}\" to \"{}\".", name, category_id),
                    )
                    .await
            }
            // Duplicate coordinates are a normal outcome: report, no-op.
            Err(CatalogError::DuplicateCoordinates { .. }) => {
                self.messenger
                    .send_message(chat_id, "A venue at those coordinates already exists.")
                    .await
            }
            Err(e) => {
                warn!("failed to save venue: {}", e);
                self.messenger
                    .send_message(chat_id, "Could not save the venue, please try again.")
                    .await
            }
        }
    }
}

fn draft_to_new_venue(draft: VenueDraft) -> Option<NewVenue> {
    let (longitude, latitude) = draft.coordinates?;
    Some(NewVenue {
        name: draft.name?,
        description: draft.description,
        image_url: draft.image_url,
        latitude,
        longitude,
        category_id: draft.category_id?,
        city_id: draft.city_id?,
    })
}
