use anyhow::Result;
use async_trait::async_trait;
use places_explorer::error::Result as CatalogResult;
use places_explorer::ingest::{IngestFlow, Messenger, SessionInput};
use places_explorer::storage::{CatalogStore, InMemoryStore};
use places_explorer::taxonomy::Taxonomy;
use std::sync::{Arc, Mutex};

const MAP_URL: &str = "https://www.google.com/maps/place/Kafeterija/@44.8142752,20.4588704,17z";

/// Records every outbound message so dialogues can be asserted on.
#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<String>>,
}

impl RecordingMessenger {
    fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn last(&self) -> String {
        self.sent.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, _chat_id: i64, text: &str) -> CatalogResult<()> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_choices(
        &self,
        _chat_id: i64,
        text: &str,
        choices: &[(String, String)],
    ) -> CatalogResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push(format!("{} [{} choices]", text, choices.len()));
        Ok(())
    }
}

fn flow() -> (Arc<InMemoryStore>, Arc<RecordingMessenger>, IngestFlow) {
    let store = Arc::new(InMemoryStore::new());
    let messenger = Arc::new(RecordingMessenger::default());
    let flow = IngestFlow::new(
        store.clone(),
        messenger.clone(),
        Arc::new(Taxonomy::builtin()),
    );
    (store, messenger, flow)
}

async fn run_dialogue(flow: &IngestFlow, user: i64, inputs: &[SessionInput<'_>]) -> Result<()> {
    for input in inputs {
        flow.handle_input(user, user, *input).await?;
    }
    Ok(())
}

#[tokio::test]
async fn full_dialogue_creates_a_venue() -> Result<()> {
    let (store, messenger, flow) = flow();

    run_dialogue(
        &flow,
        7,
        &[
            SessionInput::Text(MAP_URL),
            SessionInput::Text("Kafeterija"),
            SessionInput::Category("Бар"),
            SessionInput::Text("уютное место"),
            SessionInput::Text("no"),
            SessionInput::City("BG"),
        ],
    )
    .await?;

    let records = store.list_all().await?;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "Kafeterija");
    assert_eq!(record.category_id, "Бар");
    assert_eq!(record.city_id, "BG");
    assert_eq!(record.description.as_deref(), Some("уютное место"));
    assert_eq!(record.image_url, None);
    // Extractor output is (longitude, latitude); the record stores both.
    assert_eq!(record.longitude, 20.4588704);
    assert_eq!(record.latitude, 44.8142752);

    let messages = messenger.messages();
    assert!(messages.iter().any(|m| m.contains("Choose a category")));
    assert!(messages.iter().any(|m| m.contains("Choose a city")));
    assert!(messenger.last().contains("Added"));
    Ok(())
}

#[tokio::test]
async fn bad_link_prompts_retry_and_keeps_idle() -> Result<()> {
    let (store, messenger, flow) = flow();

    flow.handle_input(7, 7, SessionInput::Text("https://example.com/no-coords-here"))
        .await?;
    assert!(messenger.last().contains("could not find coordinates"));

    // The user can try again immediately with a good link.
    flow.handle_input(7, 7, SessionInput::Text(MAP_URL)).await?;
    assert!(messenger.last().contains("Found the coordinates"));
    assert!(store.list_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_location_is_reported_not_fatal() -> Result<()> {
    let (store, messenger, flow) = flow();

    let dialogue = [
        SessionInput::Text(MAP_URL),
        SessionInput::Text("First"),
        SessionInput::Category("Бар"),
        SessionInput::Text("no"),
        SessionInput::Text("no"),
        SessionInput::City("BG"),
    ];
    run_dialogue(&flow, 7, &dialogue).await?;
    assert_eq!(store.list_all().await?.len(), 1);

    // A second user submits the same location.
    let dialogue = [
        SessionInput::Text(MAP_URL),
        SessionInput::Text("Second"),
        SessionInput::Category("Еда"),
        SessionInput::Text("no"),
        SessionInput::Text("no"),
        SessionInput::City("NS"),
    ];
    run_dialogue(&flow, 8, &dialogue).await?;

    assert_eq!(store.list_all().await?.len(), 1);
    assert!(messenger.last().contains("already exists"));
    Ok(())
}

#[tokio::test]
async fn sessions_are_isolated_per_user() -> Result<()> {
    let (store, _, flow) = flow();

    // User 7 is mid-dialogue; user 8 starts fresh.
    flow.handle_input(7, 7, SessionInput::Text(MAP_URL)).await?;
    flow.handle_input(7, 7, SessionInput::Text("Seven's venue")).await?;

    flow.handle_input(
        8,
        8,
        SessionInput::Text("https://maps.google.com/?q=45.25,19.84"),
    )
    .await?;
    flow.handle_input(8, 8, SessionInput::Text("Eight's venue")).await?;
    flow.handle_input(8, 8, SessionInput::Category("Еда")).await?;
    flow.handle_input(8, 8, SessionInput::Text("no")).await?;
    flow.handle_input(8, 8, SessionInput::Text("no")).await?;
    flow.handle_input(8, 8, SessionInput::City("NS")).await?;

    let records = store.list_all().await?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Eight's venue");
    assert_eq!(records[0].latitude, 45.25);
    Ok(())
}
