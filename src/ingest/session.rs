//! Per-user dialogue state for the ingestion flow.
//!
//! `advance` is a pure function from (session, input) to (next session,
//! steps). It performs no I/O: sending prompts and saving drafts are
//! effects the caller interprets. Sessions live in an explicit table keyed
//! by user id, owned by the flow.

use crate::geo::extract_coordinates;
use crate::taxonomy::Taxonomy;

/// Field-collection progress for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingName,
    AwaitingCategory,
    AwaitingDescription,
    AwaitingImage,
    AwaitingCity,
}

/// Fields collected so far. `coordinates` is `(longitude, latitude)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VenueDraft {
    pub coordinates: Option<(f64, f64)>,
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub city_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub state: SessionState,
    pub draft: VenueDraft,
}

/// One user interaction: free text, or a keyboard choice already stripped
/// of its `category_`/`city_` prefix by the transport layer.
#[derive(Debug, Clone, Copy)]
pub enum SessionInput<'a> {
    Text(&'a str),
    Category(&'a str),
    City(&'a str),
}

/// Effects for the caller to interpret, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Reply(String),
    /// Prompt with the category keyboard.
    PromptCategories(String),
    /// Prompt with the city keyboard.
    PromptCities(String),
    /// Persist the completed draft.
    Save(VenueDraft),
}

fn is_skip(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    t == "no" || t == "нет"
}

/// Advances one session by one input. Never fails: unexpected input keeps
/// the state and re-prompts.
pub fn advance(session: &Session, input: &SessionInput<'_>, taxonomy: &Taxonomy) -> (Session, Vec<Step>) {
    let mut next = session.clone();

    let steps = match (session.state, input) {
        (SessionState::Idle, SessionInput::Text(text)) => {
            if text.trim() == "/start" || text.trim() == "/help" {
                return (
                    next,
                    vec![Step::Reply(
                        "Hi! Send me a map link to a venue and I will help you add it to the catalog."
                            .to_string(),
                    )],
                );
            }
            match extract_coordinates(text) {
                Some(coordinates) => {
                    next.state = SessionState::AwaitingName;
                    next.draft = VenueDraft {
                        coordinates: Some(coordinates),
                        ..Default::default()
                    };
                    vec![Step::Reply(
                        "Found the coordinates. Now send the venue name.".to_string(),
                    )]
                }
                // Extraction failure is a normal outcome: prompt a retry.
                None => vec![Step::Reply(
                    "I could not find coordinates in that message. Please send a map link to the venue."
                        .to_string(),
                )],
            }
        }

        (SessionState::AwaitingName, SessionInput::Text(text)) => {
            next.draft.name = Some(text.trim().to_string());
            next.state = SessionState::AwaitingCategory;
            vec![Step::PromptCategories("Choose a category:".to_string())]
        }

        (SessionState::AwaitingCategory, SessionInput::Category(id)) => {
            if taxonomy.is_storable_category(id) {
                next.draft.category_id = Some(id.to_string());
                next.state = SessionState::AwaitingDescription;
                vec![
                    Step::Reply(format!("Category: {}", id)),
                    Step::Reply(
                        "Send a description (or \"no\" to skip).".to_string(),
                    ),
                ]
            } else {
                vec![Step::PromptCategories(
                    "That category is not available. Choose one of these:".to_string(),
                )]
            }
        }

        (SessionState::AwaitingDescription, SessionInput::Text(text)) => {
            next.draft.description = (!is_skip(text)).then(|| text.trim().to_string());
            next.state = SessionState::AwaitingImage;
            vec![Step::Reply(
                "Send an image URL (or \"no\" to skip).".to_string(),
            )]
        }

        (SessionState::AwaitingImage, SessionInput::Text(text)) => {
            next.draft.image_url = (!is_skip(text)).then(|| text.trim().to_string());
            next.state = SessionState::AwaitingCity;
            vec![Step::PromptCities("Choose a city:".to_string())]
        }

        (SessionState::AwaitingCity, SessionInput::City(id)) => {
            if taxonomy.is_known_city(id) {
                next.draft.city_id = Some(id.to_string());
                let completed = std::mem::take(&mut next.draft);
                next.state = SessionState::Idle;
                vec![Step::Reply(format!("City: {}", id)), Step::Save(completed)]
            } else {
                vec![Step::PromptCities(
                    "That city is not available. Choose one of these:".to_string(),
                )]
            }
        }

        // Anything else: keep the state, restate what we need.
        (SessionState::Idle, _) => vec![Step::Reply(
            "Send a map link to the venue you want to add.".to_string(),
        )],
        (SessionState::AwaitingName, _) => {
            vec![Step::Reply("Send the venue name as text.".to_string())]
        }
        (SessionState::AwaitingCategory, _) => {
            vec![Step::PromptCategories("Choose a category:".to_string())]
        }
        (SessionState::AwaitingDescription, _) => vec![Step::Reply(
            "Send a description (or \"no\" to skip).".to_string(),
        )],
        (SessionState::AwaitingImage, _) => vec![Step::Reply(
            "Send an image URL (or \"no\" to skip).".to_string(),
        )],
        (SessionState::AwaitingCity, _) => {
            vec![Step::PromptCities("Choose a city:".to_string())]
        }
    };

    (next, steps)
}
