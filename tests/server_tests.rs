use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use places_explorer::domain::NewVenue;
use places_explorer::ingest::{IngestFlow, NoopMessenger};
use places_explorer::server::{create_server, AppState};
use places_explorer::storage::{CatalogStore, InMemoryStore};
use places_explorer::taxonomy::Taxonomy;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

async fn seeded_app() -> Result<Router> {
    let store = Arc::new(InMemoryStore::new());
    let venues = [
        ("Бар", "BG", "Caffe", 44.81, 20.45),
        ("Бар", "NS", "Pub", 45.25, 19.84),
        ("Еда", "BG", "Grill House", 44.82, 20.46),
    ];
    for (category, city, name, lat, lng) in venues {
        store
            .create(NewVenue {
                name: name.to_string(),
                description: None,
                image_url: None,
                latitude: lat,
                longitude: lng,
                category_id: category.to_string(),
                city_id: city.to_string(),
            })
            .await?;
    }

    let taxonomy = Arc::new(Taxonomy::builtin());
    let flow = Arc::new(IngestFlow::new(
        store.clone(),
        Arc::new(NoopMessenger),
        taxonomy.clone(),
    ));
    let state = Arc::new(AppState {
        store,
        flow,
        taxonomy,
    });
    Ok(create_server(state))
}

async fn get_json(app: &Router, uri: &str) -> Result<(StatusCode, Value)> {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
        )
        .await?;
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn facets_route_reports_counts_for_the_aggregate_partition() -> Result<()> {
    let app = seeded_app().await?;

    let (status, body) = get_json(&app, "/api/facets").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "all");

    // First-seen order over the full catalog.
    assert_eq!(body["types"][0]["id"], "Бар");
    assert_eq!(body["types"][0]["count"], 2);
    assert_eq!(body["types"][1]["id"], "Еда");
    assert_eq!(body["types"][1]["count"], 1);

    assert_eq!(body["cities"][0]["id"], "BG");
    assert_eq!(body["cities"][0]["count"], 2);
    assert_eq!(body["cities"][1]["id"], "NS");
    assert_eq!(body["cities"][1]["count"], 1);
    Ok(())
}

#[tokio::test]
async fn facets_route_scopes_counts_to_the_requested_category() -> Result<()> {
    let app = seeded_app().await?;

    // "Бар", percent-encoded.
    let (status, body) =
        get_json(&app, "/api/facets?category=%D0%91%D0%B0%D1%80").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "Бар");
    assert_eq!(body["types"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["types"][0]["count"], 2);
    assert_eq!(body["cities"][0]["id"], "BG");
    assert_eq!(body["cities"][0]["count"], 1);
    assert_eq!(body["cities"][1]["id"], "NS");
    Ok(())
}

#[tokio::test]
async fn search_route_applies_the_filter_selection() -> Result<()> {
    let app = seeded_app().await?;

    let (status, body) = get_json(&app, "/api/search?city=BG&q=grill").await?;
    assert_eq!(status, StatusCode::OK);
    let features = body["features"].as_array().cloned().unwrap_or_default();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["Name"], "BG Grill House");
    Ok(())
}

#[tokio::test]
async fn create_route_rejects_duplicates_and_unknown_categories() -> Result<()> {
    let app = seeded_app().await?;

    // Same location as the seeded "BG Caffe".
    let (status, _) = post_json(
        &app,
        "/api/places",
        serde_json::json!({
            "name": "Clone",
            "latitude": 44.81,
            "longitude": 20.45,
            "categoryId": "Бар",
            "cityId": "BG"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // The aggregate id is a view, never a stored category.
    let (status, _) = post_json(
        &app,
        "/api/places",
        serde_json::json!({
            "name": "Elsewhere",
            "latitude": 46.0,
            "longitude": 21.0,
            "categoryId": "all",
            "cityId": "BG"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}
