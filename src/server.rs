use crate::error::CatalogError;
use crate::geojson::{Feature, FeatureCollection};
use crate::ingest::telegram::Update;
use crate::ingest::IngestFlow;
use crate::search::{filter, FilterSelection, SearchIndex};
use crate::storage::CatalogStore;
use crate::taxonomy::{Taxonomy, AGGREGATE_CATEGORY};
use axum::{
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Extension, Json as AxumJson, Router,
};
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub flow: Arc<IngestFlow>,
    pub taxonomy: Arc<Taxonomy>,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "places-explorer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// All venues as a GeoJSON feature collection
async fn all_places(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list_all().await {
        Ok(records) => Json(FeatureCollection::from_records("Places", &records)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// One category as a GeoJSON feature collection; the aggregate id returns
/// everything, an unknown id returns an empty collection.
async fn places_by_category(
    Path(category): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let result = if category == AGGREGATE_CATEGORY {
        state.store.list_all().await
    } else {
        state.store.list_by_category(&category).await
    };

    match result {
        Ok(records) => Json(FeatureCollection::from_records(&category, &records)).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default, rename = "type")]
    venue_type: Option<String>,
    #[serde(default)]
    q: Option<String>,
}

/// Filtered venue list. The index is rebuilt from the store on every call
/// so it always reflects the latest data.
async fn search_places(
    Query(params): Query<SearchParams>,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let records = match state.store.list_all().await {
        Ok(records) => records,
        Err(e) => return internal_error(e),
    };

    let shared: Vec<Arc<_>> = records.into_iter().map(Arc::new).collect();
    let index = SearchIndex::build(&shared);

    let category = params.category.as_deref().unwrap_or(AGGREGATE_CATEGORY);
    let selection = FilterSelection {
        city: params.city,
        venue_type: params.venue_type,
        query: params.q.unwrap_or_default(),
    };

    let features: Vec<Feature> = index
        .visible(category, &selection)
        .iter()
        .map(|record| Feature::from_record(record))
        .collect();

    Json(serde_json::json!({
        "type": "FeatureCollection",
        "name": category,
        "features": features
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
struct FacetParams {
    #[serde(default)]
    category: Option<String>,
}

/// Filter-bar options for one category partition: the types and cities
/// present in it, each with its venue count, in first-seen order.
async fn facets(
    Query(params): Query<FacetParams>,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let records = match state.store.list_all().await {
        Ok(records) => records,
        Err(e) => return internal_error(e),
    };

    let shared: Vec<Arc<_>> = records.into_iter().map(Arc::new).collect();
    let index = SearchIndex::build(&shared);

    let category = params.category.as_deref().unwrap_or(AGGREGATE_CATEGORY);
    let partition = index.partition(category);

    let types: Vec<_> = filter::type_counts(partition)
        .into_iter()
        .map(|(id, count)| serde_json::json!({ "id": id, "count": count }))
        .collect();
    let cities: Vec<_> = filter::city_counts(partition, &state.taxonomy.cities)
        .into_iter()
        .map(|(id, count)| serde_json::json!({ "id": id, "count": count }))
        .collect();

    Json(serde_json::json!({
        "category": category,
        "types": types,
        "cities": cities
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlaceRequest {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    latitude: f64,
    longitude: f64,
    category_id: String,
    city_id: String,
}

/// Create a venue. Duplicate coordinates answer 409; unknown taxonomy
/// tokens answer 422.
async fn create_place(
    Extension(state): Extension<Arc<AppState>>,
    AxumJson(body): AxumJson<CreatePlaceRequest>,
) -> impl IntoResponse {
    if !state.taxonomy.is_storable_category(&body.category_id) {
        return unprocessable(CatalogError::UnknownCategory(body.category_id).to_string());
    }
    if !state.taxonomy.is_known_city(&body.city_id) {
        return unprocessable(CatalogError::UnknownCity(body.city_id).to_string());
    }

    let new_venue = crate::domain::NewVenue {
        name: body.name,
        description: body.description,
        image_url: body.image_url,
        latitude: body.latitude,
        longitude: body.longitude,
        category_id: body.category_id,
        city_id: body.city_id,
    };

    match state.store.create(new_venue).await {
        Ok(record) => (StatusCode::CREATED, Json(Feature::from_record(&record))).into_response(),
        Err(CatalogError::DuplicateCoordinates { longitude, latitude }) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": "duplicate coordinates",
                "longitude": longitude,
                "latitude": latitude
            })),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

/// Telegram webhook: hand the update to the ingestion flow and ack.
async fn telegram_webhook(
    Extension(state): Extension<Arc<AppState>>,
    AxumJson(update): AxumJson<Update>,
) -> impl IntoResponse {
    match state.flow.handle_update(&update).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => {
            error!("webhook handling failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "ok": false, "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}

/// Webhook liveness probe
async fn telegram_health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true, "message": "Telegram webhook is working" }))
}

fn internal_error(e: CatalogError) -> axum::response::Response {
    error!("request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal server error" })),
    )
        .into_response()
}

fn unprocessable(message: String) -> axum::response::Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Create the HTTP server with all routes
pub fn create_server(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/places", get(all_places).post(create_place))
        .route("/api/places/:category", get(places_by_category))
        .route("/api/search", get(search_places))
        .route("/api/facets", get(facets))
        .route("/api/telegram", post(telegram_webhook).get(telegram_health))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    state: Arc<AppState>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");
    println!("📍 Places:       http://localhost:{port}/api/places");
    println!("🔎 Search:       http://localhost:{port}/api/search");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
