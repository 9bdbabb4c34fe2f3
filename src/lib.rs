pub mod config;
pub mod domain;
pub mod error;
pub mod geo;
pub mod geojson;
pub mod ingest;
pub mod logging;
pub mod maintenance;
pub mod migrate;
pub mod search;
pub mod server;
pub mod storage;
pub mod taxonomy;
