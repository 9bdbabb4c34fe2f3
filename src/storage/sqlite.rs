use crate::domain::{NewVenue, VenueRecord, COORDINATE_TOLERANCE};
use crate::error::{CatalogError, Result};
use crate::storage::CatalogStore;
use crate::taxonomy::Taxonomy;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// SQLite-backed store. The connection is owned by the store and shared
/// behind a mutex; open it once at startup and drop it at shutdown.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if needed) the catalog database and seeds the
    /// category/city tables from the taxonomy.
    pub fn open<P: AsRef<Path>>(path: P, taxonomy: &Taxonomy) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        store.seed_taxonomy(taxonomy)?;
        Ok(store)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory(taxonomy: &Taxonomy) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        store.seed_taxonomy(taxonomy)?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS categories (
                id    TEXT PRIMARY KEY,
                name  TEXT NOT NULL,
                icon  TEXT NOT NULL,
                color TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS cities (
                id   TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS places (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT,
                image_url   TEXT,
                latitude    REAL NOT NULL,
                longitude   REAL NOT NULL,
                altitude    REAL NOT NULL DEFAULT 0,
                category_id TEXT NOT NULL REFERENCES categories(id),
                city_id     TEXT NOT NULL REFERENCES cities(id),
                created_at  TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn seed_taxonomy(&self, taxonomy: &Taxonomy) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        for category in &taxonomy.categories {
            conn.execute(
                "INSERT INTO categories (id, name, icon, color) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name, icon=excluded.icon, color=excluded.color",
                params![category.id, category.name, category.icon, category.color],
            )?;
        }
        for city in &taxonomy.cities {
            conn.execute(
                "INSERT INTO cities (id, name) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name",
                params![city.id, city.name],
            )?;
        }
        Ok(())
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<(VenueRecord, String)> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: String = row.get(9)?;
    Ok((
        VenueRecord {
            id,
            name: row.get(1)?,
            description: row.get(2)?,
            image_url: row.get(3)?,
            latitude: row.get(4)?,
            longitude: row.get(5)?,
            altitude: row.get(6)?,
            category_id: row.get(7)?,
            city_id: row.get(8)?,
            created_at: Utc::now(),
        },
        created_at,
    ))
}

fn finish_record((mut record, created_at): (VenueRecord, String)) -> Result<VenueRecord> {
    record.created_at = DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc);
    Ok(record)
}

const SELECT_COLUMNS: &str = "id, name, description, image_url, latitude, longitude, altitude, category_id, city_id, created_at";

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn list_all(&self) -> Result<Vec<VenueRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM places ORDER BY rowid",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.map(|r| finish_record(r?)).collect()
    }

    async fn list_by_category(&self, category_id: &str) -> Result<Vec<VenueRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM places WHERE category_id = ?1 ORDER BY rowid",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![category_id], row_to_record)?;
        rows.map(|r| finish_record(r?)).collect()
    }

    async fn create(&self, venue: NewVenue) -> Result<VenueRecord> {
        let conn = self.conn.lock().unwrap();

        let duplicates: i64 = conn.query_row(
            "SELECT COUNT(*) FROM places WHERE ABS(latitude - ?1) < ?3 AND ABS(longitude - ?2) < ?3",
            params![venue.latitude, venue.longitude, COORDINATE_TOLERANCE],
            |row| row.get(0),
        )?;
        if duplicates > 0 {
            return Err(CatalogError::DuplicateCoordinates {
                longitude: venue.longitude,
                latitude: venue.latitude,
            });
        }

        let record = VenueRecord {
            id: Uuid::new_v4(),
            name: venue.name,
            description: venue.description,
            image_url: venue.image_url,
            category_id: venue.category_id,
            city_id: venue.city_id,
            latitude: venue.latitude,
            longitude: venue.longitude,
            altitude: 0.0,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO places (id, name, description, image_url, latitude, longitude, altitude, category_id, city_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id.to_string(),
                record.name,
                record.description,
                record.image_url,
                record.latitude,
                record.longitude,
                record.altitude,
                record.category_id,
                record.city_id,
                record.created_at.to_rfc3339(),
            ],
        )?;

        debug!("Created venue: {} with id {}", record.name, record.id);
        Ok(record)
    }

    async fn update_image_url(&self, id: Uuid, image_url: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE places SET image_url = ?2 WHERE id = ?1",
            params![id.to_string(), image_url],
        )?;
        Ok(updated > 0)
    }
}
