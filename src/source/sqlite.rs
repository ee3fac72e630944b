//! SQLite-with-R-tree [`BoundarySource`] (C4): the production serving
//! variant. An `rtree` virtual table indexes each boundary's bbox for O(1)
//! rejection before the boundary blob itself is ever deserialized.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::Connection;

use crate::types::{Boundary, BoundaryType, Point};

use super::{BoundarySource, SourceError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS boundaries (
    id TEXT PRIMARY KEY,
    jurisdiction_fips TEXT NOT NULL,
    boundary_type INTEGER NOT NULL,
    payload TEXT NOT NULL
);
CREATE VIRTUAL TABLE IF NOT EXISTS boundary_bbox USING rtree(
    id, min_lng, max_lng, min_lat, max_lat
);
";

/// A boundary source backed by a SQLite database with an R-tree spatial
/// index, opened at a fixed path (§4.4, §6 `DB_PATH`).
pub struct SqliteSource {
    conn: Mutex<Connection>,
}

impl SqliteSource {
    /// Open (creating if absent) the database at `path`, ensuring the
    /// schema exists.
    pub fn open(path: &str) -> Result<Self, SourceError> {
        let conn = Connection::open(path).map_err(|e| SourceError::RequestFailed {
            message: e.to_string(),
            retryable: false,
        })?;
        conn.execute_batch(SCHEMA).map_err(|e| SourceError::RequestFailed {
            message: e.to_string(),
            retryable: false,
        })?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Insert or replace a boundary, updating both the payload table and
    /// the R-tree index.
    pub fn upsert(&self, boundary: &Boundary) -> Result<(), SourceError> {
        let payload = serde_json::to_string(boundary).map_err(|e| SourceError::MalformedResponse(e.to_string()))?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO boundaries (id, jurisdiction_fips, boundary_type, payload) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![boundary.id, boundary.jurisdiction_fips, boundary.r#type.ordinal(), payload],
        )
        .map_err(sqlite_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO boundary_bbox (id, min_lng, max_lng, min_lat, max_lat) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                boundary.id,
                boundary.bbox.min_lng,
                boundary.bbox.max_lng,
                boundary.bbox.min_lat,
                boundary.bbox.max_lat
            ],
        )
        .map_err(sqlite_err)?;
        Ok(())
    }
}

fn sqlite_err(e: rusqlite::Error) -> SourceError {
    SourceError::RequestFailed {
        message: e.to_string(),
        retryable: false,
    }
}

#[async_trait]
impl BoundarySource for SqliteSource {
    async fn candidates_for_point(
        &self,
        point: Point,
        types: Option<&[BoundaryType]>,
    ) -> Result<Vec<Boundary>, SourceError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT b.payload FROM boundaries b
                 JOIN boundary_bbox r ON r.id = b.id
                 WHERE r.min_lng <= ?1 AND r.max_lng >= ?1 AND r.min_lat <= ?2 AND r.max_lat >= ?2",
            )
            .map_err(sqlite_err)?;
        let rows = stmt
            .query_map(rusqlite::params![point.lng, point.lat], |row| row.get::<_, String>(0))
            .map_err(sqlite_err)?;

        let mut out = Vec::new();
        for row in rows {
            let payload = row.map_err(sqlite_err)?;
            let boundary: Boundary =
                serde_json::from_str(&payload).map_err(|e| SourceError::MalformedResponse(e.to_string()))?;
            if types.map_or(true, |ts| ts.contains(&boundary.r#type)) {
                out.push(boundary);
            }
        }
        Ok(out)
    }

    async fn by_jurisdiction(&self, fips: &str) -> Result<Vec<Boundary>, SourceError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT payload FROM boundaries WHERE jurisdiction_fips = ?1")
            .map_err(sqlite_err)?;
        let rows = stmt
            .query_map(rusqlite::params![fips], |row| row.get::<_, String>(0))
            .map_err(sqlite_err)?;
        let mut out = Vec::new();
        for row in rows {
            let payload = row.map_err(sqlite_err)?;
            out.push(serde_json::from_str(&payload).map_err(|e| SourceError::MalformedResponse(e.to_string()))?);
        }
        Ok(out)
    }

    async fn by_id(&self, id: &str) -> Result<Boundary, SourceError> {
        let conn = self.conn.lock();
        let payload: Option<String> = conn
            .query_row("SELECT payload FROM boundaries WHERE id = ?1", rusqlite::params![id], |row| row.get(0))
            .ok();
        let payload = payload.ok_or_else(|| SourceError::NotFound(id.to_string()))?;
        serde_json::from_str(&payload).map_err(|e| SourceError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthorityLevel, Geometry, Provenance, SourceKind};
    use chrono::DateTime;

    fn square_boundary(id: &str) -> Boundary {
        let exterior = vec![
            Point::new(0.0, 0.0).unwrap(),
            Point::new(10.0, 0.0).unwrap(),
            Point::new(10.0, 10.0).unwrap(),
            Point::new(0.0, 10.0).unwrap(),
            Point::new(0.0, 0.0).unwrap(),
        ];
        let geometry = Geometry::Polygon { exterior, holes: vec![] };
        let bbox = geometry.recompute_bbox().unwrap();
        Boundary {
            id: id.to_string(),
            r#type: BoundaryType::County,
            name: id.to_string(),
            jurisdiction: "test".to_string(),
            jurisdiction_fips: "06".to_string(),
            geometry,
            bbox,
            valid_from: DateTime::from_timestamp(0, 0).unwrap(),
            valid_until: None,
            provenance: Provenance {
                source_kind: SourceKind::CachedGeoJson,
                source_url: "file://test".to_string(),
                retrieved_at: DateTime::from_timestamp(0, 0).unwrap(),
                data_version: None,
                license: None,
                processing_steps: vec![],
                authority_level: AuthorityLevel::StateGis,
                last_verified: DateTime::from_timestamp(0, 0).unwrap(),
            },
            raw_attributes: Default::default(),
        }
    }

    #[tokio::test]
    async fn upsert_then_query_by_point_roundtrips() {
        let source = SqliteSource::open(":memory:").unwrap();
        source.upsert(&square_boundary("a")).unwrap();
        let hits = source.candidates_for_point(Point::new(5.0, 5.0).unwrap(), None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn by_id_missing_is_not_found() {
        let source = SqliteSource::open(":memory:").unwrap();
        assert!(matches!(source.by_id("missing").await, Err(SourceError::NotFound(_))));
    }
}
