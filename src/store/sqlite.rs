//! SQLite-backed store implementation.

use super::{EmbeddingKind, EmbeddingRecord, EpisodeCounts, SearchHit};
use crate::embedding::cosine_similarity;
use crate::error::{Result, VaultError};
use crate::model::{Episode, EpisodeStatus, Insight, InsightCategory, Link, Product, Segment};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS episodes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    video_id TEXT NOT NULL UNIQUE,
    source_url TEXT NOT NULL,
    description TEXT,
    duration_seconds REAL,
    published_at TEXT,
    status TEXT NOT NULL,
    summary TEXT,
    audio_path TEXT,
    processed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS segments (
    id TEXT PRIMARY KEY,
    episode_id TEXT NOT NULL REFERENCES episodes(id) ON DELETE CASCADE,
    start_seconds REAL NOT NULL,
    end_seconds REAL NOT NULL,
    raw_text TEXT NOT NULL,
    display_text TEXT NOT NULL,
    speaker TEXT NOT NULL,
    confidence REAL NOT NULL,
    position INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_segments_episode ON segments(episode_id);

CREATE TABLE IF NOT EXISTS insights (
    id TEXT PRIMARY KEY,
    episode_id TEXT NOT NULL REFERENCES episodes(id) ON DELETE CASCADE,
    category TEXT NOT NULL,
    content TEXT NOT NULL,
    confidence REAL NOT NULL,
    start_seconds REAL NOT NULL,
    end_seconds REAL NOT NULL,
    UNIQUE(episode_id, category, content)
);

CREATE INDEX IF NOT EXISTS idx_insights_episode ON insights(episode_id);

CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    normalized_name TEXT NOT NULL UNIQUE,
    mention_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS product_episodes (
    product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    episode_id TEXT NOT NULL REFERENCES episodes(id) ON DELETE CASCADE,
    PRIMARY KEY (product_id, episode_id)
);

CREATE TABLE IF NOT EXISTS links (
    id TEXT PRIMARY KEY,
    episode_id TEXT NOT NULL REFERENCES episodes(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    title TEXT,
    description TEXT,
    enriched INTEGER NOT NULL DEFAULT 0,
    position INTEGER NOT NULL,
    UNIQUE(episode_id, url)
);

CREATE TABLE IF NOT EXISTS embeddings (
    id TEXT PRIMARY KEY,
    episode_id TEXT NOT NULL REFERENCES episodes(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    ref_id TEXT NOT NULL,
    content TEXT NOT NULL,
    vector BLOB NOT NULL,
    UNIQUE(kind, ref_id)
);

CREATE INDEX IF NOT EXISTS idx_embeddings_episode ON embeddings(episode_id);
"#;

/// SQLite-backed store for all pipeline artifacts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VaultError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_episode(row: &rusqlite::Row<'_>) -> rusqlite::Result<Episode> {
        let status_str: String = row.get(7)?;
        let published_str: Option<String> = row.get(6)?;
        let created_str: String = row.get(11)?;

        Ok(Episode {
            id: row.get(0)?,
            title: row.get(1)?,
            video_id: row.get(2)?,
            source_url: row.get(3)?,
            description: row.get(4)?,
            duration_seconds: row.get(5)?,
            published_at: published_str.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
            status: status_str.parse().unwrap_or(EpisodeStatus::Failed),
            summary: row.get(8)?,
            audio_path: row.get(9)?,
            processed: row.get::<_, i64>(10)? != 0,
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

const EPISODE_COLUMNS: &str = "id, title, video_id, source_url, description, duration_seconds, \
     published_at, status, summary, audio_path, processed, created_at";

// Episodes
impl SqliteStore {
    #[instrument(skip(self, episode), fields(episode_id = %episode.id))]
    pub fn insert_episode(&self, episode: &Episode) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO episodes
            (id, title, video_id, source_url, description, duration_seconds,
             published_at, status, summary, audio_path, processed, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                episode.id,
                episode.title,
                episode.video_id,
                episode.source_url,
                episode.description,
                episode.duration_seconds,
                episode.published_at.map(|dt| dt.to_rfc3339()),
                episode.status.to_string(),
                episode.summary,
                episode.audio_path,
                episode.processed as i64,
                episode.created_at.to_rfc3339(),
            ],
        )?;

        debug!("Inserted episode {}", episode.id);
        Ok(())
    }

    #[instrument(skip(self, episode), fields(episode_id = %episode.id))]
    pub fn update_episode(&self, episode: &Episode) -> Result<()> {
        let conn = self.lock()?;

        let updated = conn.execute(
            r#"
            UPDATE episodes
            SET title = ?2, source_url = ?3, description = ?4, duration_seconds = ?5,
                published_at = ?6, status = ?7, summary = ?8, audio_path = ?9, processed = ?10
            WHERE id = ?1
            "#,
            params![
                episode.id,
                episode.title,
                episode.source_url,
                episode.description,
                episode.duration_seconds,
                episode.published_at.map(|dt| dt.to_rfc3339()),
                episode.status.to_string(),
                episode.summary,
                episode.audio_path,
                episode.processed as i64,
            ],
        )?;

        if updated == 0 {
            return Err(VaultError::Store(format!(
                "Episode not found: {}",
                episode.id
            )));
        }

        Ok(())
    }

    pub fn get_episode(&self, episode_id: &str) -> Result<Option<Episode>> {
        let conn = self.lock()?;

        let episode = conn
            .query_row(
                &format!("SELECT {} FROM episodes WHERE id = ?1", EPISODE_COLUMNS),
                params![episode_id],
                Self::row_to_episode,
            )
            .optional()?;

        Ok(episode)
    }

    pub fn find_episode_by_video_id(&self, video_id: &str) -> Result<Option<Episode>> {
        let conn = self.lock()?;

        let episode = conn
            .query_row(
                &format!(
                    "SELECT {} FROM episodes WHERE video_id = ?1",
                    EPISODE_COLUMNS
                ),
                params![video_id],
                Self::row_to_episode,
            )
            .optional()?;

        Ok(episode)
    }

    pub fn list_episodes(&self) -> Result<Vec<Episode>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM episodes ORDER BY created_at DESC",
            EPISODE_COLUMNS
        ))?;

        let episodes = stmt.query_map([], Self::row_to_episode)?;
        Ok(episodes.filter_map(|e| e.ok()).collect())
    }

    /// Delete an episode and all its owned artifacts.
    #[instrument(skip(self))]
    pub fn delete_episode(&self, episode_id: &str) -> Result<bool> {
        let conn = self.lock()?;

        let deleted = conn.execute("DELETE FROM episodes WHERE id = ?1", params![episode_id])?;
        if deleted > 0 {
            info!("Deleted episode {}", episode_id);
        }
        Ok(deleted > 0)
    }

    pub fn episode_counts(&self, episode_id: &str) -> Result<EpisodeCounts> {
        let conn = self.lock()?;

        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE episode_id = ?1", table),
                params![episode_id],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };

        Ok(EpisodeCounts {
            segments: count("segments")?,
            insights: count("insights")?,
            links: count("links")?,
            embeddings: count("embeddings")?,
        })
    }
}

// Segments
impl SqliteStore {
    /// Replace all segments for an episode in one transaction.
    ///
    /// Replacement rather than append keeps re-running the transcription
    /// stage idempotent.
    #[instrument(skip(self, segments), fields(count = segments.len()))]
    pub fn replace_segments(&self, episode_id: &str, segments: &[Segment]) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM segments WHERE episode_id = ?1",
            params![episode_id],
        )?;

        for segment in segments {
            tx.execute(
                r#"
                INSERT INTO segments
                (id, episode_id, start_seconds, end_seconds, raw_text, display_text,
                 speaker, confidence, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    segment.id,
                    segment.episode_id,
                    segment.start_seconds,
                    segment.end_seconds,
                    segment.raw_text,
                    segment.display_text,
                    segment.speaker,
                    segment.confidence,
                    segment.position,
                ],
            )?;
        }

        tx.commit()?;
        debug!("Stored {} segments for episode {}", segments.len(), episode_id);
        Ok(())
    }

    pub fn get_segments(&self, episode_id: &str) -> Result<Vec<Segment>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, episode_id, start_seconds, end_seconds, raw_text, display_text,
                   speaker, confidence, position
            FROM segments
            WHERE episode_id = ?1
            ORDER BY position
            "#,
        )?;

        let segments = stmt.query_map(params![episode_id], |row| {
            Ok(Segment {
                id: row.get(0)?,
                episode_id: row.get(1)?,
                start_seconds: row.get(2)?,
                end_seconds: row.get(3)?,
                raw_text: row.get(4)?,
                display_text: row.get(5)?,
                speaker: row.get(6)?,
                confidence: row.get(7)?,
                position: row.get(8)?,
            })
        })?;

        Ok(segments.filter_map(|s| s.ok()).collect())
    }
}

// Insights
impl SqliteStore {
    /// Insert insights, skipping duplicates of (episode, category, content).
    ///
    /// Returns the number of rows actually inserted.
    #[instrument(skip(self, insights), fields(count = insights.len()))]
    pub fn insert_insights(&self, insights: &[Insight]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let mut inserted = 0;
        for insight in insights {
            inserted += tx.execute(
                r#"
                INSERT OR IGNORE INTO insights
                (id, episode_id, category, content, confidence, start_seconds, end_seconds)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    insight.id,
                    insight.episode_id,
                    insight.category.label(),
                    insight.content,
                    insight.confidence,
                    insight.start_seconds,
                    insight.end_seconds,
                ],
            )?;
        }

        tx.commit()?;
        debug!("Inserted {} insights", inserted);
        Ok(inserted)
    }

    pub fn get_insights(&self, episode_id: &str) -> Result<Vec<Insight>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, episode_id, category, content, confidence, start_seconds, end_seconds
            FROM insights
            WHERE episode_id = ?1
            ORDER BY start_seconds, category
            "#,
        )?;

        let insights = stmt.query_map(params![episode_id], |row| {
            let category_str: String = row.get(2)?;
            Ok((
                category_str,
                Insight {
                    id: row.get(0)?,
                    episode_id: row.get(1)?,
                    category: InsightCategory::Products,
                    content: row.get(3)?,
                    confidence: row.get(4)?,
                    start_seconds: row.get(5)?,
                    end_seconds: row.get(6)?,
                },
            ))
        })?;

        // Rows with labels no parser recognizes are dropped rather than
        // misfiled under a default category.
        let result = insights
            .filter_map(|r| r.ok())
            .filter_map(|(label, mut insight)| {
                insight.category = InsightCategory::parse_label(&label)?;
                Some(insight)
            })
            .collect();

        Ok(result)
    }
}

// Products
impl SqliteStore {
    /// Record a product mention for an episode.
    ///
    /// Creates the product if the normalized name is new, otherwise bumps
    /// the existing row. The count bump and episode association commit in
    /// one transaction so a crash cannot split them.
    #[instrument(skip(self))]
    pub fn record_product_mention(
        &self,
        name: &str,
        normalized_name: &str,
        episode_id: &str,
    ) -> Result<Product> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO products (id, name, normalized_name, mention_count)
            VALUES (?1, ?2, ?3, 1)
            ON CONFLICT(normalized_name)
            DO UPDATE SET mention_count = mention_count + 1
            "#,
            params![Uuid::new_v4().to_string(), name, normalized_name],
        )?;

        let product_id: String = tx.query_row(
            "SELECT id FROM products WHERE normalized_name = ?1",
            params![normalized_name],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT OR IGNORE INTO product_episodes (product_id, episode_id) VALUES (?1, ?2)",
            params![product_id, episode_id],
        )?;

        tx.commit()?;

        drop(conn);
        self.get_product(&product_id)?
            .ok_or_else(|| VaultError::Store(format!("Product vanished: {}", product_id)))
    }

    pub fn get_product(&self, product_id: &str) -> Result<Option<Product>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                "SELECT id, name, normalized_name, mention_count FROM products WHERE id = ?1",
                params![product_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, normalized_name, mention_count)) = row else {
            return Ok(None);
        };

        let mut stmt =
            conn.prepare("SELECT episode_id FROM product_episodes WHERE product_id = ?1")?;
        let episode_ids = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(Some(Product {
            id,
            name,
            normalized_name,
            mention_count,
            episode_ids,
        }))
    }

    /// All known product names, for cross-episode matching.
    pub fn known_product_names(&self) -> Result<Vec<(String, String)>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT name, normalized_name FROM products")?;
        let names = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(names.filter_map(|n| n.ok()).collect())
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT p.id, p.name, p.normalized_name, p.mention_count,
                   COALESCE(GROUP_CONCAT(pe.episode_id), '')
            FROM products p
            LEFT JOIN product_episodes pe ON pe.product_id = p.id
            GROUP BY p.id
            ORDER BY p.mention_count DESC, p.name
            "#,
        )?;

        let products = stmt.query_map([], |row| {
            let joined: String = row.get(4)?;
            Ok(Product {
                id: row.get(0)?,
                name: row.get(1)?,
                normalized_name: row.get(2)?,
                mention_count: row.get(3)?,
                episode_ids: if joined.is_empty() {
                    Vec::new()
                } else {
                    joined.split(',').map(String::from).collect()
                },
            })
        })?;

        Ok(products.filter_map(|p| p.ok()).collect())
    }
}

// Links
impl SqliteStore {
    /// Upsert links for an episode, keyed by (episode, url).
    #[instrument(skip(self, links), fields(count = links.len()))]
    pub fn upsert_links(&self, links: &[Link]) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for link in links {
            tx.execute(
                r#"
                INSERT INTO links (id, episode_id, url, title, description, enriched, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(episode_id, url)
                DO UPDATE SET title = excluded.title,
                              description = excluded.description,
                              enriched = excluded.enriched
                "#,
                params![
                    link.id,
                    link.episode_id,
                    link.url,
                    link.title,
                    link.description,
                    link.enriched as i64,
                    link.position,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn get_links(&self, episode_id: &str) -> Result<Vec<Link>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, episode_id, url, title, description, enriched, position
            FROM links
            WHERE episode_id = ?1
            ORDER BY position
            "#,
        )?;

        let links = stmt.query_map(params![episode_id], |row| {
            Ok(Link {
                id: row.get(0)?,
                episode_id: row.get(1)?,
                url: row.get(2)?,
                title: row.get(3)?,
                description: row.get(4)?,
                enriched: row.get::<_, i64>(5)? != 0,
                position: row.get(6)?,
            })
        })?;

        Ok(links.filter_map(|l| l.ok()).collect())
    }
}

// Embeddings and search
impl SqliteStore {
    /// Upsert embedding vectors, keyed by (kind, ref_id).
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn upsert_embeddings(&self, records: &[EmbeddingRecord]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for record in records {
            let vector_bytes = Self::embedding_to_bytes(&record.vector);

            tx.execute(
                r#"
                INSERT INTO embeddings (id, episode_id, kind, ref_id, content, vector)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(kind, ref_id)
                DO UPDATE SET content = excluded.content, vector = excluded.vector
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    record.episode_id,
                    record.kind.to_string(),
                    record.ref_id,
                    record.content,
                    vector_bytes,
                ],
            )?;
        }

        tx.commit()?;
        debug!("Upserted {} embeddings", records.len());
        Ok(records.len())
    }

    pub fn embedding_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Rank all stored embeddings against a query vector.
    #[instrument(skip(self, query))]
    pub fn search(&self, query: &[f32], limit: usize, min_score: f32) -> Result<Vec<SearchHit>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT em.episode_id, ep.title, em.kind, em.ref_id, em.content, em.vector
            FROM embeddings em
            JOIN episodes ep ON ep.id = em.episode_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let kind_str: String = row.get(2)?;
            let vector_bytes: Vec<u8> = row.get(5)?;

            Ok((
                kind_str,
                SearchHit {
                    episode_id: row.get(0)?,
                    episode_title: row.get(1)?,
                    kind: EmbeddingKind::Segment,
                    ref_id: row.get(3)?,
                    content: row.get(4)?,
                    score: 0.0,
                },
                Self::bytes_to_embedding(&vector_bytes),
            ))
        })?;

        let mut hits: Vec<SearchHit> = rows
            .filter_map(|r| r.ok())
            .filter_map(|(kind_str, mut hit, vector)| {
                hit.kind = kind_str.parse().ok()?;
                hit.score = cosine_similarity(query, &vector);
                Some(hit)
            })
            .filter(|hit| hit.score >= min_score)
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_episode() -> Episode {
        Episode::new(
            "Test Episode".to_string(),
            "vid00000001".to_string(),
            "https://www.youtube.com/watch?v=vid00000001".to_string(),
        )
    }

    fn sample_segment(episode_id: &str, position: i64) -> Segment {
        Segment {
            id: Uuid::new_v4().to_string(),
            episode_id: episode_id.to_string(),
            start_seconds: position as f64 * 20.0,
            end_seconds: (position + 1) as f64 * 20.0,
            raw_text: format!("segment {}", position),
            display_text: format!("segment {}", position),
            speaker: "Speaker A".to_string(),
            confidence: 0.9,
            position,
        }
    }

    #[test]
    fn test_episode_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let mut episode = sample_episode();
        episode.description = Some("Show notes".to_string());

        store.insert_episode(&episode).unwrap();

        let loaded = store.get_episode(&episode.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Test Episode");
        assert_eq!(loaded.status, EpisodeStatus::Pending);
        assert_eq!(loaded.description.as_deref(), Some("Show notes"));

        episode.advance(EpisodeStatus::Downloading).unwrap();
        episode.summary = Some("A summary".to_string());
        store.update_episode(&episode).unwrap();

        let loaded = store.get_episode(&episode.id).unwrap().unwrap();
        assert_eq!(loaded.status, EpisodeStatus::Downloading);
        assert_eq!(loaded.summary.as_deref(), Some("A summary"));

        let by_video = store
            .find_episode_by_video_id("vid00000001")
            .unwrap()
            .unwrap();
        assert_eq!(by_video.id, episode.id);
    }

    #[test]
    fn test_update_missing_episode_fails() {
        let store = SqliteStore::in_memory().unwrap();
        let episode = sample_episode();
        assert!(store.update_episode(&episode).is_err());
    }

    #[test]
    fn test_segments_replace_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let episode = sample_episode();
        store.insert_episode(&episode).unwrap();

        let segments: Vec<Segment> = (0..3).map(|i| sample_segment(&episode.id, i)).collect();
        store.replace_segments(&episode.id, &segments).unwrap();
        store.replace_segments(&episode.id, &segments).unwrap();

        let loaded = store.get_segments(&episode.id).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].position, 0);
        assert_eq!(loaded[2].position, 2);
    }

    #[test]
    fn test_insight_dedup_on_insert() {
        let store = SqliteStore::in_memory().unwrap();
        let episode = sample_episode();
        store.insert_episode(&episode).unwrap();

        let insight = Insight::new(
            episode.id.clone(),
            InsightCategory::BusinessIdeas,
            "Sell the picks, not the gold".to_string(),
            0.9,
            0.0,
            60.0,
        );
        let duplicate = Insight::new(
            episode.id.clone(),
            InsightCategory::BusinessIdeas,
            "Sell the picks, not the gold".to_string(),
            0.8,
            120.0,
            180.0,
        );

        let inserted = store.insert_insights(&[insight, duplicate]).unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(store.get_insights(&episode.id).unwrap().len(), 1);
    }

    #[test]
    fn test_product_mention_upsert() {
        let store = SqliteStore::in_memory().unwrap();
        let ep1 = sample_episode();
        let mut ep2 = sample_episode();
        ep2.video_id = "vid00000002".to_string();
        store.insert_episode(&ep1).unwrap();
        store.insert_episode(&ep2).unwrap();

        let p = store
            .record_product_mention("Supabase", "supabase", &ep1.id)
            .unwrap();
        assert_eq!(p.mention_count, 1);
        assert_eq!(p.episode_ids.len(), 1);

        // Same episode again bumps the count but not the episode set
        let p = store
            .record_product_mention("SUPABASE", "supabase", &ep1.id)
            .unwrap();
        assert_eq!(p.mention_count, 2);
        assert_eq!(p.episode_ids.len(), 1);
        assert_eq!(p.name, "Supabase");

        let p = store
            .record_product_mention("Supabase", "supabase", &ep2.id)
            .unwrap();
        assert_eq!(p.mention_count, 3);
        assert_eq!(p.episode_ids.len(), 2);

        let products = store.list_products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].mention_count, 3);
    }

    #[test]
    fn test_links_upsert_enrichment() {
        let store = SqliteStore::in_memory().unwrap();
        let episode = sample_episode();
        store.insert_episode(&episode).unwrap();

        let mut link = Link::new(episode.id.clone(), "https://vercel.com".to_string(), 0);
        store.upsert_links(std::slice::from_ref(&link)).unwrap();

        link.title = Some("Vercel".to_string());
        link.enriched = true;
        store.upsert_links(std::slice::from_ref(&link)).unwrap();

        let loaded = store.get_links(&episode.id).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].enriched);
        assert_eq!(loaded[0].title.as_deref(), Some("Vercel"));
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let store = SqliteStore::in_memory().unwrap();
        let episode = sample_episode();
        store.insert_episode(&episode).unwrap();

        let records = vec![
            EmbeddingRecord {
                episode_id: episode.id.clone(),
                kind: EmbeddingKind::Segment,
                ref_id: "s1".to_string(),
                content: "aligned".to_string(),
                vector: vec![1.0, 0.0, 0.0],
            },
            EmbeddingRecord {
                episode_id: episode.id.clone(),
                kind: EmbeddingKind::Insight,
                ref_id: "i1".to_string(),
                content: "orthogonal".to_string(),
                vector: vec![0.0, 1.0, 0.0],
            },
        ];
        store.upsert_embeddings(&records).unwrap();

        let hits = store.search(&[1.0, 0.0, 0.0], 10, 0.5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ref_id, "s1");
        assert_eq!(hits[0].episode_title, "Test Episode");
        assert!((hits[0].score - 1.0).abs() < 0.001);

        let hits = store.search(&[1.0, 0.0, 0.0], 10, -1.0).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].ref_id, "s1");
    }

    #[test]
    fn test_delete_episode_cascades() {
        let store = SqliteStore::in_memory().unwrap();
        let episode = sample_episode();
        store.insert_episode(&episode).unwrap();
        store
            .replace_segments(&episode.id, &[sample_segment(&episode.id, 0)])
            .unwrap();
        store
            .upsert_links(&[Link::new(
                episode.id.clone(),
                "https://example.com".to_string(),
                0,
            )])
            .unwrap();

        assert!(store.delete_episode(&episode.id).unwrap());
        assert!(store.get_episode(&episode.id).unwrap().is_none());
        assert!(store.get_segments(&episode.id).unwrap().is_empty());
        assert!(store.get_links(&episode.id).unwrap().is_empty());
    }
}
