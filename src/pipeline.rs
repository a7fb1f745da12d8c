//! End-to-end episode processing pipeline.
//!
//! Stages run in a fixed order: metadata, audio, transcription, grouping,
//! summary, insights, products, links, embeddings. Each stage persists its
//! artifacts before the next starts, so a failed episode can be resumed
//! from the last completed stage. A failure marks the episode `Failed` and
//! surfaces the error attributed to the stage it occurred in.

use crate::audio::download_audio;
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Result, VaultError};
use crate::grouping::{group_segments, SegmentGroup};
use crate::insights::{dedupe_insights, InsightExtractor};
use crate::links::{extract_urls, LinkEnricher};
use crate::llm::create_model;
use crate::model::{Episode, EpisodeStatus, Insight, Link, Segment};
use crate::products::{ProductExtractor, ProductMention};
use crate::source::parse_input;
use crate::store::{EmbeddingKind, EmbeddingRecord, SqliteStore};
use crate::summary::Summarizer;
use crate::transcription::{create_transcriber, Transcriber, Utterance};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Outcome of a `process` invocation.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The pipeline ran to completion.
    Completed(Episode),
    /// The episode was already fully processed and was left untouched.
    AlreadyProcessed(Episode),
}

impl ProcessOutcome {
    pub fn episode(&self) -> &Episode {
        match self {
            ProcessOutcome::Completed(e) | ProcessOutcome::AlreadyProcessed(e) => e,
        }
    }
}

/// Orchestrates the full processing pipeline for episodes.
pub struct Pipeline {
    settings: Settings,
    store: Arc<SqliteStore>,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Summarizer,
    insight_extractor: InsightExtractor,
    product_extractor: ProductExtractor,
    enricher: LinkEnricher,
    embedder: Arc<dyn Embedder>,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    /// Build a pipeline with backends selected by the settings.
    pub fn new(settings: Settings, store: Arc<SqliteStore>) -> Result<Self> {
        let transcriber = create_transcriber(&settings.transcription);
        let embedder = create_embedder(&settings.embedding);
        Self::with_services(settings, store, transcriber, embedder)
    }

    /// Build a pipeline with explicit transcription/embedding services.
    pub fn with_services(
        settings: Settings,
        store: Arc<SqliteStore>,
        transcriber: Arc<dyn Transcriber>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let model = create_model(settings.pipeline.llm_backend);

        Ok(Self {
            summarizer: Summarizer::new(model.clone(), prompts.clone(), settings.summary.clone()),
            insight_extractor: InsightExtractor::new(
                model.clone(),
                prompts.clone(),
                settings.insights.clone(),
            ),
            product_extractor: ProductExtractor::new(model, prompts, settings.products.clone()),
            enricher: LinkEnricher::new(&settings.links),
            settings,
            store,
            transcriber,
            embedder,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag checked between stages; set it to stop after the current stage.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(VaultError::InvalidInput("Processing cancelled".to_string()));
        }
        Ok(())
    }

    /// Process a source URL or video ID end to end.
    #[instrument(skip(self))]
    pub async fn process(&self, input: &str, force: bool) -> Result<ProcessOutcome> {
        let (source, video_id) = parse_input(input).ok_or_else(|| {
            VaultError::InvalidInput(format!("Unrecognized source input: {}", input))
        })?;

        if let Some(existing) = self.store.find_episode_by_video_id(&video_id)? {
            match existing.status {
                EpisodeStatus::Processed if !force => {
                    info!("Episode {} already processed, skipping", existing.id);
                    return Ok(ProcessOutcome::AlreadyProcessed(existing));
                }
                EpisodeStatus::Failed if !force && !self.settings.pipeline.auto_resume => {
                    return Err(VaultError::InvalidInput(format!(
                        "Episode {} previously failed; run `resume {}` or use --force",
                        existing.id, existing.id
                    )));
                }
                EpisodeStatus::Failed if !force => {
                    info!("Auto-resuming failed episode {}", existing.id);
                    let episode = self.resume(&existing.id).await?;
                    return Ok(ProcessOutcome::Completed(episode));
                }
                _ => {
                    // Reprocess from scratch, dropping stale artifacts
                    info!("Reprocessing episode {} from scratch", existing.id);
                    self.store.delete_episode(&existing.id)?;
                }
            }
        }

        // The episode record exists from the moment the input is accepted,
        // so a vanished source still leaves a Failed episode behind. The
        // placeholder title is replaced once metadata arrives.
        let mut episode = Episode::new(
            video_id.clone(),
            video_id.clone(),
            source.canonical_url(&video_id),
        );
        self.store.insert_episode(&episode)?;

        let metadata = match source.fetch_metadata(&video_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                self.mark_failed(&mut episode);
                return Err(e.in_stage("metadata"));
            }
        };

        episode.title = metadata.title;
        episode.source_url = metadata.source_url;
        episode.description = metadata.description;
        episode.duration_seconds = metadata.duration_seconds;
        episode.published_at = metadata.published_at;
        self.store.update_episode(&episode)?;

        if let Some(duration) = episode.duration_seconds {
            let max = self.settings.transcription.max_duration_seconds as f64;
            if duration > max {
                self.mark_failed(&mut episode);
                return Err(VaultError::InvalidInput(format!(
                    "Media duration {:.0}s exceeds the {:.0}s limit",
                    duration, max
                )));
            }
        }

        self.run(&mut episode).await?;
        Ok(ProcessOutcome::Completed(episode))
    }

    /// Resume a failed or interrupted episode from its persisted artifacts.
    #[instrument(skip(self))]
    pub async fn resume(&self, episode_id: &str) -> Result<Episode> {
        let mut episode = self
            .store
            .get_episode(episode_id)?
            .ok_or_else(|| VaultError::InvalidInput(format!("No such episode: {}", episode_id)))?;

        if episode.status == EpisodeStatus::Processed {
            return Err(VaultError::InvalidInput(format!(
                "Episode {} is already processed",
                episode_id
            )));
        }

        // Rewind the status to match what is actually persisted; the run
        // then skips any stage whose artifacts already exist.
        let segments = self.store.get_segments(episode_id)?;
        episode.status = if segments.is_empty() {
            EpisodeStatus::Pending
        } else {
            EpisodeStatus::Transcribing
        };
        self.store.update_episode(&episode)?;

        info!("Resuming episode {} from {}", episode_id, episode.status);
        self.run(&mut episode).await?;
        Ok(episode)
    }

    /// Run all remaining stages for an episode.
    ///
    /// On error the episode is marked `Failed` before the error is
    /// returned, attributed to the stage it occurred in.
    pub async fn run(&self, episode: &mut Episode) -> Result<()> {
        match self.run_stages(episode).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.mark_failed(episode);
                Err(e)
            }
        }
    }

    fn mark_failed(&self, episode: &mut Episode) {
        if episode.status.can_transition_to(EpisodeStatus::Failed) {
            episode.status = EpisodeStatus::Failed;
            if let Err(store_err) = self.store.update_episode(episode) {
                warn!("Failed to record failure status: {}", store_err);
            }
        }
    }

    async fn run_stages(&self, episode: &mut Episode) -> Result<()> {
        let mut segments = self.store.get_segments(&episode.id)?;

        if segments.is_empty() {
            self.check_cancelled()?;
            let audio_path = self
                .acquire_audio(episode)
                .await
                .map_err(|e| e.in_stage("audio"))?;

            self.check_cancelled()?;
            segments = self
                .transcribe(episode, &audio_path)
                .await
                .map_err(|e| e.in_stage("transcription"))?;
        }

        let groups = group_segments(&segments, self.settings.grouping.max_group_chars);
        info!("{} segments in {} groups", segments.len(), groups.len());

        if episode.summary.is_none() {
            self.check_cancelled()?;
            let transcript = segments
                .iter()
                .map(|s| format!("{}: {}", s.speaker, s.display_text))
                .collect::<Vec<_>>()
                .join("\n");

            let summary = self
                .summarizer
                .summarize(&transcript)
                .await
                .map_err(|e| e.in_stage("summary"))?;
            episode.summary = Some(summary);
            self.store.update_episode(episode)?;
        }

        self.check_cancelled()?;
        self.extract_insights(episode, &groups)
            .await
            .map_err(|e| e.in_stage("insights"))?;

        self.check_cancelled()?;
        self.extract_products(episode, &groups)
            .await
            .map_err(|e| e.in_stage("products"))?;

        self.check_cancelled()?;
        self.collect_links(episode, &segments)
            .await
            .map_err(|e| e.in_stage("links"))?;

        self.check_cancelled()?;
        self.generate_embeddings(episode, &segments)
            .await
            .map_err(|e| e.in_stage("embedding"))?;

        episode.advance(EpisodeStatus::Processed)?;
        self.store.update_episode(episode)?;
        info!("Episode {} processed", episode.id);

        if !self.settings.pipeline.keep_audio {
            if let Some(path) = &episode.audio_path {
                let _ = std::fs::remove_file(path);
            }
        }

        Ok(())
    }

    async fn acquire_audio(&self, episode: &mut Episode) -> Result<std::path::PathBuf> {
        if episode.status == EpisodeStatus::Pending {
            episode.advance(EpisodeStatus::Downloading)?;
            self.store.update_episode(episode)?;
        }

        if let Some(path) = &episode.audio_path {
            let path = std::path::PathBuf::from(path);
            if path.exists() {
                info!("Reusing downloaded audio at {:?}", path);
                return Ok(path);
            }
        }

        let audio_dir = self.settings.audio_dir();
        let audio = download_audio(&episode.source_url, &episode.video_id, &audio_dir).await?;

        let max = self.settings.transcription.max_duration_seconds as f64;
        if audio.duration_seconds > max {
            return Err(VaultError::InvalidInput(format!(
                "Audio duration {:.0}s exceeds the {:.0}s limit",
                audio.duration_seconds, max
            )));
        }

        episode.audio_path = Some(audio.path.to_string_lossy().to_string());
        if episode.duration_seconds.is_none() {
            episode.duration_seconds = Some(audio.duration_seconds);
        }
        self.store.update_episode(episode)?;

        Ok(audio.path)
    }

    async fn transcribe(&self, episode: &mut Episode, audio_path: &Path) -> Result<Vec<Segment>> {
        if episode.status != EpisodeStatus::Transcribing {
            episode.advance(EpisodeStatus::Transcribing)?;
            self.store.update_episode(episode)?;
        }

        let mut utterances = self.transcriber.transcribe(audio_path).await?;
        if utterances.is_empty() {
            return Err(VaultError::TranscriptionRejected(
                "Transcription produced no utterances".to_string(),
            ));
        }

        // Segment order within an episode follows start time, not the
        // backend's delivery order.
        utterances.sort_by(|a, b| {
            a.start_seconds
                .partial_cmp(&b.start_seconds)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let segments: Vec<Segment> = utterances
            .into_iter()
            .enumerate()
            .map(|(i, u)| utterance_to_segment(&episode.id, u, i as i64))
            .collect();

        self.store.replace_segments(&episode.id, &segments)?;
        Ok(segments)
    }

    async fn extract_insights(&self, episode: &Episode, groups: &[SegmentGroup]) -> Result<()> {
        let existing = self.store.get_insights(&episode.id)?;

        let concurrency = self.settings.insights.max_concurrent_groups.max(1);
        let per_group: Vec<Vec<Insight>> = stream::iter(
            groups
                .iter()
                .map(|group| self.insight_extractor.extract(&episode.id, group)),
        )
        .buffer_unordered(concurrency)
        .try_collect()
        .await?;

        let extracted: Vec<Insight> = per_group.into_iter().flatten().collect();
        let fresh = dedupe_insights(&existing, extracted);
        let inserted = self.store.insert_insights(&fresh)?;
        info!("Stored {} new insights", inserted);
        Ok(())
    }

    async fn extract_products(&self, episode: &Episode, groups: &[SegmentGroup]) -> Result<()> {
        let known = self.store.known_product_names()?;
        let known_normalized: Vec<String> = known.iter().map(|(_, n)| n.clone()).collect();

        // Products whose registry entry already lists this episode were
        // recorded by an earlier run; skip them so resume does not double
        // count.
        let already_recorded: HashSet<String> = self
            .store
            .list_products()?
            .into_iter()
            .filter(|p| p.episode_ids.contains(&episode.id))
            .map(|p| p.normalized_name)
            .collect();

        let mut mentions: HashMap<String, ProductMention> = HashMap::new();
        for group in groups {
            for mention in self
                .product_extractor
                .extract(group, &known_normalized)
                .await?
            {
                mentions
                    .entry(mention.normalized_name.clone())
                    .or_insert(mention);
            }
        }

        let mut recorded = 0;
        for mention in mentions.values() {
            if already_recorded.contains(&mention.normalized_name) {
                continue;
            }
            self.store.record_product_mention(
                &mention.name,
                &mention.normalized_name,
                &episode.id,
            )?;
            recorded += 1;
        }

        info!("Recorded {} product mentions", recorded);
        Ok(())
    }

    async fn collect_links(&self, episode: &Episode, segments: &[Segment]) -> Result<()> {
        if !self.store.get_links(&episode.id)?.is_empty() {
            return Ok(());
        }

        let mut corpus = episode.description.clone().unwrap_or_default();
        for segment in segments {
            corpus.push('\n');
            corpus.push_str(&segment.display_text);
        }
        for insight in self.store.get_insights(&episode.id)? {
            corpus.push('\n');
            corpus.push_str(&insight.content);
        }

        let mut links: Vec<Link> = extract_urls(&corpus)
            .into_iter()
            .enumerate()
            .map(|(i, url)| Link::new(episode.id.clone(), url, i as i64))
            .collect();

        if self.settings.links.enrich {
            for link in &mut links {
                match self.enricher.enrich(&link.url).await {
                    Ok(metadata) => {
                        link.title = metadata.title;
                        link.description = metadata.description;
                        link.enriched = true;
                    }
                    // Enrichment is best-effort; the bare link is kept
                    Err(e) => warn!("Enrichment skipped for {}: {}", link.url, e),
                }
            }
        }

        info!("Stored {} links", links.len());
        self.store.upsert_links(&links)?;
        Ok(())
    }

    async fn generate_embeddings(&self, episode: &Episode, segments: &[Segment]) -> Result<()> {
        let insights = self.store.get_insights(&episode.id)?;

        let mut records: Vec<EmbeddingRecord> = Vec::with_capacity(segments.len() + insights.len());
        for segment in segments {
            records.push(EmbeddingRecord {
                episode_id: episode.id.clone(),
                kind: EmbeddingKind::Segment,
                ref_id: segment.id.clone(),
                content: segment.display_text.clone(),
                vector: Vec::new(),
            });
        }
        for insight in &insights {
            records.push(EmbeddingRecord {
                episode_id: episode.id.clone(),
                kind: EmbeddingKind::Insight,
                ref_id: insight.id.clone(),
                content: insight.content.clone(),
                vector: Vec::new(),
            });
        }

        let texts: Vec<String> = records.iter().map(|r| r.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let expected = self.embedder.dimensions();
        for (record, vector) in records.iter_mut().zip(vectors) {
            if vector.len() != expected {
                return Err(VaultError::EmbeddingFailed(format!(
                    "Expected {} dimensions, got {}",
                    expected,
                    vector.len()
                )));
            }
            record.vector = vector;
        }

        let stored = self.store.upsert_embeddings(&records)?;
        info!("Stored {} embeddings", stored);
        Ok(())
    }

    /// Embed a query and rank stored content against it.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<crate::store::SearchHit>> {
        let vector = self.embedder.embed(query).await?;
        self.store.search(&vector, limit, min_score)
    }
}

fn utterance_to_segment(episode_id: &str, utterance: Utterance, position: i64) -> Segment {
    Segment {
        id: Uuid::new_v4().to_string(),
        episode_id: episode_id.to_string(),
        start_seconds: utterance.start_seconds,
        end_seconds: utterance.end_seconds,
        raw_text: utterance.text.clone(),
        display_text: utterance.text,
        speaker: utterance.speaker,
        confidence: utterance.confidence,
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use crate::embedding::SimulatedEmbedder;
    use crate::model::InsightCategory;
    use crate::transcription::SimulatedTranscriber;
    use async_trait::async_trait;

    fn test_settings() -> Settings {
        let mut settings = Settings::default();
        settings.transcription.backend = Backend::Simulated;
        settings.pipeline.llm_backend = Backend::Simulated;
        settings.pipeline.keep_audio = true;
        settings.embedding.backend = Backend::Simulated;
        settings.embedding.dimensions = 16;
        settings.links.enrich = false;
        settings
    }

    fn test_pipeline(store: Arc<SqliteStore>) -> Pipeline {
        Pipeline::with_services(
            test_settings(),
            store,
            Arc::new(SimulatedTranscriber::new(2).with_duration(240.0)),
            Arc::new(SimulatedEmbedder::new(16)),
        )
        .unwrap()
    }

    fn seeded_episode(store: &SqliteStore) -> Episode {
        let mut episode = Episode::new(
            "Two Builders Talk Shop".to_string(),
            "dQw4w9WgXcQ".to_string(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
        );
        episode.description =
            Some("Show notes: https://supabase.com and https://vercel.com".to_string());

        let audio = tempfile::Builder::new()
            .suffix(".mp3")
            .tempfile()
            .unwrap()
            .keep()
            .unwrap();
        episode.audio_path = Some(audio.1.to_string_lossy().to_string());

        store.insert_episode(&episode).unwrap();
        episode
    }

    #[tokio::test]
    async fn test_full_run_two_speakers() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = test_pipeline(store.clone());
        let mut episode = seeded_episode(&store);

        pipeline.run(&mut episode).await.unwrap();

        assert_eq!(episode.status, EpisodeStatus::Processed);
        assert!(episode.processed);

        // Summary lands in the configured word range
        let summary = episode.summary.as_ref().unwrap();
        let words = summary.split_whitespace().count();
        assert!((150..=250).contains(&words), "word count was {}", words);

        // Both speakers transcribed, in order
        let segments = store.get_segments(&episode.id).unwrap();
        assert!(!segments.is_empty());
        let speakers: HashSet<&str> = segments.iter().map(|s| s.speaker.as_str()).collect();
        assert_eq!(speakers.len(), 2);

        // Multiple insight categories present
        let insights = store.get_insights(&episode.id).unwrap();
        let categories: HashSet<InsightCategory> = insights.iter().map(|i| i.category).collect();
        assert!(categories.len() >= 2);

        // One embedding per segment and insight, at the configured width
        let counts = store.episode_counts(&episode.id).unwrap();
        assert_eq!(counts.embeddings, counts.segments + counts.insights);

        let hits = pipeline.search("frameworks", 5, -1.0).await.unwrap();
        assert!(!hits.is_empty());

        // Links mined from the description
        let links = store.get_links(&episode.id).unwrap();
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert!(urls.contains(&"https://supabase.com"));
        assert!(urls.contains(&"https://vercel.com"));
    }

    #[tokio::test]
    async fn test_failure_marks_episode_failed() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = test_pipeline(store.clone());

        // No audio path and an unreachable source: the audio stage fails
        let mut episode = Episode::new(
            "Missing".to_string(),
            "aaaaaaaaaaa".to_string(),
            "https://www.youtube.com/watch?v=aaaaaaaaaaa".to_string(),
        );
        store.insert_episode(&episode).unwrap();

        let err = pipeline.run(&mut episode).await.unwrap_err();
        assert_eq!(err.stage(), Some("audio"));

        let stored = store.get_episode(&episode.id).unwrap().unwrap();
        assert_eq!(stored.status, EpisodeStatus::Failed);

        let counts = store.episode_counts(&episode.id).unwrap();
        assert_eq!(counts.segments, 0);
        assert_eq!(counts.insights, 0);
        assert_eq!(counts.embeddings, 0);
    }

    #[tokio::test]
    async fn test_resume_skips_transcription() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = test_pipeline(store.clone());
        let mut episode = seeded_episode(&store);

        pipeline.run(&mut episode).await.unwrap();
        let first_segments = store.get_segments(&episode.id).unwrap();

        // Simulate a later failure and resume
        let mut failed = store.get_episode(&episode.id).unwrap().unwrap();
        failed.status = EpisodeStatus::Failed;
        failed.processed = false;
        failed.summary = None;
        store.update_episode(&failed).unwrap();

        let resumed = pipeline.resume(&episode.id).await.unwrap();
        assert_eq!(resumed.status, EpisodeStatus::Processed);
        assert!(resumed.summary.is_some());

        // Segments survived untouched
        let second_segments = store.get_segments(&episode.id).unwrap();
        assert_eq!(first_segments, second_segments);
    }

    #[tokio::test]
    async fn test_resume_is_idempotent_for_products() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = test_pipeline(store.clone());
        let mut episode = seeded_episode(&store);

        pipeline.run(&mut episode).await.unwrap();
        let before = store.list_products().unwrap();

        let mut failed = store.get_episode(&episode.id).unwrap().unwrap();
        failed.status = EpisodeStatus::Failed;
        failed.processed = false;
        store.update_episode(&failed).unwrap();

        pipeline.resume(&episode.id).await.unwrap();
        let after = store.list_products().unwrap();

        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.normalized_name, a.normalized_name);
            assert_eq!(b.mention_count, a.mention_count);
        }
    }

    #[tokio::test]
    async fn test_resume_processed_episode_rejected() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = test_pipeline(store.clone());
        let mut episode = seeded_episode(&store);

        pipeline.run(&mut episode).await.unwrap();
        assert!(pipeline.resume(&episode.id).await.is_err());
    }

    #[tokio::test]
    async fn test_unavailable_source_marks_failed_episode() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = test_pipeline(store.clone());

        // Metadata fetch fails for this ID whether yt-dlp is missing or
        // the video does not exist
        let err = pipeline.process("aaaaaaaaaaa", false).await.unwrap_err();
        assert_eq!(err.stage(), Some("metadata"));

        // The submitted episode is recorded and marked Failed
        let episode = store
            .find_episode_by_video_id("aaaaaaaaaaa")
            .unwrap()
            .unwrap();
        assert_eq!(episode.status, EpisodeStatus::Failed);

        let counts = store.episode_counts(&episode.id).unwrap();
        assert_eq!(counts.segments, 0);
        assert_eq!(counts.insights, 0);
        assert_eq!(counts.links, 0);
        assert_eq!(counts.embeddings, 0);
    }

    /// Delivers utterances out of order, as a flaky backend might.
    struct ScrambledTranscriber;

    #[async_trait]
    impl Transcriber for ScrambledTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Vec<Utterance>> {
            let turn = |start: f64, text: &str, speaker: &str| Utterance {
                start_seconds: start,
                end_seconds: start + 20.0,
                text: text.to_string(),
                speaker: speaker.to_string(),
                confidence: 0.9,
            };

            Ok(vec![
                turn(40.0, "the third thing said", "Speaker A"),
                turn(0.0, "the first thing said", "Speaker A"),
                turn(20.0, "the second thing said", "Speaker B"),
            ])
        }
    }

    #[tokio::test]
    async fn test_segments_ordered_by_start_time() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = Pipeline::with_services(
            test_settings(),
            store.clone(),
            Arc::new(ScrambledTranscriber),
            Arc::new(SimulatedEmbedder::new(16)),
        )
        .unwrap();
        let mut episode = seeded_episode(&store);

        pipeline.run(&mut episode).await.unwrap();

        let segments = store.get_segments(&episode.id).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].display_text, "the first thing said");
        assert_eq!(segments[2].display_text, "the third thing said");

        // Ordered, non-overlapping, sequential positions
        for (i, pair) in segments.windows(2).enumerate() {
            assert!(pair[0].end_seconds <= pair[1].start_seconds);
            assert_eq!(pair[0].position, i as i64);
        }
    }

    #[tokio::test]
    async fn test_links_mined_from_insight_content() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = test_pipeline(store.clone());
        let mut episode = seeded_episode(&store);

        let insight = Insight::new(
            episode.id.clone(),
            InsightCategory::Products,
            "The deployment walkthrough at https://railway.app covers the setup.".to_string(),
            0.9,
            0.0,
            20.0,
        );
        store.insert_insights(std::slice::from_ref(&insight)).unwrap();

        pipeline.run(&mut episode).await.unwrap();

        let urls: Vec<String> = store
            .get_links(&episode.id)
            .unwrap()
            .into_iter()
            .map(|l| l.url)
            .collect();
        assert!(urls.contains(&"https://railway.app".to_string()));
    }

    #[tokio::test]
    async fn test_cancellation_between_stages() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pipeline = test_pipeline(store.clone());
        let mut episode = seeded_episode(&store);

        pipeline.cancel_handle().store(true, Ordering::SeqCst);
        let err = pipeline.run(&mut episode).await.unwrap_err();
        assert!(err.to_string().contains("cancelled"));

        let stored = store.get_episode(&episode.id).unwrap().unwrap();
        assert_eq!(stored.status, EpisodeStatus::Failed);
    }
}
