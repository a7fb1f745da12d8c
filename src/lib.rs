//! Podvault - Podcast Knowledge Vault
//!
//! A CLI tool that turns podcast episodes into a searchable knowledge
//! vault. Each episode is downloaded, transcribed with speaker
//! diarization, summarized, mined for categorized insights, product
//! mentions and links, and embedded for semantic search.
//!
//! # Architecture
//!
//! - `source`: resolves URLs/IDs to episode metadata (yt-dlp)
//! - `audio`: downloads and normalizes audio (yt-dlp/ffmpeg)
//! - `transcription`: speech-to-text with diarization (AssemblyAI)
//! - `grouping`: batches transcript segments for LLM calls
//! - `summary`, `insights`, `products`: LLM extraction stages
//! - `links`: URL mining and page metadata enrichment
//! - `embedding`: vector generation for semantic search (OpenAI)
//! - `store`: SQLite persistence and cosine-similarity search
//! - `pipeline`: orchestrates the stages with resume support

pub mod audio;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod grouping;
pub mod insights;
pub mod links;
pub mod llm;
pub mod model;
pub mod openai;
pub mod pipeline;
pub mod products;
pub mod retry;
pub mod source;
pub mod store;
pub mod summary;
pub mod transcription;

pub use error::{Result, VaultError};
