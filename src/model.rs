//! Plain data types shared across the pipeline.
//!
//! These mirror the `source / article / cluster / topic / clustertopic`
//! tables that `upsert_article_with_cluster` and the rest of the DB layer
//! operate on. The tables themselves are owned by the database migration,
//! not this crate; these structs are the typed view the Rust side works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A syndication source tracked in `public.source`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Source {
    pub id: i32,
    pub domain: String,
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// Status values a `Source` can be transitioned through by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Active,
    Validating,
    Verified,
    Error,
    Inactive,
}

impl SourceStatus {
    pub fn as_db_str(self) -> &'static str {
        match self {
            SourceStatus::Active => "active",
            SourceStatus::Validating => "validating",
            SourceStatus::Verified => "verified",
            SourceStatus::Error => "error",
            SourceStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// One canonical row derived from a feed item, ready to be handed to the
/// ingestion client. Field names follow the mapping in spec §4.2.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalArticleRow {
    pub url: String,
    pub url_image: Option<String>,
    pub url_type: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub guid: Option<String>,
    pub published_at: DateTime<Utc>,
    pub language: String,
    pub source_id: i32,
}

/// The tuple `upsert_article_with_cluster` returns for one inserted row.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ArticleInsertResult {
    pub cluster_id: i32,
    pub article_id: i32,
    pub score: f64,
    pub matched: bool,
    pub created_new: bool,
}

/// A taxonomy label row from `public.topic`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Topic {
    pub id: i32,
    pub title: String,
}

/// A scored label as produced by the classifier, prior to topic-id mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicScore {
    pub label: String,
    pub score: f64,
}

/// Minimal article projection used to build classifier prompts.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct ClusterArticle {
    pub title: String,
    pub summary: Option<String>,
}
