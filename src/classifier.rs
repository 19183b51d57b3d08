//! Topic Classifier: builds the per-cluster prompt, runs the LLM scorer,
//! recovers a usable label→score mapping through the fallback ladder, and
//! persists the top-K topics for a cluster, per spec §4.4.

use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use sqlx::PgPool;
use tracing::warn;

use crate::db;
use crate::errors::IngestError;
use crate::metrics::CLASSIFIER_RESULT_COUNTER;
use crate::model::{ClusterArticle, TopicScore};

const MAX_PROMPT_TEXT_CHARS: usize = 2000;
/// Token-generation cap for the single-item flat-label-map prompt shape.
pub const DEFAULT_SINGLE_MAX_TOKENS: u32 = 512;
/// Token-generation cap for the cluster-wide `{"topics":[...]}` prompt shape.
const DEFAULT_BULK_MAX_TOKENS: u32 = 256;
const MIN_GENERATION_TOKENS: u32 = 8;

/// English-only taxonomy the classifier persists topics against. Kept
/// data-driven per spec §9's guidance.
pub const TOPIC_TAXONOMY: &[&str] = &[
    "Politics",
    "Business",
    "Tech",
    "Science",
    "Health",
    "Sports",
    "Entertainment",
    "Culture",
    "Education",
    "Travel",
    "Cars",
    "Finance",
    "Crime",
    "War",
];

/// `normKey(s) = lowercase(trim(s))` with spaces, underscores, and dashes
/// removed, used to map emitted labels back to known topic titles.
pub fn norm_key(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect()
}

/// Multilingual (RU/DE/ES/EN) synonym table mapping onto the English
/// taxonomy, ported from the original classifier's canonicalization map.
static CANONICAL_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("politics", "Politics"),
        ("business", "Business"),
        ("tech", "Tech"),
        ("technology", "Tech"),
        ("science", "Science"),
        ("health", "Health"),
        ("sports", "Sports"),
        ("sport", "Sports"),
        ("entertainment", "Entertainment"),
        ("culture", "Culture"),
        ("education", "Education"),
        ("travel", "Travel"),
        ("cars", "Cars"),
        ("auto", "Cars"),
        ("finance", "Finance"),
        ("crime", "Crime"),
        ("war", "War"),
        ("политика", "Politics"),
        ("бизнес", "Business"),
        ("экономика", "Business"),
        ("технологии", "Tech"),
        ("техника", "Tech"),
        ("наука", "Science"),
        ("здоровье", "Health"),
        ("спорт", "Sports"),
        ("развлечения", "Entertainment"),
        ("культура", "Culture"),
        ("образование", "Education"),
        ("путешествия", "Travel"),
        ("туризм", "Travel"),
        ("авто", "Cars"),
        ("машины", "Cars"),
        ("финансы", "Finance"),
        ("криминал", "Crime"),
        ("преступления", "Crime"),
        ("война", "War"),
        ("конфликт", "War"),
        ("фронт", "War"),
        ("politik", "Politics"),
        ("wirtschaft", "Business"),
        ("technik", "Tech"),
        ("wissenschaft", "Science"),
        ("gesundheit", "Health"),
        ("unterhaltung", "Entertainment"),
        ("kultur", "Culture"),
        ("bildung", "Education"),
        ("reisen", "Travel"),
        ("autos", "Cars"),
        ("finanzen", "Finance"),
        ("kriminalität", "Crime"),
        ("krieg", "War"),
        ("política", "Politics"),
        ("negocios", "Business"),
        ("empresa", "Business"),
        ("tecnología", "Tech"),
        ("ciencia", "Science"),
        ("salud", "Health"),
        ("deportes", "Sports"),
        ("entretenimiento", "Entertainment"),
        ("cultura", "Culture"),
        ("educación", "Education"),
        ("viajes", "Travel"),
        ("coches", "Cars"),
        ("finanzas", "Finance"),
        ("crimen", "Crime"),
        ("delito", "Crime"),
        ("guerra", "War"),
    ])
});

/// Keyword table backing the keyword-heuristic fallback scorer, supplemental
/// per SPEC_FULL.md §4.4.
static TOPIC_KEYWORDS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        (
            "Politics",
            [
                "политик", "дума", "парламент", "выбор", "санкц", "президент", "ministry",
                "parliament", "election", "sanction", "president", "bundestag", "regierung",
                "wahl",
            ]
            .as_slice(),
        ),
        (
            "Business",
            [
                "бизнес", "компания", "рынок", "банк", "сделка", "инвести", "company", "market",
                "bank", "deal", "merger", "ipo", "unternehmen", "markt", "firma", "fusion",
            ]
            .as_slice(),
        ),
        (
            "Tech",
            [
                "технол", "ит", "софт", "стартап", "искусств", "алгоритм", "крипто", "tech",
                "software", "ai", "startup", "algorithm", "crypto", "technik", "ki",
            ]
            .as_slice(),
        ),
        (
            "Science",
            [
                "ученые", "исслед", "наука", "эксперимент", "космос", "scientist", "research",
                "study", "experiment", "space", "wissenschaft", "forschung",
            ]
            .as_slice(),
        ),
        (
            "Health",
            [
                "здоров", "врач", "медици", "вакцин", "болезн", "health", "doctor", "medical",
                "vaccine", "disease", "gesundheit", "arzt", "medizin",
            ]
            .as_slice(),
        ),
        (
            "Sports",
            [
                "спорт", "матч", "турнир", "лига", "гол", "футбол", "хоккей", "sport", "match",
                "tournament", "league", "goal", "football", "soccer", "spiel", "liga", "tor",
            ]
            .as_slice(),
        ),
        (
            "Entertainment",
            [
                "кино", "фильм", "сериал", "шоу", "певец", "актёр", "звезда", "movie", "film",
                "series", "show", "singer", "actor", "celebrity", "unterhaltung", "serie",
            ]
            .as_slice(),
        ),
        (
            "Culture",
            [
                "культура", "театр", "музей", "книг", "литерат", "выставк", "culture", "theatre",
                "museum", "book", "literature", "exhibit", "kultur", "theater",
            ]
            .as_slice(),
        ),
        (
            "Education",
            [
                "образован", "университет", "школ", "студент", "экзамен", "education",
                "university", "school", "student", "exam", "bildung", "schule", "universität",
            ]
            .as_slice(),
        ),
        (
            "Travel",
            [
                "туризм", "путешеств", "виза", "аэропорт", "рейс", "отель", "travel", "tourism",
                "visa", "airport", "flight", "hotel", "reise", "flug",
            ]
            .as_slice(),
        ),
        (
            "Cars",
            [
                "авто", "машин", "электромоб", "tesla", "двигател", "дтп", "car", "auto",
                "vehicle", "ev", "engine", "accident", "fahrzeug",
            ]
            .as_slice(),
        ),
        (
            "Finance",
            [
                "финанс", "акция", "облигац", "ставка", "курс", "рубл", "доллар", "finance",
                "stock", "bond", "rate", "usd", "eur", "finanz", "aktie", "anleihe", "zins",
            ]
            .as_slice(),
        ),
        (
            "Crime",
            [
                "криминал", "убий", "краж", "арест", "полици", "суд", "crime", "murder", "theft",
                "arrest", "police", "court", "kriminalität", "mord", "diebstahl", "verhaftung",
            ]
            .as_slice(),
        ),
        (
            "War",
            [
                "война", "фронт", "армия", "удар", "ракет", "боестолк", "конфликт", "war",
                "front", "army", "strike", "missile", "conflict", "krieg", "armee", "konflikt",
            ]
            .as_slice(),
        ),
    ])
});

/// Maps a raw, possibly multilingual, possibly mixed-case label onto the
/// fixed English taxonomy, or `None` if no entry matches.
pub fn canonicalize_topic(raw: &str) -> Option<&'static str> {
    let key = raw.trim().to_lowercase();
    CANONICAL_SYNONYMS.get(key.as_str()).copied()
}

fn to_lower_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim().to_string()
}

/// Keyword-heuristic fallback scorer: counts keyword hits per topic and
/// scores each relative to the topic with the most hits. Returns up to
/// three topics, highest first; empty if nothing matched.
pub fn heuristic_topics_from_text(text: &str) -> Vec<TopicScore> {
    let normalized = to_lower_words(text);
    let mut hits: Vec<(&'static str, usize)> = Vec::new();
    let mut max_hit = 0usize;

    for (topic, keywords) in TOPIC_KEYWORDS.iter() {
        let count = keywords.iter().filter(|kw| normalized.contains(*kw)).count();
        if count > 0 {
            hits.push((topic, count));
            max_hit = max_hit.max(count);
        }
    }

    if max_hit == 0 {
        return Vec::new();
    }

    hits.sort_by(|a, b| b.1.cmp(&a.1));
    hits.truncate(3);
    hits.into_iter()
        .map(|(topic, count)| TopicScore {
            label: topic.to_string(),
            score: count as f64 / max_hit as f64,
        })
        .collect()
}

/// Inputs and outputs of the LLM scorer contract, external to this crate.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Scores `text` against `labels` (the full taxonomy), tagged with
    /// `lang`. Returns raw model output text; parsing and recovery happen
    /// in this module, not the client.
    async fn classify_raw(
        &self,
        text: &str,
        labels: &[&str],
        lang: &str,
        max_tokens: u32,
    ) -> Result<String, IngestError>;
}

/// Talks to a locally-run chat-completion HTTP endpoint serving a
/// constrained-decoding-capable small model, per SPEC_FULL.md §4.4.
pub struct HttpLlmClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLlmClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    fn build_prompt(text: &str, labels: &[&str]) -> String {
        let allowed = labels
            .iter()
            .map(|l| format!("\"{l}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "<|im_start|>system\n\
             You are a JSON-only classifier. Output strictly JSON, no prose.\n\
             Return 1 to 3 topics ONLY from the Allowed list, with scores 0..1.\n\
             Schema: {{\"topics\":[{{\"title\":\"<topic>\",\"score\":<float>}}, ...]}}\n\
             Use EXACT English labels from the Allowed list.\n\
             <|im_end|>\n\
             <|im_start|>user\n\
             Allowed: [{allowed}]\n\
             Text:\n<<<\n{text}\n>>>\n\
             Answer with JSON only.\n\
             <|im_end|>\n\
             <|im_start|>assistant\n{{"
        )
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn classify_raw(
        &self,
        text: &str,
        labels: &[&str],
        _lang: &str,
        max_tokens: u32,
    ) -> Result<String, IngestError> {
        let prompt = Self::build_prompt(text, labels);
        let max_tokens = max_tokens.max(MIN_GENERATION_TOKENS);

        // `min_tokens` forbids the end-of-sequence token before this many
        // tokens have been emitted (spec §4.4's "at least eight tokens"
        // generation policy); this is the vLLM OpenAI-compatible
        // completions field for exactly that constraint. A runtime whose
        // HTTP contract lacks an equivalent knob will just ignore it.
        let body = serde_json::json!({
            "prompt": prompt,
            "max_tokens": max_tokens,
            "min_tokens": MIN_GENERATION_TOKENS,
            "temperature": 0.0,
            "stop": ["<|im_end|>", "}"],
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| IngestError::Llm(format!("request failed: {e}")))?;

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IngestError::Llm(format!("invalid response body: {e}")))?;

        value
            .get("text")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| IngestError::Llm("response missing `text` field".to_string()))
    }
}

/// Fixed-response client for tests, mirroring the teacher-adjacent
/// `MockLlmAdapter` pattern.
pub struct MockLlmClient {
    pub response: String,
}

impl MockLlmClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn classify_raw(
        &self,
        _text: &str,
        _labels: &[&str],
        _lang: &str,
        _max_tokens: u32,
    ) -> Result<String, IngestError> {
        Ok(self.response.clone())
    }
}

/// Extracts the largest `{...}` substring from `raw`, per the cluster-wide
/// prompt's recovery rule.
fn largest_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

fn normalize_scores(scores: &mut Vec<TopicScore>) {
    let sum: f64 = scores.iter().map(|s| s.score).sum();
    if sum > 0.0 {
        for s in scores.iter_mut() {
            s.score /= sum;
        }
    }
}

/// Parses the cluster-wide prompt's `{"topics":[{"title":...,"score":...}]}`
/// shape. Unknown keys are dropped via `labels`; at least one known label
/// with a positive score is required for this path to count as success.
fn parse_topics_object(raw: &str, labels: &[&str]) -> Option<Vec<TopicScore>> {
    let candidate = largest_json_object(raw)?;
    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    let topics = value.get("topics")?.as_array()?;

    let mut out = Vec::new();
    for entry in topics {
        let title = entry.get("title")?.as_str()?;
        let score = entry.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0);
        if labels.iter().any(|l| *l == title) && score > 0.0 {
            out.push(TopicScore {
                label: title.to_string(),
                score: clamp_unit(score),
            });
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Parses a flat `{"label": score, ...}` object (the single-item prompt
/// shape). Unknown keys are zeroed out; succeeds only if at least one
/// known label has a positive value.
fn parse_flat_object(raw: &str, labels: &[&str]) -> Option<Vec<TopicScore>> {
    let candidate = largest_json_object(raw)?;
    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    let map = value.as_object()?;

    let mut out = Vec::new();
    for label in labels {
        if let Some(score) = map.get(*label).and_then(|v| v.as_f64()) {
            if score > 0.0 {
                out.push(TopicScore {
                    label: label.to_string(),
                    score: clamp_unit(score),
                });
            }
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Case-insensitive exact-then-substring match of the raw stripped output
/// against the label set (recovery step 2).
fn match_single_label(raw: &str, labels: &[&str]) -> Option<TopicScore> {
    let stripped = raw.trim().trim_matches(|c: char| !c.is_alphanumeric());
    let lower = stripped.to_lowercase();
    if lower.is_empty() {
        return None;
    }

    for label in labels {
        if label.to_lowercase() == lower {
            return Some(TopicScore {
                label: label.to_string(),
                score: 1.0,
            });
        }
    }
    for label in labels {
        if lower.contains(&label.to_lowercase()) {
            return Some(TopicScore {
                label: label.to_string(),
                score: 1.0,
            });
        }
    }
    None
}

/// Runs the full recovery ladder from spec §4.4 against raw LLM output for
/// the single-item flat-object prompt shape.
pub fn recover_scores(raw: &str, labels: &[&str]) -> Vec<TopicScore> {
    if let Some(mut scores) = parse_flat_object(raw, labels) {
        CLASSIFIER_RESULT_COUNTER.with_label_values(&["json"]).inc();
        normalize_scores(&mut scores);
        return scores;
    }

    if let Some(hit) = match_single_label(raw, labels) {
        CLASSIFIER_RESULT_COUNTER.with_label_values(&["single_label_match"]).inc();
        return vec![hit];
    }

    CLASSIFIER_RESULT_COUNTER.with_label_values(&["uniform"]).inc();
    let uniform_score = 1.0 / labels.len().max(1) as f64;
    labels
        .iter()
        .map(|l| TopicScore {
            label: l.to_string(),
            score: uniform_score,
        })
        .collect()
}

/// Runs the cluster-wide `{"topics":[...]}` recovery path: strict JSON,
/// then case-insensitive single-label match (spec §8 scenario 6), then the
/// keyword-heuristic supplement, then uniform.
pub fn recover_cluster_scores(raw: &str, labels: &[&str], fallback_text: &str) -> Vec<TopicScore> {
    if let Some(mut scores) = parse_topics_object(raw, labels) {
        CLASSIFIER_RESULT_COUNTER.with_label_values(&["json"]).inc();
        normalize_scores(&mut scores);
        return scores;
    }

    if let Some(hit) = match_single_label(raw, labels) {
        CLASSIFIER_RESULT_COUNTER.with_label_values(&["single_label_match"]).inc();
        return vec![hit];
    }

    let heuristic = heuristic_topics_from_text(fallback_text);
    if !heuristic.is_empty() {
        CLASSIFIER_RESULT_COUNTER
            .with_label_values(&["keyword_heuristic"])
            .inc();
        return heuristic;
    }

    CLASSIFIER_RESULT_COUNTER.with_label_values(&["uniform"]).inc();
    let uniform_score = 1.0 / labels.len().max(1) as f64;
    labels
        .iter()
        .map(|l| TopicScore {
            label: l.to_string(),
            score: uniform_score,
        })
        .collect()
}

/// Builds the sample text for one cluster from its most recent articles,
/// per spec §4.4 step 1.
pub fn build_cluster_text(articles: &[ClusterArticle]) -> String {
    for article in articles {
        let mut text = article.title.clone();
        if let Some(summary) = &article.summary {
            if !summary.trim().is_empty() {
                text.push_str(". ");
                text.push_str(summary);
            }
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return trimmed.chars().take(MAX_PROMPT_TEXT_CHARS).collect();
        }
    }
    String::new()
}

/// `upsertClusterTopics(cluster_id, entries, max, min_score, replace)`: sorts
/// descending, keeps at most `max` entries stopping at the first sub-threshold
/// score after the first, normalizes, and upserts.
pub async fn upsert_cluster_topics(
    pool: &PgPool,
    topic_cache: &mut HashMap<String, i32>,
    cluster_id: i32,
    mut entries: Vec<TopicScore>,
    max: usize,
    min_score: f64,
    replace: bool,
) -> Result<(), IngestError> {
    entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept = Vec::with_capacity(max);
    for (i, entry) in entries.into_iter().enumerate() {
        if kept.len() >= max {
            break;
        }
        if i > 0 && entry.score < min_score {
            break;
        }
        kept.push(entry);
    }

    if kept.is_empty() {
        return Ok(());
    }
    if kept.len() == 1 {
        kept[0].score = kept[0].score.max(0.0);
    }

    let sum: f64 = kept.iter().map(|e| e.score).sum();
    if sum > 0.0 {
        for e in kept.iter_mut() {
            e.score /= sum;
        }
    }

    let mut tx = pool.begin().await?;
    db::clear_cluster_primary(&mut tx, cluster_id).await?;

    let mut topic_ids = Vec::with_capacity(kept.len());
    for (rank, entry) in kept.iter().enumerate() {
        let topic_id = match topic_cache.get(&entry.label) {
            Some(id) => *id,
            None => {
                let id = db::ensure_topic(pool, &entry.label).await?;
                topic_cache.insert(entry.label.clone(), id);
                id
            }
        };
        topic_ids.push(topic_id);
        db::upsert_cluster_topic(&mut tx, cluster_id, topic_id, entry.score, rank == 0).await?;
    }

    if replace {
        db::delete_cluster_topics_not_in(&mut tx, cluster_id, &topic_ids).await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Classifies and persists topics for one newly created cluster, per spec
/// §4.4's per-cluster procedure.
pub async fn classify_cluster(
    pool: &PgPool,
    llm: &dyn LlmClient,
    topic_cache: &mut HashMap<String, i32>,
    cluster_id: i32,
    lang: &str,
) -> Result<(), IngestError> {
    let articles = db::get_cluster_articles(pool, cluster_id, 6).await?;
    let text = build_cluster_text(&articles);
    if text.is_empty() {
        return Ok(());
    }

    let raw = match llm
        .classify_raw(&text, TOPIC_TAXONOMY, lang, DEFAULT_BULK_MAX_TOKENS)
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!(cluster_id, error = %e, "LLM scorer call failed; falling back to recovery ladder on empty output");
            String::new()
        }
    };

    let mut scores = recover_cluster_scores(&raw, TOPIC_TAXONOMY, &text);
    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scores.retain(|s| canonicalize_topic(&s.label).is_some() || TOPIC_TAXONOMY.contains(&s.label.as_str()));
    scores.truncate(3);

    upsert_cluster_topics(pool, topic_cache, cluster_id, scores, 3, 0.15, false).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_key_strips_separators_and_case() {
        assert_eq!(norm_key("  Breaking-News  "), "breakingnews");
        assert_eq!(norm_key("Tech_News"), "technews");
    }

    #[test]
    fn canonicalize_maps_multilingual_synonyms() {
        assert_eq!(canonicalize_topic("технологии"), Some("Tech"));
        assert_eq!(canonicalize_topic("Wirtschaft"), Some("Business"));
        assert_eq!(canonicalize_topic("deportes"), Some("Sports"));
        assert_eq!(canonicalize_topic("nonsense-label"), None);
    }

    #[test]
    fn recover_scores_parses_strict_json() {
        let raw = r#"{"Tech": 0.9, "Sports": 0.1}"#;
        let scores = recover_scores(raw, TOPIC_TAXONOMY);
        assert!((scores.iter().map(|s| s.score).sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(scores.iter().any(|s| s.label == "Tech"));
    }

    #[test]
    fn recover_scores_matches_single_label_case_insensitively() {
        let scores = recover_scores("Tech.", TOPIC_TAXONOMY);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].label, "Tech");
        assert_eq!(scores[0].score, 1.0);
    }

    #[test]
    fn recover_scores_falls_back_to_uniform() {
        let scores = recover_scores("complete garbage, no labels here", TOPIC_TAXONOMY);
        assert_eq!(scores.len(), TOPIC_TAXONOMY.len());
        let expected = 1.0 / TOPIC_TAXONOMY.len() as f64;
        assert!((scores[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn recover_cluster_scores_prefers_keyword_heuristic_over_uniform() {
        let scores = recover_cluster_scores(
            "not json at all",
            TOPIC_TAXONOMY,
            "The football match ended with a dramatic goal in the final minute",
        );
        assert!(!scores.is_empty());
        assert!(scores.iter().any(|s| s.label == "Sports"));
    }

    #[test]
    fn heuristic_topics_ranks_by_keyword_hits() {
        let scores = heuristic_topics_from_text("The central bank raised interest rates; stock market reacted");
        assert!(!scores.is_empty());
        assert_eq!(scores[0].label, "Finance");
    }

    #[test]
    fn build_cluster_text_falls_back_to_title_only() {
        let articles = vec![ClusterArticle {
            title: "Just a title".to_string(),
            summary: None,
        }];
        assert_eq!(build_cluster_text(&articles), "Just a title");
    }

    #[test]
    fn build_cluster_text_empty_when_no_articles() {
        assert_eq!(build_cluster_text(&[]), "");
    }
}
