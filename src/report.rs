//! Monthly insights report: document fetch and section parsing
//!
//! The document's plain text carries one `===== TITLE =====` page header
//! followed by `=== SECTION ===` delimited sections.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::GoogleError;
use crate::google::{check_status, ServiceAccount, DOCS_READONLY};
use crate::types::{Report, ReportSection};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"={5}\s*(.+?)\s*={5}").expect("valid title regex"));
static TITLE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"={5}[\s\S]*?={5}").expect("valid title block regex"));
static TITLE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(consumer\s+insights\s+)?report\s*$").expect("valid suffix regex")
});
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"===\s*([^=\n]+?)\s*===").expect("valid section regex"));
static NEWLINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("valid newline regex"));
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid sentence regex"));

const PREVIEW_CHARS: usize = 160;

/// Source of the report document's plain text.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_text(&self) -> Result<String, GoogleError>;
}

/// Split report text into its month label and ordered sections.
pub fn parse_report(text: &str) -> Report {
    let month = TITLE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| TITLE_SUFFIX_RE.replace(m.as_str(), "").trim().to_string())
        .unwrap_or_default();

    let body = TITLE_BLOCK_RE.replace(text, "");
    let body = body.trim();

    let headers: Vec<(String, usize, usize)> = SECTION_RE
        .captures_iter(body)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let title = c.get(1)?.as_str().trim().to_string();
            Some((title, whole.start(), whole.end()))
        })
        .collect();

    let sections = headers
        .iter()
        .enumerate()
        .map(|(i, (title, _, content_start))| {
            let content_end = headers.get(i + 1).map(|h| h.1).unwrap_or(body.len());
            let content = body[*content_start..content_end].trim().to_string();
            ReportSection {
                title: title.clone(),
                preview: preview(&content),
                icon: section_icon(title).to_string(),
                content,
            }
        })
        .collect();

    Report { month, sections }
}

/// First two sentences, else the first 160 characters.
pub fn preview(text: &str) -> String {
    let cleaned = NEWLINES_RE.replace_all(text, " ");
    let cleaned = cleaned.trim();

    let sentences: Vec<&str> = SENTENCE_RE
        .find_iter(cleaned)
        .take(2)
        .map(|m| m.as_str().trim())
        .collect();
    let joined = sentences.join(" ");
    if !joined.trim().is_empty() {
        return joined.trim().to_string();
    }

    let truncated: String = cleaned.chars().take(PREVIEW_CHARS).collect();
    let mut out = truncated.trim().to_string();
    if cleaned.chars().count() > PREVIEW_CHARS {
        out.push('…');
    }
    out
}

pub fn section_icon(title: &str) -> &'static str {
    let t = title.to_uppercase();
    let has = |k: &str| t.contains(k);
    if has("EXECUTIVE") {
        "📊"
    } else if has("VOICE") || has("CUSTOMER") {
        "💬"
    } else if has("JOBS") || has("JTBD") {
        "✅"
    } else if has("PAIN") {
        "🔴"
    } else if has("OBJECTION") {
        "🛡️"
    } else if has("TRIGGER") || has("CONVERSION") {
        "⚡"
    } else if has("PERSONA") {
        "👥"
    } else if has("COMPETITIVE") || has("INTELLIGENCE") {
        "🔍"
    } else if has("PRICE") || has("SENSITIVITY") {
        "💰"
    } else if has("TREND") {
        "📈"
    } else if has("STRATEGIC") || has("RECOMMENDATION") {
        "🎯"
    } else {
        "📄"
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Google Docs Client
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct DocElement {
    #[serde(default)]
    paragraph: Option<Paragraph>,
    #[serde(default)]
    table: Option<Table>,
}

#[derive(Debug, Default, Deserialize)]
struct Paragraph {
    #[serde(default)]
    elements: Vec<ParagraphElement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParagraphElement {
    #[serde(default)]
    text_run: Option<TextRun>,
}

#[derive(Debug, Default, Deserialize)]
struct TextRun {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Table {
    #[serde(default)]
    table_rows: Vec<TableRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableRow {
    #[serde(default)]
    table_cells: Vec<TableCell>,
}

#[derive(Debug, Default, Deserialize)]
struct TableCell {
    #[serde(default)]
    content: Vec<DocElement>,
}

#[derive(Debug, Default, Deserialize)]
struct DocBody {
    #[serde(default)]
    content: Vec<DocElement>,
}

#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    body: Option<DocBody>,
}

/// Flatten paragraphs and table cells into plain text, in document order.
pub fn extract_text(content: &[DocElement]) -> String {
    let mut text = String::new();
    for element in content {
        if let Some(paragraph) = &element.paragraph {
            for pe in &paragraph.elements {
                if let Some(run) = &pe.text_run {
                    text.push_str(&run.content);
                }
            }
        } else if let Some(table) = &element.table {
            for row in &table.table_rows {
                for cell in &row.table_cells {
                    text.push_str(&extract_text(&cell.content));
                }
            }
        }
    }
    text
}

pub struct GoogleDocsClient {
    account: Option<ServiceAccount>,
    doc_id: Option<String>,
    http_client: reqwest::Client,
}

impl GoogleDocsClient {
    pub fn new(config: &Config, http_client: reqwest::Client) -> Self {
        Self {
            account: ServiceAccount::from_config(config),
            doc_id: config.report_doc_id.clone(),
            http_client,
        }
    }
}

#[async_trait]
impl ReportSource for GoogleDocsClient {
    /// GET documents/{id}?fields=body.content
    async fn fetch_text(&self) -> Result<String, GoogleError> {
        let (Some(account), Some(doc_id)) = (&self.account, &self.doc_id) else {
            return Err(GoogleError::NotConfigured);
        };

        let token = account.access_token(&self.http_client, &[DOCS_READONLY]).await?;
        let url = format!("https://docs.googleapis.com/v1/documents/{}", doc_id);
        debug!(%doc_id, "fetching report document");

        let response = self
            .http_client
            .get(&url)
            .query(&[("fields", "body.content")])
            .bearer_auth(token)
            .send()
            .await?;
        let document: Document = check_status(response).await?.json().await?;

        Ok(document
            .body
            .map(|b| extract_text(&b.content))
            .unwrap_or_default())
    }
}
