//! Spreadsheet client for the customer/call and content-calendar sheets
//!
//! The first row of a range is the header row; every later row becomes a
//! header → cell map with missing cells as empty strings.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::GoogleError;
use crate::google::{check_status, ServiceAccount, SHEETS_READONLY};
use crate::types::SheetRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Customers,
    Content,
}

impl SheetKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customers" => Some(SheetKind::Customers),
            "content" => Some(SheetKind::Content),
            _ => None,
        }
    }
}

/// Source of tabular rows for the two logical sheets.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn rows(&self, sheet: SheetKind) -> Result<Vec<SheetRow>, GoogleError>;
}

/// Map a rectangular range (header row first) into rows.
pub fn rows_from_values(values: &[Vec<String>]) -> Vec<SheetRow> {
    let [headers, rest @ ..] = values else {
        return Vec::new();
    };

    rest.iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_text(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Google Sheets Client
// ═══════════════════════════════════════════════════════════════════════════

pub struct GoogleSheetsClient {
    account: Option<ServiceAccount>,
    customer_sheet_id: Option<String>,
    content_sheet_id: Option<String>,
    range: String,
    http_client: reqwest::Client,
}

impl GoogleSheetsClient {
    pub fn new(config: &Config, http_client: reqwest::Client) -> Self {
        Self {
            account: ServiceAccount::from_config(config),
            customer_sheet_id: config.customer_sheet_id.clone(),
            content_sheet_id: config.content_sheet_id.clone(),
            range: config.sheet_range.clone(),
            http_client,
        }
    }

    /// GET spreadsheets/{id}/values/{range}
    async fn read_range(
        &self,
        account: &ServiceAccount,
        sheet_id: &str,
    ) -> Result<Vec<SheetRow>, GoogleError> {
        let token = account.access_token(&self.http_client, &[SHEETS_READONLY]).await?;
        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}",
            sheet_id, self.range
        );
        debug!(%sheet_id, range = %self.range, "reading sheet");

        let response = self.http_client.get(&url).bearer_auth(token).send().await?;
        let range: ValueRange = check_status(response).await?.json().await?;

        let values: Vec<Vec<String>> = range
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Ok(rows_from_values(&values))
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn rows(&self, sheet: SheetKind) -> Result<Vec<SheetRow>, GoogleError> {
        let sheet_id = match sheet {
            SheetKind::Customers => self.customer_sheet_id.as_deref(),
            SheetKind::Content => self.content_sheet_id.as_deref(),
        };

        match (&self.account, sheet_id) {
            (Some(account), Some(id)) => self.read_range(account, id).await,
            _ => {
                info!(?sheet, "sheet source not configured; returning no rows");
                Ok(Vec::new())
            }
        }
    }
}
