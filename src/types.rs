use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SheetId = i64;
pub type RowId = i64;
pub type WebhookId = i64;

/// A webhook as returned by the Smartsheet webhooks API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: WebhookId,
    pub name: String,
    #[serde(default)]
    pub scope: String,
    pub scope_object_id: SheetId,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub shared_secret: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Body of a webhook creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebhook {
    pub name: String,
    pub callback_url: String,
    pub scope: String,
    pub scope_object_id: SheetId,
    pub events: Vec<String>,
    pub version: u32,
}

impl NewWebhook {
    /// A sheet-scoped hook subscribed to every event.
    pub fn for_sheet(sheet_id: SheetId, name: &str, callback_url: &str) -> Self {
        Self {
            name: name.to_string(),
            callback_url: callback_url.to_string(),
            scope: "sheet".to_string(),
            scope_object_id: sheet_id,
            events: vec!["*.*".to_string()],
            version: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookUpdate {
    pub enabled: bool,
    pub callback_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub data: Vec<Webhook>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub id: SheetId,
    pub name: String,
    #[serde(default)]
    pub permalink: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: RowId,
    #[serde(default)]
    pub row_number: Option<u64>,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(default)]
    pub column_id: Option<i64>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub display_value: Option<String>,
}

/// One callback delivery carrying change events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackBatch {
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub webhook_id: Option<WebhookId>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub scope_object_id: Option<SheetId>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub object_type: String,
    pub event_type: String,
    /// Absent on cell events, which carry `row_id`/`column_id` instead.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub row_id: Option<RowId>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub column_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// What gets handed to the external handler for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowForward {
    pub event_type: String,
    pub row_id: RowId,
    pub payload: String,
}
