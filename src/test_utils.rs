//! In-memory fakes for the API and the forwarder.

use crate::client::SheetApi;
use crate::error::{ApiError, ForwardError};
use crate::forward::RowForwarder;
use crate::types::{
    Cell, NewWebhook, Row, RowForward, RowId, Sheet, SheetId, Webhook, WebhookId, WebhookList,
    WebhookUpdate,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    GetSheet(SheetId),
    GetRow(SheetId, RowId),
    ListWebhooks,
    CreateWebhook(NewWebhook),
    UpdateWebhook(WebhookId, WebhookUpdate),
}

#[derive(Default)]
pub struct FakeSheetApi {
    pub calls: Mutex<Vec<ApiCall>>,
    pub hooks: Vec<Webhook>,
    pub rows: HashMap<RowId, Vec<Option<serde_json::Value>>>,
    pub failing_rows: HashSet<RowId>,
    pub fail_list: bool,
    pub fail_sheet: bool,
    /// Hooks returned by `create_webhook`, visible to later updates.
    pub created: Mutex<Vec<Webhook>>,
}

impl FakeSheetApi {
    pub fn with_row(mut self, row_id: RowId, values: Vec<Option<serde_json::Value>>) -> Self {
        self.rows.insert(row_id, values);
        self
    }

    pub fn with_hook(mut self, hook: Webhook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn row_fetches(&self) -> Vec<(SheetId, RowId)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::GetRow(s, r) => Some((s, r)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn not_found(path: String) -> ApiError {
    ApiError::Status {
        path,
        status: 404,
        code: Some(1006),
        message: "Not Found".into(),
    }
}

pub fn hook(id: WebhookId, name: &str, sheet_id: SheetId) -> Webhook {
    Webhook {
        id,
        name: name.into(),
        scope: "sheet".into(),
        scope_object_id: sheet_id,
        callback_url: Some("https://stale.example.com/".into()),
        enabled: false,
        status: Some("DISABLED_BY_OWNER".into()),
        events: vec!["*.*".into()],
        version: Some(1),
        shared_secret: Some(format!("secret-{id}")),
        created_at: None,
        modified_at: None,
    }
}

#[async_trait]
impl SheetApi for FakeSheetApi {
    async fn get_sheet(&self, sheet_id: SheetId) -> Result<Sheet, ApiError> {
        self.record(ApiCall::GetSheet(sheet_id));
        if self.fail_sheet {
            return Err(ApiError::Status {
                path: format!("/sheets/{sheet_id}"),
                status: 403,
                code: Some(1004),
                message: "You are not authorized to perform this action.".into(),
            });
        }
        Ok(Sheet {
            id: sheet_id,
            name: "Fake sheet".into(),
            permalink: None,
        })
    }

    async fn get_row(&self, sheet_id: SheetId, row_id: RowId) -> Result<Row, ApiError> {
        self.record(ApiCall::GetRow(sheet_id, row_id));
        if self.failing_rows.contains(&row_id) {
            return Err(not_found(format!("/sheets/{sheet_id}/rows/{row_id}")));
        }
        let values = self
            .rows
            .get(&row_id)
            .ok_or_else(|| not_found(format!("/sheets/{sheet_id}/rows/{row_id}")))?;
        Ok(Row {
            id: row_id,
            row_number: None,
            cells: values
                .iter()
                .map(|v| Cell {
                    column_id: None,
                    value: v.clone(),
                    display_value: None,
                })
                .collect(),
        })
    }

    async fn list_webhooks(&self) -> Result<WebhookList, ApiError> {
        self.record(ApiCall::ListWebhooks);
        if self.fail_list {
            return Err(ApiError::Status {
                path: "/webhooks".into(),
                status: 500,
                code: Some(4000),
                message: "An unexpected error has occurred.".into(),
            });
        }
        Ok(WebhookList {
            total_count: self.hooks.len() as u64,
            data: self.hooks.clone(),
        })
    }

    async fn create_webhook(&self, new: &NewWebhook) -> Result<Webhook, ApiError> {
        self.record(ApiCall::CreateWebhook(new.clone()));
        let mut created = hook(1000, &new.name, new.scope_object_id);
        created.callback_url = Some(new.callback_url.clone());
        created.status = Some("NEW_NOT_VERIFIED".into());
        self.created.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_webhook(
        &self,
        webhook_id: WebhookId,
        update: &WebhookUpdate,
    ) -> Result<Webhook, ApiError> {
        self.record(ApiCall::UpdateWebhook(webhook_id, update.clone()));
        let created = self.created.lock().unwrap().clone();
        let mut updated = self
            .hooks
            .iter()
            .chain(created.iter())
            .find(|h| h.id == webhook_id)
            .cloned()
            .ok_or_else(|| not_found(format!("/webhooks/{webhook_id}")))?;
        updated.enabled = update.enabled;
        updated.callback_url = Some(update.callback_url.clone());
        updated.status = Some("ENABLED".into());
        Ok(updated)
    }
}

/// Records every forward; fails for the listed row ids.
#[derive(Default)]
pub struct RecordingForwarder {
    pub forwarded: Mutex<Vec<RowForward>>,
    pub failing_rows: HashSet<RowId>,
}

impl RecordingForwarder {
    pub fn forwarded(&self) -> Vec<RowForward> {
        self.forwarded.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowForwarder for RecordingForwarder {
    async fn forward(&self, record: RowForward) -> Result<(), ForwardError> {
        let fail = self.failing_rows.contains(&record.row_id);
        self.forwarded.lock().unwrap().push(record);
        if fail {
            return Err(ForwardError::Exit {
                program: "fake".into(),
                status: "exit status: 1".into(),
            });
        }
        Ok(())
    }
}
