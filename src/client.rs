use crate::error::ApiError;
use crate::types::{
    NewWebhook, Row, RowId, Sheet, SheetId, Webhook, WebhookId, WebhookList, WebhookUpdate,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// The slice of the Smartsheet API the relay depends on.
#[async_trait]
pub trait SheetApi: Send + Sync {
    async fn get_sheet(&self, sheet_id: SheetId) -> Result<Sheet, ApiError>;
    async fn get_row(&self, sheet_id: SheetId, row_id: RowId) -> Result<Row, ApiError>;
    async fn list_webhooks(&self) -> Result<WebhookList, ApiError>;
    async fn create_webhook(&self, hook: &NewWebhook) -> Result<Webhook, ApiError>;
    async fn update_webhook(
        &self,
        webhook_id: WebhookId,
        update: &WebhookUpdate,
    ) -> Result<Webhook, ApiError>;
}

pub struct SmartsheetClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Envelope around create/update results.
#[derive(Deserialize)]
struct ResultEnvelope<T> {
    result: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    error_code: Option<i64>,
    message: Option<String>,
}

impl SmartsheetClient {
    /// A missing token is allowed; the API then rejects every call with 401.
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let resp = request.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let envelope = serde_json::from_str::<ErrorEnvelope>(&text).ok();
            let code = envelope.as_ref().and_then(|e| e.error_code);
            let message = envelope
                .and_then(|e| e.message)
                .unwrap_or(text);
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                code,
                message,
            });
        }

        resp.json().await.map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SheetApi for SmartsheetClient {
    async fn get_sheet(&self, sheet_id: SheetId) -> Result<Sheet, ApiError> {
        let path = format!("/sheets/{sheet_id}");
        // Only the first row is needed for a probe.
        let req = self.client.get(self.url(&path)).query(&[("pageSize", "1")]);
        self.send(&path, req).await
    }

    async fn get_row(&self, sheet_id: SheetId, row_id: RowId) -> Result<Row, ApiError> {
        let path = format!("/sheets/{sheet_id}/rows/{row_id}");
        let req = self.client.get(self.url(&path));
        self.send(&path, req).await
    }

    async fn list_webhooks(&self) -> Result<WebhookList, ApiError> {
        let path = "/webhooks";
        let req = self
            .client
            .get(self.url(path))
            .query(&[("includeAll", "true")]);
        self.send(path, req).await
    }

    async fn create_webhook(&self, hook: &NewWebhook) -> Result<Webhook, ApiError> {
        let path = "/webhooks";
        let req = self.client.post(self.url(path)).json(hook);
        let envelope: ResultEnvelope<Webhook> = self.send(path, req).await?;
        Ok(envelope.result)
    }

    async fn update_webhook(
        &self,
        webhook_id: WebhookId,
        update: &WebhookUpdate,
    ) -> Result<Webhook, ApiError> {
        let path = format!("/webhooks/{webhook_id}");
        let req = self.client.put(self.url(&path)).json(update);
        let envelope: ResultEnvelope<Webhook> = self.send(&path, req).await?;
        Ok(envelope.result)
    }
}
