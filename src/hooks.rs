//! Webhook reconciliation.
//!
//! Smartsheet disables a hook whenever verification or a callback fails, and a
//! redeploy may change the public callback URL. On every start we look for our
//! hook (by sheet and name), create it if missing, then re-enable it and point
//! it at the current URL.

use crate::client::SheetApi;
use crate::error::ApiError;
use crate::types::{NewWebhook, SheetId, Webhook, WebhookUpdate};

/// Make sure an enabled hook named `hook_name` on `sheet_id` targets
/// `callback_url`. Returns the hook as it stands after the update.
pub async fn ensure_hook(
    api: &dyn SheetApi,
    sheet_id: SheetId,
    hook_name: &str,
    callback_url: &str,
) -> Result<Webhook, ApiError> {
    let listed = api.list_webhooks().await?;
    tracing::info!("Found {} hooks owned by user", listed.total_count);

    let existing = listed
        .data
        .into_iter()
        .find(|hook| hook.scope_object_id == sheet_id && hook.name == hook_name);

    let hook = match existing {
        Some(hook) => {
            tracing::info!(hook_id = hook.id, "Found matching hook");
            hook
        }
        None => {
            let created = api
                .create_webhook(&NewWebhook::for_sheet(sheet_id, hook_name, callback_url))
                .await?;
            tracing::info!(hook_id = created.id, "Created new hook");
            created
        }
    };

    let update = WebhookUpdate {
        enabled: true,
        callback_url: callback_url.to_string(),
    };
    let mut updated = api.update_webhook(hook.id, &update).await?;
    tracing::info!(
        hook_id = updated.id,
        enabled = updated.enabled,
        status = updated.status.as_deref().unwrap_or("unknown"),
        "Hook reconciled"
    );

    // The update response does not always echo the secret.
    if updated.shared_secret.is_none() {
        updated.shared_secret = hook.shared_secret;
    }
    Ok(updated)
}

/// [`ensure_hook`], logging and swallowing any failure.
pub async fn initialize_hook(
    api: &dyn SheetApi,
    sheet_id: SheetId,
    hook_name: &str,
    callback_url: &str,
) -> Option<Webhook> {
    match ensure_hook(api, sheet_id, hook_name, callback_url).await {
        Ok(hook) => Some(hook),
        Err(e) => {
            tracing::error!(sheet_id, hook_name, "hook reconciliation failed: {e}");
            None
        }
    }
}
