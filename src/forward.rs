use crate::config::HandlerConfig;
use crate::error::ForwardError;
use crate::types::RowForward;
use async_trait::async_trait;
use tokio::process::Command;

/// Receives formatted row events.
#[async_trait]
pub trait RowForwarder: Send + Sync {
    async fn forward(&self, record: RowForward) -> Result<(), ForwardError>;
}

/// Runs `<program> <args...> <event_type> <row_id> <payload>` per event.
pub struct ProcessForwarder {
    program: String,
    args: Vec<String>,
}

impl ProcessForwarder {
    pub fn new(config: &HandlerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    fn command(&self, record: &RowForward) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&record.event_type)
            .arg(record.row_id.to_string())
            .arg(&record.payload)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl RowForwarder for ProcessForwarder {
    async fn forward(&self, record: RowForward) -> Result<(), ForwardError> {
        let output = self
            .command(&record)
            .output()
            .await
            .map_err(|source| ForwardError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::error!(row_id = record.row_id, "handler stderr: {line}");
        }

        if output.status.success() {
            tracing::debug!(
                row_id = record.row_id,
                event_type = %record.event_type,
                "handler finished"
            );
            Ok(())
        } else {
            Err(ForwardError::Exit {
                program: self.program.clone(),
                status: output.status.to_string(),
            })
        }
    }
}
