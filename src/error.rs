use thiserror::Error;

/// Failures talking to the Smartsheet REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status. `code` and `message` come from the
    /// Smartsheet error envelope when the body carried one.
    #[error("{path} returned {status}: {message}")]
    Status {
        path: String,
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("could not decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failures running the external row handler.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid PORT value {0:?}")]
    Port(String),
}
