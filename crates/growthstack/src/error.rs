use growthstack_common::gemini::GeminiError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Model(#[from] GeminiError),

    #[error("report rendering failed: {0}")]
    Report(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Authorization-kind failure: no valid model credential. The recovery
    /// path is the host's credential-selection flow, not a retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Model(e) if e.is_auth())
    }
}
