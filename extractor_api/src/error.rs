use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Condition the user should be told about as-is, like an offline broadcast
    #[error("{0}")]
    Expected(String),

    #[error("{resource}: missing field `{field}`")]
    MissingField {
        resource: String,
        field: &'static str,
    },

    #[error("{resource}: HTTP error {status}")]
    HttpStatus { resource: String, status: u16 },

    #[error("unsupported URL: {0}")]
    UnsupportedUrl(String),
}

impl ExtractorError {
    pub fn expected<S: Into<String>>(message: S) -> Self {
        ExtractorError::Expected(message.into())
    }

    pub fn missing_field<S: Into<String>>(resource: S, field: &'static str) -> Self {
        ExtractorError::MissingField {
            resource: resource.into(),
            field,
        }
    }

    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            ExtractorError::Expected(_) | ExtractorError::UnsupportedUrl(_)
        )
    }
}

/// Short message to show to the user.
/// Anything that isn't an expected condition gets a hint that it's probably a bug.
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ExtractorError>() {
        Some(e) if e.is_expected() => e.to_string(),
        _ => format!("{:#} (this is probably a bug, please report it)", err),
    }
}
