use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TourError {
    #[error("invalid request: {0}")] InvalidRequest(String),
    #[error("provider error: {0}")] Provider(String),
    #[error("malformed response: {0}")] MalformedResponse(String),
    #[error("invalid credentials")] InvalidCredentials,
}

impl TourError {
    /// Detail text passed through to the caller for diagnostics.
    pub fn details(&self) -> String {
        match self {
            TourError::InvalidRequest(s)
            | TourError::Provider(s)
            | TourError::MalformedResponse(s) => s.clone(),
            TourError::InvalidCredentials => String::new(),
        }
    }
}
