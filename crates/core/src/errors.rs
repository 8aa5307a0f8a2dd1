use thiserror::Error;

/// Terminal failure fetching or decoding the plan catalog. No partial catalog
/// is ever returned alongside it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog transport failure: {0}")]
    Transport(String),
    #[error("catalog source answered with status {status}")]
    Status { status: u16 },
    #[error("catalog payload could not be decoded: {0}")]
    Decode(String),
    #[error("catalog file could not be read: {0}")]
    Io(String),
}

/// A single malformed row. Recovered by skipping the row.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogRowError {
    #[error("row has no identity")]
    MissingId,
    #[error("row field `{field}` is malformed: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Optional narrative failure. Recovered by omitting the narrative.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NarrativeError {
    #[error("narrative generator unavailable: {0}")]
    Unavailable(String),
    #[error("narrative generation failed: {0}")]
    Generation(String),
    #[error("narrative generator returned no text")]
    EmptyResponse,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("spoken description could not be transcribed: {0}")]
    Transcription(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The plan catalog is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::InvalidInput(message) => Self::BadRequest { message, correlation_id },
            ApplicationError::Catalog(error) => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id }
            }
            ApplicationError::Narrative(error) => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
            ApplicationError::Transcription(message) => Self::BadRequest { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, CatalogError, InterfaceError, NarrativeError};

    #[test]
    fn invalid_input_maps_to_bad_request_with_correlation_id() {
        let interface = ApplicationError::InvalidInput("unknown lifestyle `pirate`".to_owned())
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn catalog_failure_maps_to_service_unavailable() {
        let interface = ApplicationError::from(CatalogError::Status { status: 503 })
            .into_interface("req-2");

        assert!(matches!(
            interface,
            InterfaceError::ServiceUnavailable { ref message, .. } if message.contains("503")
        ));
    }

    #[test]
    fn narrative_failure_is_distinct_from_catalog_failure() {
        let narrative = ApplicationError::from(NarrativeError::EmptyResponse);
        let catalog = ApplicationError::from(CatalogError::Decode("bad json".to_owned()));
        assert_ne!(narrative, catalog);
        assert!(narrative.to_string().contains("no text"));
    }

    #[test]
    fn transcription_failure_asks_the_user_to_retry_input() {
        let interface = ApplicationError::Transcription("no speech".to_owned())
            .into_interface("req-5");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref message, .. } if message == "no speech"
        ));
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface = ApplicationError::Configuration("sheet_id missing".to_owned())
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
