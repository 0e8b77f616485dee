use thiserror::Error;

use crate::domain::slots::SlotName;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("slot `{0}` has no value")]
    MissingSlot(SlotName),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("integration failure: {0}")]
    Integration(String),
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
    pub fn bad_request(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into(), correlation_id: correlation_id.into() }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::ServiceUnavailable { .. } | Self::Internal { .. } => 500,
        }
    }

    /// Text safe to return to the caller. Only malformed-input errors carry
    /// their detail outward.
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. } => message,
            Self::ServiceUnavailable { .. } | Self::Internal { .. } => "Internal server error",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
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
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::slots::SlotName;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn domain_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::MissingSlot(SlotName::Email))
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.status_code(), 400);
    }

    #[test]
    fn bad_request_exposes_its_detail() {
        let interface = InterfaceError::bad_request("Empty message text", "req-2");

        assert_eq!(interface.user_message(), "Empty message text");
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn integration_error_hides_detail_behind_generic_message() {
        let interface = ApplicationError::Integration("nlu returned 503: throttled".to_owned())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.status_code(), 500);
        assert_eq!(interface.user_message(), "Internal server error");
    }
}
