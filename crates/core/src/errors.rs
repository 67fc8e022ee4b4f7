use thiserror::Error;

use crate::parse::ParseError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("I ran into a problem: There are no orders!")]
    NoOrders,
    #[error("I ran into a problem: There is no order for {0}!")]
    NoOrderOnDate(String),
    #[error("I ran into a problem: Order #{0} does not exist!")]
    OrderNotFound(i64),
    #[error("I couldn't find a Slack user named `{0}`.")]
    UnknownUser(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("unprocessable: {message}")]
    Unprocessable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// HTTP status Slack receives for this failure.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::NotFound { .. } | Self::Unprocessable { .. } => 422,
            Self::Internal { .. } => 500,
        }
    }

    /// Text shown in Slack. Input and lookup problems are explained to the
    /// user; anything else falls back to the route's terse message.
    pub fn user_message<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            Self::BadRequest { message, .. } | Self::NotFound { message, .. } => message,
            Self::Unprocessable { .. } | Self::Internal { .. } => fallback,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::Unprocessable { correlation_id, .. }
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
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Unprocessable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error @ DomainError::Parse(_)) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Domain(
                error @ (DomainError::NoOrders
                | DomainError::NoOrderOnDate(_)
                | DomainError::OrderNotFound(_)
                | DomainError::UnknownUser(_)),
            ) => Self::NotFound { message: error.to_string(), correlation_id },
            ApplicationError::Domain(DomainError::InvariantViolation(message))
            | ApplicationError::Persistence(message)
            | ApplicationError::Integration(message) => {
                Self::Unprocessable { message, correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::parse::ParseError;

    #[test]
    fn parse_error_maps_to_bad_request_with_its_message() {
        let interface = ApplicationError::from(DomainError::from(
            ParseError::IncompleteDrinkPreference,
        ))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.http_status(), 400);
        assert_eq!(
            interface.user_message("INVALID INPUT"),
            "Please give a size and a drink type, e.g. `small tea with milk`."
        );
    }

    #[test]
    fn missing_orders_are_explained_to_the_user() {
        let interface = ApplicationError::from(DomainError::NoOrders).into_interface("req-2");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.http_status(), 422);
        assert_eq!(
            interface.user_message("Error in /display-orders route."),
            "I ran into a problem: There are no orders!"
        );
    }

    #[test]
    fn persistence_error_uses_route_fallback() {
        let interface = ApplicationError::Persistence("database is locked".to_owned())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Unprocessable { .. }));
        assert_eq!(interface.http_status(), 422);
        assert_eq!(interface.user_message("INVALID INPUT"), "INVALID INPUT");
        assert_eq!(interface.correlation_id(), "req-3");
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("missing bot token".to_owned()).into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.http_status(), 500);
    }
}
