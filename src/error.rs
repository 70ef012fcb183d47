use actix_web::{
    error::BlockingError,
    http::StatusCode,
    HttpResponse, ResponseError,
};
use diesel::r2d2::PoolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i32 },

    #[error("{kind} already exists: {name}")]
    Conflict { kind: &'static str, name: String },

    #[error("{0}")]
    Validation(String),

    #[error("failed to link food item {item_id} to {relation}: {source}")]
    Link {
        relation: &'static str,
        item_id: i32,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("file storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task was cancelled")]
    Blocking(#[from] BlockingError),

    #[error("database is not responding")]
    Unavailable,
}

impl ServiceError {
    /// Store failures that should trip the circuit breaker. Client errors
    /// never count against the store.
    pub fn is_store_failure(&self) -> bool {
        match self {
            ServiceError::Database(_) | ServiceError::Pool(_) => true,
            ServiceError::Link { source, .. } => source.is_store_failure(),
            _ => false,
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict { .. } => StatusCode::CONFLICT,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Link { .. }
            | ServiceError::Database(_)
            | ServiceError::Pool(_)
            | ServiceError::Io(_)
            | ServiceError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("request failed: {}", self);
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "detail": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        let missing = ServiceError::NotFound {
            kind: "Food Item",
            id: 4,
        };
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "Food Item 4 not found");

        let taken = ServiceError::Conflict {
            kind: "Food Item",
            name: "Burger".to_string(),
        };
        assert_eq!(taken.status_code(), StatusCode::CONFLICT);

        assert_eq!(
            ServiceError::Validation("food_item_name is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::Unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ServiceError::Database(diesel::result::Error::NotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn only_store_errors_trip_the_breaker() {
        assert!(ServiceError::Database(diesel::result::Error::RollbackTransaction).is_store_failure());
        assert!(!ServiceError::Unavailable.is_store_failure());
        assert!(!ServiceError::NotFound { kind: "Category", id: 1 }.is_store_failure());
    }

    #[test]
    fn link_failures_keep_their_cause() {
        let outage = ServiceError::Link {
            relation: "category",
            item_id: 3,
            source: Box::new(ServiceError::Database(diesel::result::Error::BrokenTransactionManager)),
        };
        assert!(outage.is_store_failure());
        assert_eq!(outage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let missing = ServiceError::Link {
            relation: "modifier",
            item_id: 3,
            source: Box::new(ServiceError::NotFound { kind: "Modifier", id: 42 }),
        };
        assert!(!missing.is_store_failure());
        assert_eq!(
            missing.to_string(),
            "failed to link food item 3 to modifier: Modifier 42 not found"
        );
    }
}
