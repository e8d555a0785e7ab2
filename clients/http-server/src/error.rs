use actix_web::{
    error::{JsonPayloadError, PathError},
    http::StatusCode,
    HttpRequest, HttpResponse, ResponseError,
};
use database::{
    consts::consts::PersonId,
    model::person::{FieldErrors, ValidationError},
    persistence::storage::StorageError,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Person with id {0} not found")]
    NotFound(PersonId),

    // The storage error is logged, never sent to the caller
    #[error("Internal server error")]
    Internal(#[from] StorageError),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let errors = match self {
            ApiError::Validation(validation) => Some(&validation.errors),
            ApiError::NotFound(_) => None,
            ApiError::Internal(storage_error) => {
                log::error!("Storage failure: {}", storage_error);
                None
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            message: self.to_string(),
            errors,
        })
    }
}

/// Malformed bodies, type mismatches and a missing `name` are reported as 422 rather than
/// actix's default 400
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Deserialize(e) => {
            ApiError::Validation(ValidationError::single("body", e.to_string())).into()
        }
        JsonPayloadError::ContentType => ApiError::Validation(ValidationError::single(
            "body",
            "expected content type application/json",
        ))
        .into(),
        other => other.into(),
    }
}

/// Ids that do not parse as an integer are reported as 422 rather than actix's default 404
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    let PathError::Deserialize(e) = err else {
        return err.into();
    };

    ApiError::Validation(ValidationError::single("id", e.to_string())).into()
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    async fn body_json(err: ApiError) -> serde_json::Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();

        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn not_found_names_the_id() {
        let err = ApiError::NotFound(PersonId(999));

        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(err).await,
            serde_json::json!({"message": "Person with id 999 not found"})
        );
    }

    #[actix_web::test]
    async fn validation_lists_field_errors() {
        let err = ApiError::from(ValidationError::single("name", "must not be empty"));

        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(err).await,
            serde_json::json!({
                "message": "Validation failed: name must not be empty",
                "errors": {"name": "must not be empty"}
            })
        );
    }

    #[actix_web::test]
    async fn internal_hides_the_cause() {
        let err = ApiError::from(StorageError::Poisoned);

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(err).await,
            serde_json::json!({"message": "Internal server error"})
        );
    }
}
