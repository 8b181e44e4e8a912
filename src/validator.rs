use axum::{
    Json,
    extract::{FromRequest, Request},
};
use classbase_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

/// JSON body that has passed its `validator` rules.
///
/// A body that is missing, is not JSON, or does not fit `T` is rejected as
/// `Invalid input data`; a body that breaks a rule is rejected with the
/// names of the offending fields. Both are 400s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
                AppError::invalid_input()
            })?;

        value
            .validate()
            .map_err(|errors| AppError::bad_request(format_errors(&errors)))?;

        Ok(ValidatedJson(value))
    }
}
