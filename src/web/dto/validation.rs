//! Validation utilities for web form DTOs.

use axum::{
    async_trait,
    extract::{rejection::FormRejection, FromRequest, Request},
    Form,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// A URL-encoded form extractor that validates the request body.
///
/// The body is deserialized with [`Form`] and then checked with the
/// `validator` crate. Failures become a 400 response with field details.
///
/// # Example
///
/// ```ignore
/// use filenest::web::dto::{CreateFolderForm, ValidatedForm};
///
/// async fn create_folder(
///     ValidatedForm(form): ValidatedForm<CreateFolderForm>,
/// ) -> Result<Redirect, ApiError> {
///     // form.folder_name is non-empty here
/// }
/// ```
pub struct ValidatedForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Form<T>: FromRequest<S, Rejection = FormRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid form: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedForm(value))
    }
}

// ============================================================================
// Custom Validators
// ============================================================================

/// Validate that a single-line value has no control characters.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value.chars().any(char::is_control) {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Name required".into()));
    }
    Ok(())
}
