//! # bookstore-validation
//!
//! Field and cross-field validation over `serde_json::Value` request
//! bodies. Rules are declared per endpoint with [`Rules`] and failures come
//! back grouped by field, ready for the `{message, errors}` response body.

pub mod error;
pub mod rules;
pub mod traits;
pub mod validators;

pub use error::{ValidationError, ValidationErrors, ValidationResult};
pub use rules::Rules;
pub use traits::ValidationRule;

pub use validators::{
    custom::CustomValidator,
    date::DateValidator,
    email::EmailValidator,
    fields::{ConfirmedValidator, DifferentValidator},
    length::LengthValidator,
    numeric::NumericValidator,
    required::RequiredValidator,
    url::UrlValidator,
};
