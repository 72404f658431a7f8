//! Candidate validation and acceptance.
//!
//! [`KeyValidator`] turns oracle guesses into evidence by running the
//! warehouse's aggregate checks. [`AcceptanceFilter`] then decides which
//! foreign candidates are trustworthy enough to draw.

mod acceptance;
mod validator;

pub use acceptance::{is_plausible_primary_key, AcceptanceConfig, AcceptanceFilter, ThresholdError};
pub use validator::{KeyValidator, ValidationError, ValidationObserver, ValidatorConfig};
