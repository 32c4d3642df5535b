use crate::error::{ValidationError, ValidationIssue};
use crate::outcome::{self, Outcome};
use crate::validator::CompiledValidator;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Named export of a generated module.
///
/// Bundles the three runtime operations over one schema. Generated code only
/// implements [`SchemaBinding::validator`]; the operations are provided.
pub trait SchemaBinding {
    /// `$id` of the schema
    const ID: &'static str;

    /// Main generated type for the schema
    type Output: DeserializeOwned;

    fn validator() -> &'static CompiledValidator;

    /// Run the schema validator. On failure the issue list is recorded and
    /// available from [`SchemaBinding::last_errors`].
    fn validate(value: &Value) -> bool {
        Self::validator().validate(value)
    }

    /// Validate and decode, failing with the serialized issue list
    fn get(value: Value) -> Result<Self::Output, ValidationError> {
        Self::validator().get(value)
    }

    /// Structural error check, see [`outcome::is_error`]
    fn is_error(value: &Value) -> bool {
        outcome::is_error(value)
    }

    /// Decode into a tagged [`Outcome`]
    fn outcome(value: Value) -> Result<Outcome<Self::Output>, ValidationError> {
        Outcome::from_value::<Self>(value)
    }

    fn last_errors() -> Option<Vec<ValidationIssue>> {
        Self::validator().last_errors()
    }
}
