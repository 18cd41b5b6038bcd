pub mod completed_participations;
pub mod date_time_values;

pub use completed_participations::CompletedParticipationsJob;
pub use date_time_values::DateTimeValuesJob;

use crate::domain::model::{reference_id, Resource};
use crate::utils::error::{Result, ServiceError};
use serde_json::Value;

/// learningNeed 可能是內嵌物件（取 id）或 reference URL
pub(crate) fn learning_need_id(participation: &Resource) -> Result<String> {
    match participation.get_path("learningNeed") {
        Some(Value::Object(_)) => participation.require_str("learningNeed.id"),
        Some(Value::String(reference)) if !reference.is_empty() => reference_id(reference),
        _ => Err(ServiceError::missing_field(
            participation.label(),
            "learningNeed",
        )),
    }
}
