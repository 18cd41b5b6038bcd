pub mod sweep;

pub use crate::domain::model::{ListQuery, Resource, ResourceAddress, ResourcePage};
pub use crate::domain::ports::{Gateway, TemplateParameters, TemplateRenderer};
pub use crate::utils::error::Result;
pub use sweep::{error_rate, run_sweep, SweepJob, SweepReport};
