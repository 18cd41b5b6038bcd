pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpGateway, TemplateRegistry};
pub use app::services::{MailService, ParticipationService};
pub use config::Settings;
pub use core::{error_rate, SweepReport};
pub use utils::error::{Result, ServiceError};
