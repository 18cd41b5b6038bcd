pub mod mail_service;
pub mod participation_service;

pub use mail_service::MailService;
pub use participation_service::ParticipationService;
