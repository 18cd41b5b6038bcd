pub mod jobs;
pub mod services;
