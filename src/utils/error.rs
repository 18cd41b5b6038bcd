use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Gateway responded with {status} for {url}: {body}")]
    GatewayStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Resource {resource} has no usable '{field}'")]
    MissingField { resource: String, field: String },

    #[error("Cannot resolve resource reference '{reference}'")]
    InvalidReference { reference: String },

    #[error("Invalid date '{value}': {reason}")]
    DateFormat { value: String, reason: String },

    #[error("Template '{template}' failed: {message}")]
    TemplateError { template: String, message: String },

    #[error("No resources found at {address}")]
    EmptyCollection { address: String },
}

impl ServiceError {
    pub fn missing_field(resource: impl Into<String>, field: impl Into<String>) -> Self {
        ServiceError::MissingField {
            resource: resource.into(),
            field: field.into(),
        }
    }

    /// 網路或 HTTP 層的錯誤（相對於資料格式錯誤）
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ServiceError::ApiError(_) | ServiceError::GatewayStatus { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
