use crate::domain::model::Component;
use crate::utils::error::{Result, ServiceError};
use crate::utils::validation::{
    validate_email_address, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub gateway: GatewaySettings,
    pub mail: MailSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub components: ComponentEndpoints,
}

/// 各 CommonGround 元件的 base URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEndpoints {
    pub uc: String,
    pub bs: String,
    pub gateway: String,
    #[serde(rename = "gatewayAdmin")]
    pub gateway_admin: String,
}

impl ComponentEndpoints {
    pub fn base_url(&self, component: Component) -> &str {
        match component {
            Component::Uc => &self.uc,
            Component::Bs => &self.bs,
            Component::Gateway => &self.gateway,
            Component::GatewayAdmin => &self.gateway_admin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    pub sender: String,
    /// Service referenced by every message. Unset: first listed service.
    pub service_id: Option<String>,
    pub frontend_location: String,
    pub templates_dir: Option<String>,
}

impl MailSettings {
    /// Frontend base URL without trailing slashes.
    pub fn app_base_url(&self) -> &str {
        self.frontend_location.trim_end_matches('/')
    }
}

impl GatewaySettings {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl Settings {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ServiceError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ServiceError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

/// 替換環境變數 (例如 ${GATEWAY_API_KEY})；未設定的變數保留原樣
fn substitute_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        let endpoints = &self.gateway.components;
        validate_url("gateway.components.uc", &endpoints.uc)?;
        validate_url("gateway.components.bs", &endpoints.bs)?;
        validate_url("gateway.components.gateway", &endpoints.gateway)?;
        validate_url("gateway.components.gatewayAdmin", &endpoints.gateway_admin)?;

        if let Some(api_key) = &self.gateway.api_key {
            validate_non_empty_string("gateway.api_key", api_key)?;
            if api_key.starts_with("${") {
                return Err(ServiceError::MissingConfigError {
                    field: format!("gateway.api_key (environment variable {})", api_key),
                });
            }
        }
        if let Some(timeout) = self.gateway.timeout_seconds {
            validate_positive_number("gateway.timeout_seconds", timeout, 1)?;
        }

        validate_email_address("mail.sender", &self.mail.sender)?;
        validate_url("mail.frontend_location", &self.mail.frontend_location)?;
        if let Some(service_id) = &self.mail.service_id {
            validate_non_empty_string("mail.service_id", service_id)?;
        }
        if let Some(dir) = &self.mail.templates_dir {
            validate_path("mail.templates_dir", dir)?;
        }

        Ok(())
    }
}
