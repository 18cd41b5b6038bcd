use crate::config::MailSettings;
use crate::domain::ports::{TemplateParameters, TemplateRenderer};
use crate::utils::error::{Result, ServiceError};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

pub const WELCOME_EMAIL: &str = "welcome-email";
pub const SHARE_STUDENT_EMAIL: &str = "share-student-email";
pub const EMPLOYEE_EXISTS_EMAIL: &str = "employee-exists-email";

const BUILT_IN: &[(&str, &str)] = &[
    (WELCOME_EMAIL, include_str!("../../templates/welcome-email.html")),
    (SHARE_STUDENT_EMAIL, include_str!("../../templates/share-student-email.html")),
    (EMPLOYEE_EXISTS_EMAIL, include_str!("../../templates/employee-exists-email.html")),
];

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid placeholder pattern")
    })
}

/// 以名稱註冊的郵件模板，`{{ name }}` 佔位符會以 HTML 跳脫後的值替換
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, String>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, source) in BUILT_IN {
            registry.register(name, source);
        }
        registry
    }

    /// Built-in templates overridden by any `<name>.html` file in `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut registry = Self::with_defaults();

        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path)?;
            tracing::debug!("Loaded template '{}' from {}", name, path.display());
            registry.register(name, &source);
        }

        Ok(registry)
    }

    /// 依 `mail.templates_dir` 設定載入；未設定時只用內建模板
    pub fn for_settings(settings: &MailSettings) -> Result<Self> {
        match &settings.templates_dir {
            Some(dir) => Self::from_dir(dir),
            None => Ok(Self::with_defaults()),
        }
    }

    pub fn register(&mut self, name: &str, source: &str) {
        self.templates.insert(name.to_string(), source.to_string());
    }

    #[cfg(test)]
    fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}

impl TemplateRenderer for TemplateRegistry {
    fn render(&self, template: &str, parameters: &TemplateParameters) -> Result<String> {
        let source = self
            .templates
            .get(template)
            .ok_or_else(|| ServiceError::TemplateError {
                template: template.to_string(),
                message: "unknown template".to_string(),
            })?;

        let mut missing = Vec::new();
        let rendered = placeholder_pattern().replace_all(source, |caps: &regex::Captures| {
            let key = &caps[1];
            match parameters.get(key) {
                Some(value) => escape_html(value),
                None => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        });

        if !missing.is_empty() {
            return Err(ServiceError::TemplateError {
                template: template.to_string(),
                message: format!("unresolved parameters: {}", missing.join(", ")),
            });
        }

        Ok(rendered.into_owned())
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
