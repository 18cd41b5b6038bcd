use crate::utils::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 遠端 gateway 的元件（CommonGround component code）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// user / credential component
    #[serde(rename = "uc")]
    Uc,
    /// business services, messaging
    #[serde(rename = "bs")]
    Bs,
    #[serde(rename = "gateway")]
    Gateway,
    #[serde(rename = "gatewayAdmin")]
    GatewayAdmin,
}

impl Component {
    pub fn code(&self) -> &'static str {
        match self {
            Component::Uc => "uc",
            Component::Bs => "bs",
            Component::Gateway => "gateway",
            Component::GatewayAdmin => "gatewayAdmin",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// `(component, type, id?)`: a remote resource or collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceAddress {
    pub component: Component,
    pub resource_type: String,
    pub id: Option<String>,
}

impl ResourceAddress {
    pub fn collection(component: Component, resource_type: &str) -> Self {
        Self {
            component,
            resource_type: resource_type.to_string(),
            id: None,
        }
    }

    pub fn item(component: Component, resource_type: &str, id: impl Into<String>) -> Self {
        Self {
            component,
            resource_type: resource_type.to_string(),
            id: Some(id.into()),
        }
    }

    /// Path relative to the component base, e.g. `participations/42`.
    pub fn path(&self) -> String {
        match &self.id {
            Some(id) => format!("{}/{}", self.resource_type, id),
            None => self.resource_type.clone(),
        }
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component, self.path())
    }
}

/// 遠端資源的原始 JSON 物件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    pub data: Map<String, Value>,
}

impl Resource {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Builds a resource from a JSON value; anything but an object is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        let data: Map<String, Value> = serde_json::from_value(value)?;
        Ok(Self { data })
    }

    /// Looks up a dotted path such as `learningNeed.student.id`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// String at `path`; numeric values are rendered as strings. Null and
    /// empty strings count as absent.
    pub fn str_at(&self, path: &str) -> Option<String> {
        match self.get_path(path)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn require_str(&self, path: &str) -> Result<String> {
        self.str_at(path)
            .ok_or_else(|| ServiceError::missing_field(self.label(), path))
    }

    pub fn id(&self) -> Option<String> {
        self.str_at("id")
    }

    pub fn require_id(&self) -> Result<String> {
        self.require_str("id")
    }

    /// Short description for logs and errors, e.g. `participation 42`.
    pub fn label(&self) -> String {
        let kind = self
            .str_at("@type")
            .unwrap_or_else(|| "resource".to_string())
            .to_lowercase();
        match self.id() {
            Some(id) => format!("{} {}", kind, id),
            None => kind,
        }
    }
}

impl From<Map<String, Value>> for Resource {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

/// Extracts the trailing id of a resource reference such as
/// `https://cg/api/v1/cc/people/abc-123` or `/services/abc-123`.
pub fn reference_id(reference: &str) -> Result<String> {
    let path = match url::Url::parse(reference) {
        Ok(url) => url.path().to_string(),
        Err(_) => reference.to_string(),
    };
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ServiceError::InvalidReference {
            reference: reference.to_string(),
        })
}

/// 列表查詢：過濾條件、欄位限制與頁碼
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<(String, String)>,
    pub fields: Vec<String>,
    /// `None` requests the collection without a page parameter.
    pub page: Option<u32>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Query-string pairs in the gateway's conventions (`fields[]=…`).
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filters.clone();
        for field in &self.fields {
            pairs.push(("fields[]".to_string(), field.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        pairs
    }
}

/// One page of a server-side paginated listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePage {
    pub items: Vec<Resource>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipationStatus {
    Referred,
    Active,
    Completed,
    Other(String),
}

impl ParticipationStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "REFERRED" => ParticipationStatus::Referred,
            "ACTIVE" => ParticipationStatus::Active,
            "COMPLETED" => ParticipationStatus::Completed,
            other => ParticipationStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ParticipationStatus::Referred => "REFERRED",
            ParticipationStatus::Active => "ACTIVE",
            ParticipationStatus::Completed => "COMPLETED",
            ParticipationStatus::Other(value) => value,
        }
    }
}

pub const PROVIDER_OPTION_OTHER: &str = "OTHER";

/// 外寄郵件（bs/messages）。`reciever` 是 messaging 元件的欄位拼法。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "reciever")]
    pub receiver: String,
    pub sender: String,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub status: String,
    pub service: String,
    pub subject: String,
}

impl Message {
    pub fn queued_email(
        receiver: impl Into<String>,
        sender: impl Into<String>,
        content: String,
        service_id: &str,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            receiver: receiver.into(),
            sender: sender.into(),
            content,
            message_type: "email".to_string(),
            status: "queued".to_string(),
            service: format!("/services/{}", service_id),
            subject: subject.into(),
        }
    }
}
