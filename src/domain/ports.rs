use crate::domain::model::{ListQuery, Resource, ResourceAddress, ResourcePage};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// CommonGround 資源 gateway 的存取介面
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn list(&self, address: &ResourceAddress, query: &ListQuery) -> Result<ResourcePage>;

    async fn get(&self, address: &ResourceAddress, query: &ListQuery) -> Result<Resource>;

    /// Fetches a resource by its absolute `@id` URL.
    async fn get_by_reference(&self, reference: &str) -> Result<Resource>;

    async fn create(&self, fields: Value, address: &ResourceAddress) -> Result<Resource>;

    async fn update(&self, fields: Value, address: &ResourceAddress) -> Result<Resource>;

    fn resolve_id_from_reference(&self, reference: &str) -> Result<String>;
}

pub type TemplateParameters = BTreeMap<String, String>;

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, parameters: &TemplateParameters) -> Result<String>;
}

impl<T: TemplateRenderer + ?Sized> TemplateRenderer for Arc<T> {
    fn render(&self, template: &str, parameters: &TemplateParameters) -> Result<String> {
        self.as_ref().render(template, parameters)
    }
}
