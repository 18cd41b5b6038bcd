#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use taalhuizen_service::domain::model::{
    reference_id, Component, ListQuery, Resource, ResourceAddress, ResourcePage,
};
use taalhuizen_service::domain::ports::{Gateway, TemplateParameters, TemplateRenderer};
use taalhuizen_service::{Result, ServiceError};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(String, ListQuery),
    Get(String),
    GetByReference(String),
    Create(String, Value),
    Update(String, Value),
}

#[derive(Default)]
struct State {
    collections: HashMap<(Component, String), Vec<Resource>>,
    documents: HashMap<String, Resource>,
    failing_updates: HashMap<String, u32>,
    calls: Vec<Call>,
    created: u64,
}

/// In-memory gateway that evaluates filters on every request, like the real
/// one, so corrected items drop out of later listings.
pub struct InMemoryGateway {
    state: Mutex<State>,
    page_size: usize,
}

impl InMemoryGateway {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size,
        }
    }

    pub fn insert(&self, component: Component, resource_type: &str, value: Value) {
        let resource = Resource::from_value(value).expect("fixture must be an object");
        self.state
            .lock()
            .unwrap()
            .collections
            .entry((component, resource_type.to_string()))
            .or_default()
            .push(resource);
    }

    /// Registers a resource served by `get` (address) or `get_by_reference` (URL).
    pub fn insert_document(&self, key: &str, value: Value) {
        let resource = Resource::from_value(value).expect("fixture must be an object");
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(key.to_string(), resource);
    }

    /// The next `times` updates of `id` fail with a 500.
    pub fn fail_updates(&self, id: &str, times: u32) {
        self.state
            .lock()
            .unwrap()
            .failing_updates
            .insert(id.to_string(), times);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn updates(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update(address, fields) => Some((address, fields)),
                _ => None,
            })
            .collect()
    }

    pub fn creates(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create(address, fields) => Some((address, fields)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn find(&self, component: Component, resource_type: &str, id: &str) -> Option<Resource> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(&(component, resource_type.to_string()))?
            .iter()
            .find(|r| r.id().as_deref() == Some(id))
            .cloned()
    }
}

fn filter_matches(resource: &Resource, key: &str, expected: &str) -> bool {
    if let Some(field) = key.strip_prefix("exists[").and_then(|k| k.strip_suffix(']')) {
        let present = resource.get_path(field).is_some_and(|v| !v.is_null());
        return present == (expected == "true");
    }
    if let Some(field) = key.strip_suffix("[before]") {
        return match resource.str_at(field) {
            Some(value) => value.get(..10).unwrap_or(value.as_str()) < expected,
            None => false,
        };
    }
    resource.str_at(key).as_deref() == Some(expected)
}

fn not_found(address: &str) -> ServiceError {
    ServiceError::GatewayStatus {
        status: 404,
        url: address.to_string(),
        body: "Not Found".to_string(),
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn list(&self, address: &ResourceAddress, query: &ListQuery) -> Result<ResourcePage> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(address.to_string(), query.clone()));

        let matching: Vec<Resource> = state
            .collections
            .get(&(address.component, address.resource_type.clone()))
            .map(|items| {
                items
                    .iter()
                    .filter(|r| query.filters.iter().all(|(k, v)| filter_matches(r, k, v)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let total = matching.len() as u64;
        let Some(page) = query.page else {
            return Ok(ResourcePage {
                items: matching,
                total,
                page: 1,
                pages: 1,
                has_next: false,
            });
        };

        let pages = matching.len().div_ceil(self.page_size).max(1) as u32;
        let items = matching
            .into_iter()
            .skip((page as usize - 1) * self.page_size)
            .take(self.page_size)
            .collect();

        Ok(ResourcePage {
            items,
            total,
            page,
            pages,
            has_next: page < pages,
        })
    }

    async fn get(&self, address: &ResourceAddress, _query: &ListQuery) -> Result<Resource> {
        let key = address.to_string();
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get(key.clone()));
        state.documents.get(&key).cloned().ok_or_else(|| not_found(&key))
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Resource> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetByReference(reference.to_string()));
        state
            .documents
            .get(reference)
            .cloned()
            .ok_or_else(|| not_found(reference))
    }

    async fn create(&self, fields: Value, address: &ResourceAddress) -> Result<Resource> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(address.to_string(), fields.clone()));
        state.created += 1;

        let mut resource = Resource::from_value(fields)?;
        resource.data.insert(
            "id".to_string(),
            json!(format!("{}-{}", address.resource_type, state.created)),
        );
        state
            .collections
            .entry((address.component, address.resource_type.clone()))
            .or_default()
            .push(resource.clone());
        Ok(resource)
    }

    async fn update(&self, fields: Value, address: &ResourceAddress) -> Result<Resource> {
        let key = address.to_string();
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update(key.clone(), fields.clone()));

        let id = address.id.clone().ok_or_else(|| not_found(&key))?;
        if let Some(remaining) = state.failing_updates.get_mut(&id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ServiceError::GatewayStatus {
                    status: 500,
                    url: key,
                    body: "Internal Server Error".to_string(),
                });
            }
        }

        let stored = state
            .collections
            .get_mut(&(address.component, address.resource_type.clone()))
            .and_then(|items| items.iter_mut().find(|r| r.id().as_deref() == Some(id.as_str())))
            .ok_or_else(|| not_found(&key))?;

        if let Value::Object(fields) = fields {
            for (field, value) in fields {
                stored.data.insert(field, value);
            }
        }
        Ok(stored.clone())
    }

    fn resolve_id_from_reference(&self, reference: &str) -> Result<String> {
        reference_id(reference)
    }
}

/// Renders `name|key=value;...` and remembers every parameter map it saw.
#[derive(Default)]
pub struct RecordingRenderer {
    pub rendered: Mutex<Vec<(String, TemplateParameters)>>,
}

impl RecordingRenderer {
    pub fn last(&self) -> (String, TemplateParameters) {
        self.rendered
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("nothing rendered")
    }
}

impl TemplateRenderer for RecordingRenderer {
    fn render(&self, template: &str, parameters: &TemplateParameters) -> Result<String> {
        self.rendered
            .lock()
            .unwrap()
            .push((template.to_string(), parameters.clone()));
        let body: Vec<String> = parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        Ok(format!("{}|{}", template, body.join(";")))
    }
}

pub fn params(pairs: &[(&str, &str)]) -> TemplateParameters {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<BTreeMap<_, _>>()
}
