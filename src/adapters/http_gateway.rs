use crate::config::{ComponentEndpoints, GatewaySettings};
use crate::domain::model::{reference_id, ListQuery, Resource, ResourceAddress, ResourcePage};
use crate::domain::ports::Gateway;
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// reqwest 實作的 CommonGround gateway client
pub struct HttpGateway {
    client: Client,
    endpoints: ComponentEndpoints,
    api_key: Option<String>,
}

impl HttpGateway {
    pub fn new(settings: &GatewaySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            endpoints: settings.components.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    fn url_for(&self, address: &ResourceAddress) -> String {
        format!(
            "{}/{}",
            self.endpoints
                .base_url(address.component)
                .trim_end_matches('/'),
            address.path()
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header("Accept", "application/json");

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", api_key);
        }
        request
    }

    async fn send_json(&self, request: RequestBuilder, url: &str) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();

        tracing::debug!("📡 {} -> {}", url, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::GatewayStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list(&self, address: &ResourceAddress, query: &ListQuery) -> Result<ResourcePage> {
        let url = self.url_for(address);
        let request = self.request(Method::GET, &url).query(&query.to_pairs());
        let body = self.send_json(request, &url).await?;
        parse_page(body, query.page)
    }

    async fn get(&self, address: &ResourceAddress, query: &ListQuery) -> Result<Resource> {
        let url = self.url_for(address);
        let request = self.request(Method::GET, &url).query(&query.to_pairs());
        Resource::from_value(self.send_json(request, &url).await?)
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Resource> {
        let url = Url::parse(reference).map_err(|_| ServiceError::InvalidReference {
            reference: reference.to_string(),
        })?;
        let request = self.request(Method::GET, url.as_str());
        Resource::from_value(self.send_json(request, url.as_str()).await?)
    }

    async fn create(&self, fields: Value, address: &ResourceAddress) -> Result<Resource> {
        let url = self.url_for(address);
        let request = self.request(Method::POST, &url).json(&fields);
        Resource::from_value(self.send_json(request, &url).await?)
    }

    async fn update(&self, fields: Value, address: &ResourceAddress) -> Result<Resource> {
        if address.id.is_none() {
            return Err(ServiceError::InvalidReference {
                reference: address.to_string(),
            });
        }
        let url = self.url_for(address);
        let request = self.request(Method::PUT, &url).json(&fields);
        Resource::from_value(self.send_json(request, &url).await?)
    }

    fn resolve_id_from_reference(&self, reference: &str) -> Result<String> {
        reference_id(reference)
    }
}

/// 解析列表回應。支援兩種格式：
/// gateway 的 `results/total/page/pages`，以及 hydra 的 `hydra:member/hydra:totalItems/hydra:view`
pub fn parse_page(body: Value, requested_page: Option<u32>) -> Result<ResourcePage> {
    let page = requested_page.unwrap_or(1);

    let mut body = match body {
        Value::Object(body) => body,
        Value::Array(items) => {
            let items = into_resources(items)?;
            return Ok(ResourcePage {
                total: items.len() as u64,
                items,
                page: 1,
                pages: 1,
                has_next: false,
            });
        }
        _ => return Err(ServiceError::missing_field("collection response", "results")),
    };

    if let Some(Value::Array(members)) = body.remove("hydra:member") {
        let items = into_resources(members)?;
        let total = body
            .get("hydra:totalItems")
            .and_then(Value::as_u64)
            .unwrap_or(items.len() as u64);
        let view = body.get("hydra:view");
        let has_next = view
            .and_then(|v| v.get("hydra:next"))
            .is_some_and(|next| !next.is_null());
        let pages = view
            .and_then(|v| v.get("hydra:last"))
            .and_then(Value::as_str)
            .and_then(page_param)
            .unwrap_or(if has_next { page + 1 } else { page });

        return Ok(ResourcePage {
            items,
            total,
            page,
            pages,
            has_next,
        });
    }

    if let Some(Value::Array(results)) = body.remove("results") {
        let items = into_resources(results)?;
        let total = body
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(items.len() as u64);
        let page = body
            .get("page")
            .and_then(Value::as_u64)
            .map(|p| p as u32)
            .unwrap_or(page);
        let pages = body
            .get("pages")
            .and_then(Value::as_u64)
            .map(|p| p as u32)
            .unwrap_or(page);

        return Ok(ResourcePage {
            items,
            total,
            page,
            pages,
            has_next: page < pages,
        });
    }

    Err(ServiceError::missing_field("collection response", "results"))
}

fn into_resources(values: Vec<Value>) -> Result<Vec<Resource>> {
    values.into_iter().map(Resource::from_value).collect()
}

/// `page` query parameter of a hydra link such as `/values?page=4`.
fn page_param(link: &str) -> Option<u32> {
    let url = Url::parse("http://hydra.local")
        .ok()?
        .join(link)
        .ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_results_format() {
        let body = json!({
            "results": [{"id": "p-1"}, {"id": "p-2"}],
            "total": 7,
            "page": 2,
            "pages": 4
        });
        let page = parse_page(body, Some(2)).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 7);
        assert_eq!(page.pages, 4);
        assert!(page.has_next);

        let last = parse_page(
            json!({"results": [], "total": 7, "page": 4, "pages": 4}),
            Some(4),
        )
        .unwrap();
        assert!(!last.has_next);
    }

    #[test]
    fn test_parse_empty_results_with_zero_pages() {
        let page = parse_page(
            json!({"results": [], "total": 0, "page": 1, "pages": 0}),
            Some(1),
        )
        .unwrap();
        assert_eq!(page.total, 0);
        assert!(!page.has_next);
    }

    #[test]
    fn test_parse_hydra_format() {
        let body = json!({
            "hydra:member": [{"id": "v-1"}],
            "hydra:totalItems": 31,
            "hydra:view": {
                "@id": "/values?page=1",
                "hydra:next": "/values?page=2",
                "hydra:last": "/values?exists%5BdateTimeValue%5D=true&page=2"
            }
        });
        let page = parse_page(body, Some(1)).unwrap();
        assert_eq!(page.total, 31);
        assert_eq!(page.pages, 2);
        assert!(page.has_next);

        let body = json!({"hydra:member": [], "hydra:totalItems": 0});
        let page = parse_page(body, Some(1)).unwrap();
        assert!(!page.has_next);
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn test_parse_rejects_unknown_shape() {
        assert!(parse_page(json!({"message": "hello"}), None).is_err());
        assert!(parse_page(json!("text"), None).is_err());
        assert!(parse_page(json!({"results": [1, 2]}), None).is_err());
    }
}
