use crate::core::{SweepJob, Result};
use crate::domain::model::{Component, ListQuery, Resource, ResourceAddress, ResourcePage};
use crate::domain::ports::Gateway;
use crate::utils::datetime::to_canonical_string;
use async_trait::async_trait;
use serde_json::json;

/// 有 dateTimeValue 但缺 stringValue 的 value，補上標準格式字串
pub struct DateTimeValuesJob<'a, G: Gateway> {
    gateway: &'a G,
}

impl<'a, G: Gateway> DateTimeValuesJob<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    pub fn query(page: u32) -> ListQuery {
        ListQuery::new()
            .filter("exists[dateTimeValue]", "true")
            .filter("exists[stringValue]", "false")
            .page(page)
    }
}

#[async_trait]
impl<'a, G: Gateway> SweepJob for DateTimeValuesJob<'a, G> {
    fn name(&self) -> &str {
        "values"
    }

    async fn fetch_page(&self, page: u32) -> Result<ResourcePage> {
        let address = ResourceAddress::collection(Component::GatewayAdmin, "values");
        self.gateway.list(&address, &Self::query(page)).await
    }

    async fn process(&self, value: &Resource) -> Result<String> {
        let id = value.require_id()?;
        let string_value = to_canonical_string(&value.require_str("dateTimeValue")?)?;

        self.gateway
            .update(
                json!({ "stringValue": string_value }),
                &ResourceAddress::item(Component::GatewayAdmin, "values", id),
            )
            .await?;

        Ok(format!("now has stringValue {}", string_value))
    }
}
