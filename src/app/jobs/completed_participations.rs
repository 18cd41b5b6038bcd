use crate::app::jobs::learning_need_id;
use crate::core::{SweepJob, Result};
use crate::domain::model::{
    Component, ListQuery, ParticipationStatus, Resource, ResourceAddress, ResourcePage,
};
use crate::domain::ports::Gateway;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

/// ACTIVE 且 end 早於今天的 participation 改為 COMPLETED
pub struct CompletedParticipationsJob<'a, G: Gateway> {
    gateway: &'a G,
    today: NaiveDate,
}

impl<'a, G: Gateway> CompletedParticipationsJob<'a, G> {
    pub fn new(gateway: &'a G, today: NaiveDate) -> Self {
        Self { gateway, today }
    }

    pub fn query(&self, page: u32) -> ListQuery {
        ListQuery::new()
            .filter("end[before]", self.today.format("%Y-%m-%d").to_string())
            .filter("status", ParticipationStatus::Active.as_str())
            .fields(&["status", "learningNeed.id", "providerOption", "end"])
            .page(page)
    }
}

#[async_trait]
impl<'a, G: Gateway> SweepJob for CompletedParticipationsJob<'a, G> {
    fn name(&self) -> &str {
        "participation-status"
    }

    async fn fetch_page(&self, page: u32) -> Result<ResourcePage> {
        let address = ResourceAddress::collection(Component::Gateway, "participations");
        self.gateway.list(&address, &self.query(page)).await
    }

    async fn process(&self, participation: &Resource) -> Result<String> {
        let id = participation.require_id()?;
        let update = json!({
            "status": ParticipationStatus::Completed.as_str(),
            "learningNeed": learning_need_id(participation)?,
            "providerOption": participation
                .get_path("providerOption")
                .cloned()
                .unwrap_or(Value::Null),
        });

        self.gateway
            .update(
                update,
                &ResourceAddress::item(Component::Gateway, "participations", id),
            )
            .await?;

        Ok(format!(
            "with end {} now has status COMPLETED",
            participation.str_at("end").unwrap_or_default()
        ))
    }
}
