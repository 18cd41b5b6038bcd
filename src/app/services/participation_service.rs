use crate::app::jobs::{learning_need_id, CompletedParticipationsJob, DateTimeValuesJob};
use crate::core::{run_sweep, SweepReport};
use crate::domain::model::{
    Component, ListQuery, ParticipationStatus, Resource, ResourceAddress, PROVIDER_OPTION_OTHER,
};
use crate::domain::ports::Gateway;
use crate::utils::error::Result;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;

pub struct ParticipationService<G: Gateway> {
    gateway: Arc<G>,
}

impl<G: Gateway> ParticipationService<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// providerOption 為 OTHER 的 participation 不需轉介，REFERRED 直接變 ACTIVE。
    /// 其他情況原樣回傳，不呼叫 gateway。
    pub async fn set_status(&self, participation: Resource) -> Result<Resource> {
        let is_other = participation.str_at("providerOption").as_deref() == Some(PROVIDER_OPTION_OTHER);
        let is_referred = participation
            .str_at("status")
            .map(|status| ParticipationStatus::parse(&status))
            == Some(ParticipationStatus::Referred);

        if !(is_other && is_referred) {
            return Ok(participation);
        }

        let id = participation.require_id()?;
        let update = json!({
            "status": ParticipationStatus::Active.as_str(),
            "learningNeed": learning_need_id(&participation)?,
            "providerOption": PROVIDER_OPTION_OTHER,
        });

        tracing::info!("Participation {} is REFERRED with provider OTHER, activating", id);
        self.gateway
            .update(
                update,
                &ResourceAddress::item(Component::Gateway, "participations", id),
            )
            .await
    }

    /// Sets `student.referred` when this is the student's first participation.
    ///
    /// "First" means the gateway counts exactly one participation for the
    /// student. Participations created concurrently may both observe a count
    /// of 1 (date written twice) or both observe 2 (date never written).
    pub async fn check_student_referred(&self, participation: &Resource) -> Result<Option<Resource>> {
        let student_id = participation.require_str("learningNeed.student.id")?;

        let count = self
            .gateway
            .list(
                &ResourceAddress::collection(Component::Gateway, "participations"),
                &ListQuery::new().filter("learningNeed.student.id", student_id.as_str()),
            )
            .await?
            .total;

        if count != 1 {
            tracing::debug!(
                "Student {} has {} participations, referred date left untouched",
                student_id,
                count
            );
            return Ok(None);
        }

        let person_reference = participation.require_str("learningNeed.student.person.@id")?;
        let update = json!({
            "person": self.gateway.resolve_id_from_reference(&person_reference)?,
            "referred": participation.require_str("@dateCreated")?,
        });

        let student = self
            .gateway
            .update(
                update,
                &ResourceAddress::item(Component::Gateway, "students", student_id.as_str()),
            )
            .await?;

        tracing::info!("Student {} referred on first participation", student_id);
        Ok(Some(student))
    }

    /// 排程作業：過期的 ACTIVE participation 改為 COMPLETED
    pub async fn update_completed_participations(&self) -> Result<SweepReport> {
        self.update_completed_participations_on(chrono::Local::now().date_naive())
            .await
    }

    pub async fn update_completed_participations_on(&self, today: NaiveDate) -> Result<SweepReport> {
        let job = CompletedParticipationsJob::new(self.gateway.as_ref(), today);
        run_sweep(&job).await
    }

    pub async fn update_gateway_date_time_values(&self) -> Result<SweepReport> {
        let job = DateTimeValuesJob::new(self.gateway.as_ref());
        run_sweep(&job).await
    }
}
