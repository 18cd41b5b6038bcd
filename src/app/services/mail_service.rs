use crate::adapters::templates::{EMPLOYEE_EXISTS_EMAIL, SHARE_STUDENT_EMAIL, WELCOME_EMAIL};
use crate::config::MailSettings;
use crate::domain::model::{Component, ListQuery, Message, Resource, ResourceAddress};
use crate::domain::ports::{Gateway, TemplateParameters, TemplateRenderer};
use crate::utils::error::{Result, ServiceError};
use base64::prelude::*;
use serde_json::Value;
use std::sync::Arc;

/// 組裝並排入佇列（status = queued）的交易郵件。任何 gateway 錯誤直接往上拋。
pub struct MailService<G: Gateway, R: TemplateRenderer> {
    gateway: Arc<G>,
    renderer: R,
    settings: MailSettings,
}

impl<G: Gateway, R: TemplateRenderer> MailService<G, R> {
    pub fn new(gateway: Arc<G>, renderer: R, settings: MailSettings) -> Self {
        Self {
            gateway,
            renderer,
            settings,
        }
    }

    /// Welcome mail with a set-password link for a freshly created user.
    pub async fn send_welcome_mail(&self, user: &Resource, subject: &str) -> Result<Resource> {
        let user_id = user.require_id()?;
        let username = user.require_str("username")?;

        let token_address =
            ResourceAddress::item(Component::Uc, "users", format!("{}/token", user_id));
        let token = self
            .gateway
            .get(
                &token_address,
                &ListQuery::new().filter("type", "SET_PASSWORD"),
            )
            .await?
            .require_str("token")?;

        let fullname = self.full_name(user, &username).await?;
        let service_id = self.service_id().await?;

        let mut parameters = TemplateParameters::new();
        parameters.insert("fullname".into(), fullname);
        parameters.insert(
            "base64_encoded_email".into(),
            BASE64_STANDARD.encode(username.as_bytes()),
        );
        parameters.insert(
            "base64_encoded_token".into(),
            BASE64_STANDARD.encode(token.as_bytes()),
        );
        parameters.insert(
            "app_base_url".into(),
            self.settings.app_base_url().to_string(),
        );
        parameters.insert("subject".into(), subject.to_string());

        let content = self.renderer.render(WELCOME_EMAIL, &parameters)?;
        self.queue(&username, content, &service_id, subject).await
    }

    /// Tells the recipient of a share that a student's data was shared with them.
    pub async fn send_share_student_mail(
        &self,
        share_student: &Resource,
        subject: &str,
    ) -> Result<Resource> {
        let email = share_student.require_str("email")?;
        let student_name = share_student.require_str("student.person.givenName")?;
        let service_id = self.service_id().await?;

        let mut parameters = TemplateParameters::new();
        parameters.insert("fullname".into(), email.clone());
        parameters.insert("studentName".into(), student_name);
        parameters.insert("subject".into(), subject.to_string());

        let content = self.renderer.render(SHARE_STUDENT_EMAIL, &parameters)?;
        self.queue(&email, content, &service_id, subject).await
    }

    pub async fn send_employee_exists_mail(&self, user: &Resource, subject: &str) -> Result<Resource> {
        let username = user.require_str("username")?;
        let fullname = self.full_name(user, &username).await?;
        let service_id = self.service_id().await?;

        let mut parameters = TemplateParameters::new();
        parameters.insert("fullname".into(), fullname);
        parameters.insert("username".into(), username.clone());
        parameters.insert("subject".into(), subject.to_string());

        let content = self.renderer.render(EMPLOYEE_EXISTS_EMAIL, &parameters)?;
        self.queue(&username, content, &service_id, subject).await
    }

    /// 使用者對應 person 的 name；沒有 person 或沒有 name 時退回 username
    async fn full_name(&self, user: &Resource, username: &str) -> Result<String> {
        let name = match user.get_path("person") {
            Some(Value::String(reference)) if !reference.is_empty() => {
                self.gateway.get_by_reference(reference).await?.str_at("name")
            }
            Some(Value::Object(person)) => {
                let person = Resource::new(person.clone());
                match (person.str_at("name"), person.str_at("@id")) {
                    (Some(name), _) => Some(name),
                    (None, Some(reference)) => {
                        self.gateway.get_by_reference(&reference).await?.str_at("name")
                    }
                    (None, None) => None,
                }
            }
            _ => None,
        };

        Ok(name.unwrap_or_else(|| username.to_string()))
    }

    async fn service_id(&self) -> Result<String> {
        if let Some(service_id) = &self.settings.service_id {
            return Ok(service_id.clone());
        }

        let address = ResourceAddress::collection(Component::Bs, "services");
        tracing::warn!(
            "mail.service_id is not configured, using the first service listed at {}",
            address
        );
        let services = self.gateway.list(&address, &ListQuery::new()).await?;
        services
            .items
            .first()
            .ok_or_else(|| ServiceError::EmptyCollection {
                address: address.to_string(),
            })?
            .require_id()
    }

    async fn queue(
        &self,
        receiver: &str,
        content: String,
        service_id: &str,
        subject: &str,
    ) -> Result<Resource> {
        let message = Message::queued_email(
            receiver,
            self.settings.sender.as_str(),
            content,
            service_id,
            subject,
        );
        let created = self
            .gateway
            .create(
                serde_json::to_value(&message)?,
                &ResourceAddress::collection(Component::Bs, "messages"),
            )
            .await?;

        tracing::info!("✉️ Queued '{}' for {}", subject, receiver);
        Ok(created)
    }
}
