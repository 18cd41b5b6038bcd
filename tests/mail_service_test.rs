mod common;

use base64::prelude::*;
use common::{Call, InMemoryGateway, RecordingRenderer};
use serde_json::json;
use std::sync::Arc;
use taalhuizen_service::config::MailSettings;
use taalhuizen_service::domain::model::{Component, Resource};
use taalhuizen_service::{MailService, ServiceError, TemplateRegistry};

fn settings(service_id: Option<&str>) -> MailSettings {
    MailSettings {
        sender: "taalhuizen@biscutrecht.nl".to_string(),
        service_id: service_id.map(str::to_string),
        frontend_location: "https://taalhuis.example/".to_string(),
        templates_dir: None,
    }
}

fn user(person: serde_json::Value) -> Resource {
    Resource::from_value(json!({
        "id": "u-1",
        "username": "a@b.com",
        "person": person
    }))
    .unwrap()
}

fn gateway_with_token() -> Arc<InMemoryGateway> {
    let gateway = Arc::new(InMemoryGateway::new(10));
    gateway.insert_document("uc/users/u-1/token", json!({"token": "tok-123"}));
    gateway.insert_document(
        "https://cg.example/api/v1/cc/people/person-1",
        json!({"id": "person-1", "name": "Anne de Vries"}),
    );
    gateway
}

#[tokio::test]
async fn test_welcome_mail_parameters_and_message() {
    let gateway = gateway_with_token();
    let renderer = Arc::new(RecordingRenderer::default());
    let service = MailService::new(gateway.clone(), renderer.clone(), settings(Some("svc-1")));

    let message = service
        .send_welcome_mail(
            &user(json!("https://cg.example/api/v1/cc/people/person-1")),
            "Welkom bij Taalhuizen",
        )
        .await
        .unwrap();

    let (template, parameters) = renderer.last();
    assert_eq!(template, "welcome-email");
    assert_eq!(parameters["fullname"], "Anne de Vries");
    assert_eq!(parameters["base64_encoded_email"], BASE64_STANDARD.encode("a@b.com"));
    assert_eq!(parameters["base64_encoded_email"], "YUBiLmNvbQ==");
    assert_eq!(parameters["base64_encoded_token"], BASE64_STANDARD.encode("tok-123"));
    assert_eq!(parameters["app_base_url"], "https://taalhuis.example");
    assert_eq!(parameters["subject"], "Welkom bij Taalhuizen");

    let creates = gateway.creates();
    assert_eq!(creates.len(), 1);
    let (address, fields) = &creates[0];
    assert_eq!(address, "bs/messages");
    assert_eq!(fields["reciever"], "a@b.com");
    assert_eq!(fields["sender"], "taalhuizen@biscutrecht.nl");
    assert_eq!(fields["type"], "email");
    assert_eq!(fields["status"], "queued");
    assert_eq!(fields["service"], "/services/svc-1");
    assert_eq!(fields["subject"], "Welkom bij Taalhuizen");
    assert!(fields["content"].as_str().unwrap().starts_with("welcome-email|"));

    assert_eq!(message.str_at("status").as_deref(), Some("queued"));
}

#[tokio::test]
async fn test_welcome_mail_falls_back_to_username() {
    let gateway = gateway_with_token();
    let renderer = Arc::new(RecordingRenderer::default());
    let service = MailService::new(gateway.clone(), renderer.clone(), settings(Some("svc-1")));

    service
        .send_welcome_mail(&user(serde_json::Value::Null), "Welkom")
        .await
        .unwrap();

    assert_eq!(renderer.last().1["fullname"], "a@b.com");
    assert!(!gateway
        .calls()
        .iter()
        .any(|call| matches!(call, Call::GetByReference(_))));
}

#[tokio::test]
async fn test_welcome_mail_uses_embedded_person_name() {
    let gateway = gateway_with_token();
    let renderer = Arc::new(RecordingRenderer::default());
    let service = MailService::new(gateway.clone(), renderer.clone(), settings(Some("svc-1")));

    service
        .send_welcome_mail(&user(json!({"name": "Sanne Bakker"})), "Welkom")
        .await
        .unwrap();

    assert_eq!(renderer.last().1["fullname"], "Sanne Bakker");
}

#[tokio::test]
async fn test_welcome_mail_without_token_creates_nothing() {
    let gateway = Arc::new(InMemoryGateway::new(10));
    let service = MailService::new(
        gateway.clone(),
        Arc::new(RecordingRenderer::default()),
        settings(Some("svc-1")),
    );

    let err = service
        .send_welcome_mail(&user(serde_json::Value::Null), "Welkom")
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::GatewayStatus { status: 404, .. }));
    assert!(gateway.creates().is_empty());
}

#[tokio::test]
async fn test_unconfigured_service_uses_first_listed() {
    let gateway = gateway_with_token();
    gateway.insert(Component::Bs, "services", json!({"id": "svc-first"}));
    gateway.insert(Component::Bs, "services", json!({"id": "svc-second"}));
    let service = MailService::new(
        gateway.clone(),
        Arc::new(RecordingRenderer::default()),
        settings(None),
    );

    service
        .send_employee_exists_mail(&user(serde_json::Value::Null), "Account bestaat al")
        .await
        .unwrap();

    assert_eq!(gateway.creates()[0].1["service"], "/services/svc-first");
}

#[tokio::test]
async fn test_unconfigured_service_without_services_fails() {
    let gateway = gateway_with_token();
    let service = MailService::new(
        gateway.clone(),
        Arc::new(RecordingRenderer::default()),
        settings(None),
    );

    let err = service
        .send_employee_exists_mail(&user(serde_json::Value::Null), "Account bestaat al")
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::EmptyCollection { .. }));
    assert!(gateway.creates().is_empty());
}

#[tokio::test]
async fn test_employee_exists_mail() {
    let gateway = gateway_with_token();
    let renderer = Arc::new(RecordingRenderer::default());
    let service = MailService::new(gateway.clone(), renderer.clone(), settings(Some("svc-1")));

    service
        .send_employee_exists_mail(
            &user(json!("https://cg.example/api/v1/cc/people/person-1")),
            "Account bestaat al",
        )
        .await
        .unwrap();

    let (template, parameters) = renderer.last();
    assert_eq!(template, "employee-exists-email");
    assert_eq!(parameters["fullname"], "Anne de Vries");
    assert_eq!(parameters["username"], "a@b.com");
    assert_eq!(gateway.creates()[0].1["reciever"], "a@b.com");
}

#[tokio::test]
async fn test_share_student_mail_with_built_in_template() {
    let gateway = Arc::new(InMemoryGateway::new(10));
    let service = MailService::new(
        gateway.clone(),
        TemplateRegistry::with_defaults(),
        settings(Some("svc-1")),
    );
    let share = Resource::from_value(json!({
        "email": "coach@taalhuis.example",
        "student": { "person": { "givenName": "Yusuf" } }
    }))
    .unwrap();

    service
        .send_share_student_mail(&share, "Deelnemer gedeeld")
        .await
        .unwrap();

    let creates = gateway.creates();
    assert_eq!(creates.len(), 1);
    let fields = &creates[0].1;
    assert_eq!(fields["reciever"], "coach@taalhuis.example");
    let content = fields["content"].as_str().unwrap();
    assert!(content.contains("Yusuf"));
    assert!(content.contains("Beste coach@taalhuis.example"));
    assert!(content.contains("<title>Deelnemer gedeeld</title>"));
}

#[tokio::test]
async fn test_each_call_enqueues_a_new_message() {
    let gateway = gateway_with_token();
    let service = MailService::new(
        gateway.clone(),
        TemplateRegistry::with_defaults(),
        settings(Some("svc-1")),
    );
    let user = user(serde_json::Value::Null);

    service.send_employee_exists_mail(&user, "Hallo").await.unwrap();
    service.send_employee_exists_mail(&user, "Hallo").await.unwrap();

    assert_eq!(gateway.creates().len(), 2);
}
