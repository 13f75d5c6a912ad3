mod common;

use common::{
    FakeTracker, RecordingSink, SECRET, TRUSTED_IP, comment_create_payload, config,
    issue_create_payload, issue_state_update_payload, user,
};
use lambda_runtime::{Context, LambdaEvent};
use linear_relay::api::signature::compute_signature;
use linear_relay::api::{WebhookService, handler};
use linear_relay::errors::{ConfigError, ConfigIssue};
use serde_json::{Value, json};

fn tracker() -> FakeTracker {
    FakeTracker::with_users(vec![
        user("user-creator", "Ada Lovelace", "ada"),
        user("user-assignee", "john.doe@x.com", "john"),
        user("user-commenter", "Grace Hopper", "grace"),
    ])
}

fn event(method: &str, body: &str, signature: Option<&str>, ip: &str) -> Value {
    let signature = signature.map_or_else(|| compute_signature(body.as_bytes(), SECRET), str::to_string);
    json!({
        "httpMethod": method,
        "headers": {
            "Content-Type": "application/json",
            "Linear-Signature": signature,
            "X-Forwarded-For": ip
        },
        "body": body
    })
}

fn signed_post(payload: &Value) -> Value {
    event("POST", &payload.to_string(), None, TRUSTED_IP)
}

fn parse(response: &Value) -> (u64, Value) {
    let status = response["statusCode"].as_u64().unwrap();
    let body = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
    (status, body)
}

#[tokio::test]
async fn issue_create_with_assignee_is_delivered() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());

    let (status, body) = parse(&service.handle_event(&signed_post(&issue_create_payload(true))).await);

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "success": true, "message": "OK", "error": null }));

    let sent = service_sink(&service).messages();
    assert_eq!(sent.len(), 1);
    let names: Vec<&str> = sent[0].fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Team", "Status", "Assignee"]);
    assert_eq!(sent[0].fields[2].value, "[john](https://linear.app/acme/profiles/john)");
}

#[tokio::test]
async fn invalid_signature_is_forbidden_and_not_dispatched() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());
    let body = issue_create_payload(true).to_string();

    for signature in ["deadbeef", ""] {
        let (status, response) =
            parse(&service.handle_event(&event("POST", &body, Some(signature), TRUSTED_IP)).await);
        assert_eq!(status, 403);
        assert_eq!(response["success"], false);
        assert_eq!(response["error"], "Invalid signature");
    }
    assert!(service_sink(&service).messages().is_empty());
}

#[tokio::test]
async fn non_post_methods_are_rejected() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());

    let create = issue_create_payload(true).to_string();
    for body in ["", "{}", "not json", create.as_str()] {
        let (status, response) = parse(&service.handle_event(&event("GET", body, None, TRUSTED_IP)).await);
        assert_eq!(status, 405);
        assert_eq!(response["error"], "Method GET is not allowed.");
    }
    assert!(service_sink(&service).messages().is_empty());
}

#[tokio::test]
async fn signature_is_checked_before_method() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());
    let (status, _) = parse(&service.handle_event(&event("GET", "{}", Some("bad"), TRUSTED_IP)).await);
    assert_eq!(status, 403);
}

#[tokio::test]
async fn undecodable_base64_body_is_forbidden() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());
    let mut request = event("POST", "%%% not base64", Some("deadbeef"), TRUSTED_IP);
    request["isBase64Encoded"] = json!(true);

    let (status, body) = parse(&service.handle_event(&request).await);
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Invalid signature");
    assert!(service_sink(&service).messages().is_empty());
}

#[tokio::test]
async fn base64_body_is_verified_after_decoding() {
    use base64::Engine as _;

    let service = WebhookService::new(config(), tracker(), RecordingSink::default());
    let raw = issue_create_payload(true).to_string();
    let signature = compute_signature(raw.as_bytes(), SECRET);
    let encoded = base64::engine::general_purpose::STANDARD.encode(&raw);
    let mut request = event("POST", &encoded, Some(&signature), TRUSTED_IP);
    request["isBase64Encoded"] = json!(true);

    let (status, _) = parse(&service.handle_event(&request).await);
    assert_eq!(status, 200);
    assert_eq!(service_sink(&service).messages().len(), 1);
}

#[tokio::test]
async fn untrusted_ip_is_forbidden_outside_development() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());
    let body = issue_create_payload(false).to_string();

    let (status, response) =
        parse(&service.handle_event(&event("POST", &body, None, "203.0.113.9, 35.231.147.226")).await);
    assert_eq!(status, 403);
    assert_eq!(
        response["error"],
        "Request from IP address 203.0.113.9, 35.231.147.226 is not allowed."
    );
    assert!(service_sink(&service).messages().is_empty());

    let mut dev = config();
    dev.development_mode = true;
    let dev_service = WebhookService::new(dev, tracker(), RecordingSink::default());
    let (status, _) = parse(&dev_service.handle_event(&event("POST", &body, None, "127.0.0.1")).await);
    assert_eq!(status, 200);
    assert_eq!(service_sink(&dev_service).messages().len(), 1);
}

#[tokio::test]
async fn unknown_payloads_are_skipped_without_dispatch() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());

    let payloads = [
        "not json at all".to_string(),
        json!({ "type": "Project", "action": "create", "data": {} }).to_string(),
        json!({ "type": "Issue", "action": "archive" }).to_string(),
        json!({ "type": "Issue", "action": "create", "data": { "id": "x" } }).to_string(),
        comment_create_payload().to_string(),
        json!([1, 2, 3]).to_string(),
    ];

    for body in &payloads {
        let (status, response) = parse(&service.handle_event(&event("POST", body, None, TRUSTED_IP)).await);
        assert_eq!(status, 200, "body: {body}");
        assert_eq!(
            response,
            json!({ "success": true, "message": "Event skipped.", "error": null })
        );
    }
    assert!(service_sink(&service).messages().is_empty());
    assert!(service_tracker(&service).lookups().is_empty());
}

#[tokio::test]
async fn updates_without_state_change_and_removals_are_skipped() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());

    let mut title_edit = issue_state_update_payload();
    title_edit["updatedFrom"] = json!({ "title": "Old title" });
    let mut removal = issue_create_payload(false);
    removal["action"] = json!("remove");

    for payload in [title_edit, removal] {
        let (status, response) = parse(&service.handle_event(&signed_post(&payload)).await);
        assert_eq!(status, 200);
        assert_eq!(response["message"], "Event skipped.");
    }
    assert!(service_sink(&service).messages().is_empty());
}

#[tokio::test]
async fn state_change_is_delivered() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());
    let (status, _) = parse(&service.handle_event(&signed_post(&issue_state_update_payload())).await);
    assert_eq!(status, 200);

    let sent = service_sink(&service).messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].description.as_deref(), Some("Status: **In Progress**"));
}

#[tokio::test]
async fn comments_are_delivered_when_enabled() {
    let mut cfg = config();
    cfg.accept_comment_events = true;
    let service = WebhookService::new(cfg, tracker(), RecordingSink::default());

    let (status, body) = parse(&service.handle_event(&signed_post(&comment_create_payload())).await);
    assert_eq!(status, 200);
    assert_eq!(body["message"], "OK");
    assert_eq!(
        service_sink(&service).messages()[0].author.as_ref().unwrap().name,
        "New comment"
    );
}

#[tokio::test]
async fn downstream_failures_return_generic_500() {
    let failing_tracker = FakeTracker {
        fail: true,
        ..tracker()
    };
    let service = WebhookService::new(config(), failing_tracker, RecordingSink::default());
    let (status, body) = parse(&service.handle_event(&signed_post(&issue_create_payload(false))).await);
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Something went wrong.");
    assert!(service_sink(&service).messages().is_empty());

    let service = WebhookService::new(config(), tracker(), RecordingSink::failing());
    let (status, body) = parse(&service.handle_event(&signed_post(&issue_create_payload(false))).await);
    assert_eq!(status, 500);
    assert_eq!(body, json!({ "success": false, "message": null, "error": "Something went wrong." }));
}

#[tokio::test]
async fn url_without_identifier_is_a_bad_request() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());
    let mut payload = issue_create_payload(false);
    payload["url"] = json!("https://linear.app/acme");

    let (status, body) = parse(&service.handle_event(&signed_post(&payload)).await);
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(service_sink(&service).messages().is_empty());
}

#[tokio::test]
async fn lambda_handler_reports_config_errors() {
    let err = ConfigError {
        issues: vec![
            ConfigIssue::new("DISCORD_WEBHOOKS_URL", "Required"),
            ConfigIssue::new("LINEAR_SECRET", "Required"),
        ],
    };
    let service: Result<&WebhookService<FakeTracker, RecordingSink>, &ConfigError> = Err(&err);

    let event = LambdaEvent::new(signed_post(&issue_create_payload(false)), Context::default());
    let (status, body) = parse(&handler(service, event).await.unwrap());

    assert_eq!(status, 500);
    assert_eq!(body["error"][1]["path"], json!(["LINEAR_SECRET"]));
}

#[tokio::test]
async fn lambda_handler_delegates_to_service() {
    let service = WebhookService::new(config(), tracker(), RecordingSink::default());
    let event = LambdaEvent::new(signed_post(&issue_create_payload(true)), Context::default());

    let (status, _) = parse(&handler(Ok(&service), event).await.unwrap());
    assert_eq!(status, 200);
    assert_eq!(
        service_tracker(&service).lookups(),
        vec!["user-assignee".to_string(), "user-creator".to_string()]
    );
}

fn service_sink(service: &WebhookService<FakeTracker, RecordingSink>) -> &RecordingSink {
    service.sink()
}

fn service_tracker(service: &WebhookService<FakeTracker, RecordingSink>) -> &FakeTracker {
    service.tracker()
}
