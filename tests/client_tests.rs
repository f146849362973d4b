//! HTTP client tests against a local mock server

use estate_admin_core::api::{AdminApi, CollectionFilter, HttpAdminClient};
use estate_admin_core::dispatch::EntityKind;
use estate_admin_core::remote::RemoteError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpAdminClient {
    HttpAdminClient::new(&server.uri(), Duration::from_secs(5), None).unwrap()
}

#[tokio::test]
async fn test_list_normalizes_nested_agent_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .and(query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "agents": {
                "data": [{"id": "a1"}, {"id": "a2"}],
                "totalAgents": 22,
                "currentPage": 2,
                "totalPages": 3
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let filter = CollectionFilter::new().status("pending");
    let envelope = client
        .list(EntityKind::Agent, &filter, 2, 10)
        .await
        .unwrap();

    let page = envelope.into_data().unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 22);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.total_pages, 3);
}

#[tokio::test]
async fn test_list_normalizes_bare_user_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/buyers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "users": [{"id": "b1"}],
            "totalUsers": 5
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let envelope = client
        .list(EntityKind::Buyer, &CollectionFilter::new(), 1, 2)
        .await
        .unwrap();

    let page = envelope.into_data().unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 5);
    // totalPages derived from total and limit when the server omits it
    assert_eq!(page.total_pages, 3);
}

#[tokio::test]
async fn test_approve_posts_to_action_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agents/a7/approve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Agent approved successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let envelope = client.approve(EntityKind::Agent, "a7").await.unwrap();
    assert!(envelope.success);
    assert_eq!(envelope.message.as_deref(), Some("Agent approved successfully"));
}

#[tokio::test]
async fn test_reject_sends_reason_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/testimonials/t2/reject"))
        .and(body_json(json!({"reason": "spam"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let envelope = client
        .reject(EntityKind::Testimonial, "t2", Some("spam"))
        .await
        .unwrap();
    assert!(envelope.success);
}

#[tokio::test]
async fn test_delete_uses_delete_verb() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/properties/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let envelope = client.delete(EntityKind::Property, "p1").await.unwrap();
    assert!(envelope.success);
}

#[tokio::test]
async fn test_error_envelope_passes_through_on_4xx() {
    // A JSON failure envelope on a non-2xx status is still the server's
    // answer, not a transport failure
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agents/a1/approve"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "error": "Agent already approved"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let envelope = client.approve(EntityKind::Agent, "a1").await.unwrap();
    assert!(!envelope.success);
    assert_eq!(envelope.failure_message(), "Agent already approved");
}

#[tokio::test]
async fn test_unparsable_error_body_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/agents/a1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.delete(EntityKind::Agent, "a1").await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport { .. }));
}

#[tokio::test]
async fn test_bearer_token_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inspections"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "inspections": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpAdminClient::new(
        &server.uri(),
        Duration::from_secs(5),
        Some("secret-token".to_string()),
    )
    .unwrap();
    let envelope = client
        .list(EntityKind::Inspection, &CollectionFilter::new(), 1, 10)
        .await
        .unwrap();
    assert!(envelope.success);
}

#[tokio::test]
async fn test_repeated_query_values_for_multi_filters() {
    let server = MockServer::start().await;
    // wiremock's query_param matches a single value; assert both are present
    // via the raw query string instead
    Mock::given(method("GET"))
        .and(path("/properties"))
        .and(wiremock::matchers::query_param_contains("status", "active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "properties": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let filter =
        CollectionFilter::new().set_many(CollectionFilter::STATUS, ["active", "leased"]);
    let envelope = client
        .list(EntityKind::Property, &filter, 1, 10)
        .await
        .unwrap();
    assert!(envelope.success);
}
