use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    auth::{API_KEY_HEADER, ORGANIZATION_HEADER},
    config::AppConfig,
    http::{AppState, build_router},
};

const SECRET: &str = "0123456789abcdef0123456789abcdef";

async fn test_app() -> Router {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let config = AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_string()),
        "JWT_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })
    .unwrap();
    build_router(AppState::new(db, Arc::new(config)))
}

#[derive(Default)]
struct Call<'a> {
    token: Option<&'a str>,
    org: Option<&'a str>,
    api_key: Option<&'a str>,
    body: Option<Value>,
}

async fn send(app: &Router, method: Method, uri: &str, call: Call<'_>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = call.token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(org) = call.org {
        builder = builder.header(ORGANIZATION_HEADER, org);
    }
    if let Some(key) = call.api_key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    let request = match call.body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Registers a user, creates an organization and returns `(token, org_id)`.
async fn signed_in(app: &Router, email: &str) -> (String, String) {
    let (status, auth) = send(
        app,
        Method::POST,
        "/api/auth/register",
        Call {
            body: Some(json!({"name": "Ana", "email": email, "password": "s3cret-pass"})),
            ..Call::default()
        },
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{auth}");
    let token = auth["token"].as_str().unwrap().to_string();

    let (status, org) = send(
        app,
        Method::POST,
        "/api/organizations",
        Call {
            token: Some(token.as_str()),
            body: Some(json!({"name": "Acme"})),
            ..Call::default()
        },
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{org}");
    (token, org["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn health_reports_database() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", Call::default()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["dbOk"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/deals", Call::default()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "General.Unauthorized");

    let garbage = Call {
        token: Some("not-a-jwt"),
        ..Call::default()
    };
    let (status, _) = send(&app, Method::GET, "/api/auth/me", garbage).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tenant_header_is_required_and_must_parse() {
    let app = test_app().await;
    let (token, _) = signed_in(&app, "ana@example.com").await;

    let missing = Call {
        token: Some(token.as_str()),
        ..Call::default()
    };
    let (status, body) = send(&app, Method::GET, "/api/pipelines", missing).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "General.OrganizationRequired");

    let malformed = Call {
        token: Some(token.as_str()),
        org: Some("acme"),
        ..Call::default()
    };
    let (status, body) = send(&app, Method::GET, "/api/pipelines", malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "General.Validation");

    let stranger = Uuid::new_v4().to_string();
    let foreign = Call {
        token: Some(token.as_str()),
        org: Some(stranger.as_str()),
        ..Call::default()
    };
    let (status, body) = send(&app, Method::GET, "/api/pipelines", foreign).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "Organization.NotMember");
}

#[tokio::test]
async fn deal_moves_through_the_board() {
    let app = test_app().await;
    let (token, org) = signed_in(&app, "ana@example.com").await;
    let call = |body: Option<Value>| Call {
        token: Some(token.as_str()),
        org: Some(org.as_str()),
        body,
        ..Call::default()
    };

    let (status, pipelines) = send(&app, Method::GET, "/api/pipelines", call(None)).await;
    assert_eq!(status, StatusCode::OK);
    let pipeline = &pipelines[0];
    let pipeline_id = pipeline["id"].as_str().unwrap().to_string();
    let proposal = pipeline["dealStages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "Proposal")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, deal) = send(
        &app,
        Method::POST,
        "/api/deals",
        call(Some(json!({"name": "Globex", "value": "$1,200", "pipelineId": pipeline_id}))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{deal}");
    let deal_id = deal["id"].as_str().unwrap().to_string();

    let (status, moved) = send(
        &app,
        Method::PUT,
        &format!("/api/deals/{deal_id}/stage"),
        call(Some(json!({"dealStageId": proposal}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{moved}");
    assert_eq!(moved["dealStageId"], proposal.as_str());
    assert_eq!(moved["stage"], "Proposal");

    let history_uri = format!("/api/deals/{deal_id}/stage-history");
    let (_, history) = send(&app, Method::GET, &history_uri, call(None)).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["toDealStageId"], proposal.as_str());
    assert_eq!(history[0]["fromDealStageId"], Value::Null);

    let board_uri = format!("/api/pipelines/{pipeline_id}/board");
    let (status, board) = send(&app, Method::GET, &board_uri, call(None)).await;
    assert_eq!(status, StatusCode::OK);
    let column = board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["stageName"] == "Proposal")
        .unwrap();
    assert_eq!(column["count"], 1);
    assert_eq!(column["valueTotal"], 1200.0);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/deals/{deal_id}/stage"),
        call(Some(json!({"dealStageId": Uuid::new_v4()}))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "DealStage.NotFound");
}

#[tokio::test]
async fn webhook_uses_the_organization_key() {
    let app = test_app().await;
    let (token, org) = signed_in(&app, "ana@example.com").await;
    let lead = json!({"name": "Bo", "email": "bo@example.com", "companyName": "Initech"});

    let anonymous = Call {
        body: Some(lead.clone()),
        ..Call::default()
    };
    let (status, body) = send(&app, Method::POST, "/api/webhook/leads", anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "Webhook.ApiKeyMissing");

    let (status, info) = send(
        &app,
        Method::POST,
        &format!("/api/organizations/{org}/webhook/regenerate"),
        Call {
            token: Some(token.as_str()),
            ..Call::default()
        },
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["hasApiKey"], true);
    let key = info["apiKey"].as_str().unwrap().to_string();
    assert!(key.starts_with("aci_"));

    let keyed = Call {
        api_key: Some(key.as_str()),
        body: Some(lead),
        ..Call::default()
    };
    let (status, created) = send(&app, Method::POST, "/api/webhook/leads", keyed).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["message"], "Lead created successfully");

    let (_, leads) = send(
        &app,
        Method::GET,
        "/api/leads",
        Call {
            token: Some(token.as_str()),
            org: Some(org.as_str()),
            ..Call::default()
        },
    )
    .await;
    assert_eq!(leads["totalCount"], 1);
    assert_eq!(leads["items"][0]["source"], "webhook");
}

#[tokio::test]
async fn copy_is_validated_then_generated_from_templates() {
    let app = test_app().await;
    let (token, _) = signed_in(&app, "ana@example.com").await;
    let call = |body: Value| Call {
        token: Some(token.as_str()),
        body: Some(body),
        ..Call::default()
    };

    let (status, body) =
        send(&app, Method::POST, "/api/copy/generate", call(json!({"goal": "demo"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "Copy.CopyTypeRequired");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/copy/generate-with-recipient",
        call(json!({
            "copyTypeId": "sales-email",
            "goal": "book a demo",
            "recipient": {"name": "Ada Lovelace", "company": "Analytical Engines"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["body"].as_str().unwrap().starts_with("Hi Ada,"));
    assert_eq!(body["subject"], "Meeting request: Analytical Engines partnership");
}

#[tokio::test]
async fn malformed_bodies_get_a_problem_document() {
    let app = test_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], platform_api::PROBLEM_JSON);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "General.Validation");
    assert_eq!(body["status"], 400);

    let (token, org) = signed_in(&app, "ana@example.com").await;
    let wrong_shape = Call {
        token: Some(token.as_str()),
        org: Some(org.as_str()),
        body: Some(json!({"name": 42})),
        ..Call::default()
    };
    let (status, body) = send(&app, Method::POST, "/api/deals", wrong_shape).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "General.Validation");

    let bad_id = Call {
        token: Some(token.as_str()),
        org: Some(org.as_str()),
        ..Call::default()
    };
    let (status, body) = send(&app, Method::GET, "/api/deals/not-a-uuid", bad_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "General.Validation");
}

#[tokio::test]
async fn dashboard_and_global_search_routes() {
    let app = test_app().await;
    let (token, org) = signed_in(&app, "ana@example.com").await;
    let call = |body: Option<Value>| Call {
        token: Some(token.as_str()),
        org: Some(org.as_str()),
        body,
        ..Call::default()
    };

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/deals",
        call(Some(json!({"name": "Zephyr rollout", "value": "2,500"}))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, stats) = send(&app, Method::GET, "/api/reporting/dashboard", call(None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["activeDealsCount"], 1);
    assert_eq!(stats["pipelineValue"], 2500.0);
    assert_eq!(stats["wonCount"], 0);

    let (status, found) = send(&app, Method::GET, "/api/search?q=zephyr", call(None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["deals"][0]["name"], "Zephyr rollout");
    assert_eq!(found["leads"].as_array().unwrap().len(), 0);
}
