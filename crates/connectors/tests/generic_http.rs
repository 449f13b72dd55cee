//! HTTP tests for the generic provider
//!
//! A wiremock server plays the provider API. Connector calls are blocking,
//! so they run on `spawn_blocking` while the runtime serves the mock.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use connectors::models::{
    CreateWebhooksRequest, TranslateWebhookRequest, VerifyWebhookRequest, WebhookRequest,
};
use connectors::sync::Timeline;
use connectors::webhooks::sign;
use connectors::{
    ConnectorError, CursorStore, DrainOptions, EntityKind, FetchNextRequest, FetchedItems,
    InMemoryCursorStore, InMemoryMetrics, PspAccount, Registry, StreamKey, TransportConfig,
    TransportError, drain,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
}

fn transaction(n: usize) -> Value {
    json!({
        "id": format!("tx-{}", n),
        "createdAt": base_time() + ChronoDuration::minutes(n as i64),
        "currency": "EUR/2",
        "type": "PAYIN",
        "status": "SUCCEEDED",
        "amount": format!("{}", 100 * (n + 1)),
    })
}

/// Serves `/payments` newest-first, honoring `skip`, `count` and `since`
fn payments_listing(total: usize) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    move |req: &Request| {
        let mut skip = 0;
        let mut count = usize::MAX;
        let mut since: Option<DateTime<Utc>> = None;
        for (key, value) in req.url.query_pairs() {
            match key.as_ref() {
                "skip" => skip = value.parse().unwrap(),
                "count" => count = value.parse().unwrap(),
                "since" => since = Some(value.parse().unwrap()),
                _ => {}
            }
        }

        let page: Vec<Value> = (0..total)
            .rev()
            .filter(|n| {
                since.is_none_or(|s| base_time() + ChronoDuration::minutes(*n as i64) >= s)
            })
            .skip(skip)
            .take(count)
            .map(transaction)
            .collect();
        ResponseTemplate::new(200).set_body_json(page)
    }
}

fn generic_config(server: &MockServer, extra: Value) -> Value {
    let mut config = json!({ "endpoint": server.uri() });
    if let (Some(target), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_oauth_token_is_fetched_once_and_attached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("authorization", "Bearer tok-1"))
        .and(header("x-api-key", "key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "acc-1", "accountName": "Main", "createdAt": "2024-01-01T00:00:00Z", "currency": "EUR"}
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let config = generic_config(
        &server,
        json!({
            "apiKey": "key-1",
            "oauth": {
                "tokenUrl": format!("{}/oauth/token", server.uri()),
                "clientId": "client",
                "clientSecret": "secret",
                "scopes": ["accounts:read"]
            }
        }),
    );

    tokio::task::spawn_blocking(move || {
        let registry = Registry::builtin().unwrap();
        let handle = registry.create("generic", "gen", &config).unwrap();

        let first = handle
            .fetch_next_accounts(&FetchNextRequest::new(10))
            .unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].name.as_deref(), Some("Main"));

        let second = handle
            .fetch_next_accounts(&FetchNextRequest::new(10).with_state(first.new_state))
            .unwrap();
        assert!(second.items.is_empty());
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_oauth_failure_skips_data_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let config = generic_config(
        &server,
        json!({
            "oauth": {
                "tokenUrl": format!("{}/oauth/token", server.uri()),
                "clientId": "client",
                "clientSecret": "wrong"
            }
        }),
    );

    tokio::task::spawn_blocking(move || {
        let handle = Registry::builtin()
            .unwrap()
            .create("generic", "gen", &config)
            .unwrap();
        let err = handle
            .fetch_next_accounts(&FetchNextRequest::new(10))
            .unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::Transport(TransportError::OAuth { status: Some(401), .. })
        ));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_classification_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payments"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "7")
                .set_body_json(json!({"errorMessage": "slow down"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/acc-1/balances"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such account"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/beneficiaries"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let config = generic_config(&server, json!({}));

    tokio::task::spawn_blocking(move || {
        let handle = Registry::builtin()
            .unwrap()
            .create("generic", "gen", &config)
            .unwrap();

        match handle.fetch_next_payments(&FetchNextRequest::new(10)) {
            Err(ConnectorError::Transport(TransportError::RateLimited {
                status,
                retry_after,
                detail,
                ..
            })) => {
                assert_eq!(status, 429);
                assert_eq!(retry_after, Some(7));
                assert_eq!(detail.as_deref(), Some("slow down"));
            }
            other => panic!("expected rate limiting, got {:?}", other),
        }

        let parent = PspAccount::new("acc-1", base_time(), json!({}));
        let request =
            FetchNextRequest::new(10).with_from_payload(serde_json::to_vec(&parent).unwrap());
        match handle.fetch_next_balances(&request) {
            Err(ConnectorError::Transport(TransportError::ClientError { status, detail, .. })) => {
                assert_eq!(status, 404);
                assert_eq!(detail.as_deref(), Some("no such account"));
            }
            other => panic!("expected client error, got {:?}", other),
        }

        let err = handle
            .fetch_next_external_accounts(&FetchNextRequest::new(10))
            .unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::Transport(TransportError::Decode { status: 200, .. })
        ));
        assert!(!err.is_retryable());
    })
    .await
    .unwrap();
}

#[test]
fn test_network_failure_is_retryable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let metrics = Arc::new(InMemoryMetrics::new());
    let transport = TransportConfig::default()
        .with_timeout(Duration::from_secs(2))
        .with_metrics(metrics.clone());
    let handle = Registry::builtin()
        .unwrap()
        .create_with_transport(
            "generic",
            "gen",
            &json!({ "endpoint": format!("http://{}", addr) }),
            transport,
        )
        .unwrap();

    let err = handle
        .fetch_next_accounts(&FetchNextRequest::new(5))
        .unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::Transport(TransportError::Network { .. })
    ));
    assert!(err.is_retryable());

    let labels = metrics.labels();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].operation, "list_accounts");
    let stats = metrics.stats(&labels[0]).unwrap();
    assert_eq!(stats.calls, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timeline_payments_drain_and_resume() {
    let server = MockServer::start().await;
    let listing = payments_listing(5);
    Mock::given(method("GET"))
        .and(path("/payments"))
        .respond_with(listing)
        .mount(&server)
        .await;

    let config = generic_config(&server, json!({}));

    tokio::task::spawn_blocking(move || {
        let handle = Registry::builtin()
            .unwrap()
            .create("generic", "gen", &config)
            .unwrap();
        let store = InMemoryCursorStore::new();
        let stream = StreamKey::new("gen", EntityKind::Payments);

        let mut seen = Vec::new();
        let stats = drain(&handle, &stream, &store, &DrainOptions::new(2), |page| {
            if let FetchedItems::Payments(payments) = page {
                seen.extend(payments.iter().map(|p| p.reference.clone()));
            }
            Ok(())
        })
        .unwrap();

        seen.sort();
        assert_eq!(seen, vec!["tx-0", "tx-1", "tx-2", "tx-3", "tx-4"]);
        assert_eq!(stats.items, 5);

        let cursor = store.load(&stream).unwrap().unwrap();
        let timeline: Timeline = serde_json::from_slice(&cursor).unwrap();
        assert!(timeline.is_caught_up());
        assert_eq!(timeline.oldest_id.as_deref(), Some("tx-4"));

        // Caught up: a rerun sees nothing new and queries with `since`.
        let again = drain(&handle, &stream, &store, &DrainOptions::new(2), |_| Ok(())).unwrap();
        assert_eq!(again.items, 0);
        assert_eq!(again.pages, 1);
    })
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    let last = requests.last().unwrap();
    assert!(last.url.query_pairs().any(|(k, _)| k == "since"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_webhook_registration_and_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/webhooks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webhooks"))
        .respond_with(|req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap();
            ResponseTemplate::new(201).set_body_json(json!({
                "id": format!("hook-{}", body["eventType"].as_str().unwrap()),
                "eventType": body["eventType"],
                "url": body["url"],
            }))
        })
        .expect(4)
        .mount(&server)
        .await;
    let config = generic_config(&server, json!({ "webhookSecret": "whsec-1" }));

    tokio::task::spawn_blocking(move || {
        let handle = Registry::builtin()
            .unwrap()
            .create("generic", "gen", &config)
            .unwrap();

        let created = handle
            .create_webhooks(&CreateWebhooksRequest {
                webhook_base_url: "https://hooks.example.com/connectors/gen".into(),
                connector_id: "gen".into(),
            })
            .unwrap();
        assert_eq!(created.configs.len(), 4);
        assert_eq!(created.others.len(), 4);
        assert!(
            created
                .others
                .iter()
                .any(|o| o.other["url"] == "https://hooks.example.com/connectors/gen/payment/created")
        );

        let config = created
            .configs
            .iter()
            .find(|c| c.name == "payment.created")
            .unwrap()
            .clone();
        let body = serde_json::to_vec(&json!({
            "id": "evt-1",
            "eventType": "payment.created",
            "createdAt": "2024-04-01T12:30:00Z",
            "resourceID": "tx-42",
            "payload": transaction(42),
        }))
        .unwrap();
        let webhook = WebhookRequest::new(body.clone())
            .with_header("X-Signature", format!("sha256={}", sign("whsec-1", &body).unwrap()));

        handle
            .verify_webhook(&VerifyWebhookRequest {
                config: config.clone(),
                webhook: webhook.clone(),
            })
            .unwrap();
        let responses = handle
            .translate_webhook(&TranslateWebhookRequest {
                name: config.name.clone(),
                config,
                webhook,
            })
            .unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].idempotency_key.len(), 64);
        assert_eq!(
            responses[0].payment.as_ref().map(|p| p.amount),
            Some(4300)
        );
    })
    .await
    .unwrap();
}
