//! 校验客户端集成测试（端点由 wiremock 模拟）

use access_gate::access::ScopedConfig;
use access_gate::client::{
    ClientCredentialState, ConfigVerifier, CredentialStore, HttpConfigVerifier, VerifyReply,
    sync_danger_config,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn verifier(server: &MockServer) -> HttpConfigVerifier {
    HttpConfigVerifier::new(&format!("{}/api/config", server.uri())).unwrap()
}

#[tokio::test]
async fn granted_reply_carries_scoped_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/config"))
        .and(body_json(json!({ "accessCode": "ABCD" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiKey": "sk-xyz",
            "customModels": "",
            "defaultModel": "gpt-4",
            "baseUrl": "https://x",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = verifier(&server).await.verify("ABCD").await.unwrap();
    assert_eq!(
        reply,
        VerifyReply::Granted(ScopedConfig {
            api_key: Some("sk-xyz".to_string()),
            custom_models: Some(String::new()),
            default_model: Some("gpt-4".to_string()),
            base_url: Some("https://x".to_string()),
        })
    );
}

#[tokio::test]
async fn partial_reply_leaves_missing_fields_absent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "defaultModel": "gpt-4o" })))
        .mount(&server)
        .await;

    let VerifyReply::Granted(config) = verifier(&server).await.verify("ABCD").await.unwrap() else {
        panic!("expected a granted reply");
    };
    assert_eq!(config.default_model.as_deref(), Some("gpt-4o"));
    assert_eq!(config.api_key, None);
}

#[tokio::test]
async fn every_non_200_status_is_rejected() {
    for status in [201_u16, 401, 403, 500] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/config"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": "x" })))
            .mount(&server)
            .await;

        let reply = verifier(&server).await.verify("ABCD").await.unwrap();
        assert_eq!(reply, VerifyReply::Rejected(status));
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/api/config", listener.local_addr().unwrap());
    drop(listener);

    let err = HttpConfigVerifier::new(&endpoint)
        .unwrap()
        .verify("ABCD")
        .await
        .unwrap_err();
    assert!(err.is_transport(), "{err}");
}

#[tokio::test]
async fn malformed_success_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = verifier(&server).await.verify("ABCD").await.unwrap_err();
    assert!(err.is_transport(), "{err}");
}

#[test]
fn invalid_endpoint_is_rejected_up_front() {
    assert!(HttpConfigVerifier::new("not a url").is_err());
}

#[tokio::test]
async fn danger_config_sync_merges_flags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "needCode": false,
            "hideUserApiKey": false,
            "disableGPT4": true,
            "hideBalanceQuery": true,
            "disableFastLink": false,
            "customModels": "",
            "defaultModel": "",
        })))
        .expect(2)
        .mount(&server)
        .await;

    let store = CredentialStore::in_memory(ClientCredentialState::default());
    let verifier = verifier(&server).await;

    assert!(sync_danger_config(&store, &verifier).await.unwrap());
    let state = store.snapshot();
    assert!(!state.flags.need_code);
    assert!(state.flags.disable_gpt4);
    assert!(state.flags.hide_balance_query);

    assert!(!sync_danger_config(&store, &verifier).await.unwrap());
}

#[tokio::test]
async fn gated_endpoint_turns_access_control_on() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Access code required" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut state = ClientCredentialState::default();
    state.flags.need_code = false;
    state.flags.disable_gpt4 = true;
    let store = CredentialStore::in_memory(state);

    assert!(sync_danger_config(&store, &verifier(&server).await).await.unwrap());
    let flags = store.snapshot().flags;
    assert!(flags.need_code);
    assert!(!flags.disable_gpt4);
    assert!(!store.snapshot().is_authorized());
}

#[tokio::test]
async fn danger_config_failure_leaves_state_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "Internal server error" })))
        .mount(&server)
        .await;

    let mut state = ClientCredentialState::default();
    state.flags.need_code = false;
    let store = CredentialStore::in_memory(state);
    let before = store.snapshot();

    assert!(sync_danger_config(&store, &verifier(&server).await).await.is_err());
    assert_eq!(store.snapshot(), before);
    assert!(!store.snapshot().flags.need_code);
}
