//! 服务商调度工厂集成测试

use std::sync::Arc;

use access_gate::client::{ClientCredentialState, CredentialStore};
use access_gate::provider::{
    HostContext, ModelProvider, PlatformContext, ServiceProvider, get_client_api,
    get_client_api_by_name,
};
use access_gate::provider::ClientApi;
use rstest::rstest;

fn ctx(state: ClientCredentialState) -> PlatformContext {
    PlatformContext::new(
        Arc::new(CredentialStore::in_memory(state)),
        HostContext::browser(),
    )
}

#[rstest]
#[case(ModelProvider::Gpt, ServiceProvider::OpenAI)]
#[case(ModelProvider::GeminiPro, ServiceProvider::Google)]
#[case(ModelProvider::Claude, ServiceProvider::Anthropic)]
#[case(ModelProvider::Ernie, ServiceProvider::Baidu)]
#[case(ModelProvider::Doubao, ServiceProvider::ByteDance)]
#[case(ModelProvider::Qwen, ServiceProvider::Alibaba)]
#[case(ModelProvider::Hunyuan, ServiceProvider::Tencent)]
#[case(ModelProvider::Moonshot, ServiceProvider::Moonshot)]
#[case(ModelProvider::Iflytek, ServiceProvider::Iflytek)]
fn model_provider_dispatch_is_total(
    #[case] model_provider: ModelProvider,
    #[case] service: ServiceProvider,
) {
    let client = ClientApi::new(model_provider, ctx(ClientCredentialState::default()));
    assert_eq!(client.llm.model_provider(), model_provider);
    assert_eq!(client.llm.service_provider(), service);
}

#[test]
fn azure_maps_to_gpt_with_azure_credentials() {
    let client = get_client_api(ServiceProvider::Azure, ctx(ClientCredentialState::default()));
    assert_eq!(client.llm.model_provider(), ModelProvider::Gpt);
    assert_eq!(client.llm.service_provider(), ServiceProvider::Azure);
}

#[rstest]
#[case(None)]
#[case(Some(""))]
#[case(Some("no-such-vendor"))]
fn unknown_names_fall_back_to_openai(#[case] name: Option<&str>) {
    let client = get_client_api_by_name(name, ctx(ClientCredentialState::default()));
    assert_eq!(client.llm.model_provider(), ModelProvider::Gpt);
    assert_eq!(client.llm.service_provider(), ServiceProvider::OpenAI);
}

#[rstest]
#[case("Claude", ServiceProvider::Anthropic)]
#[case("gemini", ServiceProvider::Google)]
#[case("azure", ServiceProvider::Azure)]
#[case("spark", ServiceProvider::Iflytek)]
fn known_names_resolve(#[case] name: &str, #[case] service: ServiceProvider) {
    let client = get_client_api_by_name(Some(name), ctx(ClientCredentialState::default()));
    assert_eq!(client.llm.service_provider(), service);
}

#[tokio::test]
async fn models_reflect_custom_expression() {
    let mut state = ClientCredentialState::default();
    state.custom_models = "-all,+gpt-4o-mini,my-model=My Model".to_string();
    let client = get_client_api(ServiceProvider::OpenAI, ctx(state));

    let models = client.llm.models().await.unwrap();
    let available: Vec<_> = models
        .iter()
        .filter(|m| m.available)
        .map(|m| m.name.as_str())
        .collect();
    assert!(available.contains(&"gpt-4o-mini"));
    assert!(available.contains(&"my-model"));
    assert!(!available.contains(&"gpt-4o"));
}
