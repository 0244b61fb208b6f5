//! 模型表
//!
//! 由内置模型列表与 `customModels` 表达式合成。表达式以逗号分隔：
//! `-all` / `+all` 整体禁用或启用，`-name` 禁用，`+name` 或 `name` 启用（不存在则新增），
//! `name=显示名` 设置显示名，`name@provider` 限定服务商。

use super::chat::LlmModel;
use super::types::ServiceProvider;

fn is_gpt4(name: &str) -> bool {
    name.starts_with("gpt-4") && !name.starts_with("gpt-4o-mini")
}

fn split_provider(spec: &str, fallback: ServiceProvider) -> (&str, Option<ServiceProvider>) {
    match spec.rsplit_once('@') {
        Some((name, provider)) => match ServiceProvider::parse(provider) {
            Ok(p) => (name, Some(p)),
            Err(_) => (spec, Some(fallback)),
        },
        None => (spec, None),
    }
}

/// 合成模型表
#[must_use]
pub fn collect_model_table(
    defaults: &[(&str, ServiceProvider)],
    custom_models: &str,
    disable_gpt4: bool,
) -> Vec<LlmModel> {
    let fallback = defaults
        .first()
        .map_or(ServiceProvider::default(), |(_, p)| *p);

    let mut table: Vec<LlmModel> = defaults
        .iter()
        .map(|(name, provider)| LlmModel {
            name: (*name).to_string(),
            display_name: None,
            available: true,
            provider: *provider,
        })
        .collect();

    for item in custom_models.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match item {
            "-all" => table.iter_mut().for_each(|m| m.available = false),
            "+all" => table.iter_mut().for_each(|m| m.available = true),
            _ => {
                let (enable, body) = match item.strip_prefix('-') {
                    Some(rest) => (false, rest),
                    None => (true, item.strip_prefix('+').unwrap_or(item)),
                };
                let (spec, display) = match body.split_once('=') {
                    Some((spec, display)) => (spec, Some(display.trim().to_string())),
                    None => (body, None),
                };
                let (name, provider) = split_provider(spec.trim(), fallback);
                if name.is_empty() {
                    continue;
                }

                let mut matched = false;
                for model in table
                    .iter_mut()
                    .filter(|m| m.name == name && provider.is_none_or(|p| p == m.provider))
                {
                    matched = true;
                    model.available = enable;
                    if display.is_some() {
                        model.display_name.clone_from(&display);
                    }
                }

                if !matched && enable {
                    table.push(LlmModel {
                        name: name.to_string(),
                        display_name: display,
                        available: true,
                        provider: provider.unwrap_or(fallback),
                    });
                }
            }
        }
    }

    if disable_gpt4 {
        table
            .iter_mut()
            .filter(|m| is_gpt4(&m.name))
            .for_each(|m| m.available = false);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: &[(&str, ServiceProvider)] = &[
        ("gpt-4o", ServiceProvider::OpenAI),
        ("gpt-4o-mini", ServiceProvider::OpenAI),
        ("gpt-3.5-turbo", ServiceProvider::OpenAI),
        ("gpt-4o", ServiceProvider::Azure),
    ];

    fn available(table: &[LlmModel]) -> Vec<(String, ServiceProvider)> {
        table
            .iter()
            .filter(|m| m.available)
            .map(|m| (m.name.clone(), m.provider))
            .collect()
    }

    #[test]
    fn empty_expression_keeps_defaults() {
        let table = collect_model_table(DEFAULTS, "", false);
        assert_eq!(table.len(), 4);
        assert!(table.iter().all(|m| m.available));
    }

    #[test]
    fn minus_all_then_add() {
        let table = collect_model_table(DEFAULTS, "-all,+my-model=My Model", false);
        assert_eq!(
            available(&table),
            vec![("my-model".to_string(), ServiceProvider::OpenAI)]
        );
        assert_eq!(table.last().unwrap().display_name.as_deref(), Some("My Model"));
    }

    #[test]
    fn provider_qualifier_limits_the_match() {
        let table = collect_model_table(DEFAULTS, "-gpt-4o@azure", false);
        let openai = table
            .iter()
            .find(|m| m.name == "gpt-4o" && m.provider == ServiceProvider::OpenAI)
            .unwrap();
        let azure = table
            .iter()
            .find(|m| m.name == "gpt-4o" && m.provider == ServiceProvider::Azure)
            .unwrap();
        assert!(openai.available);
        assert!(!azure.available);
    }

    #[test]
    fn disable_gpt4_spares_mini() {
        let table = collect_model_table(DEFAULTS, "", true);
        assert_eq!(
            available(&table),
            vec![
                ("gpt-4o-mini".to_string(), ServiceProvider::OpenAI),
                ("gpt-3.5-turbo".to_string(), ServiceProvider::OpenAI),
            ]
        );
    }

    #[test]
    fn removing_unknown_model_is_a_no_op() {
        let table = collect_model_table(DEFAULTS, "-nothing", false);
        assert_eq!(table.len(), 4);
    }
}
