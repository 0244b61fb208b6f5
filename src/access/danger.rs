use serde::{Deserialize, Serialize};

use super::record::AccessCodeTable;
use crate::config::AccessConfig;

/// 无需认证即可公开的功能开关与模型默认值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DangerConfig {
    pub need_code: bool,
    pub hide_user_api_key: bool,
    #[serde(rename = "disableGPT4")]
    pub disable_gpt4: bool,
    pub hide_balance_query: bool,
    pub disable_fast_link: bool,
    pub custom_models: String,
    pub default_model: String,
}

impl DangerConfig {
    #[must_use]
    pub fn from_config(access: &AccessConfig, table: &AccessCodeTable) -> Self {
        Self {
            need_code: access.need_code(table.len()),
            hide_user_api_key: access.hide_user_api_key,
            disable_gpt4: access.disable_gpt4,
            hide_balance_query: access.hide_balance_query,
            disable_fast_link: access.disable_fast_link,
            custom_models: access.custom_models.clone(),
            default_model: access.default_model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_front_end() {
        let value = serde_json::to_value(DangerConfig {
            disable_gpt4: true,
            ..DangerConfig::default()
        })
        .unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert!(keys.contains(&"disableGPT4".to_string()));
        assert!(keys.contains(&"needCode".to_string()));
        assert!(keys.contains(&"hideUserApiKey".to_string()));
        assert_eq!(keys.len(), 7);
    }

    #[test]
    fn missing_fields_deserialise_to_defaults() {
        let parsed: DangerConfig = serde_json::from_str(r#"{"needCode": true}"#).unwrap();
        assert!(parsed.need_code);
        assert!(!parsed.disable_gpt4);
    }
}
