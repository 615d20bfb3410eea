use serde::{Serialize, Deserialize};

use crate::config::ActionsConfig;
use crate::utils::candidate_href;

pub const ACTION_VERSION: &str = "2.4";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAction {
    pub href: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionLinks {
    pub actions: Vec<LinkedAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionGetResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub label: String,
    pub links: ActionLinks,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionPostRequest {
    #[serde(default)]
    pub account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionPostResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionGetResponse {
    pub fn for_config(config: &ActionsConfig) -> Self {
        Self {
            kind: "action".into(),
            title: config.title.clone(),
            description: config.description.clone(),
            icon: config.icon.clone(),
            label: "Vote".into(),
            links: ActionLinks {
                actions: config
                    .candidates
                    .iter()
                    .map(|name| LinkedAction {
                        href: candidate_href(name),
                        label: name.clone(),
                        kind: "transaction".into(),
                    })
                    .collect(),
            },
        }
    }
}
