use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub state: String,
    #[serde(rename = "htmlUrl")]
    pub html_url: String,
    pub url: String,
    #[serde(rename = "badgeUrl")]
    pub badge_url: String,
}
