//! MCP `recommend_careers` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecommendCareersParams {
    #[schemars(description = "Free-text quiz answers describing the person's interests, skills and personality")]
    pub quiz_answers: String,

    #[schemars(description = "Number of careers to return. Defaults to 5; values <= 0 return nothing.")]
    pub top_n: Option<i64>,
}
