pub mod recommend_careers;

use recommend_careers::RecommendCareersParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CareerMatchConfig;
use crate::error::RecommendError;
use crate::recommend::{recommend_with_timeout, Recommender};

/// The MCP tool handler. Holds the initialized recommender and config.
#[derive(Clone)]
pub struct CareerTools {
    tool_router: ToolRouter<Self>,
    recommender: Arc<Recommender>,
    config: Arc<CareerMatchConfig>,
}

#[tool_router]
impl CareerTools {
    pub fn new(recommender: Arc<Recommender>, config: Arc<CareerMatchConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            recommender,
            config,
        }
    }

    /// Rank careers against free-text quiz answers.
    #[tool(description = "Recommend careers for free-text quiz answers. Returns careers ranked by semantic similarity, each with description, skills, education, salary, outlook, learning resources and similarity_score.")]
    async fn recommend_careers(
        &self,
        Parameters(params): Parameters<RecommendCareersParams>,
    ) -> Result<String, String> {
        let top_n = self.config.effective_top_n(params.top_n);
        let timeout = Duration::from_millis(self.config.recommend.query_timeout_ms);

        tracing::info!(answers_len = params.quiz_answers.len(), top_n, "recommend_careers called");

        let results = recommend_with_timeout(
            Arc::clone(&self.recommender),
            params.quiz_answers,
            top_n,
            timeout,
        )
        .await
        .map_err(|e| {
            if e.is_client_error() {
                tracing::debug!(error = %e, "recommend_careers rejected");
            } else {
                tracing::warn!(error = %e, "recommend_careers failed");
            }
            describe_error(&e)
        })?;

        tracing::info!(
            returned = results.len(),
            top = results.first().map(|r| r.title.as_str()).unwrap_or(""),
            "recommendations ranked"
        );

        serde_json::to_string(&serde_json::json!({ "recommendations": results }))
            .map_err(|e| format!("serialization failed: {e}"))
    }
}

fn describe_error(e: &RecommendError) -> String {
    match e {
        RecommendError::InvalidQuery(_) => format!("{e} (quiz_answers required)"),
        _ => e.to_string(),
    }
}

#[tool_handler]
impl ServerHandler for CareerTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "CareerMatch recommends careers from free-text quiz answers. Call \
                 recommend_careers with the user's answers; persist the results yourself."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
