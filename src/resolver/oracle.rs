//! Classification oracle client.
//!
//! The oracle is an external text-in/text-out advisory service. It receives a summary of the
//! tables and the user preferences and answers with free-form suggestions about sheet names and
//! grouping. Its answer is only ever a hint: every failure maps to an [`OracleError`] and the
//! resolver falls back to the deterministic grouping.

use crate::table::TableSummary;
use crate::workbook::UserPreferences;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failure signal of an oracle call. Never fatal.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("No classification oracle configured")]
    Disabled,

    #[error("Classification oracle timed out after {0:?}")]
    Timeout(Duration),

    #[error("Classification oracle request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Classification oracle answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed classification oracle response: {0}")]
    MalformedResponse(String),
}

/// Advisory service consulted for sheet grouping hints.
#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    /// Returns free-form advice for the given tables and preferences.
    async fn classify(
        &self,
        summaries: &[TableSummary],
        preferences: &UserPreferences,
    ) -> Result<String, OracleError>;
}

/// Oracle used when none is configured; always reports [`OracleError::Disabled`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledOracle;

#[async_trait]
impl ClassificationOracle for DisabledOracle {
    async fn classify(
        &self,
        _: &[TableSummary],
        _: &UserPreferences,
    ) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }
}

/// Builds the prompt sent to the oracle.
///
/// Suggested sheet names are requested one per line as `Sheet: <name>`, which is the only
/// part of the answer the grouping step reads.
pub fn build_prompt(summaries: &[TableSummary], preferences: &UserPreferences) -> String {
    let tables = summaries
        .iter()
        .map(|summary| {
            format!(
                "Table: {}, Source: {}, Page: {}, Columns: {}, Rows: {}",
                summary.title,
                summary.source_document,
                summary.page_number,
                summary.column_count,
                summary.row_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let preferences = serde_json::to_string(preferences).unwrap_or_else(|_| "{}".to_owned());
    format!(
        "Given the following extracted tables and user preferences, \
         suggest an Excel workbook structure.\n\
         \n\
         Tables:\n{tables}\n\
         \n\
         User Preferences:\n{preferences}\n\
         \n\
         Suggest:\n\
         1. The number and names of sheets, one per line as 'Sheet: <name>'\n\
         2. Which tables should be placed in which sheets\n\
         3. Any specific layout considerations\n"
    )
}

/// Chat completion request for an OpenAI-compatible endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Oracle backed by an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionOracle {
    /// Reqwest HTTP client
    client: Client,
    /// Full URL of the chat completions endpoint
    endpoint: String,
    /// Model identifier sent with every request
    model: String,
    /// Bearer token
    api_key: String,
}

impl ChatCompletionOracle {
    /// Creates a client; `timeout` bounds every request at the transport level.
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            model: model.to_owned(),
            api_key,
        })
    }
}

#[async_trait]
impl ClassificationOracle for ChatCompletionOracle {
    async fn classify(
        &self,
        summaries: &[TableSummary],
        preferences: &UserPreferences,
    ) -> Result<String, OracleError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user".to_owned(),
                content: build_prompt(summaries, preferences),
            }],
            temperature: 0.0,
        };
        debug!(endpoint = %self.endpoint, model = %self.model, "calling classification oracle");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

/// Extracts the first choice's message content from a chat completion body.
fn parse_response(body: &str) -> Result<String, OracleError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|error| OracleError::MalformedResponse(error.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| OracleError::MalformedResponse("response has no message content".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::table;

    #[test]
    fn prompt_lists_tables_and_preferences() {
        let summaries = vec![
            table("Sales Data", 2, 3).summary(),
            table("Employee List", 4, 1).summary(),
        ];
        let preferences = UserPreferences {
            preferred_sheet_names: vec!["Financial".to_owned()],
            ..UserPreferences::default()
        };

        let prompt = build_prompt(&summaries, &preferences);

        assert!(prompt
            .contains("Table: Sales Data, Source: report.pdf, Page: 1, Columns: 2, Rows: 3"));
        assert!(prompt.contains("Table: Employee List"));
        assert!(prompt.contains(r#""preferred_sheet_names":["Financial"]"#));
        assert!(prompt.contains("'Sheet: <name>'"));
    }

    #[test]
    fn parse_first_choice() {
        let body =
            r#"{"choices": [{"message": {"role": "assistant", "content": "Sheet: Finance"}}]}"#;

        assert_eq!(parse_response(body).unwrap(), "Sheet: Finance");
    }

    #[test]
    fn reject_response_without_content() {
        assert!(matches!(
            parse_response(r#"{"choices": []}"#),
            Err(OracleError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(r#"{"choices": [{"message": {"content": null}}]}"#),
            Err(OracleError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response("<html>bad gateway</html>"),
            Err(OracleError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn disabled_oracle_reports_failure() {
        let result = DisabledOracle
            .classify(&[], &UserPreferences::default())
            .await;

        assert!(matches!(result, Err(OracleError::Disabled)));
    }
}
