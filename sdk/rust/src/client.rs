use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct AssistanceQuery<'a> {
    pub context: &'a str,
    pub question: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub rule: String,
    pub message: String,
}

/// What the gateway answered, one variant per response shape.
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    /// 200: the inference payload (usually `{ "answer": ... }`).
    Answered(Value),
    /// 400: every field violation.
    Invalid(Vec<FieldViolation>),
    /// 429: retry after this many seconds, if disclosed.
    Throttled { retry_after_secs: Option<u64> },
    /// 5xx or any other status.
    Failed { status: u16, message: String },
}

pub struct GatewayClient {
    client: Client,
    gateway_url: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Self {
        Self::with_client(Client::new(), gateway_url)
    }

    pub fn with_client(client: Client, gateway_url: &str) -> Self {
        Self {
            client,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    /// Ask a question about a context.
    pub async fn ask(&self, context: &str, question: &str) -> Result<AskOutcome, reqwest::Error> {
        let resp = self
            .client
            .post(format!("{}/api/assistance", self.gateway_url))
            .json(&AssistanceQuery { context, question })
            .send()
            .await?;

        let status = resp.status();
        let retry_after_secs = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body: Value = resp.json().await.unwrap_or(Value::Null);

        let outcome = match status {
            StatusCode::OK => AskOutcome::Answered(body["data"].clone()),
            StatusCode::BAD_REQUEST => {
                let errors = serde_json::from_value(body["errors"].clone()).unwrap_or_default();
                AskOutcome::Invalid(errors)
            }
            StatusCode::TOO_MANY_REQUESTS => AskOutcome::Throttled { retry_after_secs },
            other => AskOutcome::Failed {
                status: other.as_u16(),
                message: body["message"].as_str().unwrap_or_default().to_string(),
            },
        };
        Ok(outcome)
    }

    /// `GET /health` as raw JSON.
    pub async fn health(&self) -> Result<Value, reqwest::Error> {
        self.client
            .get(format!("{}/health", self.gateway_url))
            .send()
            .await?
            .json()
            .await
    }
}
