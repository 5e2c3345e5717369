//! Model-backed extractor.
//!
//! Sends the statement header, one batch of rows and the known project names
//! to a hosted model and validates the JSON array it returns.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use statement_core::ExtractedTransaction;
use std::fmt;
use std::str::FromStr;

use crate::extractor::{parse_response, ExtractError, ExtractionRequest, Extractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAI,
    Anthropic,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::OpenAI => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAI),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => anyhow::bail!("unknown provider '{other}' (expected gemini, openai or anthropic)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmSettings {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            api_key: api_key.into(),
            temperature: 0.1,
            max_tokens: 8192,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmExtractor {
    client: reqwest::Client,
    settings: LlmSettings,
}

impl LlmExtractor {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    /// Use a preconfigured client (proxy, timeouts, TLS roots).
    pub fn with_client(client: reqwest::Client, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    async fn complete(&self, prompt: &str) -> Result<String, ExtractError> {
        match self.settings.provider {
            Provider::Gemini => self.gemini_complete(prompt).await,
            Provider::OpenAI => self.openai_complete(prompt).await,
            Provider::Anthropic => self.anthropic_complete(prompt).await,
        }
    }

    async fn gemini_complete(&self, prompt: &str) -> Result<String, ExtractError> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<Content>,
        }

        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }

        #[derive(Deserialize)]
        struct Part {
            text: Option<String>,
        }

        let s = &self.settings;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            s.base_url.trim_end_matches('/'),
            s.model
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
                "temperature": s.temperature,
                "maxOutputTokens": s.max_tokens,
            }
        });

        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &s.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = check_status(Provider::Gemini, resp).await?;

        let out: Resp = resp.json().await?;
        let text = out
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();
        Ok(text)
    }

    async fn openai_complete(&self, prompt: &str) -> Result<String, ExtractError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let s = &self.settings;
        let body = Req {
            model: &s.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: s.temperature,
            max_tokens: s.max_tokens,
        };

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", s.base_url.trim_end_matches('/')))
            .bearer_auth(&s.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = check_status(Provider::OpenAI, resp).await?;

        let out: Resp = resp.json().await?;
        Ok(out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn anthropic_complete(&self, prompt: &str) -> Result<String, ExtractError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            system: &'a str,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let s = &self.settings;
        let body = Req {
            model: &s.model,
            max_tokens: s.max_tokens,
            temperature: s.temperature,
            system: SYSTEM_PROMPT,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&s.api_key).map_err(|e| anyhow::anyhow!("invalid api key: {e}"))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(format!("{}/v1/messages", s.base_url.trim_end_matches('/')))
            .headers(headers)
            .json(&body)
            .send()
            .await?;
        let resp = check_status(Provider::Anthropic, resp).await?;

        let out: Resp = resp.json().await?;
        let mut text = String::new();
        for b in out.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    text.push_str(&t);
                }
            }
        }
        Ok(text)
    }
}

impl Extractor for LlmExtractor {
    async fn extract(
        &self,
        request: &ExtractionRequest<'_>,
    ) -> Result<Vec<ExtractedTransaction>, ExtractError> {
        if request.rows.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_prompt(request);
        log::debug!(
            "{} extraction: {} rows, {} prompt bytes",
            self.settings.provider,
            request.rows.len(),
            prompt.len()
        );

        let text = self.complete(&prompt).await?;
        parse_response(&text, request.known_projects)
    }
}

async fn check_status(provider: Provider, resp: reqwest::Response) -> Result<reqwest::Response, ExtractError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ExtractError::Status {
        provider: provider.name(),
        status: status.as_u16(),
        body,
    })
}

const SYSTEM_PROMPT: &str = "You extract structured spending records from bank statement CSV fragments. \
Reply with a JSON array only, no commentary.";

/// Instructions plus the CSV fragment for one batch
pub fn build_prompt(request: &ExtractionRequest<'_>) -> String {
    let projects = serde_json::to_string(request.known_projects).unwrap_or_else(|_| "[]".to_string());

    let mut csv = String::from(request.header);
    for row in request.rows {
        csv.push('\n');
        csv.push_str(row);
    }

    format!(
        "Read the bank statement CSV fragment below. The first line is the header.\n\
\n\
For every data row return one object with:\n\
- \"date\": the transaction date as YYYY-MM-DD, or null if absent.\n\
- \"originalDescription\": the description text exactly as it appears.\n\
- \"supplier\": the merchant name from the description. It usually comes first and is followed \
by a store number, invoice id or reference; drop that suffix and everything after it \
(\"AMZN Mktp US*13423\" -> \"AMZN Mktp US\", \"Starbucks Store #222\" -> \"Starbucks\").\n\
- \"amount\": the spent amount as a positive number. Use the Debit column when there is one; \
only use Credit when no Debit column exists. Otherwise use the Amount column.\n\
- \"project\": one of these project names if the description contains it exactly \
(case-sensitive): {projects}. Copy the name verbatim. If none is contained, null. \
Never guess partial names.\n\
\n\
CSV:\n{csv}\n"
    )
}

/// Response schema for providers that support constrained JSON output
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "date": { "type": "STRING", "nullable": true },
                "originalDescription": { "type": "STRING" },
                "supplier": { "type": "STRING" },
                "project": { "type": "STRING", "nullable": true },
                "amount": { "type": "NUMBER" }
            },
            "required": ["originalDescription", "supplier", "amount"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn read_request(sock: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let len = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    return;
                }
            }
        }
    }

    /// Answer a single request with `status` and `body`; returns the base URL.
    async fn serve_once(status: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            read_request(&mut sock).await;
            let resp = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        });
        format!("http://{addr}")
    }

    fn local_extractor(provider: Provider, base_url: String) -> LlmExtractor {
        let mut settings = LlmSettings::new(provider, "test-key");
        settings.base_url = base_url;
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        LlmExtractor::with_client(client, settings)
    }

    #[test]
    fn test_prompt_contains_batch_and_projects() {
        let rows = vec!["2024-01-01,AMZN*1 Alpha,10.00".to_string(), "2024-01-02,TEA,2.00".to_string()];
        let projects = vec!["Alpha".to_string(), "Beta \"B\"".to_string()];
        let prompt = build_prompt(&ExtractionRequest {
            header: "Date,Description,Debit",
            rows: &rows,
            known_projects: &projects,
        });

        assert!(prompt.contains("Date,Description,Debit\n2024-01-01,AMZN*1 Alpha,10.00\n2024-01-02,TEA,2.00"));
        assert!(prompt.contains(r#"["Alpha","Beta \"B\""]"#));
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("Gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("claude".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert!("mistral".parse::<Provider>().is_err());
    }

    #[test]
    fn test_schema_requires_core_fields() {
        let schema = response_schema();
        let required = schema["items"]["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        // Unroutable base URL: any request would fail.
        let mut settings = LlmSettings::new(Provider::OpenAI, "sk-test");
        settings.base_url = "http://127.0.0.1:9".to_string();
        let ex = LlmExtractor::new(settings);
        let out = ex
            .extract(&ExtractionRequest {
                header: "Date,Description,Amount",
                rows: &[],
                known_projects: &[],
            })
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_fails_the_call() {
        let base = serve_once("500 Internal Server Error", "boom".to_string()).await;
        let ex = local_extractor(Provider::OpenAI, base);
        let rows = vec!["2024-01-01,TEA,2.00".to_string()];
        let err = ex
            .extract(&ExtractionRequest {
                header: "Date,Description,Debit",
                rows: &rows,
                known_projects: &[],
            })
            .await
            .unwrap_err();
        match err {
            ExtractError::Status { provider, status, body } => {
                assert_eq!(provider, "openai");
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gemini_envelope_is_parsed() {
        let records = r#"[{"date":"2024-01-01","originalDescription":"AMZN Mktp US*13423 Alpha","supplier":"AMZN Mktp US","project":null,"amount":-42.5},{"date":null,"originalDescription":"TEA","supplier":"TEA","amount":2.0}]"#;
        let envelope = json!({
            "candidates": [{
                "content": { "parts": [{ "text": format!("```json\n{records}") }, { "text": "\n```" }] }
            }]
        });
        let base = serve_once("200 OK", envelope.to_string()).await;
        let ex = local_extractor(Provider::Gemini, base);
        let rows = vec![
            "2024-01-01,AMZN Mktp US*13423 Alpha,42.50".to_string(),
            ",TEA,2.00".to_string(),
        ];
        let projects = vec!["Alpha".to_string()];
        let out = ex
            .extract(&ExtractionRequest {
                header: "Date,Description,Debit",
                rows: &rows,
                known_projects: &projects,
            })
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].supplier, "AMZN Mktp US");
        assert_eq!(out[0].amount, 42.5);
        assert_eq!(out[0].project.as_deref(), Some("Alpha"));
        assert_eq!(out[1].date, "");
        assert_eq!(out[1].project, None);
    }
}
