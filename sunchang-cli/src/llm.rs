use anyhow::{Context, Result, bail};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::AdvisorSection;

/// Resolved settings for one Gemini call
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
}

impl GeminiConfig {
    /// Key from the config file, else $GEMINI_API_KEY, else $API_KEY.
    pub fn from_section(section: &AdvisorSection) -> Result<Self> {
        let api_key = section
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env_key("GEMINI_API_KEY"))
            .or_else(|| env_key("API_KEY"))
            .ok_or_else(|| {
                anyhow::anyhow!("API Key is missing; set GEMINI_API_KEY or advisor.api_key in config.toml")
            })?;

        Ok(Self {
            model: section.model.clone(),
            base_url: section.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|k| !k.trim().is_empty())
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Req<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    text: Option<String>,
}

/// Single-turn text generation. Returns the trimmed reply (may be empty).
pub async fn generate(cfg: &GeminiConfig, prompt: &str) -> Result<String> {
    let body = Req {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
    };

    let mut headers = HeaderMap::new();
    headers.insert("x-goog-api-key", HeaderValue::from_str(&cfg.api_key)?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::new();
    let resp = client
        .post(cfg.endpoint())
        .headers(headers)
        .json(&body)
        .send()
        .await
        .context("gemini request")?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("gemini error: {status} {txt}");
    }

    let out: Resp = resp.json().await.context("parse gemini response")?;
    Ok(reply_text(out))
}

fn reply_text(resp: Resp) -> String {
    let mut s = String::new();
    if let Some(content) = resp.candidates.into_iter().next().and_then(|c| c.content) {
        for p in content.parts {
            if let Some(t) = p.text {
                s.push_str(&t);
            }
        }
    }
    s.trim().to_string()
}
