//! HTTP-backed knowledge services.
//!
//! Each domain service exposes a small JSON API; these clients POST the
//! request and return the text answer. Errors bubble up as delegate failures
//! and degrade to the no-solution sentinel upstream.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{EfficacyLookup, EnrollmentClassifier, EnrollmentOutlook, GraphReasoner, SafetyLookup};

#[derive(Debug, Deserialize)]
struct AnswerBody {
    answer: String,
}

async fn post_for_answer(
    client: &Client,
    url: String,
    body: serde_json::Value,
) -> anyhow::Result<String> {
    let resp = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        anyhow::bail!("knowledge service {} returned {}: {}", url, status, text);
    }

    let parsed: AnswerBody = serde_json::from_str(&text)?;
    Ok(parsed.answer)
}

/// Drug-safety service client.
pub struct HttpSafetyService {
    client: Client,
    base_url: String,
}

impl HttpSafetyService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SafetyLookup for HttpSafetyService {
    async fn drug_profile(&self, drug_name: &str) -> anyhow::Result<String> {
        post_for_answer(
            &self.client,
            format!("{}/safety/profile", self.base_url),
            serde_json::json!({ "drug_name": drug_name }),
        )
        .await
    }

    async fn failure_rates(&self, drug_name: &str, disease_name: &str) -> anyhow::Result<String> {
        post_for_answer(
            &self.client,
            format!("{}/safety/failure_rates", self.base_url),
            serde_json::json!({ "drug_name": drug_name, "disease_name": disease_name }),
        )
        .await
    }
}

/// Efficacy (Hetionet) service client.
pub struct HttpEfficacyService {
    client: Client,
    base_url: String,
}

impl HttpEfficacyService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EfficacyLookup for HttpEfficacyService {
    async fn drug_disease_evidence(
        &self,
        drug_name: &str,
        disease_name: &str,
    ) -> anyhow::Result<String> {
        post_for_answer(
            &self.client,
            format!("{}/efficacy/evidence", self.base_url),
            serde_json::json!({ "drug_name": drug_name, "disease_name": disease_name }),
        )
        .await
    }
}

/// Enrollment-classifier service client.
pub struct HttpEnrollmentService {
    client: Client,
    base_url: String,
}

impl HttpEnrollmentService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EnrollmentClassifier for HttpEnrollmentService {
    async fn classify(&self, eligibility_criteria: &str) -> anyhow::Result<EnrollmentOutlook> {
        let answer = post_for_answer(
            &self.client,
            format!("{}/enrollment/classify", self.base_url),
            serde_json::json!({ "eligibility_criteria": eligibility_criteria }),
        )
        .await?;
        answer
            .parse::<EnrollmentOutlook>()
            .map_err(|e| anyhow::anyhow!(e))
    }
}

/// Graph-reasoning service client.
pub struct HttpGraphService {
    client: Client,
    base_url: String,
}

impl HttpGraphService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GraphReasoner for HttpGraphService {
    async fn answer(
        &self,
        keyword_1: &str,
        keyword_2: &str,
        user_instruction: &str,
    ) -> anyhow::Result<String> {
        post_for_answer(
            &self.client,
            format!("{}/graph/answer", self.base_url),
            serde_json::json!({
                "keyword_1": keyword_1,
                "keyword_2": keyword_2,
                "user_instruction": user_instruction,
            }),
        )
        .await
    }
}
