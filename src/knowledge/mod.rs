//! Delegate knowledge services.
//!
//! The specialist agents' leaf capabilities are thin adapters over these
//! traits. The domain services themselves (drug-safety lookup, knowledge-graph
//! traversal, enrollment classifier, graph reasoning) are external
//! collaborators; this crate ships an HTTP-backed implementation and the tests
//! use in-process fakes.

mod http;

pub use http::{HttpEfficacyService, HttpEnrollmentService, HttpGraphService, HttpSafetyService};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::KnowledgeConfig;

/// Drug-safety information source (ADMET, toxicity, historical failure rates).
#[async_trait]
pub trait SafetyLookup: Send + Sync {
    /// Safety profile of a drug: introduction, ADMET, toxicity, side effects.
    async fn drug_profile(&self, drug_name: &str) -> anyhow::Result<String>;

    /// Historical failure rates for a drug/disease combination.
    async fn failure_rates(&self, drug_name: &str, disease_name: &str) -> anyhow::Result<String>;
}

/// Drug-efficacy evidence source backed by the Hetionet knowledge graph.
#[async_trait]
pub trait EfficacyLookup: Send + Sync {
    /// Drug introduction, disease introduction, and the drug-disease path.
    async fn drug_disease_evidence(
        &self,
        drug_name: &str,
        disease_name: &str,
    ) -> anyhow::Result<String>;
}

/// Predicted enrollment outlook for a set of eligibility criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutlook {
    Poor,
    Good,
    Excellent,
}

impl std::fmt::Display for EnrollmentOutlook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrollmentOutlook::Poor => write!(f, "poor enrollment"),
            EnrollmentOutlook::Good => write!(f, "good enrollment"),
            EnrollmentOutlook::Excellent => write!(f, "excellent enrollment"),
        }
    }
}

impl std::str::FromStr for EnrollmentOutlook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        if lowered.contains("excellent") {
            Ok(EnrollmentOutlook::Excellent)
        } else if lowered.contains("good") {
            Ok(EnrollmentOutlook::Good)
        } else if lowered.contains("poor") {
            Ok(EnrollmentOutlook::Poor)
        } else {
            Err(format!("unrecognized enrollment outlook: {s}"))
        }
    }
}

/// Eligibility-criteria classifier.
#[async_trait]
pub trait EnrollmentClassifier: Send + Sync {
    async fn classify(&self, eligibility_criteria: &str) -> anyhow::Result<EnrollmentOutlook>;
}

/// Graph-reasoning answerer over a node-pair and a free-text instruction.
#[async_trait]
pub trait GraphReasoner: Send + Sync {
    async fn answer(
        &self,
        keyword_1: &str,
        keyword_2: &str,
        user_instruction: &str,
    ) -> anyhow::Result<String>;
}

/// Bundle of the delegate services available to the specialist agents.
///
/// Every service is optional: a missing service turns the matching leaf
/// capability into a delegate failure, which flows through aggregation as the
/// no-solution sentinel instead of aborting the batch.
#[derive(Clone, Default)]
pub struct KnowledgeServices {
    pub safety: Option<Arc<dyn SafetyLookup>>,
    pub efficacy: Option<Arc<dyn EfficacyLookup>>,
    pub enrollment: Option<Arc<dyn EnrollmentClassifier>>,
    pub graph: Option<Arc<dyn GraphReasoner>>,
}

impl KnowledgeServices {
    /// No services configured.
    pub fn none() -> Self {
        Self::default()
    }

    /// HTTP-backed services for every configured base URL.
    pub fn from_config(config: &KnowledgeConfig) -> Self {
        Self {
            safety: config
                .safety_url
                .as_deref()
                .map(|url| Arc::new(HttpSafetyService::new(url)) as Arc<dyn SafetyLookup>),
            efficacy: config
                .efficacy_url
                .as_deref()
                .map(|url| Arc::new(HttpEfficacyService::new(url)) as Arc<dyn EfficacyLookup>),
            enrollment: config.enrollment_url.as_deref().map(|url| {
                Arc::new(HttpEnrollmentService::new(url)) as Arc<dyn EnrollmentClassifier>
            }),
            graph: config
                .graph_url
                .as_deref()
                .map(|url| Arc::new(HttpGraphService::new(url)) as Arc<dyn GraphReasoner>),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlook_parsing() {
        assert_eq!(
            "The trial will have excellent enrollment"
                .parse::<EnrollmentOutlook>()
                .unwrap(),
            EnrollmentOutlook::Excellent
        );
        assert_eq!(
            "poor".parse::<EnrollmentOutlook>().unwrap(),
            EnrollmentOutlook::Poor
        );
        assert!("unknown".parse::<EnrollmentOutlook>().is_err());
    }

    #[test]
    fn from_config_only_builds_configured_services() {
        let config = KnowledgeConfig {
            safety_url: Some("http://localhost:9001".into()),
            ..Default::default()
        };
        let services = KnowledgeServices::from_config(&config);
        assert!(services.safety.is_some());
        assert!(services.efficacy.is_none());
        assert!(services.graph.is_none());
    }
}
