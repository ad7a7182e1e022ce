//! Boundary to the optional explanatory-text service
//!
//! After a run completes, a front-end may ask an external service to explain
//! the outcome in plain language. The service is best-effort:
//! [`explain_with_fallback`] turns every failure into a neutral message and
//! nothing here feeds back into the simulation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ExplainError;
use crate::types::{Language, LinkId, NodeId, TopologyKind};

/// What the explanation service is told about a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub kind: TopologyKind,
    pub sender: NodeId,
    pub receiver: NodeId,
    pub success: bool,
    pub path: Vec<NodeId>,
    /// Labels of broken nodes
    pub inactive_nodes: Vec<String>,
    /// Ids of cut cables
    pub inactive_links: Vec<LinkId>,
    pub language: Language,
}

impl ExplanationRequest {
    /// Render the prompt handed to a text-generation service
    pub fn prompt(&self) -> String {
        let path: Vec<&str> = self.path.iter().map(NodeId::as_str).collect();
        let links: Vec<&str> = self.inactive_links.iter().map(LinkId::as_str).collect();

        let mut prompt = String::new();
        prompt.push_str("Context: Network Topology Simulator.\n");
        prompt.push_str(&format!("Topology Type: {}.\n", self.kind));
        prompt.push_str(&format!("Sender: Node {}.\n", self.sender));
        prompt.push_str(&format!("Receiver: Node {}.\n", self.receiver));
        prompt.push_str(&format!(
            "Outcome: {}.\n",
            if self.success { "SUCCESS" } else { "FAILURE" }
        ));
        prompt.push_str(&format!("Path Taken: {}.\n", path.join(" -> ")));
        prompt.push_str(&format!("Broken Devices: [{}].\n", self.inactive_nodes.join(", ")));
        prompt.push_str(&format!("Broken Cables: [{}].\n", links.join(", ")));
        prompt.push_str(&format!("Language: {}.\n\n", self.language.name()));

        prompt.push_str(
            "Task: Explain simply why the data transmission succeeded or failed \
             based on the topology rules and the specific failures (if any).\n",
        );
        let hint = match self.kind {
            TopologyKind::Bus => "Mention how the backbone or terminators affect it.",
            TopologyKind::Ring => "Mention the loop direction or break.",
            TopologyKind::Star => "Mention the central hub status.",
            TopologyKind::Mesh => "Mention redundancy or lack of paths.",
        };
        prompt.push_str(hint);
        prompt.push_str("\nKeep it short (max 3 sentences). Act as a network engineer.\n");
        prompt
    }
}

/// An external service producing a plain-language rationale
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplainError>;
}

/// Stand-in used when no service credential is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableExplainer;

#[async_trait]
impl Explainer for UnavailableExplainer {
    async fn explain(&self, _request: &ExplanationRequest) -> Result<String, ExplainError> {
        Err(ExplainError::MissingCredential)
    }
}

/// Neutral message shown in place of an explanation
pub fn fallback_message(error: &ExplainError, language: Language) -> &'static str {
    match (error, language) {
        (ExplainError::MissingCredential, Language::En) => "API Key missing. Cannot generate explanation.",
        (ExplainError::MissingCredential, Language::Fr) => "Clé API manquante. Impossible de générer l'explication.",
        (ExplainError::EmptyResponse, Language::En) => "No response.",
        (ExplainError::EmptyResponse, Language::Fr) => "Pas de réponse.",
        (ExplainError::Transport(_) | ExplainError::Timeout, Language::En) => "Error consulting AI.",
        (ExplainError::Transport(_) | ExplainError::Timeout, Language::Fr) => "Erreur lors de la consultation de l'IA.",
    }
}

/// Ask `explainer` for a rationale, never failing
///
/// Timeouts, transport errors, missing credentials and blank answers all
/// become a localized fallback message.
pub async fn explain_with_fallback(
    explainer: &dyn Explainer,
    request: &ExplanationRequest,
    timeout: Duration,
) -> String {
    let answer = match tokio::time::timeout(timeout, explainer.explain(request)).await {
        Ok(Ok(text)) if text.trim().is_empty() => Err(ExplainError::EmptyResponse),
        Ok(result) => result,
        Err(_) => Err(ExplainError::Timeout),
    };

    answer.unwrap_or_else(|e| {
        warn!(error = %e, "Explanation unavailable");
        fallback_message(&e, request.language).to_string()
    })
}
