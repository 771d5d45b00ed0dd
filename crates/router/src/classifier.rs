//! Keyword-based task classification.

use crate::routing::{RouteDecision, TaskKind};
use relay_llm::{ProviderEntry, ProviderRegistry};
use std::sync::Arc;
use tracing::debug;

/// One row of the classification table: any keyword selects `task`.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub task: TaskKind,
    /// Lowercase substrings, tested in order
    pub keywords: Vec<&'static str>,
}

impl ClassificationRule {
    pub fn new(task: TaskKind, keywords: &[&'static str]) -> Self {
        Self {
            task,
            keywords: keywords.to_vec(),
        }
    }

    /// The first keyword contained in `lower`, which must already be lowercase.
    fn matches(&self, lower: &str) -> Option<&'static str> {
        self.keywords.iter().copied().find(|kw| lower.contains(kw))
    }
}

/// Rules evaluated top to bottom after the image check.
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule::new(
            TaskKind::Coding,
            &["code", "programming", "function", "debug"],
        ),
        ClassificationRule::new(TaskKind::Reasoning, &["reason", "think", "logic", "explain"]),
        ClassificationRule::new(TaskKind::Fast, &["fast", "quick", "simple"]),
    ]
}

/// Maps a prompt to a registry entry.
pub struct TaskClassifier {
    registry: Arc<ProviderRegistry>,
    rules: Vec<ClassificationRule>,
}

impl TaskClassifier {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self::with_rules(registry, default_rules())
    }

    pub fn with_rules(registry: Arc<ProviderRegistry>, rules: Vec<ClassificationRule>) -> Self {
        Self { registry, rules }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn target(&self, task: TaskKind) -> &ProviderEntry {
        match task {
            TaskKind::Coding => self.registry.coding_target(),
            TaskKind::Reasoning => self.registry.reasoning_target(),
            TaskKind::Fast => self.registry.fast_target(),
        }
    }

    /// Pick a provider from prompt content and image presence.
    ///
    /// Images always win. Otherwise the first rule with a keyword contained in
    /// the prompt (ignoring case) decides, and the default entry is used when
    /// none matches.
    pub fn classify(&self, prompt: &str, has_image: bool) -> RouteDecision {
        if has_image {
            return RouteDecision::vision(self.registry.vision_target().clone());
        }

        let lower = prompt.to_lowercase();
        for rule in &self.rules {
            if let Some(keyword) = rule.matches(&lower) {
                debug!(task = rule.task.as_str(), keyword, "Keyword rule matched");
                return RouteDecision::keyword(self.target(rule.task).clone(), rule.task, keyword);
            }
        }

        RouteDecision::default_route(self.registry.default_entry().clone())
    }

    /// Honor an explicit provider id when the registry knows it, otherwise
    /// classify.
    pub fn resolve(
        &self,
        requested: Option<&str>,
        prompt: &str,
        has_image: bool,
    ) -> RouteDecision {
        if let Some(id) = requested.filter(|id| !id.is_empty()) {
            match self.registry.lookup(id) {
                Some(entry) => return RouteDecision::overridden(entry.clone()),
                None => debug!(requested = %id, "Unknown provider override ignored"),
            }
        }
        self.classify(prompt, has_image)
    }
}
