//! The generation pipeline.

use crate::classifier::TaskClassifier;
use crate::config::RelayConfig;
use crate::generation::{
    GenerationFailure, GenerationOutput, GenerationRequest, GenerationResult, MemoryRecall,
    MemoryWrite,
};
use relay_common::{Message, RelayError, Result};
use relay_llm::{
    BackendKind, ChatTransport, CompletionOptions, Credentials, Dispatcher, OpenAiCompatClient,
    ProviderRegistry,
};
use relay_memory::{
    EXTRACTED_IMPORTANCE, MemoryExtractor, MemoryStore, SEMANTIC, build_store,
    format_memory_block,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Prompt text used around recalled memories and uploaded files.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub persona: String,
    pub memory_guidance: String,
}

impl PromptTemplate {
    /// Persona, then memories, then file context, then guidance.
    pub fn compose(&self, memory_block: Option<&str>, file: Option<(&str, &str)>) -> String {
        let mut sections = vec![self.persona.clone()];
        if let Some(block) = memory_block {
            sections.push(block.to_string());
        }
        if let Some((name, content)) = file {
            sections.push(format!(
                "Additional context from uploaded file ({name}):\n{content}"
            ));
        }
        sections.push(self.memory_guidance.clone());
        sections.join("\n\n")
    }
}

impl From<&RelayConfig> for PromptTemplate {
    fn from(config: &RelayConfig) -> Self {
        Self {
            persona: config.persona.clone(),
            memory_guidance: config.memory_guidance.clone(),
        }
    }
}

/// Runs classification, memory recall, dispatch and memory extraction for
/// one request at a time. Shared across requests behind an `Arc`.
pub struct Orchestrator {
    classifier: TaskClassifier,
    credentials: Arc<Credentials>,
    dispatcher: Dispatcher,
    store: Arc<dyn MemoryStore>,
    extractor: MemoryExtractor,
    template: PromptTemplate,
    options: CompletionOptions,
}

impl Orchestrator {
    /// Build the production pipeline from configuration.
    ///
    /// Credentials are resolved from the config and then the environment.
    pub fn new(config: RelayConfig) -> Result<Self> {
        info!("Initializing Relay orchestrator");

        let registry = match config.registry.clone() {
            Some(registry) => ProviderRegistry::from_config(registry)?,
            None => ProviderRegistry::builtin(),
        };
        let credentials = config.credentials.resolve();
        for backend in [BackendKind::Nvidia, BackendKind::OpenRouter] {
            if !credentials.has(backend) {
                warn!(backend = %backend, env_var = backend.env_var(), "No API key configured");
            }
        }
        let store = build_store(&config.memory)?;

        Self::from_parts(
            &config,
            Arc::new(registry),
            Arc::new(credentials),
            Arc::new(OpenAiCompatClient::new()),
            store,
        )
    }

    /// Assemble a pipeline from explicit collaborators.
    pub fn from_parts(
        config: &RelayConfig,
        registry: Arc<ProviderRegistry>,
        credentials: Arc<Credentials>,
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn MemoryStore>,
    ) -> Result<Self> {
        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&credentials),
            transport,
            config.fallback.clone(),
        );

        info!(
            providers = registry.entries().len(),
            default = %registry.default_entry().id,
            fallback = %registry.fallback_target().id,
            "Provider registry loaded"
        );

        Ok(Self {
            classifier: TaskClassifier::new(registry),
            credentials,
            dispatcher,
            store,
            extractor: MemoryExtractor::new()?,
            template: PromptTemplate::from(config),
            options: config.generation.clone(),
        })
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.classifier.registry()
    }

    pub fn classifier(&self) -> &TaskClassifier {
        &self.classifier
    }

    pub fn memory_store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Run one generation end to end.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let has_image = request.has_image();
        let has_file = request.has_file();

        if request.prompt.trim().is_empty() && !has_image {
            return Err(RelayError::InvalidRequest("Prompt is required".into()).into());
        }

        let route = self.classifier.resolve(
            request.provider_override.as_deref(),
            &request.prompt,
            has_image,
        );
        info!(
            provider = %route.provider.id,
            source = ?route.source,
            user_id = %request.user_id,
            has_image,
            has_file,
            "Routing generation"
        );

        // No outbound call without a key for the chosen backend.
        if let Err(e) = self.credentials.require(route.provider.backend) {
            error!(provider = %route.provider.id, error = %e, "Missing credential");
            return Err(e.into());
        }

        let recall = self.recall(request).await;

        let memory_block = format_memory_block(recall.memories());
        let system = self
            .template
            .compose(memory_block.as_deref(), request.file());
        let messages = vec![
            Message::system(system),
            Message::user_with_images(request.prompt.clone(), &request.images),
        ];
        debug!(
            memories = recall.count(),
            images = request.images.len(),
            "Composed messages"
        );

        let dispatched = match self
            .dispatcher
            .complete(&route.provider, messages, &self.options)
            .await
        {
            Ok(d) => d,
            Err(e) => {
                error!(provider = %route.provider.id, error = %e, "Generation failed");
                return Err(GenerationFailure::from(e));
            }
        };

        let memory_write = self.remember(request).await;

        info!(
            served_by = %dispatched.served_by.id,
            fallback_used = dispatched.fell_back,
            memories = recall.count(),
            memory_saved = memory_write.saved(),
            "Generation complete"
        );

        Ok(GenerationOutput {
            response: dispatched.completion.content,
            reasoning: dispatched.completion.reasoning,
            route,
            served_by: dispatched.served_by,
            fallback_used: dispatched.fell_back,
            recall,
            memory_write,
            has_image,
            has_file,
        })
    }

    async fn recall(&self, request: &GenerationRequest) -> MemoryRecall {
        if !request.enable_memory {
            return MemoryRecall::Disabled;
        }
        match self
            .store
            .fetch(&request.user_id, Some(&request.prompt))
            .await
        {
            Ok(records) => MemoryRecall::Retrieved(records),
            Err(e) => {
                warn!(
                    user_id = %request.user_id,
                    error = %e,
                    "Memory fetch failed, continuing without memories"
                );
                MemoryRecall::Degraded(e.to_string())
            }
        }
    }

    /// Extract from the original prompt and persist the fact if asked to.
    async fn remember(&self, request: &GenerationRequest) -> MemoryWrite {
        if !request.enable_memory {
            return MemoryWrite::Skipped;
        }
        let extraction = self.extractor.extract(&request.prompt);
        if !extraction.should_remember || extraction.fact_text.is_empty() {
            return MemoryWrite::Skipped;
        }

        match self
            .store
            .save(
                &request.user_id,
                &extraction.fact_text,
                SEMANTIC,
                EXTRACTED_IMPORTANCE,
            )
            .await
        {
            Ok(record) => {
                info!(user_id = %request.user_id, memory_id = %record.id, "Saved memory from prompt");
                MemoryWrite::Saved(record)
            }
            Err(e) => {
                warn!(user_id = %request.user_id, error = %e, "Memory save failed");
                MemoryWrite::Failed(e.to_string())
            }
        }
    }
}
