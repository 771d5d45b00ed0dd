//! Completion dispatch with a single quota-driven fallback.

use relay_common::{Message, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::{ChatTransport, Completion, CompletionRequest};
use crate::config::Credentials;
use crate::fallback::{CompletionOptions, FallbackProfile, is_quota_error};
use crate::registry::{ProviderEntry, ProviderRegistry};

/// A completion together with the provider that actually produced it.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub completion: Completion,
    pub served_by: ProviderEntry,
    /// True when the primary call hit a quota error and the fallback answered
    pub fell_back: bool,
}

/// Issues completion calls and handles the quota fallback.
///
/// The dispatcher never retries more than once and never touches the memory
/// store.
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    credentials: Arc<Credentials>,
    transport: Arc<dyn ChatTransport>,
    fallback: FallbackProfile,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        credentials: Arc<Credentials>,
        transport: Arc<dyn ChatTransport>,
        fallback: FallbackProfile,
    ) -> Self {
        Self {
            registry,
            credentials,
            transport,
            fallback,
        }
    }

    fn build_request(
        provider: &ProviderEntry,
        messages: Vec<Message>,
        options: &CompletionOptions,
    ) -> CompletionRequest {
        CompletionRequest {
            model: provider.model.clone(),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stream: false,
        }
    }

    /// Send `messages` to `provider`.
    ///
    /// On an upstream error whose body reports quota exhaustion, retries once
    /// against the registry's fallback target using the fallback profile. Any
    /// other failure, or a failed retry, surfaces the primary error.
    pub async fn complete(
        &self,
        provider: &ProviderEntry,
        messages: Vec<Message>,
        options: &CompletionOptions,
    ) -> Result<Dispatched> {
        let api_key = self.credentials.require(provider.backend)?;

        let request = Self::build_request(provider, messages, options);

        let primary_error = match self.transport.send(provider, api_key, &request).await {
            Ok(completion) => {
                debug!(provider = %provider.id, "Primary completion succeeded");
                return Ok(Dispatched {
                    completion,
                    served_by: provider.clone(),
                    fell_back: false,
                });
            }
            Err(e) => e,
        };

        if !is_quota_error(&primary_error) {
            return Err(primary_error);
        }

        let target = self.registry.fallback_target();
        let Some(fallback_key) = self.credentials.get(target.backend) else {
            warn!(
                provider = %provider.id,
                fallback = %target.id,
                backend = %target.backend,
                "Quota exhausted but fallback backend has no credential"
            );
            return Err(primary_error);
        };

        warn!(
            provider = %provider.id,
            fallback = %target.id,
            error = %primary_error,
            "Quota exhausted, retrying once on fallback provider"
        );

        let fallback_messages = self.fallback.rewrite(&request.messages, target);
        let retry = Self::build_request(target, fallback_messages, &self.fallback.options());
        match self.transport.send(target, fallback_key, &retry).await {
            Ok(completion) => {
                info!(fallback = %target.id, "Fallback completion succeeded");
                Ok(Dispatched {
                    completion,
                    served_by: target.clone(),
                    fell_back: true,
                })
            }
            Err(retry_error) => {
                warn!(
                    fallback = %target.id,
                    error = %retry_error,
                    "Fallback completion failed"
                );
                Err(primary_error)
            }
        }
    }
}
