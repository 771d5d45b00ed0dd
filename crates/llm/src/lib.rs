//! Provider catalog and completion dispatch for Relay.
//!
//! Every backend speaks the OpenAI chat-completions wire format, so a single
//! HTTP transport serves the whole registry. The [`Dispatcher`] adds the
//! quota fallback on top of that transport.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod fallback;
pub mod openai;
pub mod registry;

pub use client::{ChatTransport, Completion, CompletionRequest};
pub use config::{Credentials, CredentialsConfig};
pub use dispatch::{Dispatched, Dispatcher};
pub use fallback::{CompletionOptions, FallbackProfile, is_quota_error};
pub use openai::OpenAiCompatClient;
pub use registry::{
    BackendKind, Capability, ProviderEntry, ProviderRegistry, RegistryConfig, RegistryRoles,
};
