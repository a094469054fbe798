// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The gateway client: per-model configuration, the fallback chain, circuit
//! breakers, token refresh, and the context-window guard, wired around the
//! per-backend shape-request / consume-stream / classify-error functions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forge_core::{codes, Clock, CircuitState, ErrorClass, Event, EventBus, EventKind, Message, TokenData};
use parking_lot::Mutex;

use crate::backend::{self, AbortFlag, AggregatedMessage, BackendKind, StreamDelta, ThinkingLevel, ToolSpec};
use crate::context_guard;
use crate::error::GatewayError;
use crate::retry;
use crate::token_store::TokenStore;

/// Static per-model configuration, matching the configuration shape in the
/// external-interfaces design (`model_name, base_url, backend,
/// auth_header_name?, auth_token?, provider_name?, fallback_models,
/// thinking_level, timeout`).
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Registration key: what callers pass to [`Gateway::chat`] and what
    /// fallback chains/circuits are keyed by (e.g. `"primary"`). Distinct
    /// from [`Self::wire_model`], which is the identifier sent to the
    /// provider.
    pub model_name: String,
    /// The vendor's model identifier, sent on the wire (request body or URL
    /// depending on backend).
    pub wire_model: String,
    pub base_url: String,
    pub backend: BackendKind,
    pub auth_header_name: Option<String>,
    pub auth_token: Option<String>,
    pub provider_name: Option<String>,
    pub fallback_models: Vec<String>,
    pub thinking_level: ThinkingLevel,
    pub timeout: Duration,
    /// Known context window in tokens; `None` skips the context-window guard.
    pub context_window: Option<usize>,
    /// Timeout applied to half-open circuit probes, overridable per model.
    pub half_open_after: Duration,
}

/// Refreshes a provider's [`TokenData`]. Registered per `provider_name`.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn refresh(&self, current: Option<&TokenData>) -> Result<TokenData, GatewayError>;
}

/// Object-safe wrapper around [`Clock`]; `Clock` itself requires `Clone`,
/// which rules out `dyn Clock`, so the gateway stores this instead and
/// accepts any concrete clock at construction time.
trait DynClock: Send + Sync {
    fn now_ms(&self) -> u64;
    fn now_secs(&self) -> u64;
}

impl<C: Clock> DynClock for C {
    fn now_ms(&self) -> u64 {
        Clock::now_ms(self)
    }

    fn now_secs(&self) -> u64 {
        Clock::now_secs(self)
    }
}

pub struct Gateway {
    http: reqwest::Client,
    models: HashMap<String, ModelConfig>,
    circuits: Mutex<HashMap<String, CircuitState>>,
    providers: HashMap<String, Arc<dyn TokenProvider>>,
    token_store: TokenStore,
    refresh_lock: tokio::sync::Mutex<()>,
    bus: EventBus,
    clock: Arc<dyn DynClock>,
}

impl Gateway {
    pub fn new(home: &std::path::Path, bus: EventBus, clock: impl Clock + 'static) -> Result<Self, GatewayError> {
        Ok(Self {
            http: reqwest::Client::new(),
            models: HashMap::new(),
            circuits: Mutex::new(HashMap::new()),
            providers: HashMap::new(),
            token_store: TokenStore::open(home)?,
            refresh_lock: tokio::sync::Mutex::new(()),
            bus,
            clock: Arc::new(clock),
        })
    }

    pub fn register_model(&mut self, cfg: ModelConfig) {
        self.circuits
            .lock()
            .entry(cfg.model_name.clone())
            .or_insert_with(|| CircuitState::new(cfg.model_name.clone()));
        self.models.insert(cfg.model_name.clone(), cfg);
    }

    pub fn register_provider(&mut self, provider_name: impl Into<String>, provider: Arc<dyn TokenProvider>) {
        self.providers.insert(provider_name.into(), provider);
    }

    /// Register the `"primary"` model for one of the built-in provider
    /// slugs (`claude`, `google`, `ollama`), loading its stored auth token
    /// if one has been saved via [`TokenStore`].
    pub fn register_default_model(&mut self, provider: &str) -> Result<(), GatewayError> {
        let cfg = crate::provider::model_config_for(provider, &self.token_store)?;
        self.register_model(cfg);
        Ok(())
    }

    /// `chat(messages, tools) -> {message}`, synchronous from the caller's
    /// view: internally streams and emits `stream_start/token/end` events,
    /// retries per the retry policy table, and falls back through
    /// `fallback_models` on retryable non-auth non-connection failures.
    pub async fn chat(
        &self,
        primary_model: &str,
        mut messages: Vec<Message>,
        tools: Vec<ToolSpec>,
        abort: &AbortFlag,
    ) -> Result<AggregatedMessage, GatewayError> {
        let chain = self.fallback_chain(primary_model);
        let now = self.clock.now_ms();

        let mut last_err: Option<GatewayError> = None;
        for model_name in &chain {
            let cfg = match self.models.get(model_name) {
                Some(cfg) => cfg,
                None => continue,
            };

            if !self.circuit_admits(model_name, now) {
                tracing::debug!(model = %model_name, "circuit open, skipping to next fallback");
                continue;
            }

            self.bus.publish(Event::new(EventKind::StreamStart, codes::AGENT_THINKING, now).with_label(model_name.as_str()));

            let result = self
                .call_model_with_retry(cfg, &mut messages, &tools, abort, |_delta| {})
                .await;

            match result {
                Ok(msg) => {
                    self.record_success(model_name);
                    self.bus.publish(Event::new(EventKind::StreamEnd, codes::AGENT_THINKING, self.clock.now_ms()).with_label(model_name.as_str()));
                    return Ok(msg);
                }
                Err(err) => {
                    self.record_failure(model_name, self.clock.now_ms());
                    if err.class().breaks_fallback_chain() {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or(GatewayError::AllModelsExhausted))
    }

    fn fallback_chain(&self, primary_model: &str) -> Vec<String> {
        let mut chain = vec![primary_model.to_string()];
        if let Some(cfg) = self.models.get(primary_model) {
            chain.extend(cfg.fallback_models.iter().cloned());
        }
        chain
    }

    fn circuit_admits(&self, model_name: &str, now_ms: u64) -> bool {
        let half_open_after = self
            .models
            .get(model_name)
            .map(|c| c.half_open_after.as_millis() as u64)
            .unwrap_or(60_000);
        let mut circuits = self.circuits.lock();
        let circuit = circuits
            .entry(model_name.to_string())
            .or_insert_with(|| CircuitState::new(model_name.to_string()));
        if circuit.try_enter_half_open(now_ms, half_open_after) {
            self.bus.publish(Event::new(EventKind::Message, codes::CIRCUIT_CLOSE, now_ms).with_label(model_name.as_str()));
        }
        circuit.is_available(now_ms, half_open_after)
    }

    fn record_success(&self, model_name: &str) {
        let mut circuits = self.circuits.lock();
        if let Some(circuit) = circuits.get_mut(model_name) {
            circuit.record_success();
        }
    }

    fn record_failure(&self, model_name: &str, now_ms: u64) {
        let mut circuits = self.circuits.lock();
        let circuit = circuits
            .entry(model_name.to_string())
            .or_insert_with(|| CircuitState::new(model_name.to_string()));
        circuit.record_failure(now_ms);
        if circuit.phase == forge_core::CircuitPhase::Open {
            tracing::warn!(model = %model_name, "circuit opened after consecutive failures");
            self.bus.publish(Event::new(EventKind::Message, codes::CIRCUIT_OPEN, now_ms).with_label(model_name.as_str()));
        }
    }

    /// Reset every circuit to closed. Called between auto-retry cycles to
    /// mirror the fresh-process semantics of a manual resume.
    pub fn reset_circuits(&self) {
        self.circuits.lock().clear();
    }

    async fn call_model_with_retry(
        &self,
        cfg: &ModelConfig,
        messages: &mut Vec<Message>,
        tools: &[ToolSpec],
        abort: &AbortFlag,
        mut emit: impl FnMut(StreamDelta),
    ) -> Result<AggregatedMessage, GatewayError> {
        if let Some(window) = cfg.context_window {
            if context_guard::trim_to_guard(messages, window) {
                self.bus.publish(
                    Event::new(EventKind::Message, codes::CONTEXT_TRIMMED, self.clock.now_ms())
                        .with_label(cfg.model_name.as_str()),
                );
            }
        }

        let mut token = self.resolve_token(cfg).await?;
        let started_ms = self.clock.now_ms();
        let mut attempt: u32 = 0;
        let mut auth_retried = false;

        loop {
            let outcome = dispatch_once(&self.http, cfg, messages, tools, token.as_deref(), abort, &mut emit).await;
            match outcome {
                Ok(msg) => return Ok(msg),
                Err(err) => {
                    let class = err.class();

                    if class == ErrorClass::Auth && !auth_retried {
                        auth_retried = true;
                        token = Some(self.refresh_token(cfg).await?);
                        continue;
                    }

                    let policy = retry::policy_for(class);
                    if !policy.retryable {
                        return Err(err);
                    }

                    let elapsed_secs = self.clock.now_ms().saturating_sub(started_ms) / 1000;
                    if elapsed_secs >= policy.budget_secs {
                        return Err(GatewayError::RetryBudgetExhausted {
                            class,
                            budget_secs: policy.budget_secs,
                        });
                    }

                    let delay = if class == ErrorClass::RateLimit {
                        retry::rate_limit_delay(err.retry_after_secs())
                    } else {
                        retry::full_jitter_delay(policy.base_delay_secs, attempt)
                    };
                    tracing::debug!(model = %cfg.model_name, ?class, attempt, delay_ms = delay.as_millis() as u64, "retrying after backoff");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn resolve_token(&self, cfg: &ModelConfig) -> Result<Option<String>, GatewayError> {
        let Some(provider_name) = &cfg.provider_name else {
            return Ok(cfg.auth_token.clone());
        };

        let now_secs = self.clock.now_secs();
        let stored = self.token_store.load(provider_name)?;
        let needs_refresh = stored
            .as_ref()
            .map(|t| t.needs_refresh(now_secs, forge_core::constants::TOKEN_REFRESH_MARGIN_SECS))
            .unwrap_or(true);

        if needs_refresh {
            Ok(Some(self.refresh_token(cfg).await?))
        } else {
            Ok(stored.map(|t| t.access_token))
        }
    }

    /// Refresh the token for `cfg`'s provider. Serialized by
    /// `refresh_lock` so exactly one caller refreshes at a time; transient
    /// network errors are retried up to 3 times with a short fixed backoff,
    /// permanent provider errors stop immediately.
    async fn refresh_token(&self, cfg: &ModelConfig) -> Result<String, GatewayError> {
        let Some(provider_name) = &cfg.provider_name else {
            return cfg
                .auth_token
                .clone()
                .ok_or_else(|| GatewayError::TokenStore("no provider and no static auth token configured".into()));
        };
        let provider = self
            .providers
            .get(provider_name)
            .ok_or_else(|| GatewayError::TokenStore(format!("no token provider registered for {provider_name}")))?;

        let _guard = self.refresh_lock.lock().await;
        let current = self.token_store.load(provider_name)?;

        const REFRESH_ATTEMPTS: u32 = 3;
        let mut last_err = None;
        for attempt in 0..REFRESH_ATTEMPTS {
            match provider.refresh(current.as_ref()).await {
                Ok(token) => {
                    self.token_store.save(provider_name, &token)?;
                    self.bus.publish(Event::new(
                        EventKind::Message,
                        codes::TOKEN_REFRESHED,
                        self.clock.now_ms(),
                    ));
                    return Ok(token.access_token);
                }
                Err(err) if err.class().is_retryable_at_gateway() => {
                    last_err = Some(err);
                    tokio::time::sleep(Duration::from_millis(200 * (attempt as u64 + 1))).await;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or(GatewayError::TokenStore("token refresh failed".into())))
    }
}

async fn dispatch_once(
    client: &reqwest::Client,
    cfg: &ModelConfig,
    messages: &[Message],
    tools: &[ToolSpec],
    token: Option<&str>,
    abort: &AbortFlag,
    emit: impl FnMut(StreamDelta),
) -> Result<AggregatedMessage, GatewayError> {
    let body = match cfg.backend {
        BackendKind::Ollama => backend::ollama::build_request(&cfg.wire_model, messages, tools),
        BackendKind::Anthropic => backend::anthropic::build_request(&cfg.wire_model, messages, tools),
        BackendKind::Google => backend::google::build_request(messages, tools),
    };

    let response = build_request(client, cfg, body, token).send().await?;
    let status = response.status();

    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();
        let class = match cfg.backend {
            BackendKind::Ollama => backend::ollama::classify_error(status_code, retry_after),
            BackendKind::Anthropic => backend::anthropic::classify_error(status_code, retry_after),
            BackendKind::Google => backend::google::classify_error(status_code, retry_after),
        };
        return Err(GatewayError::Status {
            status: status_code,
            body: body_text,
            class,
            retry_after_secs: retry_after,
        });
    }

    match cfg.backend {
        BackendKind::Ollama => backend::ollama::consume_stream(response, abort, emit).await,
        BackendKind::Anthropic => backend::anthropic::consume_stream(response, abort, emit).await,
        BackendKind::Google => backend::google::consume_stream(response, abort, emit).await,
    }
}

fn build_request(
    client: &reqwest::Client,
    cfg: &ModelConfig,
    body: serde_json::Value,
    token: Option<&str>,
) -> reqwest::RequestBuilder {
    let url = match cfg.backend {
        BackendKind::Ollama => format!("{}/api/chat", cfg.base_url),
        BackendKind::Anthropic => format!("{}/v1/messages", cfg.base_url),
        BackendKind::Google => format!("{}/v1beta/models/{}:streamGenerateContent?alt=sse", cfg.base_url, cfg.wire_model),
    };
    let mut req = client.post(url).json(&body).timeout(cfg.timeout);

    if let (Some(header_name), Some(token)) = (&cfg.auth_header_name, token) {
        req = req.header(header_name.as_str(), token);
    } else if let Some(token) = token {
        req = match cfg.backend {
            BackendKind::Anthropic => req.header("x-api-key", token).header("anthropic-version", "2023-06-01"),
            BackendKind::Google => req.query(&[("key", token)]),
            BackendKind::Ollama => req,
        };
    }
    req
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
