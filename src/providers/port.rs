/*!
 * `TranslationPort` backed by an LLM provider.
 *
 * Each call leases a prompt session for its mode and language pair from the
 * port's `SessionPool`, sends one completion request and cleans the reply.
 * Provider failures are mapped to `PortError` and never retried here.
 */

use async_trait::async_trait;
use log::{debug, error};
use std::time::Duration;

use crate::annotation::port::{TranslationPort, context_window};
use crate::app_config::{PipelineConfig, ProviderConfig};
use crate::errors::PortError;
use crate::language_utils::get_language_name;

use super::session::SessionPool;
use super::{CompletionRequest, Provider};

const SPAN_OPEN: &str = "[[";
const SPAN_CLOSE: &str = "]]";

/// System prompt and usage count for one mode and language pair
#[derive(Debug, Clone)]
pub struct PromptSession {
    system: String,
    requests: u64,
}

impl PromptSession {
    fn new(system: String) -> Self {
        Self { system, requests: 0 }
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }
}

/// Adapts a `Provider` to the pipeline's translation boundary
pub struct ProviderPort<P: Provider> {
    provider: P,
    sessions: SessionPool<PromptSession>,
    temperature: f32,
    /// Bytes of context kept on each side of a span to simplify
    simplify_context_chars: usize,
}

impl<P: Provider> ProviderPort<P> {
    pub fn new(provider: P, max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            provider,
            sessions: SessionPool::new(max_sessions, idle_timeout),
            temperature: 0.2,
            simplify_context_chars: 120,
        }
    }

    /// Build a port from configuration
    pub fn from_config(provider: P, provider_config: &ProviderConfig, pipeline_config: &PipelineConfig) -> Self {
        Self::new(
            provider,
            provider_config.max_sessions,
            Duration::from_secs(provider_config.idle_timeout_secs),
        )
        .with_temperature(provider_config.temperature)
        .with_simplify_context_chars(pipeline_config.simplify_context_chars)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_simplify_context_chars(mut self, chars: usize) -> Self {
        self.simplify_context_chars = chars;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn sessions(&self) -> &SessionPool<PromptSession> {
        &self.sessions
    }

    /// Send `prompt` through a session for `key`, creating it with `system` if needed
    async fn run(&self, key: &str, system: impl FnOnce() -> String, prompt: String) -> Result<String, PortError> {
        let mut lease = self
            .sessions
            .acquire(key, || PromptSession::new(system()))
            .await?;

        let system_prompt = match lease.session_mut() {
            Some(session) => {
                session.requests += 1;
                session.system.clone()
            }
            None => return Err(PortError::Unavailable("session lease was empty".to_string())),
        };

        let request = CompletionRequest::new(prompt)
            .system(system_prompt)
            .temperature(self.temperature);

        match self.provider.complete(request).await {
            Ok(raw) => Ok(clean_response(&raw)),
            Err(e) => {
                error!("Provider request for '{}' failed: {}", key, e);
                lease.discard();
                Err(PortError::from(e))
            }
        }
    }
}

fn language_label(code: &str) -> String {
    get_language_name(code).unwrap_or_else(|_| code.to_string())
}

/// Reduce a model reply to the bare rendering.
///
/// Keeps the first non-empty line, drops span markers and surrounding quotes.
pub fn clean_response(raw: &str) -> String {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
    let line = line.replace(SPAN_OPEN, "").replace(SPAN_CLOSE, "");
    let mut cleaned = line.trim();

    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”'), ('«', '»'), ('「', '」')] {
        if cleaned.len() >= open.len_utf8() + close.len_utf8() && cleaned.starts_with(open) && cleaned.ends_with(close) {
            cleaned = cleaned[open.len_utf8()..cleaned.len() - close.len_utf8()].trim();
            break;
        }
    }
    cleaned.to_string()
}

#[async_trait]
impl<P: Provider> TranslationPort for ProviderPort<P> {
    async fn translate_literal(&self, text: &str, source: &str, target: &str) -> Result<String, PortError> {
        let key = format!("literal:{}:{}", source, target);
        let prompt = format!(
            "Translate from {} to {}. Reply with the translation only.\n{}",
            language_label(source),
            language_label(target),
            text
        );
        self.run(
            &key,
            || "You translate short phrases word for word, without commentary.".to_string(),
            prompt,
        )
        .await
    }

    async fn translate_contextual(
        &self,
        text: &str,
        source: &str,
        target: &str,
        context: &str,
        literal_candidate: &str,
    ) -> Result<String, PortError> {
        let key = format!("contextual:{}:{}", source, target);
        let prompt = format!(
            "Sentence: {}\nLiteral {} translation: {}\nIf the literal translation fits the sentence, repeat it exactly. \
             Otherwise give a better {} translation of the phrase as used in the sentence. Reply with the translation only.\n{}",
            context,
            language_label(target),
            literal_candidate,
            language_label(target),
            text
        );
        let source_name = language_label(source);
        let reply = self
            .run(
                &key,
                move || format!("You translate {} phrases in context, without commentary.", source_name),
                prompt,
            )
            .await?;

        if reply.trim() == literal_candidate.trim() {
            debug!("Contextual reply for '{}' echoed the literal", text);
            return Ok(literal_candidate.to_string());
        }
        Ok(reply)
    }

    async fn simplify(
        &self,
        text: &str,
        full_context: &str,
        chunk_start: usize,
        chunk_end: usize,
    ) -> Result<String, PortError> {
        let (window, start, end) = context_window(full_context, chunk_start, chunk_end, self.simplify_context_chars);
        let marked = format!(
            "{}{}{}{}{}",
            &window[..start],
            SPAN_OPEN,
            &window[start..end],
            SPAN_CLOSE,
            &window[end..]
        );
        let prompt = format!(
            "Rewrite only the text between {} and {} in simpler words of the same language. \
             Reply with the rewritten span only. The span is \"{}\".\n{}",
            SPAN_OPEN, SPAN_CLOSE, text, marked
        );
        self.run(
            "simplify",
            || "You rewrite phrases for language learners in plain, common words.".to_string(),
            prompt,
        )
        .await
    }
}
