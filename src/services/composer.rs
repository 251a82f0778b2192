//! Sentence Composer
//!
//! gloss 시퀀스를 자연스러운 영어 문장으로 바꾸는 외부 chat-completions 호출.
//! 프롬프트 생성과 응답 추출은 하나의 구현을 공유하고, 전송만
//! blocking / async 두 가지로 제공합니다.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::error::{AgentError, AgentResult, UpstreamError};
use crate::models::{ComposeSentenceRequest, ComposeSentenceResponse};

const BASE_INSTRUCTION: &str = "You are assisting an ASL translation service. \
Given a list of glosses (English upper-case words representing ASL signs), compose a \
natural-sounding English sentence. Preserve the meaning, be concise, and return only the sentence.";

const SYSTEM_MESSAGE: &str = "You convert ASL gloss sequences into fluent English sentences.";

const COMPOSE_TEMPERATURE: f64 = 0.3;

/// 프로세스 단위 기본값. 호출마다 override 가 없을 때만 사용됩니다.
#[derive(Debug, Clone)]
pub struct ComposerDefaults {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ComposerDefaults {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// 사용자 메시지 프롬프트 생성 (순수 함수)
pub fn build_prompt(glosses: &[String], letters: Option<&[String]>, context: Option<&str>) -> String {
    let mut parts = vec![
        BASE_INSTRUCTION.to_string(),
        format!("Glosses: {}.", glosses.join(", ")),
    ];
    if let Some(letters) = letters.filter(|l| !l.is_empty()) {
        parts.push(format!("Detected spelled letters: {}.", letters.join(", ")));
    }
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        parts.push(format!("Conversation context: {context}"));
    }
    parts.join("\n")
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// 자격 증명까지 확정된 한 번의 호출
struct PreparedCall {
    url: String,
    api_key: String,
    body: ChatCompletionRequest,
}

impl PreparedCall {
    fn model(&self) -> &str {
        &self.body.model
    }
}

/// 응답 본문에서 첫 번째 후보의 텍스트를 꺼내 앞뒤 공백 제거
fn extract_text(raw: &str) -> Result<String, UpstreamError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(raw)
        .map_err(|e| UpstreamError::Malformed(format!("invalid completion body: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| UpstreamError::Malformed("completion has no message content".to_string()))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Text Composer
///
/// 호출마다 (명시적 override, 없으면 기본값) 으로 설정을 새로 확정합니다.
/// 재시도는 하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct SentenceComposer {
    defaults: ComposerDefaults,
}

impl SentenceComposer {
    pub fn new(defaults: ComposerDefaults) -> Self {
        Self { defaults }
    }

    /// 입력 검증과 자격 증명 확인. 네트워크 호출 전에 실패합니다.
    fn prepare(&self, request: &ComposeSentenceRequest) -> AgentResult<PreparedCall> {
        if request.glosses.is_empty() {
            return Err(AgentError::InvalidRequest(
                "glosses must contain at least one token".to_string(),
            ));
        }

        let api_key = non_empty(request.openai_api_key.as_deref())
            .or_else(|| non_empty(self.defaults.api_key.as_deref()))
            .ok_or_else(|| {
                AgentError::ComposerConfig(
                    "OpenAI API key is not configured. Set OPENAI_API_KEY or pass openai_api_key"
                        .to_string(),
                )
            })?
            .to_string();

        let model = non_empty(request.openai_model.as_deref())
            .unwrap_or(self.defaults.model.as_str())
            .to_string();

        let prompt = build_prompt(
            &request.glosses,
            request.letters.as_deref(),
            request.context.as_deref(),
        );

        Ok(PreparedCall {
            url: format!(
                "{}/chat/completions",
                self.defaults.base_url.trim_end_matches('/')
            ),
            api_key,
            body: ChatCompletionRequest {
                model,
                temperature: COMPOSE_TEMPERATURE,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: SYSTEM_MESSAGE.to_string(),
                    },
                    ChatMessage {
                        role: "user",
                        content: prompt,
                    },
                ],
            },
        })
    }

    fn log_start(request: &ComposeSentenceRequest, call: &PreparedCall) {
        info!(
            glosses = ?request.glosses,
            letters = ?request.letters,
            context_len = request.context.as_deref().map_or(0, str::len),
            model = call.model(),
            "compose start"
        );
        debug!(url = %call.url, "compose request target");
    }

    fn finish(call: PreparedCall, text: String) -> ComposeSentenceResponse {
        info!(model = call.model(), text = %text, "compose result");
        ComposeSentenceResponse {
            text,
            confidence: None,
            model: call.body.model,
        }
    }

    /// blocking 호출. async 런타임 워커가 아닌 스레드에서 호출해야 합니다
    /// (`spawn_blocking` 등).
    pub fn compose(&self, request: &ComposeSentenceRequest) -> AgentResult<ComposeSentenceResponse> {
        let call = self.prepare(request)?;
        Self::log_start(request, &call);

        let client = reqwest::blocking::Client::builder()
            .timeout(self.defaults.timeout)
            .build()
            .map_err(UpstreamError::from)?;
        let resp = client
            .post(&call.url)
            .bearer_auth(&call.api_key)
            .json(&call.body)
            .send()
            .map_err(UpstreamError::from)?;

        let status = resp.status();
        let body = resp.text().map_err(UpstreamError::from)?;
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let text = extract_text(&body)?;
        Ok(Self::finish(call, text))
    }

    /// async 호출
    pub async fn compose_async(
        &self,
        request: &ComposeSentenceRequest,
    ) -> AgentResult<ComposeSentenceResponse> {
        let call = self.prepare(request)?;
        Self::log_start(request, &call);

        let client = reqwest::Client::builder()
            .timeout(self.defaults.timeout)
            .build()
            .map_err(UpstreamError::from)?;
        let resp = client
            .post(&call.url)
            .bearer_auth(&call.api_key)
            .json(&call.body)
            .send()
            .await
            .map_err(UpstreamError::from)?;

        let status = resp.status();
        let body = resp.text().await.map_err(UpstreamError::from)?;
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let text = extract_text(&body)?;
        Ok(Self::finish(call, text))
    }
}

/// 세션 워크플로우가 의존하는 생성기 (테스트에서 교체 가능)
#[async_trait]
pub trait TextComposer: Send + Sync {
    async fn generate(&self, request: ComposeSentenceRequest) -> AgentResult<ComposeSentenceResponse>;
}

#[async_trait]
impl TextComposer for SentenceComposer {
    async fn generate(&self, request: ComposeSentenceRequest) -> AgentResult<ComposeSentenceResponse> {
        self.compose_async(&request).await
    }
}
