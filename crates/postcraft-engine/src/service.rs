//! Request boundary: decode, authenticate, gate on quota, generate, commit
//! usage, and build the response document.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use postcraft_ai::Orchestrator;
use postcraft_core::request::DEFAULT_TARGET_WORD_COUNT;
use postcraft_core::{Background, GenerationRequest, WriterProfile};
use postcraft_news::{NewsContext, compress, format_for_prompt, should_fetch_news};
use postcraft_store::{ProfileStore, StoreError, UsageKind};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::assembler::AssembledDraft;
use crate::error::PipelineError;
use crate::machine::{DEFAULT_MAX_ATTEMPTS, DegradedReason};
use crate::personalization::additional_context;
use crate::pipeline::{Pipeline, Supplements};

// ── Wire types ──

/// Caller identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Credential {
    /// Session token issued to the writer.
    Bearer { token: String },
    /// Identity asserted by a trusted upstream login provider.
    Delegated { provider: String, uid: String },
}

/// Request fields, accepting the legacy aliases older clients still send.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestPayload {
    #[serde(alias = "prompt")]
    pub topic: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub keywords: Option<String>,
    #[serde(alias = "instructions", alias = "background")]
    pub background_instructions: Background,
    #[serde(alias = "wordCount")]
    pub target_word_count: Option<u32>,
    pub model_name: Option<String>,
    #[serde(alias = "useBonus")]
    pub use_bonus_credit: bool,
    pub auth: Option<Credential>,
}

impl RequestPayload {
    pub fn into_request(self) -> GenerationRequest {
        GenerationRequest {
            topic: self.topic,
            category: self.category,
            sub_category: self.sub_category.filter(|s| !s.trim().is_empty()),
            keywords: self.keywords.filter(|s| !s.trim().is_empty()),
            background: self.background_instructions,
            target_word_count: self.target_word_count.unwrap_or(DEFAULT_TARGET_WORD_COUNT),
            model_name: self.model_name,
            use_bonus_credit: self.use_bonus_credit,
        }
    }
}

/// Either `{data: {...}, auth}` or the bare payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequestEnvelope {
    Wrapped {
        data: RequestPayload,
        #[serde(default)]
        auth: Option<Credential>,
    },
    Bare(RequestPayload),
}

impl RequestEnvelope {
    /// Split into the payload and the credential, preferring the outer one.
    pub fn into_parts(self) -> (RequestPayload, Option<Credential>) {
        match self {
            Self::Wrapped { mut data, auth } => {
                let credential = auth.or_else(|| data.auth.take());
                (data, credential)
            }
            Self::Bare(mut payload) => {
                let credential = payload.auth.take();
                (payload, credential)
            }
        }
    }
}

// ── Authentication ──

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential supplied")]
    Missing,
    #[error("token not recognised")]
    UnknownToken,
    #[error("provider {0} is not trusted")]
    UntrustedProvider(String),
}

impl From<AuthError> for PipelineError {
    fn from(e: AuthError) -> Self {
        Self::Unauthenticated(e.to_string())
    }
}

/// Resolves a credential to a writer uid.
#[async_trait::async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, credential: &Credential) -> Result<String, AuthError>;
}

/// Static token → uid table plus the set of trusted delegating providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenTable {
    pub tokens: HashMap<String, String>,
    pub trusted_providers: HashSet<String>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, uid: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), uid.into());
        self
    }

    pub fn trust_provider(mut self, provider: impl Into<String>) -> Self {
        self.trusted_providers.insert(provider.into());
        self
    }
}

#[async_trait::async_trait]
impl AuthVerifier for TokenTable {
    async fn verify(&self, credential: &Credential) -> Result<String, AuthError> {
        match credential {
            Credential::Bearer { token } => {
                self.tokens.get(token).cloned().ok_or(AuthError::UnknownToken)
            }
            Credential::Delegated { provider, uid } => {
                if self.trusted_providers.contains(provider) && !uid.trim().is_empty() {
                    Ok(uid.clone())
                } else {
                    Err(AuthError::UntrustedProvider(provider.clone()))
                }
            }
        }
    }
}

// ── Service ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub max_attempts: u32,
    /// Wall-clock bound on one request, in seconds.
    pub request_deadline_secs: u64,
    pub news_limit: usize,
    /// Same-day draft count at which the response carries a warning.
    pub daily_warning_threshold: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_deadline_secs: 300,
            news_limit: 3,
            daily_warning_threshold: 3,
        }
    }
}

/// A finished request.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub draft: AssembledDraft,
    pub degraded: Option<DegradedReason>,
    pub used_bonus: bool,
    pub daily_limit_warning: bool,
}

impl ServiceResponse {
    pub fn to_json(&self) -> Value {
        let draft = &self.draft.draft;
        let mut metadata = json!({
            "generatedAt": draft.generated_at.to_rfc3339(),
            "modelUsed": self.draft.model_used,
            "attemptCount": self.draft.attempt_count,
            "usedBonus": self.used_bonus,
            "degraded": self.degraded.is_some(),
            "dailyLimitWarning": self.daily_limit_warning,
        });
        if let Some(reason) = self.degraded {
            metadata["degradedReason"] = json!(reason.as_str());
        }
        json!({ "success": true, "draft": draft, "metadata": metadata })
    }
}

/// Failure document: `{success: false, error: {code, message}}`.
pub fn error_json(e: &PipelineError) -> Value {
    json!({
        "success": false,
        "error": { "code": e.code().as_str(), "message": e.to_string() },
    })
}

fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

pub struct GenerationService {
    pipeline: Pipeline,
    store: Arc<dyn ProfileStore>,
    auth: Arc<dyn AuthVerifier>,
    news: Option<Arc<dyn NewsContext>>,
    config: EngineConfig,
}

impl GenerationService {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        store: Arc<dyn ProfileStore>,
        auth: Arc<dyn AuthVerifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            pipeline: Pipeline::new(orchestrator).with_max_attempts(config.max_attempts),
            store,
            auth,
            news: None,
            config,
        }
    }

    pub fn with_news(mut self, news: Arc<dyn NewsContext>) -> Self {
        self.news = Some(news);
        self
    }

    /// JSON in, JSON out. Never fails: errors become failure documents.
    pub async fn handle(&self, body: Value) -> Value {
        let envelope: RequestEnvelope = match serde_json::from_value(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                return error_json(&PipelineError::InvalidArgument(format!(
                    "malformed request: {e}"
                )));
            }
        };
        match self.generate(envelope).await {
            Ok(response) => response.to_json(),
            Err(e) => {
                warn!(code = %e.code(), error = %e, "request failed");
                error_json(&e)
            }
        }
    }

    /// Run one request under the configured deadline.
    pub async fn generate(&self, envelope: RequestEnvelope) -> Result<ServiceResponse, PipelineError> {
        let secs = self.config.request_deadline_secs;
        match tokio::time::timeout(Duration::from_secs(secs), self.run(envelope)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::DeadlineExceeded(secs)),
        }
    }

    async fn run(&self, envelope: RequestEnvelope) -> Result<ServiceResponse, PipelineError> {
        let (payload, credential) = envelope.into_parts();
        let request = payload.into_request().validate()?;
        let uid = self.auth.verify(&credential.ok_or(AuthError::Missing)?).await?;
        let now = Utc::now();
        let today = day_key(now);

        let profile = match self.store.load_profile(&uid).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(uid = %uid, error = %e, "profile unavailable, using fallback");
                WriterProfile::fallback()
            }
        };

        if request.use_bonus_credit {
            if profile.usage.available_bonus() == 0 {
                return Err(PipelineError::FailedPrecondition(
                    "no bonus credit available".to_string(),
                ));
            }
        } else if !profile.is_admin && profile.usage.monthly_exhausted() {
            return Err(PipelineError::ResourceExhausted(format!(
                "monthly limit of {} drafts reached",
                profile.usage.monthly_limit
            )));
        }
        let daily_limit_warning =
            !profile.is_admin && profile.generated_on(&today) >= self.config.daily_warning_threshold;

        let bio = match self.store.load_bio(&uid).await {
            Ok(bio) => bio,
            Err(e) => {
                warn!(uid = %uid, error = %e, "bio unavailable");
                None
            }
        };
        let metadata = bio.as_ref().and_then(|b| b.extracted_metadata.as_ref());
        let hints = additional_context(metadata, &profile, &request.category, &request.topic);
        let news = self.news_section(&request).await;

        info!(
            uid = %uid,
            status = %profile.status,
            category = %request.category,
            target = request.target_word_count,
            bonus = request.use_bonus_credit,
            hints = hints.is_some(),
            news = news.is_some(),
            "generating draft"
        );
        let outcome = self
            .pipeline
            .run(
                &request,
                &profile,
                Supplements {
                    hints: hints.as_deref(),
                    news: news.as_deref(),
                },
            )
            .await?;

        let kind = if request.use_bonus_credit {
            UsageKind::Bonus
        } else {
            UsageKind::Standard
        };
        match self.store.commit_usage(&uid, kind, &today).await {
            Ok(usage) => info!(uid = %uid, ?kind, posts = usage.posts_generated, "usage committed"),
            Err(StoreError::NotFound(_)) => warn!(uid = %uid, "no stored profile, usage not recorded"),
            Err(e) => return Err(e.into()),
        }
        if bio.is_some()
            && let Err(e) = self.store.bump_bio_usage(&uid, &now.to_rfc3339()).await
        {
            warn!(uid = %uid, error = %e, "bio usage not recorded");
        }

        Ok(ServiceResponse {
            degraded: outcome.degraded_reason(),
            draft: outcome.draft().clone(),
            used_bonus: request.use_bonus_credit,
            daily_limit_warning,
        })
    }

    /// Recent-news section for categories that want it. Failures only log.
    async fn news_section(&self, request: &GenerationRequest) -> Option<String> {
        let news = self.news.as_ref()?;
        if !should_fetch_news(&request.category) {
            return None;
        }
        match news.recent(&request.topic, self.config.news_limit).await {
            Ok(items) => {
                let items: Vec<_> = items.iter().map(compress).collect();
                let section = format_for_prompt(&items);
                (!section.is_empty()).then_some(section)
            }
            Err(e) => {
                warn!(topic = %request.topic, error = %e, "news lookup failed, continuing without");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use postcraft_ai::{GenerationError, OrchestratorConfig, TextGenerator};
    use postcraft_core::{UsageCounters, WriterStatus};
    use postcraft_news::{NewsError, NewsItem};
    use postcraft_store::InMemoryStore;

    use super::*;
    use crate::pipeline::tests::{ScriptedGenerator, long_body, orchestrator, profile, reply};

    fn good_reply() -> Result<String, GenerationError> {
        let content = format!("<p>존경하는 남양주시민 여러분, 홍길동입니다.</p>{}", long_body());
        Ok(reply("남양주시 교통 대책", &content))
    }

    fn body(extra: Value) -> Value {
        let mut data = json!({ "topic": "남양주시 교통 대책", "category": "정책/비전" });
        if let (Some(data), Some(extra)) = (data.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                data.insert(k.clone(), v.clone());
            }
        }
        json!({ "data": data, "auth": { "kind": "bearer", "token": "t1" } })
    }

    struct Fixture {
        generator: Arc<ScriptedGenerator>,
        store: Arc<InMemoryStore>,
        service: GenerationService,
    }

    fn fixture(writer: WriterProfile) -> Fixture {
        let generator = Arc::new(ScriptedGenerator::new(vec![good_reply()]));
        let store = Arc::new(InMemoryStore::new().with_profile("u1", writer));
        let service = GenerationService::new(
            orchestrator(generator.clone()),
            store.clone(),
            Arc::new(TokenTable::new().with_token("t1", "u1")),
            EngineConfig::default(),
        );
        Fixture {
            generator,
            store,
            service,
        }
    }

    #[test]
    fn envelopes_and_aliases_decode() {
        let wrapped: RequestEnvelope = serde_json::from_value(json!({
            "data": {
                "prompt": "청년 일자리 정책",
                "category": "정책/비전",
                "instructions": ["2024년 청년 고용률", "없음"],
                "wordCount": 1200,
                "useBonus": true
            },
            "auth": { "kind": "delegated", "provider": "naver", "uid": "u9" }
        }))
        .unwrap();
        let (payload, credential) = wrapped.into_parts();
        assert_eq!(
            credential,
            Some(Credential::Delegated {
                provider: "naver".into(),
                uid: "u9".into()
            })
        );
        let request = payload.into_request();
        assert_eq!(request.topic, "청년 일자리 정책");
        assert_eq!(request.target_word_count, 1200);
        assert!(request.use_bonus_credit);
        assert_eq!(request.background.items(), vec!["2024년 청년 고용률"]);

        let bare: RequestEnvelope = serde_json::from_value(json!({
            "topic": "청년 일자리 정책",
            "category": "정책/비전",
            "backgroundInstructions": "배경",
            "auth": { "kind": "bearer", "token": "t1" }
        }))
        .unwrap();
        let (payload, credential) = bare.into_parts();
        assert_eq!(credential, Some(Credential::Bearer { token: "t1".into() }));
        let request = payload.into_request();
        assert_eq!(request.target_word_count, 1700);
        assert_eq!(request.background, Background::Text("배경".into()));
    }

    #[tokio::test]
    async fn token_table_verification() {
        let table = TokenTable::new().with_token("t1", "u1").trust_provider("naver");
        let bearer = Credential::Bearer { token: "t1".into() };
        assert_eq!(table.verify(&bearer).await.unwrap(), "u1");
        let unknown = Credential::Bearer { token: "nope".into() };
        assert!(matches!(table.verify(&unknown).await, Err(AuthError::UnknownToken)));
        let kakao = Credential::Delegated {
            provider: "kakao".into(),
            uid: "u2".into(),
        };
        assert!(matches!(
            table.verify(&kakao).await,
            Err(AuthError::UntrustedProvider(_))
        ));
    }

    #[tokio::test]
    async fn successful_request_commits_usage() {
        let f = fixture(profile(WriterStatus::Active));
        let out = f.service.handle(body(json!({}))).await;

        assert_eq!(out["success"], json!(true));
        assert_eq!(out["draft"]["title"], json!("남양주시 교통 대책"));
        assert_eq!(out["draft"]["category"], json!("정책/비전"));
        assert!(out["draft"]["id"].as_str().unwrap().starts_with("draft_"));
        assert_eq!(out["metadata"]["modelUsed"], json!("model-a"));
        assert_eq!(out["metadata"]["attemptCount"], json!(1));
        assert_eq!(out["metadata"]["usedBonus"], json!(false));
        assert_eq!(out["metadata"]["degraded"], json!(false));
        assert_eq!(out["metadata"]["dailyLimitWarning"], json!(false));
        assert!(out["metadata"].get("degradedReason").is_none());

        let stored = f.store.load_profile("u1").await.unwrap();
        assert_eq!(stored.usage.posts_generated, 1);
        assert_eq!(stored.generated_on(&day_key(Utc::now())), 1);
    }

    #[tokio::test]
    async fn invalid_request_fails_before_any_call() {
        let f = fixture(profile(WriterStatus::Active));
        let out = f.service.handle(body(json!({ "topic": "짧음" }))).await;
        assert_eq!(out["success"], json!(false));
        assert_eq!(out["error"]["code"], json!("invalid-argument"));
        assert!(f.generator.calls.lock().unwrap().is_empty());

        let out = f.service.handle(json!("not an object")).await;
        assert_eq!(out["error"]["code"], json!("invalid-argument"));
    }

    #[tokio::test]
    async fn missing_or_unknown_credentials_are_rejected() {
        let f = fixture(profile(WriterStatus::Active));
        let out = f
            .service
            .handle(json!({ "topic": "남양주시 교통 대책", "category": "정책/비전" }))
            .await;
        assert_eq!(out["error"]["code"], json!("unauthenticated"));

        let mut request = body(json!({}));
        request["auth"]["token"] = json!("stolen");
        let out = f.service.handle(request).await;
        assert_eq!(out["error"]["code"], json!("unauthenticated"));
        assert!(f.generator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exhausted_monthly_quota_fails_fast() {
        let mut writer = profile(WriterStatus::Active);
        writer.usage = UsageCounters {
            posts_generated: 50,
            monthly_limit: 50,
            ..UsageCounters::default()
        };
        let f = fixture(writer);
        let out = f.service.handle(body(json!({}))).await;
        assert_eq!(out["error"]["code"], json!("resource-exhausted"));
        assert!(f.generator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bonus_requires_available_credit() {
        let f = fixture(profile(WriterStatus::Active));
        let out = f.service.handle(body(json!({ "useBonusCredit": true }))).await;
        assert_eq!(out["error"]["code"], json!("failed-precondition"));

        let mut writer = profile(WriterStatus::Active);
        writer.usage = UsageCounters {
            posts_generated: 50,
            monthly_limit: 50,
            bonus_generated: 2,
            bonus_used: 0,
        };
        let f = fixture(writer);
        let out = f.service.handle(body(json!({ "useBonusCredit": true }))).await;
        assert_eq!(out["success"], json!(true));
        assert_eq!(out["metadata"]["usedBonus"], json!(true));
        let stored = f.store.load_profile("u1").await.unwrap();
        assert_eq!(stored.usage.bonus_used, 1);
        assert_eq!(stored.usage.posts_generated, 50);
    }

    #[tokio::test]
    async fn admins_bypass_quota_and_warning() {
        let mut writer = profile(WriterStatus::Active);
        writer.is_admin = true;
        writer.usage.posts_generated = 50;
        writer.usage.monthly_limit = 50;
        writer.daily_usage.insert(day_key(Utc::now()), 10);
        let f = fixture(writer);
        let out = f.service.handle(body(json!({}))).await;
        assert_eq!(out["success"], json!(true));
        assert_eq!(out["metadata"]["dailyLimitWarning"], json!(false));
        assert_eq!(f.store.load_profile("u1").await.unwrap().usage.posts_generated, 50);
    }

    #[tokio::test]
    async fn heavy_daily_use_sets_warning() {
        let mut writer = profile(WriterStatus::Active);
        writer.daily_usage.insert(day_key(Utc::now()), 3);
        let f = fixture(writer);
        let out = f.service.handle(body(json!({}))).await;
        assert_eq!(out["metadata"]["dailyLimitWarning"], json!(true));
    }

    #[tokio::test]
    async fn unknown_writer_uses_fallback_profile() {
        let generator = Arc::new(ScriptedGenerator::new(vec![good_reply()]));
        let service = GenerationService::new(
            orchestrator(generator.clone()),
            Arc::new(InMemoryStore::new()),
            Arc::new(TokenTable::new().with_token("t1", "ghost")),
            EngineConfig {
                max_attempts: 1,
                ..EngineConfig::default()
            },
        );
        let out = service.handle(body(json!({}))).await;
        assert_eq!(out["success"], json!(true));
        assert_eq!(out["metadata"]["degraded"], json!(true));
        assert_eq!(out["metadata"]["degradedReason"], json!("name-missing"));
        let prompt = &generator.calls.lock().unwrap()[0].1;
        assert!(prompt.contains("사용자"));
    }

    struct StaticNews {
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl NewsContext for StaticNews {
        async fn recent(&self, topic: &str, limit: usize) -> Result<Vec<NewsItem>, NewsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(limit, 3);
            Ok(vec![NewsItem {
                title: format!("<b>{topic}</b> 예산 확정"),
                summary: "시의회가 예산안을 의결했다.".into(),
                published: "2026-10-15".into(),
                link: "https://news.example/1".into(),
            }])
        }
    }

    #[tokio::test]
    async fn news_is_added_only_for_current_event_categories() {
        let news = Arc::new(StaticNews {
            calls: AtomicU32::new(0),
        });
        let f = fixture(profile(WriterStatus::Active));
        let service = f.service.with_news(news.clone());

        let out = service.handle(body(json!({}))).await;
        assert_eq!(out["success"], json!(true));
        assert_eq!(news.calls.load(Ordering::SeqCst), 1);
        {
            let calls = f.generator.calls.lock().unwrap();
            assert!(calls[0].1.contains("[최신 뉴스 참고]"));
            assert!(calls[0].1.contains("남양주시 교통 대책 예산 확정"));
        }

        let out = service.handle(body(json!({ "category": "일상소통" }))).await;
        assert_eq!(out["success"], json!(true));
        assert_eq!(news.calls.load(Ordering::SeqCst), 1);
    }

    struct Hanging;

    #[async_trait::async_trait]
    impl TextGenerator for Hanging {
        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, GenerationError> {
            std::future::pending::<Result<String, GenerationError>>().await
        }
    }

    #[tokio::test]
    async fn request_deadline_is_enforced() {
        let service = GenerationService::new(
            Arc::new(Orchestrator::new(Arc::new(Hanging), OrchestratorConfig::default())),
            Arc::new(InMemoryStore::new().with_profile("u1", profile(WriterStatus::Active))),
            Arc::new(TokenTable::new().with_token("t1", "u1")),
            EngineConfig {
                request_deadline_secs: 0,
                ..EngineConfig::default()
            },
        );
        let out = service.handle(body(json!({}))).await;
        assert_eq!(out["error"]["code"], json!("deadline-exceeded"));
    }
}
