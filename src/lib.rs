//! ASL Agent - Translation Session Backend Library
//!
//! 표현 규칙/번역 세션 저장소, gloss → 문장 합성, HTTP API 를 담당합니다.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::api::AppState;
use crate::config::Settings;
use crate::db::Database;
use crate::error::AgentResult;
use crate::services::SentenceComposer;

fn is_valid_env_key(key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    key.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// `KEY=VALUE` 라인만 읽는 관대한 로더. 비어 있지 않은 기존 값은 덮어쓰지 않습니다.
fn load_env_lenient(text: &str) -> Vec<(String, String)> {
    let mut loaded = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("```") {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line).trim();
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim();
        if !is_valid_env_key(key) {
            continue;
        }
        if let Ok(existing) = std::env::var(key) {
            if !existing.trim().is_empty() {
                continue;
            }
        }

        let mut value = v.trim();
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        loaded.push((key.to_string(), value.to_string()));
    }

    loaded
}

fn find_upwards(start: PathBuf, filename: &str, max_hops: usize) -> Option<PathBuf> {
    let mut cur = start;
    for _ in 0..=max_hops {
        let candidate = cur.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        if !cur.pop() {
            break;
        }
    }
    None
}

fn load_env_file(path: &Path) -> bool {
    // strict 파서 우선, 실패하면 KEY=VALUE 라인만 보강
    if dotenvy::from_path(path).is_ok() {
        return true;
    }
    let Ok(text) = std::fs::read_to_string(path) else {
        return false;
    };
    let pairs = load_env_lenient(&text);
    let loaded = !pairs.is_empty();
    for (key, value) in pairs {
        std::env::set_var(key, value);
    }
    loaded
}

/// `.env` 를 CWD 에서 위로 올라가며 찾아 로드 (없어도 에러 아님)
///
/// 설정(`config::settings()`)이 처음 읽히기 전에 호출해야 합니다.
pub fn load_env() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let path = find_upwards(cwd, ".env", 4)?;
    load_env_file(&path).then_some(path)
}

/// tracing subscriber 설치. `RUST_LOG` 가 있으면 우선합니다.
pub fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // 이미 설치돼 있으면 무시
    let _ = subscriber.try_init();
}

/// DB 오픈 + 스키마 초기화 (+ 선택적 샘플 데이터) 후 핸들러 상태 구성
pub fn build_state(settings: &Settings, seed: bool) -> AgentResult<AppState> {
    let db = Database::open(&settings.db_path, &settings.connection_config())?;
    db.initialize()?;
    if seed {
        db.seed()?;
        info!("seed data inserted");
    }

    if settings.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; compose requires a per-request openai_api_key");
    }

    let composer = SentenceComposer::new(settings.composer_defaults());
    Ok(AppState::new(db, composer))
}

/// HTTP 서버 실행
pub async fn run(settings: Settings, seed: bool) -> AgentResult<()> {
    init_tracing(&settings.log_level);

    let state = build_state(&settings, seed)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    let addr = listener.local_addr()?;
    info!(
        %addr,
        db_path = %settings.db_path.display(),
        model = %settings.openai_model,
        "ASL Agent API listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
