//! Database Schema
//!
//! SQLite 테이블 스키마 정의

/// 데이터베이스 스키마 생성 SQL
pub const CREATE_SCHEMA: &str = r#"
-- 표현 규칙 테이블
CREATE TABLE IF NOT EXISTS expression_rules (
    id TEXT PRIMARY KEY,
    emotion TEXT NOT NULL,
    intent TEXT NOT NULL,
    punctuation_adjustment TEXT NOT NULL,
    tts_tone TEXT NOT NULL,
    confidence_threshold REAL NOT NULL DEFAULT 0.7,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- (emotion, intent) 는 유니크가 아니지만 조회 키
CREATE INDEX IF NOT EXISTS idx_rules_emotion_intent ON expression_rules(emotion, intent);
CREATE INDEX IF NOT EXISTS idx_rules_updated ON expression_rules(updated_at);

-- 번역 세션 테이블
CREATE TABLE IF NOT EXISTS translation_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT,
    glosses TEXT NOT NULL,                -- JSON Array
    letters TEXT,                         -- JSON Array, NULL 허용
    preferred_words TEXT NOT NULL,        -- JSON Object
    context TEXT,
    input_text TEXT NOT NULL,
    compose_confidence REAL NOT NULL,
    compose_alternatives TEXT NOT NULL,   -- JSON Array
    detected_emotion TEXT NOT NULL,
    detected_intent TEXT NOT NULL,
    emphasis TEXT NOT NULL,               -- JSON Array
    adjusted_text TEXT NOT NULL,
    tts_metadata TEXT NOT NULL,           -- JSON Object
    tool_metadata TEXT NOT NULL,          -- JSON Object
    summary_text TEXT,
    summary_topics TEXT NOT NULL,         -- JSON Array
    summary_action_items TEXT NOT NULL,   -- JSON Array
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- 세션 인덱스
CREATE INDEX IF NOT EXISTS idx_sessions_emotion ON translation_sessions(detected_emotion);
CREATE INDEX IF NOT EXISTS idx_sessions_intent ON translation_sessions(detected_intent);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON translation_sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_updated ON translation_sessions(updated_at);
"#;

/// 샘플 데이터 (중복 실행해도 안전)
pub const SEED_DATA: &str = r#"
INSERT OR IGNORE INTO expression_rules
    (id, emotion, intent, punctuation_adjustment, tts_tone, confidence_threshold, created_at, updated_at)
VALUES
    ('11111111-1111-1111-1111-111111111111', 'happy', 'statement', 'add exclamation mark', 'bright', 0.9,
     CAST(strftime('%s', 'now') AS INTEGER) * 1000, CAST(strftime('%s', 'now') AS INTEGER) * 1000),
    ('22222222-2222-2222-2222-222222222222', 'frustrated', 'question', 'add question mark', 'concerned', 0.85,
     CAST(strftime('%s', 'now') AS INTEGER) * 1000, CAST(strftime('%s', 'now') AS INTEGER) * 1000);

INSERT OR IGNORE INTO translation_sessions
    (id, user_id, glosses, letters, preferred_words, context, input_text, compose_confidence,
     compose_alternatives, detected_emotion, detected_intent, emphasis, adjusted_text,
     tts_metadata, tool_metadata, summary_text, summary_topics, summary_action_items,
     created_at, updated_at)
VALUES
    ('33333333-3333-3333-3333-333333333333',
     'user_123',
     '["IX-1","GOOD","IDEA"]',
     '["A","I"]',
     '{"GOOD":"fantastic"}',
     'Brainstorming product ideas',
     'That''s a good idea',
     0.9,
     '["Good idea."]',
     'positive',
     'statement',
     '["good"]',
     'That''s a good idea!',
     '{"voice":"en-female-1","tone":"bright","audio_url":"https://example.com/audio.wav","visemes":["AA","B"]}',
     '{"compose_version":"2024-09-25","tts_version":"v2"}',
     'Discussed next sprint scope and agreed on deliverables.',
     '["planning","next steps"]',
     '["Send sprint summary","Update roadmap"]',
     CAST(strftime('%s', 'now') AS INTEGER) * 1000,
     CAST(strftime('%s', 'now') AS INTEGER) * 1000);
"#;
