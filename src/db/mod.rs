//! Database Module
//!
//! SQLite 데이터베이스 관리 (r2d2 커넥션 풀)
//!
//! 모든 public 연산은 진입 시 풀에서 커넥션 1개를 꺼내고, 반환 직전에
//! 돌려놓습니다. 변경 연산은 트랜잭션 안에서 실행되며, 커밋 전에 에러가
//! 나면 트랜잭션이 drop 되면서 롤백됩니다.

mod rows;
mod rules;
mod schema;
mod sessions;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::{AgentError, AgentResult};

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// 커넥션 풀 설정
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub pool_size: u32,
    pub busy_timeout_ms: u32,
    pub acquire_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 5_000,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// 새 커넥션마다 pragma 적용
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA foreign_keys = ON;\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))
    }
}

/// 데이터베이스 래퍼 (clone 하면 같은 풀을 공유)
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// 파일 기반 데이터베이스 풀 생성
    pub fn open(path: &Path, config: &ConnectionConfig) -> AgentResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AgentError::StorageTask(format!(
                        "failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.acquire_timeout)
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout_ms: config.busy_timeout_ms,
            }))
            .build(manager)?;
        Ok(Self { pool })
    }

    /// 데이터베이스 스키마 초기화
    pub fn initialize(&self) -> AgentResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(schema::CREATE_SCHEMA)?;
        Ok(())
    }

    /// 샘플 규칙/세션 삽입
    pub fn seed(&self) -> AgentResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute_batch(schema::SEED_DATA)?;
        tx.commit()?;
        Ok(())
    }

    fn conn(&self) -> AgentResult<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// 동기 DB 작업을 blocking 스레드에서 실행
    ///
    /// 호출한 async 태스크는 작업이 끝날 때까지 양보하므로 다른 요청이 계속 진행됩니다.
    pub async fn call<T, F>(&self, f: F) -> AgentResult<T>
    where
        F: FnOnce(&Database) -> AgentResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| AgentError::StorageTask(e.to_string()))?
    }
}

/// 현재 시각 (epoch millis, DB 저장 정밀도)
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn millis_to_datetime(
    id: &str,
    column: &'static str,
    millis: i64,
) -> AgentResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| AgentError::MalformedRow {
        id: id.to_string(),
        column,
        reason: format!("timestamp out of range: {millis}"),
    })
}

/// 빈 문자열 필터는 "필터 없음" 으로 취급
pub(crate) fn active_filter(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) use sessions::fixtures;

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// 임시 디렉토리에 초기화된 DB 생성 (TempDir 는 테스트가 끝날 때까지 보관)
    pub fn temp_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db"), &ConnectionConfig::default()).unwrap();
        db.initialize().unwrap();
        (dir, db)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::temp_db;
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let (_dir, db) = temp_db();
        db.initialize().unwrap();
        db.initialize().unwrap();
    }

    #[test]
    fn test_pragmas_applied() {
        let (_dir, db) = temp_db();
        let conn = db.conn().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("agent.db");
        let db = Database::open(&path, &ConnectionConfig::default()).unwrap();
        db.initialize().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let (_dir, db) = temp_db();
        db.seed().unwrap();
        db.seed().unwrap();

        let rules = db.list_rules(&Default::default()).unwrap();
        assert_eq!(rules.len(), 2);

        let sessions = db.list_sessions(&Default::default()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].glosses, vec!["IX-1", "GOOD", "IDEA"]);
        assert_eq!(
            sessions[0].letters,
            Some(vec!["A".to_string(), "I".to_string()])
        );
    }

    #[tokio::test]
    async fn test_call_runs_on_blocking_pool() {
        let (_dir, db) = temp_db();
        let count = db
            .call(|db| Ok(db.list_rules(&Default::default())?.len()))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_active_filter_ignores_empty() {
        assert_eq!(active_filter(&Some(String::new())), None);
        assert_eq!(active_filter(&Some("happy".into())), Some("happy"));
        assert_eq!(active_filter(&None), None);
    }
}
