//! SQLite 요청 큐 저장소.
//!
//! `QueueStorage` 포트 구현. 큐의 순서는 `request_queue.id` 오름차순이다.
//! 디바이스 ID처럼 재시작 후에도 유지되어야 하는 값은 `client_state`에 둔다.

use pulse_core::error::CoreError;
use pulse_core::ports::storage::QueueStorage;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::migration;

/// 디바이스 ID 키 (`client_state`)
const DEVICE_ID_KEY: &str = "device_id";

/// SQLite 요청 큐 저장소: `QueueStorage` 포트 구현
pub struct SqliteQueueStorage {
    conn: Mutex<Connection>,
}

impl SqliteQueueStorage {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| CoreError::Storage(format!("SQLite 열기 실패: {e}")))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )
        .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        info!("요청 큐 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Storage(format!("인메모리 SQLite 생성 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|e| CoreError::Storage(format!("잠금 획득 실패: {e}")))
    }

    /// 저장된 디바이스 ID 반환, 없으면 UUID v4를 생성해 저장
    pub fn device_id_or_create(&self) -> Result<String, CoreError> {
        let conn = self.lock()?;

        let existing: Option<String> = conn
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                rusqlite::params![DEVICE_ID_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CoreError::Storage(format!("디바이스 ID 조회 실패: {e}")))?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO client_state (key, value) VALUES (?1, ?2)",
            rusqlite::params![DEVICE_ID_KEY, id],
        )
        .map_err(|e| CoreError::Storage(format!("디바이스 ID 저장 실패: {e}")))?;

        info!("새 디바이스 ID 생성: {id}");
        Ok(id)
    }
}

impl QueueStorage for SqliteQueueStorage {
    fn load_all(&self) -> Result<Vec<String>, CoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT payload FROM request_queue ORDER BY id ASC")
            .map_err(|e| CoreError::Storage(format!("쿼리 준비 실패: {e}")))?;

        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| CoreError::Storage(format!("쿼리 실행 실패: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoreError::Storage(format!("요청 읽기 실패: {e}")))?;

        debug!("저장된 요청 {}개 로드", payloads.len());
        Ok(payloads)
    }

    fn push_back(&self, payload: &str) -> Result<(), CoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO request_queue (payload) VALUES (?1)",
            rusqlite::params![payload],
        )
        .map_err(|e| CoreError::Storage(format!("요청 저장 실패: {e}")))?;

        Ok(())
    }

    fn pop_front(&self) -> Result<(), CoreError> {
        let conn = self.lock()?;

        conn.execute(
            "DELETE FROM request_queue WHERE id = (SELECT MIN(id) FROM request_queue)",
            [],
        )
        .map_err(|e| CoreError::Storage(format!("요청 삭제 실패: {e}")))?;

        Ok(())
    }

    fn len(&self) -> Result<usize, CoreError> {
        let conn = self.lock()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM request_queue", [], |row| row.get(0))
            .map_err(|e| CoreError::Storage(format!("요청 수 조회 실패: {e}")))?;

        Ok(count as usize)
    }

    fn clear(&self) -> Result<(), CoreError> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM request_queue", [])
            .map_err(|e| CoreError::Storage(format!("요청 전체 삭제 실패: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn push_and_load_in_order() {
        let storage = SqliteQueueStorage::open_in_memory().unwrap();
        storage.push_back("a=1").unwrap();
        storage.push_back("a=2").unwrap();
        storage.push_back("a=3").unwrap();

        assert_eq!(storage.load_all().unwrap(), vec!["a=1", "a=2", "a=3"]);
        assert_eq!(storage.len().unwrap(), 3);
    }

    #[test]
    fn pop_front_removes_oldest() {
        let storage = SqliteQueueStorage::open_in_memory().unwrap();
        storage.push_back("first").unwrap();
        storage.push_back("second").unwrap();

        storage.pop_front().unwrap();
        assert_eq!(storage.load_all().unwrap(), vec!["second"]);

        storage.pop_front().unwrap();
        assert!(storage.is_empty().unwrap());

        // 빈 큐에서 pop은 에러 없이 무시
        storage.pop_front().unwrap();
        assert!(storage.is_empty().unwrap());
    }

    #[test]
    fn clear_removes_everything() {
        let storage = SqliteQueueStorage::open_in_memory().unwrap();
        storage.push_back("x").unwrap();
        storage.push_back("y").unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.len().unwrap(), 0);
    }

    #[test]
    fn contents_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("queue.db");

        {
            let storage = SqliteQueueStorage::open(&path).unwrap();
            storage.push_back("app_key=k&events=%5B%5D").unwrap();
            storage.push_back("app_key=k&session_duration=60").unwrap();
            storage.pop_front().unwrap();
            storage.push_back("app_key=k&end_session=1").unwrap();
        }

        let reopened = SqliteQueueStorage::open(&path).unwrap();
        assert_eq!(
            reopened.load_all().unwrap(),
            vec!["app_key=k&session_duration=60", "app_key=k&end_session=1"]
        );
    }

    #[test]
    fn unusable_parent_dir_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let result = SqliteQueueStorage::open(&blocker.join("state").join("queue.db"));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }

    #[test]
    fn device_id_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("queue.db");

        let first = SqliteQueueStorage::open(&path)
            .unwrap()
            .device_id_or_create()
            .unwrap();
        let second = SqliteQueueStorage::open(&path)
            .unwrap()
            .device_id_or_create()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 36);
    }
}
