//! 스키마 마이그레이션.
//!
//! 버전 기반 SQLite 스키마 관리.

use rusqlite::Connection;
use tracing::{debug, info};

/// 현재 스키마 버전
const CURRENT_VERSION: u32 = 2;

/// 스키마 마이그레이션 실행
pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current = get_version(conn)?;
    debug!("현재 스키마 버전: {current}, 목표: {CURRENT_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }

    if current < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// 현재 스키마 버전 조회
pub(crate) fn get_version(conn: &Connection) -> Result<u32, rusqlite::Error> {
    let result: Result<u32, _> = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    );
    result.or(Ok(0))
}

/// V1: request_queue 테이블 생성
fn migrate_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V1 실행: request_queue 테이블");

    conn.execute_batch(
        "
        -- 전송 대기 요청 (id 순서 = 큐 순서)
        CREATE TABLE IF NOT EXISTS request_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT INTO schema_version (version) VALUES (1);
        ",
    )?;

    info!("마이그레이션 V1 완료");
    Ok(())
}

/// V2: client_state 키-값 테이블 (디바이스 ID 등)
fn migrate_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V2 실행: client_state 테이블");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS client_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT INTO schema_version (version) VALUES (2);
        ",
    )?;

    info!("마이그레이션 V2 완료");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_reach_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, CURRENT_VERSION as i64);
    }
}
