//! # pulse-storage
//!
//! 로컬 저장소 어댑터.
//! SQLite 기반 요청 큐 영속화와 스키마 마이그레이션,
//! 재시작 후에도 유지되는 디바이스 ID를 관리한다.
//!
//! ## 모듈
//! - `sqlite`: 요청 큐 저장소 (QueueStorage 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;
