//! # pulse-core
//!
//! Pulse 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 이벤트, 큐 요청, 세션 추적기, 디바이스 메트릭
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (전송/저장소/디바이스/시계)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 매니저 설정 구조체

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
