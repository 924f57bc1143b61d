//! # pulse-client
//!
//! 텔레메트리 전송 엔진.
//!
//! - [`request_queue`]: 크기 제한 + 영속화 가능한 FIFO 요청 큐
//! - [`event_buffer`]: 임계값 기반 이벤트 배치 버퍼
//! - [`delivery`]: 단일 전송 태스크 (재시도 5회 후 폐기)
//! - [`driver`]: 주기 하트비트 타이머
//! - [`manager`]: 호출자용 API (`Manager`)

pub mod delivery;
pub mod driver;
pub mod event_buffer;
pub mod manager;
pub mod request_queue;

pub use delivery::DeliveryReport;
pub use manager::{Manager, ManagerDeps, ManagerStats};
