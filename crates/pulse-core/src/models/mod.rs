//! Pulse 도메인 모델.
//!
//! 이벤트, 큐 요청, 세션 상태, 디바이스 메트릭을 정의한다.

pub mod device;
pub mod event;
pub mod request;
pub mod session;
