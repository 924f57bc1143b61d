//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 전송, 영속 저장소, 디바이스 정보, 시계는 외부 협력자이며
//! 각 어댑터 crate가 구현하고 `pulse-client`에서 `Arc<dyn T>`로 와이어링한다.

pub mod clock;
pub mod device;
pub mod storage;
pub mod transport;
