//! 전송 포트.
//!
//! 구현: `pulse-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::request::OutboundRequest;

/// 수집 서버 전송
///
/// 2xx 응답이면 `Ok(())`. 타임아웃/연결 실패/비정상 상태 코드는 모두 `Err`이며
/// 무한 대기하지 않아야 한다.
#[async_trait]
pub trait Transport: Send + Sync {
    /// 요청 하나 전송
    async fn send(&self, request: &OutboundRequest) -> Result<(), CoreError>;
}
