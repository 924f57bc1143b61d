//! 요청 큐 영속 저장소 포트.
//!
//! 구현: `pulse-storage` crate (rusqlite)
//!
//! 큐의 양 끝만 다룬다: 꼬리에 추가, 머리에서 제거.
//! 호출은 동기식이며 짧게 끝나야 한다 (이벤트 기록 경로에서 호출됨).

use crate::error::CoreError;

/// 요청 큐 영속 저장소
pub trait QueueStorage: Send + Sync {
    /// 저장된 모든 페이로드를 삽입 순서대로 반환
    fn load_all(&self) -> Result<Vec<String>, CoreError>;

    /// 꼬리에 페이로드 추가
    fn push_back(&self, payload: &str) -> Result<(), CoreError>;

    /// 머리 페이로드 제거 (비어 있으면 아무것도 하지 않음)
    fn pop_front(&self) -> Result<(), CoreError>;

    /// 저장된 페이로드 수
    fn len(&self) -> Result<usize, CoreError>;

    /// 비어 있는지
    fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.len()? == 0)
    }

    /// 전체 삭제
    fn clear(&self) -> Result<(), CoreError>;
}
