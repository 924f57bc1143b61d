//! Pulse 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 외부 에러를 `map_err`로 `CoreError`에 매핑한다.
//! 엔진 내부에서 발생한 에러는 호스트 앱으로 전파되지 않고 로그로만 남는다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패 (빈 이벤트 키 등)
    #[error("유효성 검증 실패 ({field}): {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// Rate Limit 초과 (429)
    #[error("요청 한도 초과, {retry_after_secs}초 후 재시도")]
    RateLimit {
        /// 재시도 대기 시간 (초)
        retry_after_secs: u64,
    },

    /// 서비스 일시 불가 (503)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// 기타 HTTP 실패 응답
    #[error("HTTP 에러 ({status}): {body}")]
    Http {
        /// 응답 상태 코드
        status: u16,
        /// 응답 본문
        body: String,
    },

    /// 영속 저장소 읽기/쓰기 실패
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 빈 값/잘못된 입력에 대한 검증 에러 생성
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
