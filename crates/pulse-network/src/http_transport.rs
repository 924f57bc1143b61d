//! HTTP 전송 클라이언트.
//!
//! `Transport` 포트 구현. 짧은 페이로드는 GET 쿼리 문자열로,
//! 긴 페이로드는 form 본문 POST로 보낸다.
//! 재시도는 하지 않는다. 재시도 정책은 전송 루프가 담당한다.

use async_trait::async_trait;
use pulse_core::error::CoreError;
use pulse_core::models::request::{OutboundRequest, RequestMethod};
use pulse_core::ports::transport::Transport;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use std::time::Duration;
use tracing::{debug, warn};

/// Retry-After 헤더가 없을 때 기본 대기 시간 (초)
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// reqwest 기반 전송: `Transport` 포트 구현
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// 새 HTTP 전송 생성 (요청 타임아웃 지정)
    pub fn new(timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {}", e)))?;

        Ok(Self { client })
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(resp: reqwest::Response) -> Result<(), CoreError> {
        let status = resp.status();

        if status.is_success() {
            return Ok(());
        }

        let retry_after_secs = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

        let status_code = status.as_u16();
        let text = resp.text().await.unwrap_or_else(|e| {
            warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });

        match status_code {
            429 => Err(CoreError::RateLimit { retry_after_secs }),
            503 => Err(CoreError::ServiceUnavailable(text)),
            _ => Err(CoreError::Http {
                status: status_code,
                body: text,
            }),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<(), CoreError> {
        let builder = match request.method {
            RequestMethod::Get => self.client.get(request.url()),
            RequestMethod::Post => self
                .client
                .post(&request.endpoint)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(request.payload.clone()),
        };

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CoreError::Network(format!("요청 타임아웃: {e}"))
            } else {
                CoreError::Network(format!("요청 실패: {e}"))
            }
        })?;

        Self::check_response(resp).await?;
        debug!("요청 전송 성공 ({:?}, {}바이트)", request.method, request.payload.len());
        Ok(())
    }
}
