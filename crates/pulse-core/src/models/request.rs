//! 수집 서버 요청 모델.
//!
//! 큐에 저장되는 요청은 이미 인코딩된 쿼리 문자열이다.
//! 모든 요청은 `app_key`, `device_id`, `timestamp`로 시작하며
//! 종류별 파라미터(begin_session/session_duration/end_session/events)가 뒤따른다.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::config::SDK_VERSION;

/// 큐에 저장되는 불투명 요청 페이로드 (인코딩된 쿼리 문자열)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueuedRequest(String);

impl QueuedRequest {
    /// 이미 인코딩된 쿼리 문자열로 생성 (영속 저장소 복원용)
    pub fn from_encoded(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 파라미터 값 조회 (디코딩 결과)
    pub fn param(&self, name: &str) -> Option<String> {
        form_urlencoded::parse(self.0.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// HTTP 전송 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    /// `<endpoint>?<payload>`
    Get,
    /// `<endpoint>` + form 본문
    Post,
}

/// 전송 직전 요청 (엔드포인트 + 페이로드 + 방식)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub endpoint: String,
    pub payload: String,
    pub method: RequestMethod,
}

impl OutboundRequest {
    /// 페이로드 길이에 따라 GET/POST 결정
    pub fn new(endpoint: &str, request: &QueuedRequest, post_threshold_bytes: usize) -> Self {
        let method = if request.len() > post_threshold_bytes {
            RequestMethod::Post
        } else {
            RequestMethod::Get
        };

        Self {
            endpoint: endpoint.to_string(),
            payload: request.as_str().to_string(),
            method,
        }
    }

    /// GET 요청 URL (`<endpoint>?<payload>`)
    pub fn url(&self) -> String {
        format!("{}?{}", self.endpoint, self.payload)
    }
}

/// 요청 쿼리 문자열 빌더
///
/// 값은 항상 form-urlencoded로 인코딩된다 (공백은 `+`).
pub struct RequestBuilder {
    serializer: form_urlencoded::Serializer<'static, String>,
}

impl RequestBuilder {
    /// 공통 파라미터(app_key, device_id, timestamp)로 시작
    pub fn new(app_key: &str, device_id: &str, timestamp: i64) -> Self {
        let mut serializer = form_urlencoded::Serializer::new(String::with_capacity(256));
        serializer
            .append_pair("app_key", app_key)
            .append_pair("device_id", device_id)
            .append_pair("timestamp", &timestamp.to_string());
        Self { serializer }
    }

    /// 세션 시작 요청
    pub fn begin_session(mut self, metrics_json: &str) -> QueuedRequest {
        self.serializer
            .append_pair("sdk_version", SDK_VERSION)
            .append_pair("begin_session", "1")
            .append_pair("metrics", metrics_json);
        self.finish()
    }

    /// 세션 하트비트 (경과 시간 갱신)
    pub fn session_duration(mut self, duration: u64) -> QueuedRequest {
        self.serializer
            .append_pair("session_duration", &duration.to_string());
        self.finish()
    }

    /// 세션 종료 요청
    pub fn end_session(mut self, duration: u64) -> QueuedRequest {
        self.serializer
            .append_pair("end_session", "1")
            .append_pair("session_duration", &duration.to_string());
        self.finish()
    }

    /// 이벤트 배치 요청
    pub fn events(mut self, events_json: &str) -> QueuedRequest {
        self.serializer.append_pair("events", events_json);
        self.finish()
    }

    fn finish(mut self) -> QueuedRequest {
        QueuedRequest(self.serializer.finish())
    }
}
