//! 디바이스 메트릭 모델.
//!
//! begin_session 요청의 `metrics` 파라미터로 전송되는 평면 JSON 객체.
//! 필드 이름은 Countly 수집 서버와 호환되도록 밑줄 접두사를 쓴다.

use serde::{Deserialize, Serialize};

/// 디바이스 메트릭
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMetrics {
    /// 운영체제 이름
    #[serde(rename = "_os", skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// 운영체제 버전
    #[serde(rename = "_os_version", skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    /// 디바이스 모델/호스트 이름
    #[serde(rename = "_device", skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// 화면 해상도 ("1920x1080")
    #[serde(rename = "_resolution", skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// 로케일 ("ko_KR")
    #[serde(rename = "_locale", skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// 앱 버전
    #[serde(rename = "_app_version", skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}
