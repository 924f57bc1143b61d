//! 매니저 설정 구조체.
//!
//! 수집 서버 주소, 앱 키, 갱신 주기, 이벤트 전송 임계값, 요청 큐 한도 등
//! 엔진 런타임 설정을 정의한다. JSON 파일 로드/저장을 지원한다.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::CoreError;

/// SDK 버전 (begin_session 요청에 포함)
pub const SDK_VERSION: &str = "2.0";

/// 엔진 설정
///
/// `app_key`를 제외한 모든 필드는 초기화 이후 변경되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// 수집 서버 기본 URL (예: "https://cloud.count.ly")
    #[serde(default = "default_app_host")]
    pub app_host: String,
    /// 앱 키 (Init 시점에 지연 지정 가능)
    #[serde(default)]
    pub app_key: String,
    /// 디버그 로그 출력 여부
    #[serde(default)]
    pub allow_debug_log: bool,
    /// 세션 갱신 주기 (초). 0이면 내부 타이머 없이 호스트가 `tick()`을 호출한다.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: f64,
    /// 이벤트 배치 전송 임계값 (버퍼 크기)
    #[serde(default = "default_event_send_threshold")]
    pub event_send_threshold: usize,
    /// 요청 큐 초기 용량
    #[serde(default = "default_queue_capacity_hint")]
    pub queue_capacity_hint: usize,
    /// 요청 큐 최대 길이 (초과 시 가장 오래된 요청 제거)
    #[serde(default = "default_queue_limit")]
    pub queue_limit: usize,
    /// 요청 큐 영속화 여부
    #[serde(default = "default_true")]
    pub queue_uses_persistent_storage: bool,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 종료 직전 큐 비우기 대기 한도 (밀리초)
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    /// 이 길이를 넘는 페이로드는 POST 본문으로 전송
    #[serde(default = "default_post_threshold_bytes")]
    pub post_threshold_bytes: usize,
    /// 요청 큐 SQLite 파일 경로 (None이면 호출자가 결정)
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    /// 앱 버전 (`_app_version` 메트릭)
    #[serde(default)]
    pub app_version: Option<String>,
}

impl ManagerConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            app_host: default_app_host(),
            app_key: String::new(),
            allow_debug_log: false,
            update_interval_secs: default_update_interval_secs(),
            event_send_threshold: default_event_send_threshold(),
            queue_capacity_hint: default_queue_capacity_hint(),
            queue_limit: default_queue_limit(),
            queue_uses_persistent_storage: true,
            request_timeout_ms: default_request_timeout_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            post_threshold_bytes: default_post_threshold_bytes(),
            storage_path: None,
            app_version: None,
        }
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        url::Url::parse(&self.app_host)
            .map_err(|e| CoreError::Config(format!("잘못된 app_host '{}': {e}", self.app_host)))?;

        if self.queue_limit == 0 {
            return Err(CoreError::Config(
                "queue_limit은 1 이상이어야 합니다".to_string(),
            ));
        }

        if !self.update_interval_secs.is_finite() || self.update_interval_secs < 0.0 {
            return Err(CoreError::Config(format!(
                "잘못된 update_interval_secs: {}",
                self.update_interval_secs
            )));
        }

        Ok(())
    }

    /// 세션 갱신 주기 (0이면 None, 내부 타이머 비활성화)
    pub fn update_interval(&self) -> Option<Duration> {
        if self.update_interval_secs > 0.0 {
            Some(Duration::from_secs_f64(self.update_interval_secs))
        } else {
            None
        }
    }

    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 종료 대기 한도를 Duration으로 반환
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// 수집 엔드포인트 (`<app_host>/i`)
    pub fn endpoint(&self) -> String {
        format!("{}/i", self.app_host.trim_end_matches('/'))
    }

    /// 파일에서 설정 로드
    pub fn load_from_file(path: &Path) -> Result<Self, CoreError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
        })?;

        let config: ManagerConfig = serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
        })?;

        config.validate()?;
        debug!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 파일에 설정 저장
    pub fn save_to_file(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::Config(format!(
                        "설정 디렉토리 생성 실패: {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {}", e)))?;

        fs::write(path, content).map_err(|e| {
            CoreError::Config(format!("설정 파일 저장 실패: {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_app_host() -> String {
    "https://cloud.count.ly".to_string()
}
fn default_update_interval_secs() -> f64 {
    60.0
}
fn default_event_send_threshold() -> usize {
    10
}
fn default_queue_capacity_hint() -> usize {
    128
}
fn default_queue_limit() -> usize {
    1024
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_shutdown_timeout_ms() -> u64 {
    5_000
}
fn default_post_threshold_bytes() -> usize {
    2_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_defaults() {
        let config = ManagerConfig::default_config();
        assert_eq!(config.app_host, "https://cloud.count.ly");
        assert_eq!(config.update_interval_secs, 60.0);
        assert_eq!(config.event_send_threshold, 10);
        assert_eq!(config.queue_capacity_hint, 128);
        assert_eq!(config.queue_limit, 1024);
        assert!(config.queue_uses_persistent_storage);
        assert!(!config.allow_debug_log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ManagerConfig =
            serde_json::from_str(r#"{"app_key":"abc","queue_limit":5}"#).unwrap();
        assert_eq!(config.app_key, "abc");
        assert_eq!(config.queue_limit, 5);
        assert_eq!(config.event_send_threshold, 10);
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ManagerConfig::default_config();
        config.app_host = "not a url".to_string();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let mut config = ManagerConfig::default_config();
        config.queue_limit = 0;
        assert!(config.validate().is_err());

        let mut config = ManagerConfig::default_config();
        config.update_interval_secs = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_interval_disables_timer() {
        let mut config = ManagerConfig::default_config();
        config.update_interval_secs = 0.0;
        assert!(config.validate().is_ok());
        assert!(config.update_interval().is_none());

        config.update_interval_secs = 0.5;
        assert_eq!(config.update_interval(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let mut config = ManagerConfig::default_config();
        config.app_host = "http://localhost:8080/".to_string();
        assert_eq!(config.endpoint(), "http://localhost:8080/i");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("pulse.json");

        let mut config = ManagerConfig::default_config();
        config.app_key = "key_1".to_string();
        config.event_send_threshold = 3;
        config.save_to_file(&path).unwrap();

        let loaded = ManagerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.app_key, "key_1");
        assert_eq!(loaded.event_send_threshold, 3);
    }

    #[test]
    fn load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = ManagerConfig::load_from_file(&temp_dir.path().join("missing.json"));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }
}
