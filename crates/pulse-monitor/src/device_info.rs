//! 디바이스 정보 수집.
//!
//! `DeviceInfoProvider` 포트 구현. 디바이스 ID는 생성 시 주입받는다
//! (영속 저장소가 발급한 값 또는 호스트 앱이 정한 값).

use parking_lot::Mutex;
use pulse_core::models::device::DeviceMetrics;
use pulse_core::ports::device::DeviceInfoProvider;
use sysinfo::System;
use tracing::debug;

/// 로케일 환경 변수 조회 순서
const LOCALE_ENV_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// sysinfo 기반 디바이스 정보 제공자
pub struct SysInfoDeviceProvider {
    device_id: String,
    app_version: Option<String>,
    /// 호스트 앱이 알려준 화면 해상도
    resolution: Mutex<Option<(u32, u32)>>,
    metrics: Mutex<DeviceMetrics>,
}

impl SysInfoDeviceProvider {
    pub fn new(device_id: impl Into<String>, app_version: Option<String>) -> Self {
        let provider = Self {
            device_id: device_id.into(),
            app_version,
            resolution: Mutex::new(None),
            metrics: Mutex::new(DeviceMetrics::default()),
        };
        provider.refresh();
        provider
    }

    /// 화면 해상도 설정 (헤드리스 환경에서는 호출하지 않는다)
    pub fn set_resolution(&self, width: u32, height: u32) {
        *self.resolution.lock() = Some((width, height));
    }

    fn collect(&self) -> DeviceMetrics {
        let resolution = *self.resolution.lock();
        DeviceMetrics {
            os: System::name(),
            os_version: System::os_version(),
            device: System::host_name(),
            resolution: resolution.map(|(w, h)| format!("{w}x{h}")),
            locale: current_locale(),
            app_version: self.app_version.clone(),
        }
    }
}

impl DeviceInfoProvider for SysInfoDeviceProvider {
    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    fn refresh(&self) {
        let metrics = self.collect();
        debug!(
            "디바이스 정보 갱신: os={:?}, version={:?}, locale={:?}",
            metrics.os, metrics.os_version, metrics.locale
        );
        *self.metrics.lock() = metrics;
    }

    fn metrics(&self) -> DeviceMetrics {
        self.metrics.lock().clone()
    }
}

/// 환경 변수에서 로케일 추출 ("ko_KR.UTF-8" → "ko_KR")
fn current_locale() -> Option<String> {
    LOCALE_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find_map(|value| normalize_locale(&value))
}

fn normalize_locale(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.to_string())
}
