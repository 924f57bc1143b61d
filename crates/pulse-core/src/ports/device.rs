//! 디바이스 정보 포트.
//!
//! 구현: `pulse-monitor` crate (sysinfo)

use crate::models::device::DeviceMetrics;

/// 디바이스 식별자 + 메트릭 제공자
pub trait DeviceInfoProvider: Send + Sync {
    /// 디바이스 고유 ID
    fn device_id(&self) -> String;

    /// 메트릭 재수집 (OS 버전, 로케일 등이 바뀌었을 수 있음)
    fn refresh(&self);

    /// 마지막으로 수집한 메트릭
    fn metrics(&self) -> DeviceMetrics;
}
