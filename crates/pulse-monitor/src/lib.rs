//! # pulse-monitor
//!
//! 디바이스 정보 어댑터.
//! sysinfo로 OS 이름/버전과 호스트 이름을, 환경 변수로 로케일을 수집해
//! begin_session 메트릭을 만든다.

pub mod device_info;
