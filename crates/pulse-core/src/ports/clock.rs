//! 시계 포트.

/// 벽시계 (유닉스 초, 소수부 포함)
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> f64;

    /// 요청 `timestamp` 파라미터용 정수 초
    fn unix_timestamp(&self) -> i64 {
        self.now_secs().floor() as i64
    }
}

/// 시스템 시계: `chrono::Utc::now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        let now = chrono::Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2020() {
        let clock = SystemClock;
        assert!(clock.now_secs() > 1_577_836_800.0);
        assert!(clock.unix_timestamp() > 1_577_836_800);
    }
}
