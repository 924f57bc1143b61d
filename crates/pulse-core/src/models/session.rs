//! 세션 상태 모델.
//!
//! 일시정지/재개 상태와 미보고 세션 시간을 추적한다.
//! 정수 초만 서버로 보내고 소수 나머지는 다음 계산으로 이월한다.

/// 세션 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// 일시정지 (초기 상태)
    Suspended,
    /// 활성
    Active,
}

/// 세션 시간 추적기
///
/// 불변식: 지금까지 추출한 정수 시간의 합 + `unsent_fraction` =
/// 마지막 `resume` 이후 활성 상태로 흐른 시간.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    phase: SessionPhase,
    last_tracked_at: f64,
    unsent_fraction: f64,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Suspended,
            last_tracked_at: 0.0,
            unsent_fraction: 0.0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn last_tracked_at(&self) -> f64 {
        self.last_tracked_at
    }

    pub fn unsent_fraction(&self) -> f64 {
        self.unsent_fraction
    }

    /// 활성 상태로 전환. 이미 활성이면 false.
    pub fn resume(&mut self, now: f64) -> bool {
        if self.is_active() {
            return false;
        }

        self.phase = SessionPhase::Active;
        self.last_tracked_at = now;
        self.unsent_fraction = 0.0;
        true
    }

    /// 일시정지로 전환하고 남은 세션 시간을 반환. 이미 일시정지면 None.
    pub fn suspend(&mut self, now: f64) -> Option<u64> {
        if !self.is_active() {
            return None;
        }

        let duration = self.extract_duration(now);
        self.phase = SessionPhase::Suspended;
        Some(duration)
    }

    /// 마지막 추적 이후 경과 시간을 정수 초로 추출
    ///
    /// 시계가 뒤로 가면 경과 시간은 0으로 본다.
    pub fn extract_duration(&mut self, now: f64) -> u64 {
        let elapsed = if now > self.last_tracked_at {
            now - self.last_tracked_at
        } else {
            0.0
        };

        let total = elapsed + self.unsent_fraction;
        let duration = total.floor().max(0.0);

        self.unsent_fraction = total - duration;
        if now > self.last_tracked_at {
            self.last_tracked_at = now;
        }

        duration as u64
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_suspended() {
        let tracker = SessionTracker::new();
        assert_eq!(tracker.phase(), SessionPhase::Suspended);
    }

    #[test]
    fn resume_and_suspend_are_idempotent() {
        let mut tracker = SessionTracker::new();
        assert!(tracker.resume(100.0));
        assert!(!tracker.resume(101.0));
        assert_eq!(tracker.last_tracked_at(), 100.0);

        assert_eq!(tracker.suspend(103.5), Some(3));
        assert_eq!(tracker.suspend(104.0), None);
    }

    #[test]
    fn fractions_accumulate() {
        let mut tracker = SessionTracker::new();
        tracker.resume(0.0);

        assert_eq!(tracker.extract_duration(0.6), 0);
        assert_eq!(tracker.extract_duration(1.2), 1);
        assert!((tracker.unsent_fraction() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn clock_going_backward_is_ignored() {
        let mut tracker = SessionTracker::new();
        tracker.resume(50.0);

        assert_eq!(tracker.extract_duration(40.0), 0);
        assert_eq!(tracker.last_tracked_at(), 50.0);
        assert_eq!(tracker.extract_duration(52.0), 2);
    }

    #[test]
    fn total_duration_is_conserved() {
        let mut tracker = SessionTracker::new();
        let start = 1_000.0;
        tracker.resume(start);

        let steps = [0.3, 1.7, 0.05, 2.95, 0.999, 10.001, 0.4, 0.6];
        let mut now = start;
        let mut reported = 0u64;
        for step in steps {
            now += step;
            reported += tracker.extract_duration(now);
        }

        let elapsed = now - start;
        let accounted = reported as f64 + tracker.unsent_fraction();
        assert!((accounted - elapsed).abs() < 1e-6);
        assert!(tracker.unsent_fraction() >= 0.0 && tracker.unsent_fraction() < 1.0);
    }

    #[test]
    fn resume_resets_fraction() {
        let mut tracker = SessionTracker::new();
        tracker.resume(0.0);
        tracker.suspend(0.7);
        assert!(tracker.unsent_fraction() > 0.0);

        tracker.resume(10.0);
        assert_eq!(tracker.unsent_fraction(), 0.0);
        assert_eq!(tracker.extract_duration(11.0), 1);
    }
}
