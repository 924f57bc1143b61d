//! 이벤트 배치 버퍼.
//!
//! 플러시 전까지 이벤트를 삽입 순서대로 모은다. 크기 제한은 없다.

use pulse_core::models::event::Event;

/// 이벤트 배치 버퍼
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Vec<Event>,
}

impl EventBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// 꼬리에 추가
    pub fn add(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 버퍼 크기가 1 이상이고 `threshold` 이상이면 전체를 꺼내 반환
    ///
    /// `threshold == 0`이면 비어 있지 않을 때 항상 꺼낸다.
    pub fn flush_if_threshold_met(&mut self, threshold: usize) -> Option<Vec<Event>> {
        if self.events.is_empty() || self.events.len() < threshold {
            return None;
        }

        Some(std::mem::take(&mut self.events))
    }
}
