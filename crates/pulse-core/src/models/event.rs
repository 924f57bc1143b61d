//! 이벤트 모델.
//!
//! 분석 이벤트 하나(키, 횟수, 선택적 합계, 선택적 세그먼트)와
//! 배치 전송용 JSON 직렬화를 정의한다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CoreError;

/// 세그먼트 (문자열 → 문자열, 키 순서 정렬)
pub type Segmentation = BTreeMap<String, String>;

/// 분석 이벤트 (생성 후 불변)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    key: String,
    count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    segmentation: Option<Segmentation>,
}

impl Event {
    /// 새 이벤트 생성 (빈 키는 거부)
    pub fn new(key: impl Into<String>, count: u64) -> Result<Self, CoreError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CoreError::validation("key", "이벤트 키가 비어 있습니다"));
        }

        Ok(Self {
            key,
            count,
            sum: None,
            segmentation: None,
        })
    }

    /// 합계 지정
    pub fn with_sum(mut self, sum: f64) -> Self {
        self.sum = Some(sum);
        self
    }

    /// 세그먼트 지정
    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = Some(segmentation);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> Option<f64> {
        self.sum
    }

    pub fn segmentation(&self) -> Option<&Segmentation> {
        self.segmentation.as_ref()
    }
}

/// 이벤트 목록을 JSON 배열로 직렬화 (삽입 순서 유지)
pub fn serialize_events(events: &[Event]) -> Result<String, CoreError> {
    Ok(serde_json::to_string(events)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_rejected() {
        let result = Event::new("", 1);
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn optional_fields_omitted() {
        let event = Event::new("purchase", 2).unwrap();
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"key":"purchase","count":2}"#);
    }

    #[test]
    fn all_fields_serialized() {
        let mut seg = Segmentation::new();
        seg.insert("purchase_id".to_string(), "product01".to_string());
        let event = Event::new("purchase", 1)
            .unwrap()
            .with_sum(100.0)
            .with_segmentation(seg);

        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["key"], "purchase");
        assert_eq!(value["count"], 1);
        assert_eq!(value["sum"], 100.0);
        assert_eq!(value["segmentation"]["purchase_id"], "product01");
    }

    #[test]
    fn batch_preserves_insertion_order() {
        let events: Vec<Event> = ["c", "a", "b"]
            .iter()
            .map(|k| Event::new(*k, 1).unwrap())
            .collect();

        let json = serialize_events(&events).unwrap();
        let parsed: Vec<Event> = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = parsed.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn unicode_and_escapes_roundtrip() {
        let mut seg = Segmentation::new();
        seg.insert(
            "demo3".to_string(),
            "Handles UTF8-テスト JSON\"\nstrings".to_string(),
        );
        let event = Event::new("UTF8こんにちは World", 1)
            .unwrap()
            .with_sum(10.25)
            .with_segmentation(seg.clone());

        let json = serialize_events(std::slice::from_ref(&event)).unwrap();
        let parsed: Vec<Event> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].key(), "UTF8こんにちは World");
        assert_eq!(parsed[0].count(), 1);
        assert_eq!(parsed[0].sum(), Some(10.25));
        assert_eq!(parsed[0].segmentation(), Some(&seg));
    }
}
