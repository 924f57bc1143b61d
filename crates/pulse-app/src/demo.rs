//! 데모 이벤트.
//!
//! 일반 구매 이벤트와 UTF-8/특수문자 이벤트를 만든다.

use pulse_core::error::CoreError;
use pulse_core::models::event::{Event, Segmentation};

/// 구매 이벤트 (count 1, sum 100)
pub fn purchase_event() -> Result<Event, CoreError> {
    let segmentation = Segmentation::from([("purchase_id".to_string(), "product01".to_string())]);
    Ok(Event::new("purchase", 1)?
        .with_sum(100.0)
        .with_segmentation(segmentation))
}

/// 이스케이프가 필요한 키/값을 담은 이벤트
pub fn crazy_event() -> Result<Event, CoreError> {
    let segmentation = Segmentation::from([
        ("demo1".to_string(), "someText".to_string()),
        (
            "demo2".to_string(),
            "UTF8-こんにちは-Привет-مرحبا".to_string(),
        ),
        (
            "demo3".to_string(),
            "Handles UTF8-テスト JSON\"\nstrings".to_string(),
        ),
        (
            "demo4".to_string(),
            "Special Chars: \\ / \t & = ? %".to_string(),
        ),
    ]);

    Ok(Event::new("UTF8こんにちは World", 1)?
        .with_sum(10.25)
        .with_segmentation(segmentation))
}
