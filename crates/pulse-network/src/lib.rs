//! # pulse-network
//!
//! HTTP 전송 어댑터.
//! 큐에서 꺼낸 요청을 수집 서버 `/i` 엔드포인트로 전송하고
//! 응답 상태 코드를 `CoreError`로 매핑한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use pulse_network::http_transport::HttpTransport;
//! use std::time::Duration;
//!
//! let transport = HttpTransport::new(Duration::from_secs(30))?;
//! ```

pub mod http_transport;
