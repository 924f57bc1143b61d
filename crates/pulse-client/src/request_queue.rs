//! 요청 큐.
//!
//! 크기가 제한된 FIFO. 꼬리에만 추가하고 머리에서만 제거한다.
//! 가득 차면 가장 오래된 요청을 밀어낸다.
//! 영속 저장소가 연결되어 있으면 모든 추가/제거/밀어내기를 그대로 반영하고,
//! 생성 시 저장소 내용으로 큐를 복원한다.
//!
//! 각 항목에는 단조 증가 순번이 붙는다. 전송 루프는 `peek`으로 받은 순번으로
//! `commit`하므로, 전송 중에 머리가 밀려나도 다른 요청을 지우지 않는다.

use parking_lot::Mutex;
use pulse_core::models::request::QueuedRequest;
use pulse_core::ports::storage::QueueStorage;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct QueueInner {
    entries: VecDeque<(u64, QueuedRequest)>,
    next_seq: u64,
    /// 저장소 실패 후에는 None (메모리 전용으로 전환)
    storage: Option<Arc<dyn QueueStorage>>,
}

impl QueueInner {
    fn push(&mut self, request: QueuedRequest) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back((seq, request));
    }

    /// 저장소 작업 실행. 실패하면 메모리 전용으로 전환.
    ///
    /// 전환 시 저장소를 비운다. 남은 행은 메모리 큐와 어긋나므로
    /// 재시작 후 이미 보낸 요청이 다시 전송된다.
    fn mirror<F>(&mut self, op: &str, f: F)
    where
        F: FnOnce(&dyn QueueStorage) -> Result<(), pulse_core::error::CoreError>,
    {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };

        if let Err(e) = f(storage.as_ref()) {
            warn!("요청 큐 저장소 {op} 실패, 메모리 전용으로 전환: {e}");
            if let Err(e) = storage.clear() {
                warn!("요청 큐 저장소 비우기 실패: {e}");
            }
            self.storage = None;
        }
    }
}

/// 크기 제한 요청 큐
pub struct RequestQueue {
    inner: Mutex<QueueInner>,
    limit: usize,
}

impl RequestQueue {
    /// 메모리 전용 큐 생성
    pub fn new(limit: usize, capacity_hint: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                entries: VecDeque::with_capacity(capacity_hint.min(limit)),
                next_seq: 0,
                storage: None,
            }),
            limit: limit.max(1),
        }
    }

    /// 영속 저장소 기반 큐 생성 (저장된 요청 복원)
    ///
    /// 저장된 요청이 `limit`보다 많으면 오래된 것부터 버린다.
    /// 저장소를 읽지 못하면 메모리 전용 큐가 된다.
    pub fn with_storage(
        limit: usize,
        capacity_hint: usize,
        storage: Arc<dyn QueueStorage>,
    ) -> Self {
        let queue = Self::new(limit, capacity_hint);

        let stored = match storage.load_all() {
            Ok(stored) => stored,
            Err(e) => {
                warn!("저장된 요청 로드 실패, 메모리 전용으로 동작: {e}");
                return queue;
            }
        };

        {
            let mut inner = queue.inner.lock();
            inner.storage = Some(storage);

            let excess = stored.len().saturating_sub(queue.limit);
            for _ in 0..excess {
                inner.mirror("초과분 삭제", |s| s.pop_front());
            }
            if excess > 0 {
                warn!("저장된 요청 {excess}개가 큐 한도를 넘어 삭제됨");
            }

            for payload in stored.into_iter().skip(excess) {
                inner.push(QueuedRequest::from_encoded(payload));
            }

            if !inner.entries.is_empty() {
                info!("저장된 요청 {}개 복원", inner.entries.len());
            }
        }

        queue
    }

    /// 꼬리에 추가. 한도를 넘으면 가장 오래된 요청을 밀어낸다.
    ///
    /// 밀려난 요청이 있으면 true.
    pub fn enqueue(&self, request: QueuedRequest) -> bool {
        let mut inner = self.inner.lock();

        let mut evicted = false;
        while inner.entries.len() >= self.limit {
            if let Some((seq, _)) = inner.entries.pop_front() {
                inner.mirror("밀어내기", |s| s.pop_front());
                warn!("요청 큐 가득 참 (한도 {}), 가장 오래된 요청 #{seq} 폐기", self.limit);
                evicted = true;
            }
        }

        inner.mirror("추가", |s| s.push_back(request.as_str()));
        inner.push(request);
        debug!("요청 큐 추가, 현재 크기: {}", inner.entries.len());
        evicted
    }

    /// 머리 요청 조회 (제거하지 않음)
    pub fn peek(&self) -> Option<(u64, QueuedRequest)> {
        self.inner.lock().entries.front().cloned()
    }

    /// 머리의 순번이 `seq`이면 제거. 이미 밀려났으면 false.
    pub fn commit(&self, seq: u64) -> bool {
        let mut inner = self.inner.lock();

        let is_head = inner.entries.front().is_some_and(|(head, _)| *head == seq);
        if !is_head {
            return false;
        }

        inner.entries.pop_front();
        inner.mirror("삭제", |s| s.pop_front());
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// 영속 저장소가 연결되어 있는지
    pub fn is_persistent(&self) -> bool {
        self.inner.lock().storage.is_some()
    }
}
