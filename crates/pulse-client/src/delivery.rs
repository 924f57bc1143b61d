//! 전송 루프.
//!
//! 요청 큐를 머리부터 하나씩 전송하는 단일 워커.
//! 성공하면 머리를 커밋하고 다음으로 넘어간다.
//! 실패하면 머리를 그대로 두고 멈춘 뒤 다음 트리거를 기다린다.
//! 같은 머리가 연속 5번 실패하면 폐기하고 다음 요청으로 진행한다.
//!
//! 워커는 tokio 태스크 하나이며 명령 채널로만 구동된다.
//! 채널 소비자가 하나뿐이므로 동시에 두 번 전송하는 일은 없다.

use pulse_core::models::request::OutboundRequest;
use pulse_core::ports::transport::Transport;
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::request_queue::RequestQueue;

/// 한 요청에 대한 최대 연속 실패 횟수 (도달 시 폐기)
pub const MAX_ATTEMPTS: u32 = 5;

/// 한 번의 드레인 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// 전송 성공 후 커밋된 요청 수
    pub delivered: usize,
    /// 재시도 소진으로 폐기된 요청 수
    pub dropped: usize,
    /// 드레인 종료 시 큐에 남은 요청 수
    pub remaining: usize,
    /// 전송 실패로 멈췄는지
    pub stalled: bool,
}

/// 워커 명령
#[derive(Debug)]
pub enum DeliveryCommand {
    /// 큐가 비어 있지 않으면 드레인 시작
    Kick,
    /// 드레인 후 결과 회신
    Drain(oneshot::Sender<DeliveryReport>),
    /// 워커 종료
    Shutdown,
}

/// 전송 루프 상태
pub struct DeliveryLoop {
    queue: Arc<RequestQueue>,
    transport: Arc<dyn Transport>,
    endpoint: String,
    post_threshold_bytes: usize,
    verbose: bool,
    /// (머리 순번, 연속 실패 횟수). 트리거 사이에도 유지된다.
    failures: Option<(u64, u32)>,
}

impl DeliveryLoop {
    pub fn new(
        queue: Arc<RequestQueue>,
        transport: Arc<dyn Transport>,
        endpoint: String,
        post_threshold_bytes: usize,
    ) -> Self {
        Self {
            queue,
            transport,
            endpoint,
            post_threshold_bytes,
            verbose: false,
            failures: None,
        }
    }

    /// 요청 단위 디버그 로그 활성화
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// 현재 머리의 연속 실패 횟수
    pub fn consecutive_failures(&self) -> u32 {
        match (self.failures, self.queue.peek()) {
            (Some((seq, count)), Some((head, _))) if seq == head => count,
            _ => 0,
        }
    }

    /// 큐가 비거나 전송이 실패할 때까지 머리부터 전송
    pub async fn drain(&mut self) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        while let Some((seq, request)) = self.queue.peek() {
            let outbound = OutboundRequest::new(&self.endpoint, &request, self.post_threshold_bytes);
            if self.verbose {
                debug!("요청 시작 #{seq}: {}", outbound.url());
            }

            match self.transport.send(&outbound).await {
                Ok(()) => {
                    if self.verbose {
                        debug!("요청 성공 #{seq}");
                    }
                    self.queue.commit(seq);
                    self.failures = None;
                    report.delivered += 1;
                }
                Err(e) => {
                    let attempts = match self.failures {
                        Some((failed_seq, count)) if failed_seq == seq => count + 1,
                        _ => 1,
                    };

                    if attempts >= MAX_ATTEMPTS {
                        warn!("요청 #{seq} {attempts}회 연속 실패, 폐기: {e}");
                        self.queue.commit(seq);
                        self.failures = None;
                        report.dropped += 1;
                        continue;
                    }

                    warn!("요청 #{seq} 전송 실패 ({attempts}/{MAX_ATTEMPTS}), 다음 트리거까지 대기: {e}");
                    self.failures = Some((seq, attempts));
                    report.stalled = true;
                    break;
                }
            }
        }

        report.remaining = self.queue.len();
        report
    }

    /// 명령 채널 처리 루프
    ///
    /// 드레인 중 쌓인 `Kick`은 하나로 합친다. 실패로 멈춘 직후
    /// 곧바로 다시 시도하지 않기 위함이다.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<DeliveryCommand>) {
        let mut next = rx.recv().await;

        while let Some(command) = next {
            match command {
                DeliveryCommand::Kick => {
                    self.drain().await;
                }
                DeliveryCommand::Drain(reply) => {
                    let report = self.drain().await;
                    let _ = reply.send(report);
                }
                DeliveryCommand::Shutdown => break,
            }

            next = match skip_pending_kicks(&mut rx) {
                Some(command) => Some(command),
                None => rx.recv().await,
            };
        }

        info!("전송 루프 종료");
    }

    /// 주어진 런타임에 워커 태스크 시작
    pub fn spawn(self, runtime: &Handle) -> DeliveryHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(self.run(rx));
        DeliveryHandle {
            tx,
            task: parking_lot::Mutex::new(Some(task)),
        }
    }
}

/// 대기 중인 `Kick`을 버리고 첫 번째 다른 명령을 반환
fn skip_pending_kicks(rx: &mut mpsc::UnboundedReceiver<DeliveryCommand>) -> Option<DeliveryCommand> {
    while let Ok(command) = rx.try_recv() {
        if !matches!(command, DeliveryCommand::Kick) {
            return Some(command);
        }
    }
    None
}

/// 워커 태스크 핸들
pub struct DeliveryHandle {
    tx: mpsc::UnboundedSender<DeliveryCommand>,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryHandle {
    /// 전송 트리거 (워커가 바쁘면 합쳐진다)
    pub fn kick(&self) {
        let _ = self.tx.send(DeliveryCommand::Kick);
    }

    /// 드레인 요청 후 결과 대기. 워커가 종료되었으면 None.
    pub async fn drain(&self) -> Option<DeliveryReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(DeliveryCommand::Drain(reply_tx)).ok()?;
        reply_rx.await.ok()
    }

    /// 워커 종료 후 태스크 완료 대기
    pub async fn shutdown(&self) {
        let _ = self.tx.send(DeliveryCommand::Shutdown);
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("전송 루프 태스크 종료 실패: {e}");
            }
        }
    }
}
