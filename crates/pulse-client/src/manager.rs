//! 호출자용 매니저 API.
//!
//! 이벤트 기록, 세션 라이프사이클 훅, 주기 하트비트를 하나로 묶는다.
//! 호스트 앱에는 에러를 전파하지 않는다. 전송/저장소 실패는 로그만 남긴다.
//!
//! 상태(버퍼, 세션, 앱 키)는 하나의 잠금 아래에 있고
//! 네트워크 대기 중에는 잠금을 잡지 않는다.
//!
//! 일시정지는 end_session 전송까지 끝나야 완료된다. 그 사이의 재개 요청은
//! 보류했다가 일시정지가 끝난 뒤 처리하므로 이전 세션의 end_session이
//! 다음 begin_session보다 늦게 도착하지 않는다.

use parking_lot::Mutex;
use pulse_core::config::ManagerConfig;
use pulse_core::error::CoreError;
use pulse_core::models::event::{serialize_events, Event, Segmentation};
use pulse_core::models::request::{OutboundRequest, RequestBuilder};
use pulse_core::models::session::SessionTracker;
use pulse_core::ports::clock::Clock;
use pulse_core::ports::device::DeviceInfoProvider;
use pulse_core::ports::storage::QueueStorage;
use pulse_core::ports::transport::Transport;
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::delivery::{DeliveryHandle, DeliveryLoop, DeliveryReport};
use crate::driver;
use crate::event_buffer::EventBuffer;
use crate::request_queue::RequestQueue;

/// 매니저가 사용하는 외부 협력자
pub struct ManagerDeps {
    pub transport: Arc<dyn Transport>,
    pub device: Arc<dyn DeviceInfoProvider>,
    pub clock: Arc<dyn Clock>,
    /// `queue_uses_persistent_storage`일 때 요청 큐 백엔드
    pub storage: Option<Arc<dyn QueueStorage>>,
}

/// 매니저 상태 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManagerStats {
    pub queued_requests: usize,
    pub buffered_events: usize,
    pub session_active: bool,
    pub running: bool,
    pub storage_backed: bool,
}

struct EngineState {
    app_key: String,
    running: bool,
    buffer: EventBuffer,
    session: SessionTracker,
    /// end_session 전송 전까지 true
    suspending: bool,
    /// 일시정지 중 들어온 재개 요청
    resume_pending: bool,
}

struct Engine {
    config: ManagerConfig,
    endpoint: String,
    state: Mutex<EngineState>,
    queue: Arc<RequestQueue>,
    delivery: DeliveryHandle,
    transport: Arc<dyn Transport>,
    device: Arc<dyn DeviceInfoProvider>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    fn request(&self, app_key: &str) -> RequestBuilder {
        RequestBuilder::new(app_key, &self.device.device_id(), self.clock.unix_timestamp())
    }

    /// 버퍼가 임계값을 넘으면 events 요청 하나로 큐에 추가
    fn flush_events(&self, state: &mut EngineState, threshold: usize) -> bool {
        let Some(events) = state.buffer.flush_if_threshold_met(threshold) else {
            return false;
        };

        let json = match serialize_events(&events) {
            Ok(json) => json,
            Err(e) => {
                warn!("이벤트 {}개 직렬화 실패, 폐기: {e}", events.len());
                return false;
            }
        };

        if self.config.allow_debug_log {
            debug!("이벤트 {}개 배치 플러시: {json}", events.len());
        }
        self.queue.enqueue(self.request(&state.app_key).events(&json));
        true
    }

    fn record_event(&self, event: Event) {
        let was_empty = self.queue.is_empty();

        let flushed = {
            let mut state = self.state.lock();
            state.buffer.add(event);
            state.running && self.flush_events(&mut state, self.config.event_send_threshold)
        };

        if flushed && was_empty {
            self.delivery.kick();
        }
    }

    fn resume(&self) {
        {
            let mut state = self.state.lock();
            if !state.running {
                return;
            }
            if state.suspending {
                debug!("일시정지 완료 후 재개");
                state.resume_pending = true;
                return;
            }
            if !state.session.resume(self.clock.now_secs()) {
                return;
            }

            self.device.refresh();
            let metrics = serde_json::to_string(&self.device.metrics()).unwrap_or_else(|e| {
                warn!("디바이스 메트릭 직렬화 실패: {e}");
                "{}".to_string()
            });

            info!("세션 재개");
            self.queue
                .enqueue(self.request(&state.app_key).begin_session(&metrics));
        }

        self.delivery.kick();
    }

    /// 주기 하트비트. 세션이 일시정지 상태여도 전송 루프는 깨운다.
    fn tick(&self) {
        {
            let mut state = self.state.lock();
            if !state.running {
                return;
            }

            if state.session.is_active() {
                self.device.refresh();
                self.flush_events(&mut state, 0);

                let duration = state.session.extract_duration(self.clock.now_secs());
                if self.config.allow_debug_log {
                    debug!("세션 하트비트: {duration}초");
                }
                self.queue
                    .enqueue(self.request(&state.app_key).session_duration(duration));
            }
        }

        self.delivery.kick();
    }

    /// 세션 일시정지
    ///
    /// 남은 이벤트를 큐에 넣고 큐를 비운 뒤(`shutdown_timeout` 한도)
    /// end_session을 큐를 거치지 않고 직접 보낸다.
    /// 끝난 뒤 보류된 재개 요청이 있으면 새 세션을 시작한다.
    async fn suspend(&self) {
        let end_request = {
            let mut state = self.state.lock();
            if state.suspending {
                state.resume_pending = false;
                return;
            }
            if !state.running || !state.session.is_active() {
                return;
            }

            self.device.refresh();
            self.flush_events(&mut state, 0);

            let Some(duration) = state.session.suspend(self.clock.now_secs()) else {
                return;
            };
            info!("세션 일시정지 ({duration}초)");
            state.suspending = true;
            self.request(&state.app_key).end_session(duration)
        };
        let _suspending = SuspendGuard(self);

        match tokio::time::timeout(self.config.shutdown_timeout(), self.delivery.drain()).await {
            Ok(Some(report)) if report.remaining > 0 => {
                warn!("대기 요청 {}개 전송 못함, 다음 실행에서 재시도", report.remaining);
            }
            Ok(Some(_)) => {}
            Ok(None) => warn!("전송 루프가 종료되어 대기 요청을 보내지 못함"),
            Err(_) => warn!(
                "대기 요청 전송 시간 초과 ({}ms)",
                self.config.shutdown_timeout_ms
            ),
        }

        let outbound = OutboundRequest::new(
            &self.endpoint,
            &end_request,
            self.config.post_threshold_bytes,
        );
        if self.config.allow_debug_log {
            debug!("세션 종료 요청: {}", outbound.url());
        }
        if let Err(e) = self.transport.send(&outbound).await {
            warn!("세션 종료 요청 실패: {e}");
        }
    }
}

/// 일시정지 구간 종료 표시. 중간에 취소되어도 보류된 재개를 처리한다.
struct SuspendGuard<'a>(&'a Engine);

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        let resume = {
            let mut state = self.0.state.lock();
            state.suspending = false;
            std::mem::take(&mut state.resume_pending)
        };
        if resume {
            self.0.resume();
        }
    }
}

/// 텔레메트리 매니저
///
/// tokio 런타임 안에서 생성해야 한다. 런타임이 없으면 `CoreError::Internal`.
/// 전송 루프와 주기 드라이버는 생성 시점의 런타임에서 돈다.
pub struct Manager {
    engine: Arc<Engine>,
    runtime: Handle,
    shutdown_tx: watch::Sender<bool>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Manager {
    pub fn new(config: ManagerConfig, deps: ManagerDeps) -> Result<Self, CoreError> {
        config.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| CoreError::Internal(format!("tokio 런타임 밖에서 매니저 생성: {e}")))?;

        let queue = match (config.queue_uses_persistent_storage, deps.storage) {
            (true, Some(storage)) => {
                RequestQueue::with_storage(config.queue_limit, config.queue_capacity_hint, storage)
            }
            (true, None) => {
                warn!("요청 큐 저장소가 없어 메모리 전용으로 동작");
                RequestQueue::new(config.queue_limit, config.queue_capacity_hint)
            }
            (false, _) => RequestQueue::new(config.queue_limit, config.queue_capacity_hint),
        };
        let queue = Arc::new(queue);

        let endpoint = config.endpoint();
        let delivery = DeliveryLoop::new(
            queue.clone(),
            deps.transport.clone(),
            endpoint.clone(),
            config.post_threshold_bytes,
        )
        .with_verbose(config.allow_debug_log)
        .spawn(&runtime);

        let state = EngineState {
            app_key: config.app_key.clone(),
            running: false,
            buffer: EventBuffer::with_capacity(config.event_send_threshold.max(1)),
            session: SessionTracker::new(),
            suspending: false,
            resume_pending: false,
        };

        info!(
            "매니저 생성: endpoint={endpoint}, queue_limit={}, persistent={}",
            config.queue_limit,
            queue.is_persistent()
        );

        Ok(Self {
            engine: Arc::new(Engine {
                config,
                endpoint,
                state: Mutex::new(state),
                queue,
                delivery,
                transport: deps.transport,
                device: deps.device,
                clock: deps.clock,
            }),
            runtime,
            shutdown_tx: watch::channel(false).0,
            driver: Mutex::new(None),
        })
    }

    /// 초기화: 세션 시작 + 주기 드라이버 기동
    ///
    /// `app_key`가 None이면 설정의 키를 쓴다. 키가 비어 있으면 false.
    /// 이미 실행 중이면 키만 교체한다.
    pub fn init(&self, app_key: Option<&str>) -> bool {
        if *self.shutdown_tx.borrow() {
            warn!("종료된 매니저는 다시 초기화할 수 없음");
            return false;
        }

        {
            let mut state = self.engine.state.lock();
            match app_key {
                Some("") => {
                    warn!("빈 앱 키로 초기화 거부");
                    return false;
                }
                Some(key) => state.app_key = key.to_string(),
                None => {}
            }

            if state.app_key.is_empty() {
                warn!("앱 키가 없어 초기화 건너뜀");
                return false;
            }
            if state.running {
                return true;
            }

            info!("초기화: {}", state.app_key);
            state.running = true;
        }

        self.engine.resume();

        // 초기화 전에 기록된 이벤트
        let flushed = {
            let mut state = self.engine.state.lock();
            self.engine
                .flush_events(&mut state, self.engine.config.event_send_threshold)
        };
        if flushed {
            self.engine.delivery.kick();
        }

        if let Some(period) = self.engine.config.update_interval() {
            let engine = self.engine.clone();
            let handle = driver::spawn(
                &self.runtime,
                period,
                self.shutdown_tx.subscribe(),
                move || engine.tick(),
            );
            *self.driver.lock() = Some(handle);
        }

        true
    }

    /// 이벤트 기록. 임계값에 도달하면 배치를 큐에 넣는다.
    pub fn record_event(&self, event: Event) {
        self.engine.record_event(event);
    }

    pub fn emit(&self, key: &str, count: u64) -> Result<(), CoreError> {
        self.record_event(Event::new(key, count)?);
        Ok(())
    }

    pub fn emit_with_sum(&self, key: &str, count: u64, sum: f64) -> Result<(), CoreError> {
        self.record_event(Event::new(key, count)?.with_sum(sum));
        Ok(())
    }

    pub fn emit_with_segmentation(
        &self,
        key: &str,
        count: u64,
        segmentation: Segmentation,
    ) -> Result<(), CoreError> {
        self.record_event(Event::new(key, count)?.with_segmentation(segmentation));
        Ok(())
    }

    pub fn emit_full(
        &self,
        key: &str,
        count: u64,
        sum: f64,
        segmentation: Segmentation,
    ) -> Result<(), CoreError> {
        self.record_event(
            Event::new(key, count)?
                .with_sum(sum)
                .with_segmentation(segmentation),
        );
        Ok(())
    }

    /// 포그라운드 진입 → 세션 재개
    pub fn on_foreground(&self) {
        self.engine.resume();
    }

    /// 백그라운드 진입 → 세션 일시정지
    pub async fn on_background(&self) {
        self.engine.suspend().await;
    }

    /// 프로세스 종료 → 세션 일시정지 후 백그라운드 태스크 정리
    pub async fn on_terminate(&self) {
        self.engine.suspend().await;
        self.shutdown().await;
    }

    /// 주기 업데이트 1회 (자체 루프를 가진 호스트용)
    pub fn tick(&self) {
        self.engine.tick();
    }

    /// 큐를 한 번 드레인하고 결과 반환
    pub async fn deliver_pending(&self) -> DeliveryReport {
        match self.engine.delivery.drain().await {
            Some(report) => report,
            None => DeliveryReport {
                remaining: self.engine.queue.len(),
                stalled: true,
                ..DeliveryReport::default()
            },
        }
    }

    pub fn stats(&self) -> ManagerStats {
        let state = self.engine.state.lock();
        ManagerStats {
            queued_requests: self.engine.queue.len(),
            buffered_events: state.buffer.len(),
            session_active: state.session.is_active(),
            running: state.running,
            storage_backed: self.engine.queue.is_persistent(),
        }
    }

    /// 주기 드라이버와 전송 루프 종료. 큐에 남은 요청은 저장소에 남는다.
    pub async fn shutdown(&self) {
        self.engine.state.lock().running = false;
        self.shutdown_tx.send_replace(true);

        let driver = self.driver.lock().take();
        if let Some(task) = driver {
            if let Err(e) = task.await {
                warn!("주기 드라이버 종료 실패: {e}");
            }
        }

        self.engine.delivery.shutdown().await;
        info!("매니저 종료 (남은 요청 {}개)", self.engine.queue.len());
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}
