//! 주기 드라이버.
//!
//! 고정 간격으로 콜백을 호출하는 타이머 태스크.
//! 콜백은 동기 함수이며 전송은 전송 루프에 위임하므로
//! 느린 전송이 다음 틱을 늦추지 않는다.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// 주기 드라이버 시작
///
/// 첫 틱은 `period` 후에 발생한다. `shutdown_rx`가 바뀌면 종료한다.
pub fn spawn<F>(
    runtime: &Handle,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    on_tick: F,
) -> JoinHandle<()>
where
    F: Fn() + Send + 'static,
{
    runtime.spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("주기 드라이버 시작 (간격 {}ms)", period.as_millis());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    debug!("주기 틱");
                    on_tick();
                }
                _ = shutdown_rx.changed() => {
                    info!("주기 드라이버 종료");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn ticks_at_fixed_interval() {
        let (tx, rx) = watch::channel(false);
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let task = spawn(&Handle::current(), Duration::from_secs(60), rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(151)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let (tx, rx) = watch::channel(false);
        let task = spawn(&Handle::current(), Duration::from_secs(3600), rx, || {});

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
