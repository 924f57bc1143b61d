//! Pulse 데모 클라이언트.
//!
//! 실제 어댑터(SQLite 큐, reqwest 전송, sysinfo 디바이스 정보)를 조립하고
//! 데모 이벤트를 기록한 뒤 SIGINT/SIGTERM까지 세션을 유지한다.

mod demo;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use pulse_client::{Manager, ManagerDeps};
use pulse_core::config::ManagerConfig;
use pulse_core::ports::clock::SystemClock;
use pulse_monitor::device_info::SysInfoDeviceProvider;
use pulse_network::http_transport::HttpTransport;
use pulse_storage::sqlite::SqliteQueueStorage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pulse 텔레메트리 데모 클라이언트
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 수집 서버 URL (기본: https://cloud.count.ly)
    #[arg(long, short = 's')]
    host: Option<String>,

    /// 앱 키 (설정 파일 값보다 우선)
    #[arg(long, short = 'k')]
    app_key: Option<String>,

    /// JSON 설정 파일 경로
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 현재 설정을 파일로 저장하고 종료
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// 데이터 저장 경로 (요청 큐 DB)
    #[arg(long)]
    data_dir: Option<String>,

    /// 세션 갱신 주기 (초, 0이면 비활성화)
    #[arg(long)]
    update_interval: Option<f64>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 요청 단위 디버그 로그
    #[arg(long, short = 'd')]
    debug: bool,
}

/// 요청 큐 DB 경로 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// - macOS: `~/Library/Application Support/io.pulse.client/queue.db`
/// - Windows: `%APPDATA%\pulse\client\data\queue.db`
/// - Linux: `~/.local/share/client/queue.db`
fn resolve_db_path(data_dir: Option<&str>) -> PathBuf {
    data_dir
        .map(|d| PathBuf::from(d).join("queue.db"))
        .or_else(|| ProjectDirs::from("io", "pulse", "client").map(|p| p.data_dir().join("queue.db")))
        .unwrap_or_else(|| PathBuf::from("./queue.db"))
}

fn load_config(args: &Args) -> Result<ManagerConfig> {
    let mut config = match &args.config {
        Some(path) => ManagerConfig::load_from_file(path)
            .map_err(|e| anyhow!("설정 로드 실패: {e}"))?,
        None => ManagerConfig::default_config(),
    };

    if let Some(ref host) = args.host {
        config.app_host = host.clone();
    }
    if let Some(interval) = args.update_interval {
        config.update_interval_secs = interval;
    }
    if args.debug {
        config.allow_debug_log = true;
    }
    if config.storage_path.is_none() {
        config.storage_path = Some(resolve_db_path(args.data_dir.as_deref()));
    }

    config.validate()?;
    Ok(config)
}

/// SIGINT/SIGTERM (Windows: Ctrl+C) 대기
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).context("SIGINT 핸들러 등록 실패")?;
        let mut sigterm = signal(SignalKind::terminate()).context("SIGTERM 핸들러 등록 실패")?;

        tokio::select! {
            _ = sigint.recv() => info!("SIGINT 수신"),
            _ = sigterm.recv() => info!("SIGTERM 수신"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Ctrl+C 핸들러 등록 실패")?;
        info!("Ctrl+C 수신");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let level = if config.allow_debug_log {
        "debug"
    } else {
        args.log_level.as_str()
    };
    let log_filter = format!(
        "pulse={level},pulse_app={level},pulse_client={level},pulse_core={level},pulse_storage={level},pulse_network={level},pulse_monitor={level}"
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    if let Some(ref path) = args.save_config {
        config.save_to_file(path)?;
        info!("설정 저장: {}", path.display());
        return Ok(());
    }

    info!("Pulse 클라이언트 시작");

    let db_path = config
        .storage_path
        .clone()
        .unwrap_or_else(|| resolve_db_path(args.data_dir.as_deref()));
    let storage = Arc::new(SqliteQueueStorage::open(&db_path)?);
    let device_id = storage.device_id_or_create()?;
    info!("디바이스 ID: {device_id}");

    let device = Arc::new(SysInfoDeviceProvider::new(
        device_id,
        config.app_version.clone(),
    ));
    let transport = Arc::new(HttpTransport::new(config.request_timeout())?);

    let manager = Manager::new(
        config,
        ManagerDeps {
            transport,
            device,
            clock: Arc::new(SystemClock),
            storage: Some(storage),
        },
    )?;

    if !manager.init(args.app_key.as_deref()) {
        bail!("앱 키가 필요합니다 (--app-key 또는 설정 파일의 app_key)");
    }

    manager.record_event(demo::purchase_event()?);
    manager.record_event(demo::crazy_event()?);
    info!("데모 이벤트 2개 기록, 종료 신호 대기 중 (Ctrl+C)");

    wait_for_signal().await?;

    manager.on_terminate().await;
    let stats = manager.stats();
    info!(
        "종료: 남은 요청 {}개 (저장소 보존: {})",
        stats.queued_requests, stats.storage_backed
    );

    Ok(())
}
