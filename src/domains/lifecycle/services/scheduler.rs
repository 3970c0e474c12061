use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::domains::lifecycle::models::SweepKind;
use crate::domains::lifecycle::services::LifecycleSweeps;

/// 기본 실행 주기 (90분)
/// Default tick period (90 minutes)
pub const DEFAULT_TIMER_EVENT_FREQUENCY: Duration = Duration::from_secs(90 * 60);

/// 계정 생명주기 스케줄러
/// Account Lifecycle Scheduler
///
/// 역할:
/// - 주기마다 네 가지 sweep 을 각각 독립 태스크로 실행
/// - 같은 종류의 sweep 이 아직 실행 중이면 이번 주기는 건너뜀
/// - 종료 신호 수신 시 다음 주기 전에 멈춤
///
/// 처리 흐름:
/// 1. 첫 실행은 한 주기 후
/// 2. 매 주기: 종료 신호 확인 → 종류별 슬롯 확인 → 빈 슬롯에 sweep 실행
/// 3. 종료 시 실행 중인 sweep 은 끝까지 진행
pub struct LifecycleScheduler {
    sweeps: Arc<LifecycleSweeps>,
    instance_ids: Arc<Vec<String>>,
    period: Duration,
    /// 종류별 실행 중 태스크
    /// In-flight task per sweep kind
    in_flight: HashMap<SweepKind, JoinHandle<()>>,
}

impl LifecycleScheduler {
    /// 새 스케줄러 생성
    /// Create new scheduler
    pub fn new(sweeps: LifecycleSweeps, instance_ids: Vec<String>, period: Duration) -> Self {
        Self {
            sweeps: Arc::new(sweeps),
            instance_ids: Arc::new(instance_ids),
            period,
            in_flight: HashMap::new(),
        }
    }

    /// 스케줄러 시작 (백그라운드)
    /// Start the timer loop in the background
    pub fn start(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// 타이머 루프
    /// Timer loop; returns once the shutdown signal is observed
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            period_secs = self.period.as_secs(),
            instances = self.instance_ids.len(),
            "starting lifecycle scheduler"
        );

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    // 송신측이 사라져도 종료로 처리
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            if *shutdown.borrow() {
                break;
            }
            self.tick();
        }

        self.drain().await;
        tracing::info!("lifecycle scheduler stopped");
    }

    /// 한 주기 실행: 비어 있는 종류별 슬롯마다 sweep 을 띄움
    /// One tick: launch every sweep kind whose previous run has finished
    pub fn tick(&mut self) -> Vec<SweepKind> {
        let mut launched = Vec::new();

        for kind in SweepKind::ALL {
            if let Some(handle) = self.in_flight.get(&kind) {
                if !handle.is_finished() {
                    tracing::warn!(sweep = %kind, "previous run still in flight, skipping this tick");
                    continue;
                }
            }

            let sweeps = self.sweeps.clone();
            let instance_ids = self.instance_ids.clone();
            let handle = tokio::spawn(async move {
                let report = sweeps.run(kind, &instance_ids).await;
                tracing::debug!(
                    sweep = %kind,
                    processed = report.processed,
                    failed = report.failed,
                    "sweep run complete"
                );
            });

            self.in_flight.insert(kind, handle);
            launched.push(kind);
        }

        launched
    }

    /// 실행 중인 sweep 이 모두 끝날 때까지 대기
    /// Wait for every in-flight sweep
    pub async fn drain(&mut self) {
        for (kind, handle) in self.in_flight.drain() {
            if let Err(e) = handle.await {
                tracing::error!(sweep = %kind, error = %e, "sweep task panicked");
            }
        }
    }
}
