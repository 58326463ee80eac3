//! 그룹 단위 동시 페치 스케줄러.
//!
//! 오래된 자산 목록을 연속 그룹으로 나누고, 그룹마다 하나의 태스크로
//! 동시에 실행합니다. 그룹 안에서는 자산을 순차로 처리하며 요청 사이에
//! 고정 간격을 둡니다 (제공자의 암묵적 요청 제한 준수).
//!
//! 그룹 간 공유 가변 상태는 없습니다. 각 태스크는 자신의 그룹 목록을
//! 소유하고 독립적인 결과를 생산하며, 집계는 모든 태스크가 끝난
//! 합류 지점에서만 일어납니다. 한 그룹의 실패는 형제 그룹을 취소하지
//! 않습니다.

use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use coinflow_core::{Bar, FetchRequest};

use crate::fetch::AssetFetcher;

/// 그룹 분할 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSizing {
    /// `ceil(n / workers)` 크기의 균등 분할 (첫 패스)
    Balanced,
    /// 고정 크기 그룹, 그룹 수는 worker 수로 제한 (보수 패스)
    Fixed(usize),
}

/// 스케줄러 설정.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 동시 그룹(태스크) 수 상한
    pub workers: usize,
    /// 그룹 분할 방식
    pub sizing: GroupSizing,
    /// 그룹 내 자산 간 간격
    pub pacing: Duration,
}

impl SchedulerConfig {
    /// 첫 패스 설정: 넓은 풀, 균등 분할.
    pub fn first_pass(workers: usize, pacing: Duration) -> Self {
        Self {
            workers,
            sizing: GroupSizing::Balanced,
            pacing,
        }
    }

    /// 보수 패스 설정: 좁은 풀, 고정 그룹 크기로 실행당 작업량 제한.
    pub fn repair_pass(workers: usize, per_group: usize, pacing: Duration) -> Self {
        Self {
            workers,
            sizing: GroupSizing::Fixed(per_group),
            pacing,
        }
    }
}

/// 그룹 단위 동시 페치 스케줄러.
pub struct FetchScheduler {
    fetcher: Arc<AssetFetcher>,
    config: SchedulerConfig,
}

impl FetchScheduler {
    /// 새 스케줄러를 생성합니다.
    pub fn new(fetcher: Arc<AssetFetcher>, config: SchedulerConfig) -> Self {
        Self { fetcher, config }
    }

    /// 요청 목록을 연속 그룹으로 분할합니다.
    pub fn split_groups(&self, requests: Vec<FetchRequest>) -> Vec<Vec<FetchRequest>> {
        if requests.is_empty() {
            return Vec::new();
        }

        match self.config.sizing {
            GroupSizing::Balanced => {
                let workers = self.config.workers.max(1);
                let chunk_size = requests.len().div_ceil(workers).max(1);
                requests
                    .chunks(chunk_size)
                    .map(|chunk| chunk.to_vec())
                    .collect()
            }
            GroupSizing::Fixed(per_group) => requests
                .chunks(per_group.max(1))
                .take(self.config.workers.max(1))
                .map(|chunk| chunk.to_vec())
                .collect(),
        }
    }

    /// 오래된 자산 집합을 동시 페치하고 자산별 결과 맵을 반환합니다.
    ///
    /// 결과는 완료 순서대로 수집됩니다. 그룹 경계에서 잡히지 않은
    /// 태스크 실패는 해당 그룹의 결과만 잃고 형제 그룹에는 영향이
    /// 없습니다 (커서가 갱신되지 않으므로 다음 실행에서 재시도).
    pub async fn run(&self, requests: Vec<FetchRequest>) -> HashMap<String, Vec<Bar>> {
        let total = requests.len();
        let groups = self.split_groups(requests);

        info!(
            assets = total,
            groups = groups.len(),
            workers = self.config.workers,
            "페치 스케줄 시작"
        );

        let mut set = JoinSet::new();
        for (group_idx, group) in groups.into_iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let pacing = self.config.pacing;
            set.spawn(async move { run_group(group_idx, group, fetcher, pacing).await });
        }

        let mut outcomes: HashMap<String, Vec<Bar>> = HashMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(group_results) => {
                    for (symbol, bars) in group_results {
                        outcomes.insert(symbol, bars);
                    }
                }
                Err(e) => {
                    error!(error = %e, "그룹 태스크 합류 실패, 해당 그룹 결과 유실");
                }
            }
        }

        info!(
            fetched = outcomes.values().filter(|bars| !bars.is_empty()).count(),
            empty = outcomes.values().filter(|bars| bars.is_empty()).count(),
            "페치 스케줄 완료"
        );
        outcomes
    }
}

/// 한 그룹을 순차 처리합니다.
///
/// 자산 하나를 처리하다 패닉이 나면 그때까지 모은 부분 결과를 유지한 채
/// 그룹의 남은 자산을 건너뜁니다 (커서 미갱신으로 다음 실행에서 재시도).
async fn run_group(
    group_idx: usize,
    group: Vec<FetchRequest>,
    fetcher: Arc<AssetFetcher>,
    pacing: Duration,
) -> Vec<(String, Vec<Bar>)> {
    let mut results = Vec::with_capacity(group.len());

    debug!(group = group_idx, assets = group.len(), "그룹 처리 시작");

    for request in &group {
        match AssertUnwindSafe(fetcher.fetch(request)).catch_unwind().await {
            Ok(bars) => {
                results.push((request.asset.symbol.clone(), bars));
            }
            Err(_) => {
                error!(
                    group = group_idx,
                    symbol = %request.asset.symbol,
                    kind = "group_task_panic",
                    "그룹 내 예기치 않은 오류, 남은 자산 건너뜀"
                );
                break;
            }
        }

        tokio::time::sleep(pacing).await;
    }

    debug!(group = group_idx, completed = results.len(), "그룹 처리 완료");
    results
}
