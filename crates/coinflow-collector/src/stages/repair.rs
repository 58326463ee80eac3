//! 증분 보수 스테이지.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use coinflow_core::Asset;
use coinflow_data::{AssetFetcher, FetchScheduler};

use crate::merge;
use crate::staleness;
use crate::stats::CollectionStats;
use crate::Result;

use super::{Stage, StageContext};

/// 커서가 뒤처진 자산의 빈 구간을 채웁니다.
///
/// 커서 나이에 따라 최근 구간 또는 전체 이력을 다시 가져옵니다.
/// 백필과 달리 좁은 풀과 고정 그룹 크기로 실행당 작업량을 제한합니다.
pub struct RepairStage;

#[async_trait]
impl Stage for RepairStage {
    fn name(&self) -> &'static str {
        "repair"
    }

    async fn apply(&self, ctx: &StageContext, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        let started = Instant::now();
        let today = Utc::now().date_naive();

        let partition = staleness::partition(assets, today, ctx.config.fetch.stale_days);
        if partition.stale.is_empty() {
            return Ok(partition.current);
        }

        let targets: Vec<String> = partition
            .stale
            .iter()
            .map(|r| r.asset.symbol.clone())
            .collect();
        let skipped = partition.current.len();

        // current 자산은 그대로 통과, stale 자산만 스케줄
        let mut assets = partition.current;
        assets.extend(partition.stale.iter().map(|r| r.asset.clone()));

        let fetcher = Arc::new(AssetFetcher::new(
            ctx.provider.clone(),
            ctx.config.fetch.fetch_policy(),
        ));
        let scheduler = FetchScheduler::new(fetcher, ctx.config.fetch.repair_pass_scheduler());
        let outcomes = scheduler.run(partition.stale).await;

        let outcome = merge::merge(outcomes, assets, &targets, &ctx.staging, today)?;

        let stats = CollectionStats {
            total: targets.len(),
            success: outcome.fetched,
            errors: outcome.lost,
            skipped,
            empty: outcome.empty,
            total_bars: outcome.appended,
            elapsed: started.elapsed(),
        };
        stats.log_summary("증분 보수");

        Ok(outcome.assets)
    }
}
