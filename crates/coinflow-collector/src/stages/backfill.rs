//! 전체 이력 백필 스테이지.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use coinflow_core::{Asset, FetchDepth, FetchRequest};
use coinflow_data::{AssetFetcher, FetchScheduler};

use crate::merge;
use crate::stats::CollectionStats;
use crate::Result;

use super::{Stage, StageContext};

/// 커서 없는 자산의 전체 이력을 수집합니다.
///
/// 첫 실행이나 유니버스에 새로 들어온 자산이 대상입니다. 제공자
/// 응답이 페이지 단위라 개별 요청이 가볍기 때문에 넓은 동시성 풀을
/// 사용합니다.
pub struct BackfillStage;

#[async_trait]
impl Stage for BackfillStage {
    fn name(&self) -> &'static str {
        "backfill"
    }

    async fn apply(&self, ctx: &StageContext, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        let started = Instant::now();
        let today = Utc::now().date_naive();

        let requests: Vec<FetchRequest> = assets
            .iter()
            .filter(|asset| asset.updated_at.is_none())
            .map(|asset| FetchRequest::new(asset.clone(), FetchDepth::FullHistory))
            .collect();

        if requests.is_empty() {
            return Ok(assets);
        }

        let targets: Vec<String> = requests
            .iter()
            .map(|r| r.asset.symbol.clone())
            .collect();

        let fetcher = Arc::new(AssetFetcher::new(
            ctx.provider.clone(),
            ctx.config.fetch.fetch_policy(),
        ));
        let scheduler = FetchScheduler::new(fetcher, ctx.config.fetch.first_pass_scheduler());
        let outcomes = scheduler.run(requests).await;

        let outcome = merge::merge(outcomes, assets, &targets, &ctx.staging, today)?;

        let stats = CollectionStats {
            total: targets.len(),
            success: outcome.fetched,
            errors: outcome.lost,
            skipped: outcome.assets.len() - targets.len(),
            empty: outcome.empty,
            total_bars: outcome.appended,
            elapsed: started.elapsed(),
        };
        stats.log_summary("전체 이력 백필");

        Ok(outcome.assets)
    }
}
