//! 파이프라인 스테이지.
//!
//! 각 스테이지는 자산 테이블을 받아 갱신된 자산 테이블을 돌려주는
//! 변환입니다. 스테이지들은 공유 컨텍스트(DB 풀, 설정, 스테이징
//! 아티팩트, 시계열 제공자)만 바라보고 서로를 직접 알지 못하므로
//! 어떤 조합으로도 이어 붙일 수 있습니다.

mod backfill;
mod discover;
mod load;
mod repair;

pub use backfill::BackfillStage;
pub use discover::DiscoverStage;
pub use load::LoadStage;
pub use repair::RepairStage;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use coinflow_core::Asset;
use coinflow_data::{HistoryProvider, StagingArtifact};

use crate::config::CollectorConfig;
use crate::Result;

/// 스테이지 공유 컨텍스트.
pub struct StageContext {
    /// 데이터베이스 풀
    pub pool: PgPool,
    /// Collector 설정
    pub config: CollectorConfig,
    /// 스테이징 아티팩트
    pub staging: StagingArtifact,
    /// 시계열 제공자
    pub provider: Arc<dyn HistoryProvider>,
}

impl StageContext {
    /// 새 컨텍스트를 생성합니다.
    pub fn new(
        pool: PgPool,
        config: CollectorConfig,
        provider: Arc<dyn HistoryProvider>,
    ) -> Self {
        let staging = StagingArtifact::new(config.staging_path.clone());
        Self {
            pool,
            config,
            staging,
            provider,
        }
    }
}

/// 파이프라인 스테이지.
#[async_trait]
pub trait Stage: Send + Sync {
    /// 스테이지 이름 (로그용)
    fn name(&self) -> &'static str;

    /// 자산 테이블을 변환합니다.
    async fn apply(&self, ctx: &StageContext, assets: Vec<Asset>) -> Result<Vec<Asset>>;
}

/// 스테이지 열을 차례로 실행합니다.
pub async fn run_pipeline(
    ctx: &StageContext,
    stages: &[Box<dyn Stage>],
    mut assets: Vec<Asset>,
) -> Result<Vec<Asset>> {
    for (idx, stage) in stages.iter().enumerate() {
        info!(
            step = format!("{}/{}", idx + 1, stages.len()),
            stage = stage.name(),
            assets = assets.len(),
            "스테이지 시작"
        );
        let started = Instant::now();
        assets = stage.apply(ctx, assets).await?;
        info!(
            stage = stage.name(),
            assets = assets.len(),
            elapsed = format!("{:.1}s", started.elapsed().as_secs_f64()),
            "스테이지 완료"
        );
    }
    Ok(assets)
}
