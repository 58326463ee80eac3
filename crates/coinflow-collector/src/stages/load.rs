//! 영속화 스테이지.

use async_trait::async_trait;
use tracing::info;

use coinflow_core::Asset;
use coinflow_data::{BulkLoader, MetadataStore};

use super::{Stage, StageContext};
use crate::Result;

/// 갱신된 커서 테이블과 스테이징 아티팩트를 데이터베이스에 적재합니다.
///
/// 커서 테이블은 통째로 교체하고, OHLCV 테이블에는 이어 붙입니다.
pub struct LoadStage;

#[async_trait]
impl Stage for LoadStage {
    fn name(&self) -> &'static str {
        "load"
    }

    async fn apply(&self, ctx: &StageContext, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        let store = MetadataStore::new(ctx.pool.clone());
        let saved = store.save_assets(&assets).await?;

        let loader = BulkLoader::new(ctx.pool.clone())
            .with_copy_threshold(ctx.config.loader.copy_threshold);
        let loaded = loader
            .load_staging(&ctx.staging, &ctx.config.loader.ohlcv_table, false)
            .await?;

        info!(cursors = saved, bars = loaded, "영속화 완료");
        Ok(assets)
    }
}
