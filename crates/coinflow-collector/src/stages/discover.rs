//! 유니버스 발견 스테이지.

use async_trait::async_trait;
use tracing::info;

use coinflow_core::Asset;
use coinflow_data::{CoinScreener, MetadataStore};

use super::{Stage, StageContext};
use crate::Result;

/// 스크리너로 자산 유니버스를 새로 구성하고 영속 커서를 입힙니다.
///
/// 입력 자산 테이블은 무시됩니다. 이전 실행에서 커서를 얻은 자산이
/// 유니버스에 다시 나타나면 그 커서를 이어받고, 처음 보는 자산은
/// 커서 없이 (전체 이력 대상으로) 들어옵니다.
pub struct DiscoverStage;

#[async_trait]
impl Stage for DiscoverStage {
    fn name(&self) -> &'static str {
        "discover"
    }

    async fn apply(&self, ctx: &StageContext, _assets: Vec<Asset>) -> Result<Vec<Asset>> {
        let screener = CoinScreener::new(ctx.config.discovery.screener_config())?;
        let discovered = screener.discover().await?;
        info!(assets = discovered.len(), "유니버스 발견 완료");

        let store = MetadataStore::new(ctx.pool.clone());
        let hydrated = store.hydrate_cursors(discovered).await?;
        Ok(hydrated)
    }
}
