//! 자산 커서 테이블(`coins_metadata`) 연동.
//!
//! 발견된 유니버스에 영속 커서를 입히고, 실행이 끝나면 갱신된 자산
//! 테이블을 통째로 다시 저장합니다 (replace 의미론).

use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, info};

use coinflow_core::Asset;

use crate::error::{DataError, Result};

const METADATA_TABLE: &str = "coins_metadata";
const INSERT_CHUNK: usize = 500;

/// 자산 커서 테이블 저장소.
pub struct MetadataStore {
    pool: PgPool,
}

impl MetadataStore {
    /// 새 저장소를 생성합니다.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 커서 테이블이 존재하는지 확인합니다.
    async fn table_exists(&self) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables WHERE table_name = $1
             )",
        )
        .bind(METADATA_TABLE)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// 발견된 유니버스에 영속 커서를 입힙니다.
    ///
    /// 테이블이 없거나 심볼이 없으면 커서는 `None`으로 남습니다
    /// (첫 등장 자산은 전체 이력 대상으로 분류됨).
    pub async fn hydrate_cursors(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        if !self.table_exists().await? {
            debug!("커서 테이블 없음, 모든 자산을 신규로 취급");
            return Ok(assets);
        }

        let rows: Vec<(String, Option<NaiveDate>)> =
            sqlx::query_as(&format!("SELECT symbol, updated_at FROM {}", METADATA_TABLE))
                .fetch_all(&self.pool)
                .await?;

        let cursors: HashMap<String, Option<NaiveDate>> = rows.into_iter().collect();

        let hydrated: Vec<Asset> = assets
            .into_iter()
            .map(|mut asset| {
                asset.updated_at = cursors.get(&asset.symbol).copied().flatten();
                asset
            })
            .collect();

        debug!(
            assets = hydrated.len(),
            with_cursor = hydrated.iter().filter(|a| a.updated_at.is_some()).count(),
            "커서 하이드레이션 완료"
        );
        Ok(hydrated)
    }

    /// 커서 테이블 전체를 자산 목록으로 읽어옵니다.
    ///
    /// 발견 단계 없이 실행할 때의 인바운드 자산 테이블입니다.
    pub async fn load_assets(&self) -> Result<Vec<Asset>> {
        if !self.table_exists().await? {
            return Err(DataError::NotFound(format!(
                "{} 테이블이 없습니다. discover를 먼저 실행하세요",
                METADATA_TABLE
            )));
        }

        let rows: Vec<(String, String, Option<NaiveDate>)> = sqlx::query_as(&format!(
            "SELECT symbol, name, updated_at FROM {} ORDER BY symbol",
            METADATA_TABLE
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(symbol, name, updated_at)| Asset {
                symbol,
                name,
                updated_at,
            })
            .collect())
    }

    /// 자산 테이블을 통째로 다시 저장합니다.
    ///
    /// 테이블이 없으면 만들고, 기존 내용을 비운 뒤 청크 단위
    /// 다중 행 INSERT로 채웁니다.
    pub async fn save_assets(&self, assets: &[Asset]) -> Result<usize> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                symbol TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                updated_at DATE
             )",
            METADATA_TABLE
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!("TRUNCATE {} RESTART IDENTITY", METADATA_TABLE))
            .execute(&self.pool)
            .await?;

        let mut total = 0usize;

        for chunk in assets.chunks(INSERT_CHUNK) {
            let mut query = format!(
                "INSERT INTO {} (symbol, name, updated_at) VALUES ",
                METADATA_TABLE
            );

            let value_tuples: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    let base = i * 3;
                    format!("(${}, ${}, ${})", base + 1, base + 2, base + 3)
                })
                .collect();
            query.push_str(&value_tuples.join(", "));

            let mut sql_query = sqlx::query(&query);
            for asset in chunk {
                sql_query = sql_query
                    .bind(&asset.symbol)
                    .bind(&asset.name)
                    .bind(asset.updated_at);
            }

            let result = sql_query
                .execute(&self.pool)
                .await
                .map_err(|e| DataError::InsertError(e.to_string()))?;

            total += result.rows_affected() as usize;
        }

        info!(rows = total, table = METADATA_TABLE, "자산 테이블 저장 완료");
        Ok(total)
    }
}
