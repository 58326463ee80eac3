//! 스테이징 아티팩트 벌크 로더.
//!
//! 스테이징 CSV를 관계형 테이블로 적재합니다. 행 수가 임계값을 넘으면
//! PostgreSQL COPY 경로를, 그 아래면 청크 단위 다중 행 INSERT 경로를
//! 사용합니다. replace/append 의미론을 모두 지원합니다.

use sqlx::postgres::PgPoolCopyExt;
use sqlx::PgPool;
use tracing::{info, warn};

use coinflow_core::Bar;

use crate::error::{DataError, Result};
use crate::staging::StagingArtifact;

const INSERT_CHUNK: usize = 500;

/// 벌크 로더.
pub struct BulkLoader {
    pool: PgPool,
    /// 이 행 수를 넘으면 COPY 경로 사용
    copy_threshold: usize,
}

impl BulkLoader {
    /// 기본 임계값(70만 행)으로 로더를 생성합니다.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            copy_threshold: 700_000,
        }
    }

    /// COPY 경로 임계값을 설정합니다.
    pub fn with_copy_threshold(mut self, threshold: usize) -> Self {
        self.copy_threshold = threshold;
        self
    }

    /// 스테이징 아티팩트를 지정 테이블로 적재합니다.
    ///
    /// `replace`가 true면 기존 내용을 비우고, false면 이어 붙입니다.
    /// 아티팩트가 없으면 경고만 남기고 0을 반환합니다.
    pub async fn load_staging(
        &self,
        artifact: &StagingArtifact,
        table: &str,
        replace: bool,
    ) -> Result<usize> {
        if !artifact.exists() {
            warn!(path = %artifact.path().display(), "스테이징 아티팩트 없음, 적재 건너뜀");
            return Ok(0);
        }

        let bars = artifact.read_all()?;
        if bars.is_empty() {
            return Ok(0);
        }

        self.ensure_table(table).await?;

        if replace {
            sqlx::query(&format!("TRUNCATE {} RESTART IDENTITY", table))
                .execute(&self.pool)
                .await?;
        }

        let loaded = if bars.len() > self.copy_threshold {
            info!(rows = bars.len(), table, "COPY 경로로 적재");
            self.copy_in(table, &bars).await?
        } else {
            info!(rows = bars.len(), table, "INSERT 경로로 적재");
            self.insert_chunked(table, &bars).await?
        };

        info!(rows = loaded, table, "벌크 적재 완료");
        Ok(loaded)
    }

    /// 대상 테이블이 없으면 생성합니다.
    async fn ensure_table(&self, table: &str) -> Result<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                adj_close NUMERIC,
                close NUMERIC,
                high NUMERIC,
                low NUMERIC,
                open NUMERIC,
                volume BIGINT,
                date DATE,
                symbol TEXT NOT NULL,
                name TEXT
             )",
            table
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// PostgreSQL COPY FROM STDIN 경로 (대용량).
    async fn copy_in(&self, table: &str, bars: &[Bar]) -> Result<usize> {
        // 헤더 없는 CSV 페이로드 구성
        let mut payload = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut payload);
            for bar in bars {
                writer.serialize(bar)?;
            }
            writer
                .flush()
                .map_err(|e| DataError::InsertError(e.to_string()))?;
        }

        let mut copy = self
            .pool
            .copy_in_raw(&format!(
                "COPY {} (adj_close, close, high, low, open, volume, date, symbol, name) \
                 FROM STDIN WITH (FORMAT CSV)",
                table
            ))
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

        copy.send(payload)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;
        let rows = copy
            .finish()
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

        Ok(rows as usize)
    }

    /// 청크 단위 다중 행 INSERT 경로 (소용량).
    async fn insert_chunked(&self, table: &str, bars: &[Bar]) -> Result<usize> {
        let mut total = 0usize;

        for chunk in bars.chunks(INSERT_CHUNK) {
            let mut query = format!(
                "INSERT INTO {} (adj_close, close, high, low, open, volume, date, symbol, name) VALUES ",
                table
            );

            let value_tuples: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    let base = i * 9;
                    format!(
                        "(${}, ${}, ${}, ${}, ${}, ${}, ${}, ${}, ${})",
                        base + 1,
                        base + 2,
                        base + 3,
                        base + 4,
                        base + 5,
                        base + 6,
                        base + 7,
                        base + 8,
                        base + 9
                    )
                })
                .collect();
            query.push_str(&value_tuples.join(", "));

            let mut sql_query = sqlx::query(&query);
            for bar in chunk {
                sql_query = sql_query
                    .bind(bar.adj_close)
                    .bind(bar.close)
                    .bind(bar.high)
                    .bind(bar.low)
                    .bind(bar.open)
                    .bind(bar.volume)
                    .bind(bar.date)
                    .bind(&bar.symbol)
                    .bind(&bar.name);
            }

            let result = sql_query
                .execute(&self.pool)
                .await
                .map_err(|e| DataError::InsertError(e.to_string()))?;

            total += result.rows_affected() as usize;
        }

        Ok(total)
    }
}
