//! Standalone incremental OHLCV collector for the CoinFlow pipeline.
//!
//! 이 crate는 증분 수집 파이프라인을 실행하는 바이너리를 제공합니다:
//! - 크립토 스크리너 기반 자산 유니버스 발견
//! - 커서 기반 신선도 판정과 증분 페치
//! - 스테이징 아티팩트 병합 및 커서 전진
//! - 커서 테이블/OHLCV 테이블 벌크 적재

pub mod config;
pub mod error;
pub mod merge;
pub mod stages;
pub mod staleness;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
