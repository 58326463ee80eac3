//! 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 시계열 제공자 추상화와 Yahoo Finance 구현
//! - 크립토 스크리너 기반 자산 유니버스 발견
//! - 원시 응답 → 정규 Bar 스키마 정규화
//! - 자산별 페처 (간격 폴백 + 재시도/백오프)
//! - 그룹 단위 동시 페치 스케줄러
//! - append-only CSV 스테이징 아티팩트
//! - PostgreSQL 커서 테이블 및 벌크 로더

pub mod error;
pub mod fetch;
pub mod normalize;
pub mod provider;
pub mod scheduler;
pub mod staging;
pub mod storage;

pub use error::{DataError, Result};

// 페치 엔진 재내보내기
pub use fetch::{AssetFetcher, FetchPolicy};
pub use scheduler::{FetchScheduler, GroupSizing, SchedulerConfig};

// 제공자 재내보내기
pub use provider::{
    CoinScreener, HistoryError, HistoryProvider, RawSeries, RawValue, ScreenerConfig,
    YahooHistoryProvider,
};

// 저장소 재내보내기
pub use staging::StagingArtifact;
pub use storage::{BulkLoader, MetadataStore};
