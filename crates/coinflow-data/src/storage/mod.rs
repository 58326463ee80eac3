//! PostgreSQL 저장소 모듈.
//!
//! - `MetadataStore`: 자산 커서 테이블(`coins_metadata`) 연동
//! - `BulkLoader`: 스테이징 아티팩트의 벌크 적재

pub mod loader;
pub mod metadata;

pub use loader::BulkLoader;
pub use metadata::MetadataStore;
