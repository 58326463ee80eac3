//! # CoinFlow Core
//!
//! 증분 수집 파이프라인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 자산 및 페치 요청 타입 (`Asset`, `FetchRequest`, `FetchDepth`)
//! - 캔들(Bar) 정규 스키마
//! - 샘플링 간격 정의 (`Interval`)
//! - 로깅 인프라

pub mod error;
pub mod logging;
pub mod types;

pub use error::{CoreError, Result};
pub use logging::*;
pub use types::*;
