//! 데이터 Provider 모듈.
//!
//! 외부 소스에서 데이터를 가져오는 Provider들을 정의합니다.
//!
//! ## 시계열 제공자
//! - `HistoryProvider`: 시계열 이력 조회 추상화 (심볼, 범위, 간격)
//! - `YahooHistoryProvider`: Yahoo Finance 구현
//!
//! ## 유니버스 발견
//! - `CoinScreener`: Yahoo Finance 크립토 스크리너 크롤러
//! - 페이지 단위 동시 수집, 호가 통화/거래량/유통량/52주 변동률 필터

pub mod history;
pub mod screener;
pub mod yahoo;

pub use history::{HistoryError, HistoryProvider, RawSeries, RawValue};
pub use screener::{CoinScreener, ScreenerConfig};
pub use yahoo::YahooHistoryProvider;
