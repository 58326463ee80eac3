//! 자산 및 페치 요청 타입 정의.
//!
//! 이 모듈은 수집 대상 자산과 페치 요청 관련 타입을 정의합니다:
//! - `Asset` - 추적 대상 자산 (staleness cursor 포함)
//! - `FetchDepth` - 페치 범위 (전체 이력 / 최근 구간)
//! - `FetchRequest` - 한 번의 실행에서 생성되는 자산별 페치 요청

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 추적 대상 자산.
///
/// `updated_at`은 해당 자산의 데이터가 확보된 마지막 날짜(staleness cursor)입니다.
/// 최초 발견 시에는 `None`이며, 병합 단계에서만 전진합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// 심볼 (예: "BTC-USD"), 고유 식별자
    pub symbol: String,
    /// 표시 이름
    pub name: String,
    /// 마지막 데이터 확보 날짜 (커서). 없으면 아직 수집된 적 없음
    pub updated_at: Option<NaiveDate>,
}

impl Asset {
    /// 커서 없는 새 자산을 생성합니다.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            updated_at: None,
        }
    }

    /// 커서를 지정합니다.
    pub fn with_cursor(mut self, date: NaiveDate) -> Self {
        self.updated_at = Some(date);
        self
    }
}

/// 페치 요청 범위.
///
/// 커서가 없거나 오래된 자산은 전체 이력을, 최근에 갱신된 자산은
/// 짧은 최근 구간만 요청합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchDepth {
    /// 전체 이력
    FullHistory,
    /// 최근 구간 (1개월)
    RecentWindow,
}

impl FetchDepth {
    /// 제공자 API에 전달할 기간 문자열을 반환합니다.
    pub fn range_str(&self) -> &'static str {
        match self {
            FetchDepth::FullHistory => "max",
            FetchDepth::RecentWindow => "1mo",
        }
    }
}

impl fmt::Display for FetchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.range_str())
    }
}

impl FromStr for FetchDepth {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" | "full_history" => Ok(FetchDepth::FullHistory),
            "1mo" | "recent_window" => Ok(FetchDepth::RecentWindow),
            other => Err(CoreError::InvalidDepth(other.to_string())),
        }
    }
}

/// 자산별 페치 요청.
///
/// 실행마다 Staleness Tracker가 생성하는 일회성 값입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// 대상 자산 (커서 포함)
    pub asset: Asset,
    /// 요청 범위
    pub depth: FetchDepth,
}

impl FetchRequest {
    /// 새 페치 요청을 생성합니다.
    pub fn new(asset: Asset, depth: FetchDepth) -> Self {
        Self { asset, depth }
    }
}
