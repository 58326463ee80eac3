//! 시계열 이력 제공자 추상화.
//!
//! 파이프라인은 정확히 하나의 시계열 소스 추상화만 사용합니다.
//! 제공자는 원시 컬럼명을 그대로 유지한 테이블 형태(`RawSeries`)로
//! 응답하고, 정규화는 `normalize` 모듈이 담당합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use coinflow_core::{FetchDepth, Interval};

/// 시계열 제공자 오류 분류.
///
/// 페처의 재시도 정책은 이 분류에 따라 갈라집니다.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// 이 자산에 대해 지원하지 않는 기간/간격 조합. 재시도 대상 아님
    #[error("Invalid parameter combination: {0}")]
    InvalidParams(String),

    /// 일시적 인증/요청 제한 신호. 백오프 후 재시도 대상
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 그 외 실패 (응답 형태 이상 포함)
    #[error("Provider error: {0}")]
    Other(String),
}

/// 원시 시계열 응답의 셀 값.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// 부동소수점 값 (가격)
    Float(f64),
    /// 정수 값 (거래량)
    Int(i64),
    /// 날짜 값
    Date(NaiveDate),
    /// 문자열 값
    Text(String),
    /// 값 없음
    Null,
}

/// 제공자 고유 컬럼명을 그대로 유지한 원시 시계열 응답.
#[derive(Debug, Clone, Default)]
pub struct RawSeries {
    /// 컬럼명 (제공자 표기 그대로, 중복 가능)
    pub columns: Vec<String>,
    /// 행 데이터. 각 행의 길이는 컬럼 수와 같음
    pub rows: Vec<Vec<RawValue>>,
}

impl RawSeries {
    /// 지정한 컬럼명으로 빈 시리즈를 생성합니다.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// 행이 없으면 true.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 시계열 이력 제공자.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// 지정한 심볼의 시계열을 조회합니다.
    ///
    /// 데이터가 없는 경우 빈 `RawSeries`로 성공합니다. 오류는
    /// `HistoryError` 분류에 따라 페처가 폴백/재시도를 결정합니다.
    async fn history(
        &self,
        symbol: &str,
        depth: FetchDepth,
        interval: Interval,
    ) -> Result<RawSeries, HistoryError>;
}
