//! 정규 캔들(Bar) 스키마 정의.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 정규 스키마의 일별 캔들 한 행.
///
/// 필드 순서는 스테이징 CSV 아티팩트의 컬럼 순서와 일치합니다.
/// 결과 집합 내에서 (symbol, date) 기준으로 유일하며 날짜 오름차순으로 정렬됩니다.
/// 가격 값이 없는 행은 정규화 단계에서 제거됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// 수정 종가. 제공자가 생략하면 종가로 대체됨
    pub adj_close: Decimal,
    /// 종가
    pub close: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 시가
    pub open: Decimal,
    /// 거래량 (음수 불가, 누락 시 0)
    pub volume: i64,
    /// 거래일 (시간 성분 없음)
    pub date: NaiveDate,
    /// 자산 심볼
    pub symbol: String,
    /// 자산 이름
    pub name: String,
}
