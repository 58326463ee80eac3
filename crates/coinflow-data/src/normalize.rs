//! 원시 응답 → 정규 Bar 스키마 정규화.
//!
//! 순수 함수 모듈입니다. I/O 없이 `RawSeries`를 정규 `Bar` 시퀀스로
//! 변환합니다:
//!
//! 1. 중복 컬럼명을 `_1`, `_2` … 접미사로 결정적으로 해소
//! 2. 제공자 고유 컬럼명을 정규 필드에 매핑
//! 3. 날짜 중복 제거 (입력 순서상 첫 행이 날짜를 소비)
//! 4. 수정 종가가 없으면 종가로 합성
//! 5. 거래량을 음수 불가 정수로 강제 (누락 시 0)
//! 6. 가격 필드가 빠진 행 제거 후 오름차순 정렬
//! 7. 모든 행에 심볼/이름 스탬프

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

use coinflow_core::Bar;

use crate::provider::{RawSeries, RawValue};

/// 정규 스키마의 필드 위치.
#[derive(Debug, Default)]
struct FieldIndex {
    date: Option<usize>,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    adj_close: Option<usize>,
    volume: Option<usize>,
}

/// 원시 시계열을 정규 Bar 시퀀스로 변환합니다.
///
/// 자기 출력에 대해 멱등합니다: 이미 정규화된 시리즈를 다시 넣어도
/// 같은 결과가 나옵니다.
pub fn normalize(raw: &RawSeries, symbol: &str, name: &str) -> Vec<Bar> {
    let columns = dedupe_columns(&raw.columns);
    let index = build_field_index(&columns);

    let (date_idx, open_idx, high_idx, low_idx, close_idx) = match (
        index.date,
        index.open,
        index.high,
        index.low,
        index.close,
    ) {
        (Some(d), Some(o), Some(h), Some(l), Some(c)) => (d, o, h, l, c),
        // 필수 컬럼 자체가 없으면 정규화 불가
        _ => return Vec::new(),
    };

    let mut bars: Vec<Bar> = Vec::with_capacity(raw.rows.len());
    let mut seen_dates: HashSet<NaiveDate> = HashSet::with_capacity(raw.rows.len());

    for row in &raw.rows {
        let date = match row.get(date_idx).and_then(as_date) {
            Some(d) => d,
            None => continue,
        };

        // 날짜 중복 제거: 입력 순서상 첫 행이 날짜를 소비함
        // (가격 검사보다 먼저 수행되므로, 첫 행이 가격 누락으로
        // 제거되면 같은 날짜의 뒤 행도 살아나지 않음)
        if !seen_dates.insert(date) {
            continue;
        }

        // 가격 값이 하나라도 없으면 행 제거
        let open = row.get(open_idx).and_then(as_decimal);
        let high = row.get(high_idx).and_then(as_decimal);
        let low = row.get(low_idx).and_then(as_decimal);
        let close = row.get(close_idx).and_then(as_decimal);
        let (open, high, low, close) = match (open, high, low, close) {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => continue,
        };

        // 수정 종가가 없으면 종가로 합성
        let adj_close = index
            .adj_close
            .and_then(|i| row.get(i))
            .and_then(as_decimal)
            .unwrap_or(close);

        // 거래량은 음수 불가 정수, 누락 시 0
        let volume = index
            .volume
            .and_then(|i| row.get(i))
            .and_then(as_i64)
            .unwrap_or(0)
            .max(0);

        bars.push(Bar {
            adj_close,
            close,
            high,
            low,
            open,
            volume,
            date,
            symbol: symbol.to_string(),
            name: name.to_string(),
        });
    }

    bars.sort_by_key(|bar| bar.date);
    bars
}

/// 중복 컬럼명을 증가 카운터 접미사로 해소합니다.
///
/// 뒤에 오는 중복에 `_1`, `_2` …가 붙어 첫 등장 컬럼만 원래 이름을
/// 유지합니다.
pub fn dedupe_columns(columns: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();

    columns
        .iter()
        .map(|col| match seen.get_mut(col.as_str()) {
            Some(count) => {
                let renamed = format!("{}_{}", col, count);
                *count += 1;
                renamed
            }
            None => {
                seen.insert(col, 1);
                col.clone()
            }
        })
        .collect()
}

/// 제공자 컬럼명을 정규 필드 위치에 매핑합니다.
///
/// 같은 정규 필드에 대응하는 컬럼이 여럿이면 첫 번째가 이깁니다.
fn build_field_index(columns: &[String]) -> FieldIndex {
    let mut index = FieldIndex::default();

    for (i, col) in columns.iter().enumerate() {
        let slot = match canonical_field(col) {
            Some("date") => &mut index.date,
            Some("open") => &mut index.open,
            Some("high") => &mut index.high,
            Some("low") => &mut index.low,
            Some("close") => &mut index.close,
            Some("adj_close") => &mut index.adj_close,
            Some("volume") => &mut index.volume,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(i);
        }
    }

    index
}

/// 제공자 고유 컬럼명 → 정규 필드명.
fn canonical_field(column: &str) -> Option<&'static str> {
    match column.to_lowercase().as_str() {
        "date" => Some("date"),
        "open" => Some("open"),
        "high" => Some("high"),
        "low" => Some("low"),
        "close" => Some("close"),
        "adj close" | "adjclose" | "adj_close" => Some("adj_close"),
        "volume" => Some("volume"),
        _ => None,
    }
}

/// 셀 값을 Decimal로 변환합니다. NaN/비숫자는 None.
fn as_decimal(value: &RawValue) -> Option<Decimal> {
    match value {
        RawValue::Float(f) => Decimal::from_f64(*f),
        RawValue::Int(i) => Some(Decimal::from(*i)),
        RawValue::Text(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

/// 셀 값을 i64로 변환합니다.
fn as_i64(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Int(i) => Some(*i),
        RawValue::Float(f) if f.is_finite() => Some(*f as i64),
        RawValue::Text(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// 셀 값을 날짜로 변환합니다.
fn as_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Date(d) => Some(*d),
        RawValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    }
}
