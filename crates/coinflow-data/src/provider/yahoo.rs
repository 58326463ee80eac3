//! Yahoo Finance 시계열 제공자.
//!
//! `yahoo_finance_api` crate 위에서 `HistoryProvider`를 구현합니다.
//! 응답은 Yahoo 고유 컬럼명("Date", "Open", "Adj Close" 등)을 유지한
//! `RawSeries`로 변환되고, 오류는 메시지 내용으로 분류됩니다.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tracing::debug;

use coinflow_core::{FetchDepth, Interval};

use super::history::{HistoryError, HistoryProvider, RawSeries, RawValue};

/// Yahoo가 반환하는 원시 컬럼명 (이 순서대로 RawSeries를 구성).
const YAHOO_COLUMNS: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];

/// Yahoo Finance 기반 시계열 제공자.
pub struct YahooHistoryProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooHistoryProvider {
    /// 새 제공자를 생성합니다.
    pub fn new() -> Result<Self, HistoryError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| HistoryError::Other(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl HistoryProvider for YahooHistoryProvider {
    async fn history(
        &self,
        symbol: &str,
        depth: FetchDepth,
        interval: Interval,
    ) -> Result<RawSeries, HistoryError> {
        debug!(
            symbol = symbol,
            range = depth.range_str(),
            interval = interval.as_str(),
            "Yahoo Finance API 호출"
        );

        let response = self
            .connector
            .get_quote_range(symbol, interval.as_str(), depth.range_str())
            .await
            .map_err(|e| classify_error(&e.to_string()))?;

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            // Quote 파싱 실패는 이 간격에 대한 구조적 실패로 취급
            Err(e) => return Err(classify_error(&e.to_string())),
        };

        let mut series = RawSeries::new(YAHOO_COLUMNS.iter().map(|c| c.to_string()).collect());

        for quote in &quotes {
            let date = match Utc.timestamp_opt(quote.timestamp as i64, 0).single() {
                Some(dt) => dt.date_naive(),
                None => continue,
            };

            series.rows.push(vec![
                RawValue::Date(date),
                RawValue::Float(quote.open),
                RawValue::Float(quote.high),
                RawValue::Float(quote.low),
                RawValue::Float(quote.close),
                RawValue::Float(quote.adjclose),
                RawValue::Int(quote.volume as i64),
            ]);
        }

        Ok(series)
    }
}

/// Yahoo 오류 메시지를 `HistoryError` 분류로 변환합니다.
///
/// yahoo_finance_api는 상태 코드를 구조적으로 노출하지 않아
/// 메시지 내용으로 판별합니다.
fn classify_error(msg: &str) -> HistoryError {
    let lower = msg.to_lowercase();

    if lower.contains("401")
        || lower.contains("429")
        || lower.contains("unauthorized")
        || lower.contains("too many requests")
    {
        return HistoryError::RateLimited(msg.to_string());
    }

    if lower.contains("invalid interval")
        || lower.contains("max must be")
        || lower.contains("not supported")
    {
        return HistoryError::InvalidParams(msg.to_string());
    }

    HistoryError::Other(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limited() {
        assert!(matches!(
            classify_error("HTTP 401 Unauthorized"),
            HistoryError::RateLimited(_)
        ));
        assert!(matches!(
            classify_error("Too Many Requests (429)"),
            HistoryError::RateLimited(_)
        ));
    }

    #[test]
    fn test_classify_invalid_params() {
        assert!(matches!(
            classify_error("Invalid interval for this range"),
            HistoryError::InvalidParams(_)
        ));
        assert!(matches!(
            classify_error("period max must be within last 30 days"),
            HistoryError::InvalidParams(_)
        ));
    }

    #[test]
    fn test_classify_other() {
        assert!(matches!(
            classify_error("connection reset by peer"),
            HistoryError::Other(_)
        ));
    }

    #[tokio::test]
    #[ignore] // 실제 네트워크 테스트는 ignore
    async fn test_fetch_btc_daily() {
        let provider = YahooHistoryProvider::new().unwrap();
        let series = provider
            .history("BTC-USD", FetchDepth::RecentWindow, Interval::D1)
            .await
            .unwrap();
        assert!(!series.is_empty());
        assert_eq!(series.columns.len(), 7);
    }
}
