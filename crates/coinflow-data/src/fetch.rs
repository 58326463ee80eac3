//! 자산별 페처.
//!
//! 한 자산의 시계열을 간격 폴백과 재시도/백오프로 가져옵니다.
//! 모든 실패는 이 경계에서 흡수됩니다: 호출자에게는 항상
//! (비어 있을 수 있는) Bar 시퀀스만 반환되고, 흡수된 실패는
//! 구조화된 tracing 이벤트(심볼, 실패 종류)로 남습니다.
//!
//! 동시성 제어와 호출 간 간격 조절은 호출자(스케줄러)의 책임입니다.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use coinflow_core::{Bar, FetchRequest, Interval};

use crate::normalize::normalize;
use crate::provider::{HistoryError, HistoryProvider};

/// 페치 재시도/폴백 정책.
///
/// 흩어져 있던 재시도/지연 상수를 한 곳에 모은 설정 구조체입니다.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// 자산당 최대 시도 횟수
    pub max_attempts: u32,
    /// 요청 제한 신호 후 대기 시간
    pub backoff: Duration,
    /// 간격 폴백 순서
    pub intervals: Vec<Interval>,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            intervals: Interval::FALLBACK_ORDER.to_vec(),
        }
    }
}

/// 자산별 페처.
pub struct AssetFetcher {
    provider: Arc<dyn HistoryProvider>,
    policy: FetchPolicy,
}

impl AssetFetcher {
    /// 새 페처를 생성합니다.
    pub fn new(provider: Arc<dyn HistoryProvider>, policy: FetchPolicy) -> Self {
        Self { provider, policy }
    }

    /// 한 자산의 시계열을 가져옵니다. 실패해도 절대 오류를 반환하지 않습니다.
    ///
    /// - 빈 응답 → 다음 간격 시도
    /// - 기간/간격 조합 거부 → 다음 간격 시도 (시도 횟수에 포함 안 함)
    /// - 요청 제한 신호 → 남은 간격 포기, 백오프 후 다음 시도
    /// - 그 외 실패 → 다음 간격 시도
    /// - 첫 성공 간격이 이깁니다: 정규화 후 커서 필터를 적용해 즉시 반환
    /// - 모든 시도/간격 소진 → 빈 결과
    pub async fn fetch(&self, request: &FetchRequest) -> Vec<Bar> {
        let asset = &request.asset;

        'attempts: for attempt in 1..=self.policy.max_attempts {
            for interval in &self.policy.intervals {
                match self
                    .provider
                    .history(&asset.symbol, request.depth, *interval)
                    .await
                {
                    Ok(raw) => {
                        if raw.is_empty() {
                            debug!(
                                symbol = %asset.symbol,
                                interval = %interval,
                                "빈 응답, 다음 간격 시도"
                            );
                            continue;
                        }

                        let mut bars = normalize(&raw, &asset.symbol, &asset.name);

                        // 커서 필터: 증분 실행에서 중복 행 방지
                        if let Some(cursor) = asset.updated_at {
                            bars.retain(|bar| bar.date > cursor);
                        }

                        debug!(
                            symbol = %asset.symbol,
                            interval = %interval,
                            attempt,
                            bars = bars.len(),
                            "페치 성공"
                        );
                        return bars;
                    }
                    Err(HistoryError::InvalidParams(msg)) => {
                        debug!(
                            symbol = %asset.symbol,
                            interval = %interval,
                            kind = "invalid_params",
                            reason = %msg,
                            "간격 조합 거부, 다음 간격 시도"
                        );
                        continue;
                    }
                    Err(HistoryError::RateLimited(msg)) => {
                        warn!(
                            symbol = %asset.symbol,
                            attempt,
                            kind = "rate_limited",
                            reason = %msg,
                            "요청 제한 신호, 백오프 후 재시도"
                        );
                        if attempt < self.policy.max_attempts {
                            tokio::time::sleep(self.policy.backoff).await;
                        }
                        continue 'attempts;
                    }
                    Err(HistoryError::Other(msg)) => {
                        debug!(
                            symbol = %asset.symbol,
                            interval = %interval,
                            kind = "provider_error",
                            reason = %msg,
                            "조회 실패, 다음 간격 시도"
                        );
                        continue;
                    }
                }
            }
        }

        warn!(
            symbol = %asset.symbol,
            attempts = self.policy.max_attempts,
            kind = "exhausted",
            "모든 시도 소진, 이번 실행에서는 데이터 없음"
        );
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use coinflow_core::{Asset, FetchDepth};
    use std::sync::Mutex;

    use crate::provider::{RawSeries, RawValue};

    /// 호출마다 스크립트된 결과를 돌려주는 mock 제공자.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<RawSeries, HistoryError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<RawSeries, HistoryError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl HistoryProvider for ScriptedProvider {
        async fn history(
            &self,
            _symbol: &str,
            _depth: FetchDepth,
            _interval: Interval,
        ) -> Result<RawSeries, HistoryError> {
            *self.calls.lock().unwrap() += 1;
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                Ok(RawSeries::default())
            } else {
                script.remove(0)
            }
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn series_with_days(days: &[u32]) -> RawSeries {
        let columns = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let mut series = RawSeries::new(columns);
        for &day in days {
            series.rows.push(vec![
                RawValue::Date(date(day)),
                RawValue::Float(100.0),
                RawValue::Float(101.0),
                RawValue::Float(99.0),
                RawValue::Float(100.5),
                RawValue::Float(100.5),
                RawValue::Int(1_000),
            ]);
        }
        series
    }

    fn quick_policy() -> FetchPolicy {
        FetchPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
            intervals: Interval::FALLBACK_ORDER.to_vec(),
        }
    }

    fn request(cursor: Option<NaiveDate>) -> FetchRequest {
        let mut asset = Asset::new("BTC-USD", "Bitcoin USD");
        asset.updated_at = cursor;
        FetchRequest::new(asset, FetchDepth::FullHistory)
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(series_with_days(&[1, 2, 3]))]));
        let fetcher = AssetFetcher::new(provider.clone(), quick_policy());

        let bars = fetcher.fetch(&request(None)).await;
        assert_eq!(bars.len(), 3);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_twice_then_success() {
        // 시나리오: 요청 제한 2회 후 세 번째 시도에서 성공
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(HistoryError::RateLimited("401".to_string())),
            Err(HistoryError::RateLimited("401".to_string())),
            Ok(series_with_days(&[1, 2])),
        ]));
        let fetcher = AssetFetcher::new(provider.clone(), quick_policy());

        let bars = fetcher.fetch(&request(None)).await;
        assert_eq!(bars.len(), 2);
        // 시도 1, 2는 요청 제한으로 즉시 포기, 시도 3의 첫 간격에서 성공
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_invalid_params_falls_to_next_interval() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(HistoryError::InvalidParams("invalid interval".to_string())),
            Ok(series_with_days(&[1])),
        ]));
        let fetcher = AssetFetcher::new(provider.clone(), quick_policy());

        let bars = fetcher.fetch(&request(None)).await;
        assert_eq!(bars.len(), 1);
        // 같은 시도 안에서 두 번째 간격으로 폴백
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_response_falls_to_next_interval() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(RawSeries::default()),
            Ok(series_with_days(&[1])),
        ]));
        let fetcher = AssetFetcher::new(provider.clone(), quick_policy());

        let bars = fetcher.fetch(&request(None)).await;
        assert_eq!(bars.len(), 1);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_never_raises_on_total_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(HistoryError::Other("boom".to_string())),
            Err(HistoryError::RateLimited("429".to_string())),
            Err(HistoryError::InvalidParams("bad".to_string())),
            Err(HistoryError::Other("boom".to_string())),
        ]));
        let fetcher = AssetFetcher::new(provider, quick_policy());

        let bars = fetcher.fetch(&request(None)).await;
        assert!(bars.is_empty());
    }

    #[tokio::test]
    async fn test_cursor_filter_drops_old_bars() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(series_with_days(&[1, 2, 3, 4]))]));
        let fetcher = AssetFetcher::new(provider, quick_policy());

        let bars = fetcher.fetch(&request(Some(date(2)))).await;
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|b| b.date > date(2)));
    }
}
