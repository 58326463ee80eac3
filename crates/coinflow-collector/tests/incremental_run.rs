//! 증분 실행 통합 테스트.
//!
//! 데이터베이스 없이 신선도 판정 → 스케줄 → 병합 경로를 mock 제공자로
//! 검증합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use coinflow_collector::merge;
use coinflow_collector::staleness;
use coinflow_core::{Asset, FetchDepth, Interval};
use coinflow_data::{
    AssetFetcher, FetchPolicy, FetchScheduler, HistoryError, HistoryProvider, RawSeries,
    RawValue, SchedulerConfig, StagingArtifact,
};

/// 커서 이후 날짜만 담긴 고정 시계열을 돌려주는 mock 제공자.
struct FixedProvider {
    days: Vec<u32>,
}

#[async_trait]
impl HistoryProvider for FixedProvider {
    async fn history(
        &self,
        _symbol: &str,
        _depth: FetchDepth,
        _interval: Interval,
    ) -> Result<RawSeries, HistoryError> {
        let columns = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let mut series = RawSeries::new(columns);
        for &day in &self.days {
            series.rows.push(vec![
                RawValue::Date(NaiveDate::from_ymd_opt(2024, 3, day).unwrap()),
                RawValue::Float(100.0),
                RawValue::Float(101.0),
                RawValue::Float(99.0),
                RawValue::Float(100.5),
                RawValue::Float(100.5),
                RawValue::Int(1_000),
            ]);
        }
        Ok(series)
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn temp_staging(tag: &str) -> (StagingArtifact, PathBuf) {
    let path = std::env::temp_dir().join(format!(
        "coinflow-itest-{}-{}.csv",
        tag,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    (StagingArtifact::new(&path), path)
}

fn scheduler(days: Vec<u32>) -> FetchScheduler {
    let fetcher = Arc::new(AssetFetcher::new(
        Arc::new(FixedProvider { days }),
        FetchPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
            intervals: Interval::FALLBACK_ORDER.to_vec(),
        },
    ));
    FetchScheduler::new(fetcher, SchedulerConfig::first_pass(4, Duration::ZERO))
}

/// 실행 한 번: 신선도 판정 → 스케줄 → 병합.
async fn run_once(
    assets: Vec<Asset>,
    days: Vec<u32>,
    staging: &StagingArtifact,
) -> (Vec<Asset>, usize, usize) {
    let partition = staleness::partition(assets, today(), 30);
    let fetched_count = partition.stale.len();

    let targets: Vec<String> = partition
        .stale
        .iter()
        .map(|r| r.asset.symbol.clone())
        .collect();

    let mut assets = partition.current;
    assets.extend(partition.stale.iter().map(|r| r.asset.clone()));

    let outcomes = if partition.stale.is_empty() {
        HashMap::new()
    } else {
        scheduler(days).run(partition.stale).await
    };

    let outcome = merge::merge(outcomes, assets, &targets, staging, today()).unwrap();
    (outcome.assets, outcome.appended, fetched_count)
}

#[tokio::test]
async fn test_first_run_backfills_and_second_run_skips() {
    let (staging, path) = temp_staging("two-runs");

    // 첫 실행: 커서 없는 자산 → 전체 이력 3개 Bar, 커서가 오늘로 전진
    let assets = vec![Asset::new("BTC-USD", "Bitcoin USD")];
    let (assets, appended, fetched) = run_once(assets, vec![12, 13, 14], &staging).await;

    assert_eq!(fetched, 1);
    assert_eq!(appended, 3);
    assert_eq!(assets[0].updated_at, Some(today()));
    assert_eq!(staging.read_all().unwrap().len(), 3);

    // 두 번째 실행: 커서가 오늘 → 페치 없음, 아티팩트 그대로
    let (assets, appended, fetched) = run_once(assets, vec![12, 13, 14], &staging).await;

    assert_eq!(fetched, 0);
    assert_eq!(appended, 0);
    assert_eq!(assets[0].updated_at, Some(today()));
    assert_eq!(staging.read_all().unwrap().len(), 3);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_incremental_run_appends_only_after_cursor() {
    let (staging, path) = temp_staging("incremental");

    // 커서가 3/12인 자산: 제공자는 3/10~3/14를 돌려주지만 3/13, 3/14만 병합됨
    let mut asset = Asset::new("ETH-USD", "Ethereum USD");
    asset.updated_at = Some(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());

    let (assets, appended, _) = run_once(vec![asset], vec![10, 11, 12, 13, 14], &staging).await;

    assert_eq!(appended, 2);
    assert_eq!(assets[0].updated_at, Some(today()));

    let bars = staging.read_all().unwrap();
    assert_eq!(bars.len(), 2);
    assert!(bars
        .iter()
        .all(|b| b.date > NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()));
    assert!(bars.iter().all(|b| b.adj_close > Decimal::ZERO));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_mixed_universe_only_stale_assets_fetched() {
    let (staging, path) = temp_staging("mixed");

    let fresh = {
        let mut a = Asset::new("BTC-USD", "Bitcoin USD");
        a.updated_at = Some(today());
        a
    };
    let stale = Asset::new("NEW-USD", "Newcoin USD");

    let (assets, appended, fetched) = run_once(vec![fresh, stale], vec![14], &staging).await;

    assert_eq!(fetched, 1);
    assert_eq!(appended, 1);

    let by_symbol: HashMap<&str, &Asset> =
        assets.iter().map(|a| (a.symbol.as_str(), a)).collect();
    assert_eq!(by_symbol["BTC-USD"].updated_at, Some(today()));
    assert_eq!(by_symbol["NEW-USD"].updated_at, Some(today()));

    let bars = staging.read_all().unwrap();
    assert!(bars.iter().all(|b| b.symbol == "NEW-USD"));

    let _ = std::fs::remove_file(&path);
}
