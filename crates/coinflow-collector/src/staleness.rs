//! 커서 기반 신선도 판정.
//!
//! 자산 테이블을 "이미 최신"과 "오래됨"으로 가르고, 오래된 자산마다
//! 커서 나이에 따라 수집 깊이를 고릅니다. 판정 기준일은 호출자가
//! 주입하므로 테스트에서 시간을 고정할 수 있습니다.

use chrono::NaiveDate;
use tracing::debug;

use coinflow_core::{Asset, FetchDepth, FetchRequest};

/// 신선도 분할 결과.
#[derive(Debug, Default)]
pub struct StalenessPartition {
    /// 커서가 오늘인 자산 (이번 실행에서 건너뜀)
    pub current: Vec<Asset>,
    /// 오래된 자산과 그에 맞는 수집 깊이
    pub stale: Vec<FetchRequest>,
}

/// 자산 테이블을 신선도로 분할합니다.
///
/// - 커서가 `today`와 같으면 최신으로 분류
/// - 커서가 없으면 전체 이력 수집 대상
/// - 커서 나이가 `stale_days` 미만이면 최근 구간만, 이상이면 전체 이력
///
/// 미래 날짜 커서(음수 나이)는 최근 구간 쪽으로 분류됩니다.
pub fn partition(assets: Vec<Asset>, today: NaiveDate, stale_days: i64) -> StalenessPartition {
    let mut partition = StalenessPartition::default();

    for asset in assets {
        match asset.updated_at {
            Some(cursor) if cursor == today => {
                partition.current.push(asset);
            }
            Some(cursor) => {
                let age = (today - cursor).num_days();
                let depth = if age < stale_days {
                    FetchDepth::RecentWindow
                } else {
                    FetchDepth::FullHistory
                };
                partition.stale.push(FetchRequest::new(asset, depth));
            }
            None => {
                partition
                    .stale
                    .push(FetchRequest::new(asset, FetchDepth::FullHistory));
            }
        }
    }

    debug!(
        current = partition.current.len(),
        stale = partition.stale.len(),
        full_history = partition
            .stale
            .iter()
            .filter(|r| r.depth == FetchDepth::FullHistory)
            .count(),
        "신선도 분할 완료"
    );
    partition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn asset(symbol: &str, cursor: Option<NaiveDate>) -> Asset {
        let mut asset = Asset::new(symbol, format!("{} name", symbol));
        asset.updated_at = cursor;
        asset
    }

    #[test]
    fn test_cursor_today_is_current() {
        let part = partition(vec![asset("BTC-USD", Some(today()))], today(), 30);
        assert_eq!(part.current.len(), 1);
        assert!(part.stale.is_empty());
    }

    #[test]
    fn test_no_cursor_gets_full_history() {
        let part = partition(vec![asset("NEW-USD", None)], today(), 30);
        assert_eq!(part.stale.len(), 1);
        assert_eq!(part.stale[0].depth, FetchDepth::FullHistory);
    }

    #[test]
    fn test_recent_cursor_gets_recent_window() {
        // 커서 나이 29일 < 30일
        let cursor = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let part = partition(vec![asset("ETH-USD", Some(cursor))], today(), 30);
        assert_eq!(part.stale.len(), 1);
        assert_eq!(part.stale[0].depth, FetchDepth::RecentWindow);
    }

    #[test]
    fn test_old_cursor_gets_full_history() {
        // 커서 나이 45일 ≥ 30일
        let cursor = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        let part = partition(vec![asset("SOL-USD", Some(cursor))], today(), 30);
        assert_eq!(part.stale.len(), 1);
        assert_eq!(part.stale[0].depth, FetchDepth::FullHistory);
    }

    #[test]
    fn test_boundary_exactly_stale_days() {
        // 나이 == stale_days면 전체 이력
        let cursor = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();
        let part = partition(vec![asset("ADA-USD", Some(cursor))], today(), 30);
        assert_eq!(part.stale[0].depth, FetchDepth::FullHistory);
    }

    #[test]
    fn test_mixed_universe() {
        let assets = vec![
            asset("BTC-USD", Some(today())),
            asset("NEW-USD", None),
            asset("ETH-USD", Some(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap())),
        ];
        let part = partition(assets, today(), 30);
        assert_eq!(part.current.len(), 1);
        assert_eq!(part.stale.len(), 2);
    }
}
