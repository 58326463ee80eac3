//! 페치 결과 병합과 커서 전진.
//!
//! 스케줄러가 돌려준 자산별 결과를 스테이징 아티팩트에 이어 붙이고,
//! 새 데이터를 얻은 자산의 커서만 기준일로 전진시킵니다. 빈 결과나
//! 유실된 결과의 커서는 그대로 두어 다음 실행에서 다시 시도됩니다.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info};

use coinflow_core::{Asset, Bar};
use coinflow_data::StagingArtifact;

use crate::Result;

/// 병합 결과.
#[derive(Debug)]
pub struct MergeOutcome {
    /// 커서가 갱신된 자산 테이블 (입력 순서 유지)
    pub assets: Vec<Asset>,
    /// 스테이징에 추가된 Bar 수
    pub appended: usize,
    /// 새 데이터를 얻은 자산 수
    pub fetched: usize,
    /// 빈 결과 자산 수
    pub empty: usize,
    /// 결과가 유실된 자산 수
    pub lost: usize,
}

/// 페치 결과를 스테이징에 병합하고 커서를 전진시킵니다.
///
/// `targets`는 이번 실행에서 페치를 시도한 심볼 집합입니다. 결과 맵에
/// 없는 대상 심볼은 그룹 실패로 유실된 것으로 집계합니다. 대상이 아닌
/// 자산(이미 최신)은 커서를 건드리지 않고 그대로 통과합니다.
pub fn merge(
    mut outcomes: HashMap<String, Vec<Bar>>,
    assets: Vec<Asset>,
    targets: &[String],
    staging: &StagingArtifact,
    today: NaiveDate,
) -> Result<MergeOutcome> {
    let target_set: std::collections::HashSet<&str> =
        targets.iter().map(String::as_str).collect();

    let mut pending: Vec<Bar> = Vec::new();
    let mut fetched = 0usize;
    let mut empty = 0usize;
    let mut lost = 0usize;

    let assets: Vec<Asset> = assets
        .into_iter()
        .map(|mut asset| {
            if !target_set.contains(asset.symbol.as_str()) {
                return asset;
            }
            match outcomes.remove(&asset.symbol) {
                Some(bars) if !bars.is_empty() => {
                    debug!(symbol = %asset.symbol, bars = bars.len(), "새 데이터 병합");
                    pending.extend(bars);
                    asset.updated_at = Some(today);
                    fetched += 1;
                }
                Some(_) => {
                    // 빈 결과: 커서 미전진, 다음 실행에서 재시도
                    empty += 1;
                }
                None => {
                    debug!(symbol = %asset.symbol, "결과 유실, 커서 유지");
                    lost += 1;
                }
            }
            asset
        })
        .collect();

    // 빈 입력이면 아티팩트를 건드리지 않음
    let appended = staging.append(&pending)?;

    info!(
        appended,
        fetched, empty, lost,
        "병합 완료"
    );

    Ok(MergeOutcome {
        assets,
        appended,
        fetched,
        empty,
        lost,
    })
}
