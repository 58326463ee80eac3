//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 대상 자산 수
    pub total: usize,
    /// 새 데이터를 얻은 자산 수
    pub success: usize,
    /// 결과가 유실된 자산 수 (그룹 실패 포함)
    pub errors: usize,
    /// 건너뛴 자산 수 (이미 최신 커서)
    pub skipped: usize,
    /// 빈 결과 자산 수 (조회했으나 새 데이터 없음)
    pub empty: usize,
    /// 스테이징에 추가된 총 Bar 수
    pub total_bars: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            empty = self.empty,
            total_bars = self.total_bars,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
