//! 환경변수 기반 설정 모듈.

use crate::Result;
use std::time::Duration;

use coinflow_core::Interval;
use coinflow_data::{FetchPolicy, SchedulerConfig, ScreenerConfig};
use rust_decimal::Decimal;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 유니버스 발견 설정
    pub discovery: DiscoveryConfig,
    /// 페치 설정 (재시도/지연/풀 크기 통합)
    pub fetch: FetchConfig,
    /// 스테이징 아티팩트 경로
    pub staging_path: String,
    /// 벌크 로더 설정
    pub loader: LoaderConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 유니버스 발견 설정
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// 스크리너에서 조회할 전체 코인 수
    pub total_coins: usize,
    /// 페이지당 코인 수
    pub page_size: usize,
    /// 24시간 최소 거래량
    pub min_volume: i64,
}

/// 페치 설정.
///
/// 호출부마다 흩어져 있기 쉬운 재시도/지연 상수를 한 구조체로 모아
/// 스케줄러와 페처에 명시적으로 전달합니다.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 자산당 최대 시도 횟수
    pub max_attempts: u32,
    /// 요청 제한 신호 후 대기 시간 (밀리초)
    pub backoff_ms: u64,
    /// 그룹 내 자산 간 간격 (밀리초)
    pub pacing_ms: u64,
    /// 커서가 이 일수 이상 오래되면 전체 이력 재수집
    pub stale_days: i64,
    /// 첫 패스 동시 그룹 수
    pub first_pass_workers: usize,
    /// 보수 패스 동시 그룹 수
    pub repair_workers: usize,
    /// 보수 패스 그룹당 자산 수
    pub repair_group_size: usize,
}

/// 벌크 로더 설정
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// COPY 경로 전환 임계 행 수
    pub copy_threshold: usize,
    /// OHLCV 대상 테이블명
    pub ohlcv_table: String,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            crate::error::CollectorError::Config(
                "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        Ok(Self {
            database_url,
            discovery: DiscoveryConfig {
                total_coins: env_var_parse("DISCOVERY_TOTAL_COINS", 1300),
                page_size: env_var_parse("DISCOVERY_PAGE_SIZE", 100),
                min_volume: env_var_parse("DISCOVERY_MIN_VOLUME", 100_000),
            },
            fetch: FetchConfig {
                max_attempts: env_var_parse("FETCH_MAX_ATTEMPTS", 3),
                backoff_ms: env_var_parse("FETCH_BACKOFF_MS", 1_000),
                pacing_ms: env_var_parse("FETCH_PACING_MS", 150),
                stale_days: env_var_parse("FETCH_STALE_DAYS", 30),
                first_pass_workers: env_var_parse("FETCH_FIRST_PASS_WORKERS", 70),
                repair_workers: env_var_parse("FETCH_REPAIR_WORKERS", 10),
                repair_group_size: env_var_parse("FETCH_REPAIR_GROUP_SIZE", 100),
            },
            staging_path: std::env::var("STAGING_PATH")
                .unwrap_or_else(|_| "data/data_to_add.csv".to_string()),
            loader: LoaderConfig {
                copy_threshold: env_var_parse("LOADER_COPY_THRESHOLD", 700_000),
                ohlcv_table: std::env::var("LOADER_OHLCV_TABLE")
                    .unwrap_or_else(|_| "ohlcv_data".to_string()),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 60),
            },
        })
    }
}

impl DiscoveryConfig {
    /// 스크리너 설정으로 변환
    pub fn screener_config(&self) -> ScreenerConfig {
        ScreenerConfig {
            total_coins: self.total_coins,
            page_size: self.page_size,
            min_volume: Decimal::from(self.min_volume),
        }
    }
}

impl FetchConfig {
    /// 요청 제한 백오프를 Duration으로 반환
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// 자산 간 간격을 Duration으로 반환
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// 페처 정책으로 변환
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff(),
            intervals: Interval::FALLBACK_ORDER.to_vec(),
        }
    }

    /// 첫 패스 스케줄러 설정
    pub fn first_pass_scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::first_pass(self.first_pass_workers, self.pacing())
    }

    /// 보수 패스 스케줄러 설정
    pub fn repair_pass_scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::repair_pass(self.repair_workers, self.repair_group_size, self.pacing())
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_parse_default() {
        assert_eq!(env_var_parse("COINFLOW_TEST_MISSING_KEY", 42), 42);
    }

    #[test]
    fn test_discovery_screener_config() {
        let discovery = DiscoveryConfig {
            total_coins: 1300,
            page_size: 100,
            min_volume: 100_000,
        };
        let screener = discovery.screener_config();
        assert_eq!(screener.total_coins, 1300);
        assert_eq!(screener.min_volume, Decimal::from(100_000));
    }

    #[test]
    fn test_fetch_config_durations() {
        let fetch = FetchConfig {
            max_attempts: 3,
            backoff_ms: 1_000,
            pacing_ms: 150,
            stale_days: 30,
            first_pass_workers: 70,
            repair_workers: 10,
            repair_group_size: 100,
        };
        assert_eq!(fetch.backoff(), Duration::from_secs(1));
        assert_eq!(fetch.pacing(), Duration::from_millis(150));
        assert_eq!(fetch.fetch_policy().max_attempts, 3);
    }
}
