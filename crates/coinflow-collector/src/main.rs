//! Standalone incremental OHLCV collector CLI.

use clap::{Parser, Subcommand};
use std::sync::Arc;

use coinflow_core::logging::{init_logging, LogConfig};

use coinflow_collector::stages::{
    run_pipeline, BackfillStage, DiscoverStage, LoadStage, RepairStage, Stage, StageContext,
};
use coinflow_collector::{CollectorConfig, CollectorError};
use coinflow_data::{MetadataStore, YahooHistoryProvider};

#[derive(Parser)]
#[command(name = "coinflow-collector")]
#[command(about = "CoinFlow Incremental Data Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 스크리너로 자산 유니버스를 갱신
    Discover,

    /// 저장된 유니버스에 대해 백필/보수/적재 실행
    Collect {
        /// 특정 심볼만 수집 (쉼표로 구분, 예: "BTC-USD,ETH-USD")
        #[arg(long)]
        symbols: Option<String>,
    },

    /// 전체 워크플로우 실행 (발견 → 백필 → 보수 → 적재)
    RunAll,

    /// 데몬 모드: 주기적으로 전체 워크플로우 실행
    Daemon,
}

fn full_pipeline() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(DiscoverStage),
        Box::new(BackfillStage),
        Box::new(RepairStage),
        Box::new(LoadStage),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화 (RUST_LOG가 있으면 그쪽이 우선)
    let log_config = LogConfig::from_env();
    init_logging(LogConfig {
        level: format!("coinflow_collector={}", cli.log_level),
        ..log_config
    })?;

    tracing::info!("CoinFlow Data Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(staging = %config.staging_path, "설정 로드 완료");

    // DB 연결
    let pool = sqlx::PgPool::connect(&config.database_url).await?;
    tracing::info!("데이터베이스 연결 성공");

    let provider = Arc::new(
        YahooHistoryProvider::new()
            .map_err(|e| CollectorError::DataSource(e.to_string()))?,
    );
    let ctx = StageContext::new(pool.clone(), config.clone(), provider);

    // 명령 실행
    match cli.command {
        Commands::Discover => {
            let stages: Vec<Box<dyn Stage>> =
                vec![Box::new(DiscoverStage), Box::new(LoadStage)];
            let assets = run_pipeline(&ctx, &stages, Vec::new()).await?;
            tracing::info!(assets = assets.len(), "유니버스 갱신 완료");
        }
        Commands::Collect { symbols } => {
            let store = MetadataStore::new(pool.clone());
            let mut assets = store.load_assets().await.map_err(CollectorError::from)?;

            if let Some(filter) = symbols {
                let wanted: Vec<&str> = filter.split(',').map(str::trim).collect();
                assets.retain(|a| wanted.contains(&a.symbol.as_str()));
                tracing::info!(assets = assets.len(), "심볼 필터 적용");
            }

            let stages: Vec<Box<dyn Stage>> = vec![
                Box::new(BackfillStage),
                Box::new(RepairStage),
                Box::new(LoadStage),
            ];
            run_pipeline(&ctx, &stages, assets).await?;
        }
        Commands::RunAll => {
            tracing::info!("=== 전체 워크플로우 시작 ===");
            run_pipeline(&ctx, &full_pipeline(), Vec::new()).await?;
            tracing::info!("=== 전체 워크플로우 완료 ===");
        }
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::info!("=== 워크플로우 실행 시작 ===");

                        match run_pipeline(&ctx, &full_pipeline(), Vec::new()).await {
                            Ok(assets) => {
                                tracing::info!(assets = assets.len(), "워크플로우 완료");
                            }
                            Err(e) => {
                                tracing::error!("워크플로우 실패: {}", e);
                            }
                        }

                        tracing::info!(
                            "=== 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
    }

    pool.close().await;
    tracing::info!("CoinFlow Data Collector 종료");

    Ok(())
}
