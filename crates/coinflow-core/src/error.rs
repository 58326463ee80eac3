//! 코어 오류 타입.

use thiserror::Error;

/// 코어 도메인 오류.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 알 수 없는 샘플링 간격 문자열
    #[error("Unknown interval: {0}")]
    InvalidInterval(String),

    /// 알 수 없는 페치 범위 문자열
    #[error("Unknown fetch depth: {0}")]
    InvalidDepth(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
