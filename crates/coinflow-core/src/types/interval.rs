//! 시계열 샘플링 간격 정의.
//!
//! 제공자가 요청을 거부하면 점점 더 성긴 간격으로 폴백합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 샘플링 간격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// 일봉
    D1,
    /// 5일봉
    D5,
    /// 주봉
    W1,
    /// 월봉
    Mn1,
}

impl Interval {
    /// 폴백 우선순위 (세밀한 간격부터 성긴 간격 순).
    pub const FALLBACK_ORDER: [Interval; 4] =
        [Interval::D1, Interval::D5, Interval::W1, Interval::Mn1];

    /// 제공자 API에 전달할 간격 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::D1 => "1d",
            Interval::D5 => "5d",
            Interval::W1 => "1wk",
            Interval::Mn1 => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Interval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Interval::D1),
            "5d" => Ok(Interval::D5),
            "1wk" => Ok(Interval::W1),
            "1mo" => Ok(Interval::Mn1),
            other => Err(CoreError::InvalidInterval(other.to_string())),
        }
    }
}
