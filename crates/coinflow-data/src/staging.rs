//! append-only 스테이징 아티팩트.
//!
//! 실행마다 수집된 Bar를 CSV 파일에 누적합니다. 파일은 다시 쓰이지 않고
//! 추가만 됩니다. 헤더는 파일 생성 시 한 번만 기록되며, 이 파일이
//! 벌크 로더의 내구성 있는 입력이 됩니다.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

use coinflow_core::Bar;

use crate::error::Result;

/// append-only CSV 스테이징 아티팩트.
#[derive(Debug, Clone)]
pub struct StagingArtifact {
    path: PathBuf,
}

impl StagingArtifact {
    /// 지정한 경로의 아티팩트 핸들을 생성합니다. 파일은 첫 append 때 만들어집니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 아티팩트 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 파일이 이미 존재하면 true.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Bar들을 아티팩트 끝에 추가합니다.
    ///
    /// 첫 쓰기에서만 헤더를 기록합니다. 빈 입력이면 파일을 건드리지
    /// 않습니다. 추가된 행 수를 반환합니다.
    pub fn append(&self, bars: &[Bar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);

        for bar in bars {
            writer.serialize(bar)?;
        }
        writer.flush()?;

        debug!(
            path = %self.path.display(),
            rows = bars.len(),
            header = write_header,
            "스테이징 아티팩트 추가 완료"
        );
        Ok(bars.len())
    }

    /// 아티팩트 전체를 읽어 Bar 목록으로 반환합니다.
    ///
    /// 파일이 없으면 빈 목록을 반환합니다.
    pub fn read_all(&self) -> Result<Vec<Bar>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut bars = Vec::new();
        for record in reader.deserialize() {
            bars.push(record?);
        }
        Ok(bars)
    }
}
