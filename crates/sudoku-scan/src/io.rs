//! JSON configuration and report helpers.

use crate::core::{DetectionResult, RoiRect, RoiSpec};
use crate::grid::{CornerSource, Grid, GridDetectorParams, GridExtractorParams};
use crate::scan::SudokuScanner;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ScanIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Scanner parameters as stored on disk. Missing sections use defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub detector: GridDetectorParams,
    #[serde(default)]
    pub extractor: GridExtractorParams,
    #[serde(default)]
    pub roi: Option<RoiSpec>,
}

impl ScanConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScanIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ScanIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn build_scanner(&self) -> SudokuScanner {
        SudokuScanner::new(self.detector.clone(), self.extractor.clone())
    }
}

/// Shape of an extracted grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSummary {
    pub cell_size: usize,
    pub cell_count: usize,
    /// Length of the flat cell buffer.
    pub buffer_len: usize,
}

impl From<&Grid> for GridSummary {
    fn from(grid: &Grid) -> Self {
        Self {
            cell_size: grid.cell_size(),
            cell_count: grid.cells().len(),
            buffer_len: grid.cells().len() * grid.cell_size() * grid.cell_size(),
        }
    }
}

/// Corner estimation method, as written to reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerMethod {
    Polygon,
    Extremes,
}

impl From<CornerSource> for CornerMethod {
    fn from(source: CornerSource) -> Self {
        match source {
            CornerSource::Polygon => Self::Polygon,
            CornerSource::Extremes => Self::Extremes,
        }
    }
}

/// What a single scan produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub image_path: String,
    #[serde(default)]
    pub image_width: usize,
    #[serde(default)]
    pub image_height: usize,
    #[serde(default)]
    pub roi: Option<RoiRect>,
    #[serde(default)]
    pub detection: Option<DetectionResult>,
    #[serde(default)]
    pub corner_method: Option<CornerMethod>,
    #[serde(default)]
    pub grid: Option<GridSummary>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ScanReport {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            ..Self::default()
        }
    }

    /// Load a JSON report from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScanIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ScanIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_threshold_section_parses() {
        let cfg: ScanConfig =
            serde_json::from_str(r#"{ "detector": { "threshold": { "bias": 15 } } }"#)
                .expect("parse");
        assert_eq!(cfg.detector.threshold.bias, 15);
        assert_eq!(cfg.detector.threshold.block_size, 69);
        assert_eq!(
            cfg.detector.min_area_frac,
            GridDetectorParams::default().min_area_frac
        );
    }

    #[test]
    fn config_sections_default_when_missing() {
        let cfg: ScanConfig = serde_json::from_str(
            r#"{ "roi": { "mode": "fixed", "size_px": 300, "offset_px": -20 } }"#,
        )
        .expect("parse");
        assert_eq!(cfg.detector, GridDetectorParams::default());
        assert_eq!(cfg.extractor, GridExtractorParams::default());
        assert_eq!(
            cfg.roi,
            Some(RoiSpec::Fixed {
                size_px: 300,
                offset_px: -20
            })
        );
    }

    #[test]
    fn config_survives_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scan.json");
        let mut cfg = ScanConfig::default();
        cfg.extractor.rectified_size = 270;
        cfg.write_json(&path).expect("write");
        assert_eq!(ScanConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn report_serializes_corner_method() {
        let mut report = ScanReport::new("board.png");
        report.corner_method = Some(CornerSource::Extremes.into());
        let json = serde_json::to_string(&report).expect("json");
        assert!(json.contains(r#""corner_method":"extremes""#));
    }
}
