use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_INPUT: &str = "stub://demo";
const DEFAULT_TARGET_FPS: u32 = 20;
const DEFAULT_STUB_FRAMES: u64 = 100;
const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_MODEL_INPUT_SIZE: u32 = 416;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_IOU_THRESHOLD: f32 = 0.4;
const DEFAULT_TARGET_CLASS: &str = "person";
const DEFAULT_BOUNDARY_FRACTION: f32 = 0.5;

#[derive(Debug, Deserialize, Default)]
struct FootfallConfigFile {
    input: Option<String>,
    target_fps: Option<u32>,
    stub_frames: Option<u64>,
    output_dir: Option<String>,
    labels: Option<String>,
    backend: Option<String>,
    model: Option<ModelConfigFile>,
    detect: Option<DetectConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<String>,
    input_width: Option<u32>,
    input_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectConfigFile {
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
    target_class: Option<String>,
    zone_boundary_fraction: Option<f32>,
}

/// Resolved run configuration.
#[derive(Debug, Clone)]
pub struct FootfallConfig {
    /// Video input path (`stub://` for the synthetic source).
    pub input: String,
    pub target_fps: u32,
    /// Frame count for the synthetic source.
    pub stub_frames: u64,
    /// Annotated-frame output directory; `None` discards output.
    pub output_dir: Option<String>,
    /// Newline-delimited labels file; `None` uses the stub vocabulary.
    pub labels: Option<String>,
    /// Detector backend name ("stub" or "tract").
    pub backend: String,
    pub model: ModelSettings,
    pub detect: DetectSettings,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub path: Option<String>,
    pub input_width: u32,
    pub input_height: u32,
}

#[derive(Debug, Clone)]
pub struct DetectSettings {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub target_class: String,
    pub zone_boundary_fraction: f32,
}

impl Default for DetectSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            target_class: DEFAULT_TARGET_CLASS.to_string(),
            zone_boundary_fraction: DEFAULT_BOUNDARY_FRACTION,
        }
    }
}

impl Default for FootfallConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT.to_string(),
            target_fps: DEFAULT_TARGET_FPS,
            stub_frames: DEFAULT_STUB_FRAMES,
            output_dir: None,
            labels: None,
            backend: DEFAULT_BACKEND.to_string(),
            model: ModelSettings {
                path: None,
                input_width: DEFAULT_MODEL_INPUT_SIZE,
                input_height: DEFAULT_MODEL_INPUT_SIZE,
            },
            detect: DetectSettings::default(),
        }
    }
}

impl FootfallConfig {
    /// Load configuration: optional JSON file named by
    /// `FOOTFALL_CONFIG`, then `FOOTFALL_*` env overrides, then
    /// validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FOOTFALL_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: FootfallConfigFile) -> Self {
        let defaults = Self::default();
        let model = file.model.unwrap_or_default();
        let detect = file.detect.unwrap_or_default();
        Self {
            input: file.input.unwrap_or(defaults.input),
            target_fps: file.target_fps.unwrap_or(defaults.target_fps),
            stub_frames: file.stub_frames.unwrap_or(defaults.stub_frames),
            output_dir: file.output_dir,
            labels: file.labels,
            backend: file.backend.unwrap_or(defaults.backend),
            model: ModelSettings {
                path: model.path,
                input_width: model.input_width.unwrap_or(defaults.model.input_width),
                input_height: model.input_height.unwrap_or(defaults.model.input_height),
            },
            detect: DetectSettings {
                confidence_threshold: detect
                    .confidence_threshold
                    .unwrap_or(defaults.detect.confidence_threshold),
                iou_threshold: detect
                    .iou_threshold
                    .unwrap_or(defaults.detect.iou_threshold),
                target_class: detect
                    .target_class
                    .unwrap_or(defaults.detect.target_class),
                zone_boundary_fraction: detect
                    .zone_boundary_fraction
                    .unwrap_or(defaults.detect.zone_boundary_fraction),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(input) = std::env::var("FOOTFALL_INPUT") {
            if !input.trim().is_empty() {
                self.input = input;
            }
        }
        if let Ok(dir) = std::env::var("FOOTFALL_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output_dir = Some(dir);
            }
        }
        if let Ok(labels) = std::env::var("FOOTFALL_LABELS") {
            if !labels.trim().is_empty() {
                self.labels = Some(labels);
            }
        }
        if let Ok(backend) = std::env::var("FOOTFALL_BACKEND") {
            if !backend.trim().is_empty() {
                self.backend = backend;
            }
        }
        if let Ok(target_class) = std::env::var("FOOTFALL_TARGET_CLASS") {
            if !target_class.trim().is_empty() {
                self.detect.target_class = target_class;
            }
        }
        if let Ok(threshold) = std::env::var("FOOTFALL_CONFIDENCE_THRESHOLD") {
            self.detect.confidence_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("FOOTFALL_CONFIDENCE_THRESHOLD must be a number"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detect.confidence_threshold) {
            return Err(anyhow!("confidence_threshold must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.detect.iou_threshold) {
            return Err(anyhow!("iou_threshold must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.detect.zone_boundary_fraction) {
            return Err(anyhow!("zone_boundary_fraction must be in [0, 1]"));
        }
        if self.detect.target_class.trim().is_empty() {
            return Err(anyhow!("target_class must not be empty"));
        }
        match self.backend.as_str() {
            "stub" => {}
            "tract" => {
                if self.model.path.is_none() {
                    return Err(anyhow!("backend 'tract' requires model.path"));
                }
            }
            other => return Err(anyhow!("unknown backend '{}'", other)),
        }
        if self.target_fps == 0 {
            return Err(anyhow!("target_fps must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<FootfallConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
