//! footfall - count people entering and exiting across a zone boundary
//!
//! Reads a video, runs the configured detector per frame, tallies
//! entries and exits against the boundary line, and writes annotated
//! frames. Final totals are printed when the stream ends or on
//! Ctrl-C.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;

use footfall::detect::backends::StubBackend;
use footfall::{
    DetectorBackend, FootfallConfig, FrameSink, Labels, Pipeline, SourceConfig, VideoSource,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video input path, or stub://<name> for the synthetic source.
    #[arg(long, env = "FOOTFALL_INPUT")]
    input: Option<String>,
    /// Directory for annotated output frames (omit to discard).
    #[arg(long)]
    output_dir: Option<String>,
    /// Newline-delimited class names file.
    #[arg(long)]
    labels: Option<String>,
    /// Detector backend (stub|tract).
    #[arg(long)]
    backend: Option<String>,
    /// ONNX model path (tract backend).
    #[arg(long)]
    model: Option<String>,
    /// Detection confidence threshold.
    #[arg(long)]
    confidence_threshold: Option<f32>,
    /// NMS overlap threshold.
    #[arg(long)]
    iou_threshold: Option<f32>,
    /// Class label that participates in counting.
    #[arg(long)]
    target_class: Option<String>,
    /// Boundary line as a fraction of frame height.
    #[arg(long)]
    zone_boundary_fraction: Option<f32>,
    /// Frame count for the synthetic source.
    #[arg(long)]
    stub_frames: Option<u64>,
    /// UI mode for stderr progress (auto|plain|pretty).
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty);

    let cfg = {
        let _stage = ui.stage("Load configuration");
        apply_args(FootfallConfig::load()?, &args)?
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            log::info!("interrupt received, finishing current frame");
            stop.store(true, Ordering::Relaxed);
        })?;
    }

    let labels = {
        let _stage = ui.stage("Load labels");
        load_labels(&cfg)?
    };

    let backend = {
        let _stage = ui.stage("Load detector");
        build_backend(&cfg)?
    };

    let mut pipeline = {
        let _stage = ui.stage("Open video");
        let source = VideoSource::open(SourceConfig {
            path: cfg.input.clone(),
            target_fps: cfg.target_fps,
            stub_frames: cfg.stub_frames,
            ..SourceConfig::default()
        })?;
        let sink = build_sink(&cfg)?;
        Pipeline::new(source, sink, backend, &labels, cfg.detect.clone())?
    };

    let report = {
        let _stage = ui.stage("Process video");
        pipeline.run(&stop)?
    };

    println!(
        "People entered: {}, People exited: {}",
        report.entered, report.exited
    );
    if report.frames_skipped > 0 {
        println!(
            "({} of {} frame(s) skipped after detector failures)",
            report.frames_skipped,
            report.frames_processed + report.frames_skipped
        );
    }
    Ok(())
}

/// CLI flags override the config file and env.
fn apply_args(mut cfg: FootfallConfig, args: &Args) -> Result<FootfallConfig> {
    if let Some(input) = &args.input {
        cfg.input = input.clone();
    }
    if let Some(dir) = &args.output_dir {
        cfg.output_dir = Some(dir.clone());
    }
    if let Some(labels) = &args.labels {
        cfg.labels = Some(labels.clone());
    }
    if let Some(backend) = &args.backend {
        cfg.backend = backend.clone();
    }
    if let Some(model) = &args.model {
        cfg.model.path = Some(model.clone());
    }
    if let Some(v) = args.confidence_threshold {
        cfg.detect.confidence_threshold = v;
    }
    if let Some(v) = args.iou_threshold {
        cfg.detect.iou_threshold = v;
    }
    if let Some(class) = &args.target_class {
        cfg.detect.target_class = class.clone();
    }
    if let Some(v) = args.zone_boundary_fraction {
        cfg.detect.zone_boundary_fraction = v;
    }
    if let Some(v) = args.stub_frames {
        cfg.stub_frames = v;
    }
    Ok(cfg)
}

fn load_labels(cfg: &FootfallConfig) -> Result<Labels> {
    match &cfg.labels {
        Some(path) => Labels::from_file(path),
        // Stub runs use the stub backend's single-class vocabulary.
        None if cfg.backend == "stub" => Labels::from_lines(["person"]),
        None => Err(anyhow!("backend '{}' requires --labels", cfg.backend)),
    }
}

fn build_backend(cfg: &FootfallConfig) -> Result<Box<dyn DetectorBackend>> {
    match cfg.backend.as_str() {
        "stub" => Ok(Box::new(StubBackend::new())),
        #[cfg(feature = "backend-tract")]
        "tract" => {
            let path = cfg
                .model
                .path
                .as_ref()
                .ok_or_else(|| anyhow!("backend 'tract' requires a model path"))?;
            Ok(Box::new(footfall::detect::backends::TractBackend::new(
                path,
                cfg.model.input_width,
                cfg.model.input_height,
            )?))
        }
        #[cfg(not(feature = "backend-tract"))]
        "tract" => Err(anyhow!(
            "backend 'tract' requires the backend-tract feature"
        )),
        other => Err(anyhow!("unknown backend '{}'", other)),
    }
}

fn build_sink(cfg: &FootfallConfig) -> Result<FrameSink> {
    match &cfg.output_dir {
        None => Ok(FrameSink::null(cfg.target_fps)),
        #[cfg(feature = "sink-image")]
        Some(dir) => FrameSink::image_dir(dir, cfg.target_fps),
        #[cfg(not(feature = "sink-image"))]
        Some(_) => Err(anyhow!(
            "writing annotated frames requires the sink-image feature"
        )),
    }
}
