//! End-to-end pipeline runs against scripted detectors and synthetic
//! video, covering the counting invariants.

use std::sync::atomic::AtomicBool;

use footfall::detect::backends::{ScriptedBackend, ScriptedCall};
use footfall::{
    DetectSettings, FrameSink, Labels, Pipeline, RawPrediction, SourceConfig, VideoSource,
};

const FRAME_SIZE: u32 = 200;

fn source(frames: u64) -> VideoSource {
    VideoSource::open(SourceConfig {
        path: "stub://test".into(),
        stub_frames: frames,
        stub_width: FRAME_SIZE,
        stub_height: FRAME_SIZE,
        ..SourceConfig::default()
    })
    .expect("open synthetic source")
}

fn labels() -> Labels {
    Labels::from_lines(["person", "bicycle"]).expect("labels")
}

fn settings() -> DetectSettings {
    DetectSettings::default()
}

/// A person box whose pixel extent is y0..y1 in a 200-tall frame.
fn person(y0: f32, y1: f32) -> RawPrediction {
    let h = (y1 - y0) / FRAME_SIZE as f32;
    let cy = (y0 + (y1 - y0) / 2.0) / FRAME_SIZE as f32;
    RawPrediction {
        cx: 0.5,
        cy,
        w: 0.2,
        h,
        scores: vec![0.9, 0.0],
    }
}

fn bicycle(y0: f32, y1: f32) -> RawPrediction {
    let mut pred = person(y0, y1);
    pred.scores = vec![0.0, 0.9];
    pred
}

fn run(frames: u64, script: Vec<ScriptedCall>) -> (footfall::Report, Vec<(u64, u32, u32)>) {
    let backend = Box::new(ScriptedBackend::new(script));
    let mut pipeline = Pipeline::new(
        source(frames),
        FrameSink::collecting(20),
        backend,
        &labels(),
        settings(),
    )
    .expect("assemble pipeline");
    let report = pipeline.run(&AtomicBool::new(false)).expect("run");
    let written = pipeline.sink().written().to_vec();
    (report, written)
}

#[test]
fn one_frame_top_and_bottom_person() {
    // One person entirely in the top half, one entirely in the bottom.
    let script = vec![ScriptedCall::Emit(vec![
        person(0.0, 50.0),
        person(150.0, 199.0),
    ])];
    let (report, _) = run(1, script);
    assert_eq!(report.entered, 1);
    assert_eq!(report.exited, 1);
    assert_eq!(report.frames_processed, 1);
    assert_eq!(report.frames_skipped, 0);
}

#[test]
fn empty_video_reaches_done_with_zero_tally() {
    let (report, written) = run(0, vec![]);
    assert_eq!(report.entered, 0);
    assert_eq!(report.exited, 0);
    assert_eq!(report.frames_processed, 0);
    assert!(written.is_empty());
}

#[test]
fn detector_failure_skips_frame_without_breaking_the_run() {
    let script = vec![
        ScriptedCall::Emit(vec![person(0.0, 50.0)]),
        ScriptedCall::Fail("inference backend crashed".into()),
        ScriptedCall::Emit(vec![person(150.0, 199.0)]),
    ];
    let (report, written) = run(3, script);
    assert_eq!(report.entered, 1);
    assert_eq!(report.exited, 1);
    assert_eq!(report.frames_processed, 2);
    assert_eq!(report.frames_skipped, 1);
    // The skipped frame is still emitted, in temporal order.
    let indices: Vec<u64> = written.iter().map(|f| f.0).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn tally_equals_surviving_person_detections() {
    // Disjoint person boxes survive NMS untouched; bicycles never
    // count. 2 + 0 + 3 person detections across three frames.
    let script = vec![
        ScriptedCall::Emit(vec![person(0.0, 30.0), person(160.0, 190.0)]),
        ScriptedCall::Emit(vec![bicycle(0.0, 30.0)]),
        ScriptedCall::Emit(vec![
            person(0.0, 20.0),
            person(40.0, 60.0),
            person(170.0, 199.0),
        ]),
    ];
    let (report, _) = run(3, script);
    assert_eq!(report.entered + report.exited, 5);
}

#[test]
fn overlapping_person_boxes_count_once() {
    // Two fully overlapping person candidates collapse to one count.
    let mut duplicate = person(0.0, 50.0);
    duplicate.scores = vec![0.6, 0.0];
    let script = vec![ScriptedCall::Emit(vec![person(0.0, 50.0), duplicate])];
    let (report, _) = run(1, script);
    assert_eq!(report.entered, 1);
    assert_eq!(report.exited, 0);
}

#[test]
fn below_threshold_predictions_never_count() {
    let mut faint = person(0.0, 50.0);
    faint.scores = vec![0.5, 0.0]; // not strictly above the 0.5 default
    let script = vec![ScriptedCall::Emit(vec![faint])];
    let (report, _) = run(1, script);
    assert_eq!(report.entered + report.exited, 0);
}

#[test]
fn stop_flag_ends_run_between_frames() {
    let backend = Box::new(ScriptedBackend::new(vec![ScriptedCall::Emit(vec![
        person(0.0, 50.0),
    ])]));
    let mut pipeline = Pipeline::new(
        source(10),
        FrameSink::collecting(20),
        backend,
        &labels(),
        settings(),
    )
    .expect("assemble pipeline");
    let stop = AtomicBool::new(true);
    let report = pipeline.run(&stop).expect("run");
    assert_eq!(report.frames_processed, 0);
    assert_eq!(report.entered + report.exited, 0);
}

#[test]
fn unknown_target_class_fails_at_init() {
    let backend = Box::new(ScriptedBackend::new(vec![]));
    let result = Pipeline::new(
        source(1),
        FrameSink::null(20),
        backend,
        &labels(),
        DetectSettings {
            target_class: "unicorn".into(),
            ..DetectSettings::default()
        },
    );
    assert!(result.is_err());
}
