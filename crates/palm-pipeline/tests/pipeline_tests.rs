mod common;

use common::*;
use palm_base::{Allocator, CancelToken};
use palm_pipeline::{PipelineConfig, Step};
use std::time::Duration;

#[tokio::test]
async fn test_step_recognizes_gestures() {
    let allocator = Allocator::new(1 << 20, 1 << 20);
    let mut pipeline = pipeline(
        vec![Some(jpeg(320, 240))],
        ScriptedDetector::always(vec![hand()]),
        FixedClassifier::new(open_palm_and_fist()),
        allocator.clone(),
    );

    let step = pipeline.step().await;

    assert_eq!(step, Step::Recognized(open_palm_and_fist()));
    assert_eq!(pipeline.frame(), 1);
    assert_eq!(pipeline.detector().last_size, Some((224, 224)));
    assert_eq!(pipeline.classifier().calls, 1);
    assert_eq!(pipeline.classifier().last_hands, 1);
    assert_eq!(pipeline.source().outstanding(), 0);
    assert_eq!(allocator.in_use(), 0);
    assert_eq!(allocator.live(), 0);
}

#[tokio::test]
async fn test_corrupt_frame_skips_inference() {
    let allocator = Allocator::default();
    let mut pipeline = pipeline(
        vec![Some(b"definitely not a jpeg".to_vec())],
        ScriptedDetector::always(vec![hand()]),
        FixedClassifier::new(open_palm_and_fist()),
        allocator.clone(),
    );

    let step = pipeline.step().await;

    assert_eq!(step, Step::DecodeFailed);
    assert_eq!(step.pace(pipeline.config()), Duration::from_millis(100));
    assert_eq!(pipeline.detector().calls, 0);
    assert_eq!(pipeline.classifier().calls, 0);
    assert_eq!(pipeline.source().released, 1);
    assert_eq!(allocator.live(), 0);

    pipeline.step().await;
    assert_eq!(pipeline.frame(), 2);
}

#[tokio::test]
async fn test_empty_frame_is_a_decode_failure() {
    let mut pipeline = pipeline(
        vec![Some(Vec::new())],
        ScriptedDetector::always(vec![hand()]),
        FixedClassifier::new(open_palm_and_fist()),
        Allocator::default(),
    );

    assert_eq!(pipeline.step().await, Step::DecodeFailed);
    assert_eq!(pipeline.source().outstanding(), 0);
}

#[tokio::test]
async fn test_no_hand_skips_classifier() {
    let mut pipeline = pipeline(
        vec![Some(jpeg(320, 240))],
        ScriptedDetector::always(Vec::new()),
        FixedClassifier::new(open_palm_and_fist()),
        Allocator::default(),
    );

    let step = pipeline.step().await;

    assert_eq!(step, Step::NoHand);
    assert!(!step.is_failure());
    assert_eq!(step.pace(pipeline.config()), Duration::from_millis(300));
    assert_eq!(pipeline.detector().calls, 1);
    assert_eq!(pipeline.classifier().calls, 0);
}

#[tokio::test]
async fn test_resample_allocation_failure_retries() {
    // room for the decoded 320x240 frame and nothing else
    let allocator = Allocator::new(320 * 240 * 3, 0);
    let mut pipeline = pipeline(
        vec![Some(jpeg(320, 240))],
        ScriptedDetector::always(vec![hand()]),
        FixedClassifier::new(open_palm_and_fist()),
        allocator.clone(),
    );

    for frame in 1..=3 {
        let step = pipeline.step().await;
        assert_eq!(step, Step::ResampleFailed);
        assert_eq!(step.pace(pipeline.config()), Duration::from_millis(100));
        assert_eq!(pipeline.frame(), frame);
        assert_eq!(allocator.in_use(), 0);
    }
    assert_eq!(pipeline.detector().calls, 0);
    assert_eq!(pipeline.source().outstanding(), 0);
}

#[tokio::test]
async fn test_acquire_failure() {
    let mut pipeline = pipeline(
        vec![None, Some(jpeg(64, 48))],
        ScriptedDetector::always(Vec::new()),
        FixedClassifier::new(Vec::new()),
        Allocator::default(),
    );

    let step = pipeline.step().await;
    assert_eq!(step, Step::NoFrame);
    assert!(step.is_failure());
    assert_eq!(step.pace(pipeline.config()), Duration::from_millis(100));
    assert_eq!(pipeline.source().released, 0);

    assert_eq!(pipeline.step().await, Step::NoHand);
    assert_eq!(pipeline.frame(), 2);
}

#[tokio::test]
async fn test_detector_failure() {
    let allocator = Allocator::default();
    let mut pipeline = pipeline(
        vec![Some(jpeg(320, 240))],
        ScriptedDetector::failing(),
        FixedClassifier::new(open_palm_and_fist()),
        allocator.clone(),
    );

    let step = pipeline.step().await;

    assert_eq!(step, Step::DetectFailed);
    assert_eq!(step.pace(pipeline.config()), Duration::from_millis(100));
    assert_eq!(pipeline.classifier().calls, 0);
    assert_eq!(allocator.live(), 0);
}

#[tokio::test]
async fn test_classifier_failure() {
    let allocator = Allocator::default();
    let mut pipeline = pipeline(
        vec![Some(jpeg(320, 240))],
        ScriptedDetector::always(vec![hand()]),
        FixedClassifier::failing(),
        allocator.clone(),
    );

    let step = pipeline.step().await;

    assert_eq!(step, Step::ClassifyFailed);
    assert_eq!(step.pace(pipeline.config()), Duration::from_millis(100));
    assert_eq!(allocator.live(), 0);
}

#[tokio::test]
async fn test_recognized_without_gestures_still_cycles() {
    let mut pipeline = pipeline(
        vec![Some(jpeg(240, 320))],
        ScriptedDetector::always(vec![hand()]),
        FixedClassifier::new(Vec::new()),
        Allocator::default(),
    );

    let step = pipeline.step().await;

    assert_eq!(step, Step::Recognized(Vec::new()));
    assert_eq!(step.pace(pipeline.config()), Duration::from_millis(2000));
}

#[test]
fn test_pace_follows_config() {
    let config = PipelineConfig::default()
        .with_retry_delay(Duration::from_millis(7))
        .with_idle_delay(Duration::from_millis(11))
        .with_cycle_delay(Duration::from_millis(13));

    assert_eq!(Step::NoFrame.pace(&config), Duration::from_millis(7));
    assert_eq!(Step::ClassifyFailed.pace(&config), Duration::from_millis(7));
    assert_eq!(Step::NoHand.pace(&config), Duration::from_millis(11));
    assert_eq!(
        Step::Recognized(Vec::new()).pace(&config),
        Duration::from_millis(13)
    );
}

#[tokio::test(start_paused = true)]
async fn test_warm_up_leaves_frame_counter() {
    let mut pipeline = pipeline(
        vec![Some(jpeg(32, 32)), None],
        ScriptedDetector::always(Vec::new()),
        FixedClassifier::new(Vec::new()),
        Allocator::default(),
    );

    let start = tokio::time::Instant::now();
    pipeline.warm_up().await;

    assert_eq!(start.elapsed(), Duration::from_millis(250));
    assert_eq!(pipeline.frame(), 0);
    assert_eq!(pipeline.source().acquired, 3);
    assert_eq!(pipeline.source().outstanding(), 0);
    assert_eq!(pipeline.detector().calls, 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_paces_idle_frames_until_cancelled() {
    let mut pipeline = pipeline(
        vec![Some(jpeg(64, 64))],
        ScriptedDetector::always(Vec::new()),
        FixedClassifier::new(Vec::new()),
        Allocator::default(),
    );
    let cancel = CancelToken::new();
    let stopper = cancel.clone();

    // steps at 0, 300, 600 and 900 ms; cancelled during the last pause
    tokio::join!(pipeline.run(&cancel), async move {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        stopper.cancel();
    });

    assert_eq!(pipeline.frame(), 4);
    assert_eq!(pipeline.classifier().calls, 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_cancel_interrupts_cycle_delay() {
    let mut pipeline = pipeline(
        vec![Some(jpeg(64, 64))],
        ScriptedDetector::always(vec![hand()]),
        FixedClassifier::new(open_palm_and_fist()),
        Allocator::default(),
    );
    let cancel = CancelToken::new();
    let stopper = cancel.clone();
    let start = tokio::time::Instant::now();

    tokio::join!(pipeline.run(&cancel), async move {
        tokio::time::sleep(Duration::from_millis(4500)).await;
        stopper.cancel();
    });

    assert_eq!(pipeline.frame(), 3);
    assert_eq!(start.elapsed(), Duration::from_millis(4500));
}

#[tokio::test]
async fn test_run_returns_immediately_when_already_cancelled() {
    let mut pipeline = pipeline(
        vec![Some(jpeg(64, 64))],
        ScriptedDetector::always(Vec::new()),
        FixedClassifier::new(Vec::new()),
        Allocator::default(),
    );
    let cancel = CancelToken::new();
    cancel.cancel();

    pipeline.run(&cancel).await;

    assert_eq!(pipeline.frame(), 0);
    assert_eq!(pipeline.source().acquired, 0);
}
