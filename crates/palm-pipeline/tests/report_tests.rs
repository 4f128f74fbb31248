mod common;

use common::*;
use log::{Level, Log, Metadata, Record};
use palm_base::Allocator;
use std::sync::Mutex;

struct CaptureLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.target().starts_with("palm_pipeline") {
            self.lines
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

// One test per binary: the global logger can only be installed once.
#[tokio::test]
async fn test_each_gesture_reported_once_per_frame() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(log::LevelFilter::Debug);

    let mut pipeline = pipeline(
        vec![Some(jpeg(320, 240))],
        ScriptedDetector::new(vec![Some(vec![hand()]), Some(Vec::new())]),
        FixedClassifier::new(open_palm_and_fist()),
        Allocator::default(),
    );

    pipeline.step().await;
    pipeline.step().await;

    let lines = LOGGER.lines.lock().unwrap().clone();
    let gestures: Vec<_> = lines
        .iter()
        .filter(|(_, line)| line.contains("Gesture:"))
        .collect();

    assert_eq!(
        gestures,
        vec![
            &(Level::Info, "[1] Gesture: Open_Palm score=0.92".to_string()),
            &(Level::Info, "[1] Gesture: Fist score=0.05".to_string()),
        ]
    );
    assert!(lines.contains(&(Level::Warn, "[2] No hand detected".to_string())));
}
