use crate::{Detection, InferError, Keypoint};
use palm_base::{Rect, Vec2};

/// Decode a raw hand detector output into detections in image pixels.
///
/// `shape` must be `[1, 5 + 3K, N]`: for each of the `N` candidates, the
/// attribute rows hold center x, center y, width, height, score and `K`
/// keypoint triplets (x, y, confidence), all in model input pixels.
/// `scale` maps model pixels to image pixels per axis.
///
/// Candidates below `conf_threshold` are dropped, the rest go through
/// [`non_max_suppression`] and come back sorted by score, highest first.
pub fn decode_hand_output(
    data: &[f32],
    shape: &[usize],
    scale: Vec2<f32>,
    conf_threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<Detection>, InferError> {
    if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 || (shape[1] - 5) % 3 != 0 {
        return Err(InferError::Shape(format!(
            "expected detector output [1, 5 + 3K, N], got {shape:?}"
        )));
    }
    let (attrs, n) = (shape[1], shape[2]);
    if data.len() != attrs * n {
        return Err(InferError::Shape(format!(
            "detector output holds {} values, shape {shape:?} needs {}",
            data.len(),
            attrs * n
        )));
    }
    let keypoint_count = (attrs - 5) / 3;

    // attribute `a` of candidate `i` lives at a * n + i
    let at = |a: usize, i: usize| data[a * n + i];

    let mut candidates = Vec::new();
    for i in 0..n {
        let score = at(4, i);
        if score < conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (
            at(0, i) * scale.x,
            at(1, i) * scale.y,
            at(2, i) * scale.x,
            at(3, i) * scale.y,
        );
        let bbox = Rect::new(Vec2::new(cx - w / 2.0, cy - h / 2.0), Vec2::new(w, h));

        let keypoints = (0..keypoint_count)
            .map(|k| {
                let base = 5 + k * 3;
                Keypoint {
                    position: Vec2::new(at(base, i) * scale.x, at(base + 1, i) * scale.y),
                    confidence: at(base + 2, i),
                }
            })
            .collect();

        candidates.push(Detection::new(bbox, score).with_keypoints(keypoints));
    }

    Ok(non_max_suppression(candidates, iou_threshold))
}

/// Greedy NMS: keep the best-scoring box, drop every box overlapping it by
/// more than `iou_threshold`, repeat.
pub fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| k.bbox.iou(&candidate.bbox) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
