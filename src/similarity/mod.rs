use crate::normalize::NormalizedPose;
use metrics::{arm_heights, hip_flexion_angle, relative_positions, MetricError};
use tracing::warn;

pub mod metrics;
mod shape;

/// Divisor applied to the hip angle difference, in degrees.
const HIP_ANGLE_RANGE: f64 = 180.0;
/// Divisor applied to summed distance and height differences.
const DISTANCE_RANGE: f64 = 100.0;

/// Contribution of each sub-metric to the composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub shape: f64,
    pub hip_flexion: f64,
    pub relative_position: f64,
    pub arm_height: f64,
}

pub const WEIGHTS: Weights = Weights {
    shape: 0.4,
    hip_flexion: 0.2,
    relative_position: 0.2,
    arm_height: 0.2,
};

impl Weights {
    pub fn total(&self) -> f64 {
        self.shape + self.hip_flexion + self.relative_position + self.arm_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricScores {
    pub shape: f64,
    pub hip_flexion: f64,
    pub relative_position: f64,
    pub arm_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimilarityResult {
    pub composite: f64,
    pub scores: MetricScores,
}

#[inline]
fn inverse_difference(difference: f64, range: f64) -> f64 {
    1.0 / (1.0 + difference / range)
}

fn hip_flexion_similarity(
    candidate: &NormalizedPose,
    reference: &NormalizedPose,
) -> Result<f64, MetricError> {
    let delta = (hip_flexion_angle(candidate)? - hip_flexion_angle(reference)?).abs();
    Ok(inverse_difference(delta, HIP_ANGLE_RANGE))
}

fn relative_position_similarity(
    candidate: &NormalizedPose,
    reference: &NormalizedPose,
) -> Result<f64, MetricError> {
    let a = relative_positions(candidate)?;
    let b = relative_positions(reference)?;
    let delta = (a.head_shoulder - b.head_shoulder).abs() + (a.shoulder_knee - b.shoulder_knee).abs();
    Ok(inverse_difference(delta, DISTANCE_RANGE))
}

fn arm_height_similarity(
    candidate: &NormalizedPose,
    reference: &NormalizedPose,
) -> Result<f64, MetricError> {
    let a = arm_heights(candidate)?;
    let b = arm_heights(reference)?;
    let delta = (a.left - b.left).abs() + (a.right - b.right).abs();
    Ok(inverse_difference(delta, DISTANCE_RANGE))
}

fn score_or_zero(metric: &'static str, score: Result<f64, MetricError>) -> f64 {
    score.unwrap_or_else(|error| {
        warn!(message = "similarity metric failed, scoring it as zero", metric, %error);
        0.0
    })
}

/// Weighted similarity of `candidate` to `reference`.
///
/// Each sub-metric lands in `[0, 1]`; a failing one contributes zero instead of
/// aborting the score.
pub fn similarity(candidate: &NormalizedPose, reference: &NormalizedPose) -> SimilarityResult {
    let scores = MetricScores {
        shape: score_or_zero("shape", shape::shape_similarity(candidate, reference)),
        hip_flexion: score_or_zero("hip flexion", hip_flexion_similarity(candidate, reference)),
        relative_position: score_or_zero(
            "relative position",
            relative_position_similarity(candidate, reference),
        ),
        arm_height: score_or_zero("arm height", arm_height_similarity(candidate, reference)),
    };

    let composite = WEIGHTS.shape * scores.shape
        + WEIGHTS.hip_flexion * scores.hip_flexion
        + WEIGHTS.relative_position * scores.relative_position
        + WEIGHTS.arm_height * scores.arm_height;

    SimilarityResult {
        composite: composite.clamp(0.0, 1.0),
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        landmark::{Landmark, LandmarkSet, Point3, NUM_LANDMARKS},
        normalize::normalize,
    };
    use assert_approx_eq::assert_approx_eq;

    fn pseudo_random_poses(count: usize) -> Vec<NormalizedPose> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        (0..count)
            .map(|_| {
                let mut points = [Point3::default(); NUM_LANDMARKS];
                for point in points.iter_mut() {
                    *point = Point3::new(next(), next(), next() - 0.5);
                }
                normalize(&LandmarkSet::new(points).unwrap()).unwrap()
            })
            .collect()
    }

    #[test]
    fn weights_sum_to_one() {
        assert_approx_eq!(WEIGHTS.total(), 1.0);
    }

    #[test]
    fn pose_matches_itself_perfectly() {
        for pose in pseudo_random_poses(8) {
            let result = similarity(&pose, &pose);
            assert_approx_eq!(result.composite, 1.0);
            assert_approx_eq!(result.scores.shape, 1.0);
            assert_approx_eq!(result.scores.hip_flexion, 1.0);
            assert_approx_eq!(result.scores.relative_position, 1.0);
            assert_approx_eq!(result.scores.arm_height, 1.0);
        }
    }

    #[test]
    fn composite_stays_in_unit_interval() {
        let poses = pseudo_random_poses(16);
        for a in &poses {
            for b in &poses {
                let result = similarity(a, b);
                assert!((0.0..=1.0).contains(&result.composite), "{:?}", result);
                for score in [
                    result.scores.shape,
                    result.scores.hip_flexion,
                    result.scores.relative_position,
                    result.scores.arm_height,
                ] {
                    assert!((0.0..=1.0).contains(&score), "{:?}", result);
                }
            }
        }
    }

    #[test]
    fn raised_arm_lowers_only_geometric_metrics() {
        let base = pseudo_random_poses(1)[0];
        let mut points = *base.points();
        points[Landmark::LeftWrist.idx()].y -= 0.5;
        let raised = NormalizedPose::from_points(points);

        let result = similarity(&raised, &base);
        assert!(result.composite < 1.0);
        assert_approx_eq!(result.scores.hip_flexion, 1.0);
        assert_approx_eq!(result.scores.relative_position, 1.0);
        assert_approx_eq!(result.scores.arm_height, 1.0 / (1.0 + 0.5 / 100.0));
    }

    #[test]
    fn failed_metric_contributes_zero() {
        let zero = NormalizedPose::from_points([Point3::default(); NUM_LANDMARKS]);
        let result = similarity(&zero, &zero);
        assert_eq!(result.scores.shape, 0.0);
        assert_approx_eq!(result.composite, 0.6);
    }
}
