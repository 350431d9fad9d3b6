//! Scalar body measurements shared by scoring and feedback.

use crate::{
    landmark::{Landmark, Point3},
    normalize::NormalizedPose,
};
use tracing::warn;

#[derive(Debug, Clone, thiserror::Error)]
pub enum MetricError {
    #[error("{0} vector has zero magnitude")]
    ZeroMagnitude(&'static str),

    #[error("{0} is not finite: {1}")]
    NonFinite(&'static str, f64),
}

#[derive(Debug, Clone, Copy)]
struct Side {
    name: &'static str,
    shoulder: Landmark,
    wrist: Landmark,
    hip: Landmark,
    knee: Landmark,
}

const SIDES: [Side; 2] = [
    Side {
        name: "left",
        shoulder: Landmark::LeftShoulder,
        wrist: Landmark::LeftWrist,
        hip: Landmark::LeftHip,
        knee: Landmark::LeftKnee,
    },
    Side {
        name: "right",
        shoulder: Landmark::RightShoulder,
        wrist: Landmark::RightWrist,
        hip: Landmark::RightHip,
        knee: Landmark::RightKnee,
    },
];

pub(crate) fn finite(name: &'static str, value: f64) -> Result<f64, MetricError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MetricError::NonFinite(name, value))
    }
}

/// Angle in degrees between shoulder→hip and hip→knee, averaged over both
/// sides. A side with a zero-length segment counts as 0°.
pub fn hip_flexion_angle(pose: &NormalizedPose) -> Result<f64, MetricError> {
    let mut total = 0.0;
    for side in &SIDES {
        let upper = pose.get(side.hip) - pose.get(side.shoulder);
        let lower = pose.get(side.knee) - pose.get(side.hip);
        let (norm_upper, norm_lower) = (upper.norm(), lower.norm());

        let angle = if norm_upper == 0.0 || norm_lower == 0.0 {
            warn!(message = "leg vector has zero length", side = side.name);
            0.0
        } else {
            let cos = (upper / norm_upper).dot(lower / norm_lower);
            cos.clamp(-1.0, 1.0).acos().to_degrees()
        };
        total += finite("hip flexion angle", angle)?;
    }
    Ok(total / SIDES.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePositions {
    /// Head-top to each shoulder, summed over both sides.
    pub head_shoulder: f64,
    /// Shoulder to knee, summed over both sides.
    pub shoulder_knee: f64,
}

pub fn relative_positions(pose: &NormalizedPose) -> Result<RelativePositions, MetricError> {
    let head_top = pose.head_top();
    let (head_shoulder, shoulder_knee) =
        SIDES.iter().fold((0.0, 0.0), |(hs, sk), side| {
            let shoulder: Point3 = pose.get(side.shoulder);
            (
                hs + head_top.distance(shoulder),
                sk + shoulder.distance(pose.get(side.knee)),
            )
        });
    Ok(RelativePositions {
        head_shoulder: finite("head-shoulder distance", head_shoulder)?,
        shoulder_knee: finite("shoulder-knee distance", shoulder_knee)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmHeights {
    pub left: f64,
    pub right: f64,
}

/// Vertical offset of each wrist above its shoulder (image y grows downward).
pub fn arm_heights(pose: &NormalizedPose) -> Result<ArmHeights, MetricError> {
    let [left, right] = SIDES;
    let height = |side: Side| pose.get(side.shoulder).y - pose.get(side.wrist).y;
    Ok(ArmHeights {
        left: finite("left arm height", height(left))?,
        right: finite("right arm height", height(right))?,
    })
}
