use crate::landmark::{Landmark, LandmarkSet, Point3, NUM_LANDMARKS};
use num_traits::FromPrimitive;
use tracing::warn;

/// Upward offset of the synthetic head-top anchor from the shoulder midpoint.
pub const HEAD_TOP_OFFSET: f64 = 0.1;

/// Head-top anchor for a pair of shoulders.
#[inline]
pub fn head_top(left_shoulder: Point3, right_shoulder: Point3) -> Point3 {
    left_shoulder.midpoint(right_shoulder) - Point3::new(0.0, HEAD_TOP_OFFSET, 0.0)
}

/// A pose expressed relative to its head-top anchor and scaled so the farthest
/// landmark sits at distance 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPose {
    points: [Point3; NUM_LANDMARKS],
    normalized: bool,
}

impl NormalizedPose {
    /// Wrap coordinates that are already in the normalized frame.
    pub fn from_points(points: [Point3; NUM_LANDMARKS]) -> Self {
        Self {
            points,
            normalized: true,
        }
    }

    /// Raw coordinates passed through untouched; scored as low confidence.
    pub fn unnormalized(landmarks: &LandmarkSet) -> Self {
        Self {
            points: *landmarks.points(),
            normalized: false,
        }
    }

    #[inline]
    pub fn get(&self, landmark: Landmark) -> Point3 {
        self.points[landmark.idx()]
    }

    pub fn points(&self) -> &[Point3; NUM_LANDMARKS] {
        &self.points
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub fn head_top(&self) -> Point3 {
        head_top(
            self.get(Landmark::LeftShoulder),
            self.get(Landmark::RightShoulder),
        )
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum NormalizationError {
    #[error("pose scale is not finite: {0}")]
    NonFiniteScale(f64),

    #[error("normalized coordinate of {0:?} is not finite")]
    NonFiniteCoordinate(Landmark),
}

pub fn normalize(landmarks: &LandmarkSet) -> Result<NormalizedPose, NormalizationError> {
    let anchor = head_top(
        landmarks.get(Landmark::LeftShoulder),
        landmarks.get(Landmark::RightShoulder),
    );

    let mut points = *landmarks.points();
    points.iter_mut().for_each(|point| *point = *point - anchor);

    let scale = points.iter().map(|point| point.norm()).fold(0.0, f64::max);
    if !scale.is_finite() {
        return Err(NormalizationError::NonFiniteScale(scale));
    }
    if scale > 0.0 {
        points.iter_mut().for_each(|point| *point = *point / scale);
    }

    if let Some(landmark) = points
        .iter()
        .position(|point| !point.is_finite())
        .and_then(Landmark::from_usize)
    {
        return Err(NormalizationError::NonFiniteCoordinate(landmark));
    }

    Ok(NormalizedPose::from_points(points))
}

/// Normalize, falling back to the raw coordinates when normalization fails.
pub fn normalize_or_degrade(landmarks: &LandmarkSet) -> NormalizedPose {
    normalize(landmarks).unwrap_or_else(|error| {
        warn!(message = "pose normalization failed, using raw coordinates", %error);
        NormalizedPose::unnormalized(landmarks)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn standing() -> LandmarkSet {
        LandmarkSet::new([
            Point3::new(0.40, 0.30, -0.10),
            Point3::new(0.60, 0.30, -0.12),
            Point3::new(0.36, 0.45, -0.05),
            Point3::new(0.64, 0.45, -0.06),
            Point3::new(0.35, 0.58, 0.00),
            Point3::new(0.65, 0.58, 0.01),
            Point3::new(0.44, 0.62, 0.00),
            Point3::new(0.56, 0.62, 0.00),
            Point3::new(0.45, 0.80, 0.02),
            Point3::new(0.55, 0.80, 0.03),
        ])
        .unwrap()
    }

    #[test]
    fn anchors_head_top_at_origin_with_unit_scale() {
        let pose = normalize(&standing()).unwrap();
        assert!(pose.is_normalized());

        let max = pose.points().iter().map(|p| p.norm()).fold(0.0, f64::max);
        assert_approx_eq!(max, 1.0);

        // the shoulder midpoint sits straight below the anchor
        let mid = pose
            .get(Landmark::LeftShoulder)
            .midpoint(pose.get(Landmark::RightShoulder));
        assert_approx_eq!(mid.x, 0.0);
        assert!(mid.y > 0.0);
    }

    #[test]
    fn idempotent_on_unit_scaled_anchored_pose() {
        let set = LandmarkSet::new([
            Point3::new(-0.2, 0.1, 0.0),
            Point3::new(0.2, 0.1, 0.0),
            Point3::new(-0.3, 0.3, 0.0),
            Point3::new(0.3, 0.3, 0.0),
            Point3::new(-0.3, 0.5, 0.1),
            Point3::new(0.3, 0.5, -0.1),
            Point3::new(-0.1, 0.6, 0.0),
            Point3::new(0.1, 0.6, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.1, 0.9, 0.0),
        ])
        .unwrap();

        let once = normalize(&set).unwrap();
        for (a, b) in once.points().iter().zip(set.points()) {
            assert_approx_eq!(a.x, b.x);
            assert_approx_eq!(a.y, b.y);
            assert_approx_eq!(a.z, b.z);
        }

        let again = normalize(&LandmarkSet::new(*once.points()).unwrap()).unwrap();
        for (a, b) in again.points().iter().zip(once.points()) {
            assert_approx_eq!(a.x, b.x);
            assert_approx_eq!(a.y, b.y);
            assert_approx_eq!(a.z, b.z);
        }
    }

    #[test]
    fn translation_invariant() {
        let set = standing();
        let shift = Point3::new(0.25, -0.15, 0.4);
        let mut moved = *set.points();
        moved.iter_mut().for_each(|p| *p = *p + shift);
        let moved = LandmarkSet::new(moved).unwrap();

        let a = normalize(&set).unwrap();
        let b = normalize(&moved).unwrap();
        for (p, q) in a.points().iter().zip(b.points()) {
            assert_approx_eq!(p.x, q.x);
            assert_approx_eq!(p.y, q.y);
            assert_approx_eq!(p.z, q.z);
        }
    }

    #[test]
    fn overflowing_scale_degrades_to_raw_coordinates() {
        let mut points = *standing().points();
        points[8] = Point3::new(1e308, 1e308, 0.0);
        let set = LandmarkSet::new(points).unwrap();

        assert!(matches!(
            normalize(&set),
            Err(NormalizationError::NonFiniteScale(_))
        ));

        let degraded = normalize_or_degrade(&set);
        assert!(!degraded.is_normalized());
        assert_eq!(degraded.points(), set.points());
    }
}
