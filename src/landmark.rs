use crate::error::Error;
use ordered_float::NotNan;
use std::ops::{Add, Div, Sub};

/// The body landmarks scored by this crate, in storage order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, num_derive::FromPrimitive)]
pub enum Landmark {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
}

pub const NUM_LANDMARKS: usize = 10;

/// Number of landmarks in a full MediaPipe pose result.
pub const NUM_MEDIAPIPE_LANDMARKS: usize = 33;

impl Landmark {
    pub const ALL: [Landmark; NUM_LANDMARKS] = [
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
    ];

    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    /// Index of this landmark in a 33-point MediaPipe pose result.
    pub fn mediapipe_index(self) -> usize {
        match self {
            Landmark::LeftShoulder => 11,
            Landmark::RightShoulder => 12,
            Landmark::LeftElbow => 13,
            Landmark::RightElbow => 14,
            Landmark::LeftWrist => 15,
            Landmark::RightWrist => 16,
            Landmark::LeftHip => 23,
            Landmark::RightHip => 24,
            Landmark::LeftKnee => 25,
            Landmark::RightKnee => 26,
        }
    }
}

pub mod constants {
    use super::Landmark::{self, *};

    /// Skeleton edges over the scored landmarks.
    pub const EDGES: [(Landmark, Landmark); 10] = [
        (LeftShoulder, RightShoulder),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        (LeftShoulder, LeftHip),
        (RightShoulder, RightHip),
        (LeftHip, RightHip),
        (LeftHip, LeftKnee),
        (RightHip, RightKnee),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Construct a point, rejecting NaN and infinite coordinates.
    pub fn checked(x: f64, y: f64, z: f64) -> Result<Self, Error> {
        let check = |value: f64| -> Result<f64, Error> {
            let value = NotNan::new(value).map_err(|e| Error::ConstructNotNan(e, value))?;
            if value.is_infinite() {
                Err(Error::NonFiniteCoordinate(value.into_inner()))
            } else {
                Ok(value.into_inner())
            }
        };
        Ok(Self {
            x: check(x)?,
            y: check(y)?,
            z: check(z)?,
        })
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).norm()
    }

    #[inline]
    pub fn midpoint(self, other: Self) -> Self {
        (self + other) / 2.0
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Sub for Point3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Add for Point3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::Output {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Div<f64> for Point3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self::Output {
            x: self.x / rhs,
            y: self.y / rhs,
            z: self.z / rhs,
        }
    }
}

/// The landmarks a provider found for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSet([Point3; NUM_LANDMARKS]);

impl LandmarkSet {
    pub fn new(points: [Point3; NUM_LANDMARKS]) -> Result<Self, Error> {
        for point in &points {
            Point3::checked(point.x, point.y, point.z)?;
        }
        Ok(Self(points))
    }

    /// Build a set from `[x, y, z]` triples holding either the scored subset
    /// or a full MediaPipe result.
    pub fn from_triples(triples: &[[f64; 3]]) -> Result<Self, Error> {
        let pick: fn(Landmark) -> usize = match triples.len() {
            NUM_LANDMARKS => Landmark::idx,
            NUM_MEDIAPIPE_LANDMARKS => Landmark::mediapipe_index,
            n => return Err(Error::GetExpectedNumLandmarks(NUM_LANDMARKS, n)),
        };
        let mut points = [Point3::default(); NUM_LANDMARKS];
        for (dst, &landmark) in points.iter_mut().zip(Landmark::ALL.iter()) {
            let [x, y, z] = triples[pick(landmark)];
            *dst = Point3::checked(x, y, z)?;
        }
        Ok(Self(points))
    }

    #[inline]
    pub fn get(&self, landmark: Landmark) -> Point3 {
        self.0[landmark.idx()]
    }

    pub fn points(&self) -> &[Point3; NUM_LANDMARKS] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn from_primitive_matches_storage_order() {
        for (i, &landmark) in Landmark::ALL.iter().enumerate() {
            assert_eq!(Landmark::from_usize(i), Some(landmark));
            assert_eq!(landmark.idx(), i);
        }
        assert_eq!(Landmark::from_usize(NUM_LANDMARKS), None);
    }

    #[test]
    fn rejects_nan_and_infinity() {
        assert!(matches!(
            Point3::checked(f64::NAN, 0.0, 0.0),
            Err(Error::ConstructNotNan(..))
        ));
        assert!(matches!(
            Point3::checked(0.0, f64::INFINITY, 0.0),
            Err(Error::NonFiniteCoordinate(_))
        ));

        let mut points = [Point3::default(); NUM_LANDMARKS];
        points[3].z = f64::NAN;
        assert!(LandmarkSet::new(points).is_err());
    }

    #[test]
    fn selects_mediapipe_subset() {
        let triples = (0..NUM_MEDIAPIPE_LANDMARKS)
            .map(|i| [i as f64, 0.5, 0.0])
            .collect::<Vec<_>>();
        let set = LandmarkSet::from_triples(&triples).unwrap();
        assert_eq!(set.get(Landmark::LeftShoulder).x, 11.0);
        assert_eq!(set.get(Landmark::RightWrist).x, 16.0);
        assert_eq!(set.get(Landmark::LeftHip).x, 23.0);
        assert_eq!(set.get(Landmark::RightKnee).x, 26.0);
    }

    #[test]
    fn rejects_wrong_landmark_count() {
        let triples = vec![[0.0; 3]; 17];
        assert!(matches!(
            LandmarkSet::from_triples(&triples),
            Err(Error::GetExpectedNumLandmarks(10, 17))
        ));
    }

    #[test]
    fn point_arithmetic() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 4.0, 4.0);
        assert_eq!(a.distance(b), 6.0);
        assert_eq!(a.midpoint(b), Point3::new(1.0, 2.0, 2.0));
    }
}
