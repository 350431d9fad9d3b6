use crate::{
    normalize::NormalizedPose,
    similarity::metrics::{arm_heights, hip_flexion_angle, relative_positions},
};
use tracing::warn;

/// Hip angle differences below this many degrees need no correction.
const HIP_ANGLE_TOLERANCE: f64 = 5.0;
/// Distance and height differences above this get a correction.
const DISTANCE_TOLERANCE: f64 = 0.05;

pub const NOT_RECOGNIZED: &str = "The pose was not recognized.";
pub const INSUFFICIENT_DATA: &str = "There is not enough data to analyze the pose.";

fn hip_flexion(candidate: &NormalizedPose, reference: &NormalizedPose) -> String {
    let (user, standard) = match (hip_flexion_angle(candidate), hip_flexion_angle(reference)) {
        (Ok(user), Ok(standard)) => (user, standard),
        (Err(error), _) | (_, Err(error)) => {
            warn!(message = "could not measure hip flexion", %error);
            return "The hip angle could not be measured.".to_owned();
        }
    };

    let difference = user - standard;
    if difference.abs() < HIP_ANGLE_TOLERANCE {
        "The hip angle is appropriate.".to_owned()
    } else if difference > 0.0 {
        format!(
            "Your hips are bent less than the reference. \
             Fold a little more at the hips to lower your upper body. \
             (current angle: {:.2}°, reference angle: {:.2}°)",
            user, standard
        )
    } else {
        format!(
            "Your hips are bent more than the reference. \
             Straighten your back a little. \
             (current angle: {:.2}°, reference angle: {:.2}°)",
            user, standard
        )
    }
}

fn position_distance(candidate: &NormalizedPose, reference: &NormalizedPose) -> String {
    let (user, standard) = match (relative_positions(candidate), relative_positions(reference)) {
        (Ok(user), Ok(standard)) => (user, standard),
        (Err(error), _) | (_, Err(error)) => {
            warn!(message = "could not measure relative positions", %error);
            return "The relative body positions could not be measured.".to_owned();
        }
    };

    let mut feedback = vec![];
    if (user.head_shoulder - standard.head_shoulder).abs() > DISTANCE_TOLERANCE {
        feedback.push(format!(
            "The distance between your head and shoulders differs from the reference. \
             Balance your head over your shoulders. \
             (current distance: {:.2}, reference distance: {:.2})",
            user.head_shoulder, standard.head_shoulder
        ));
    }
    if (user.shoulder_knee - standard.shoulder_knee).abs() > DISTANCE_TOLERANCE {
        feedback.push(format!(
            "The distance between your shoulders and knees differs from the reference. \
             Bend or straighten your knees to balance your upper and lower body. \
             (current distance: {:.2}, reference distance: {:.2})",
            user.shoulder_knee, standard.shoulder_knee
        ));
    }

    if feedback.is_empty() {
        "The relative body positions are appropriate.".to_owned()
    } else {
        feedback.join(" ")
    }
}

fn arm_height(candidate: &NormalizedPose, reference: &NormalizedPose) -> String {
    let (user, standard) = match (arm_heights(candidate), arm_heights(reference)) {
        (Ok(user), Ok(standard)) => (user, standard),
        (Err(error), _) | (_, Err(error)) => {
            warn!(message = "could not measure arm height", %error);
            return "The arm height could not be measured.".to_owned();
        }
    };

    let feedback = [
        ("left", user.left, standard.left),
        ("right", user.right, standard.right),
    ]
    .iter()
    .filter(|(_, user, standard)| (user - standard).abs() > DISTANCE_TOLERANCE)
    .map(|(side, user, standard)| {
        format!(
            "Your {side} arm height differs from the reference. \
             Raise or lower your {side} arm a little to match. \
             (current height: {:.2}, reference height: {:.2})",
            user,
            standard,
            side = side
        )
    })
    .collect::<Vec<_>>();

    if feedback.is_empty() {
        "The arm height is appropriate.".to_owned()
    } else {
        feedback.join(" ")
    }
}

/// Corrective feedback for `candidate` against the reference it matched.
pub fn feedback(candidate: Option<&NormalizedPose>, reference: Option<&NormalizedPose>) -> String {
    match (candidate, reference) {
        (Some(candidate), Some(reference)) => [
            hip_flexion(candidate, reference),
            position_distance(candidate, reference),
            arm_height(candidate, reference),
        ]
        .join(" "),
        _ => INSUFFICIENT_DATA.to_owned(),
    }
}
