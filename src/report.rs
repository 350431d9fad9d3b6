use crate::{
    consensus::{ClassOutcome, Resolution},
    feedback::{feedback, NOT_RECOGNIZED},
    library::{PoseClassId, ReferenceDirectory, VariantIndex},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Public URL prefix the professional images are served from.
pub const PROFESSIONAL_IMAGE_PREFIX: &str = "/professional_poses";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseReport {
    pub user_image: Option<String>,
    pub similarity: String,
    pub feedback: String,
    pub professional_image: String,
}

pub type Report = BTreeMap<String, PoseReport>;

pub fn similarity_percentage(average_similarity: f64) -> String {
    if average_similarity > 0.0 {
        format!("{:.2}%", average_similarity * 100.0)
    } else {
        "0.00%".to_owned()
    }
}

pub fn professional_image(class: PoseClassId, variant: VariantIndex) -> String {
    format!(
        "{}/{}",
        PROFESSIONAL_IMAGE_PREFIX,
        ReferenceDirectory::file_name(class, variant)
    )
}

pub fn report_key(class: PoseClassId) -> String {
    format!("pose {}", class)
}

impl PoseReport {
    pub fn from_outcome<F>(outcome: &ClassOutcome<F>, user_image: Option<String>) -> Self {
        let professional_image = professional_image(outcome.class, outcome.professional_variant());
        match (&outcome.resolution, &outcome.selected) {
            (Resolution::NotRecognized, _) | (_, None) => Self {
                user_image: None,
                similarity: similarity_percentage(0.0),
                feedback: NOT_RECOGNIZED.to_owned(),
                professional_image,
            },
            (_, Some(selected)) => Self {
                user_image,
                similarity: similarity_percentage(outcome.average_similarity),
                feedback: feedback(
                    Some(&selected.candidate),
                    Some(&selected.matched.reference.pose),
                ),
                professional_image,
            },
        }
    }
}

/// Report every outcome; `user_image` names the saved frame of a class.
pub fn build_report<F, U>(outcomes: &[ClassOutcome<F>], mut user_image: U) -> Report
where
    U: FnMut(&ClassOutcome<F>) -> Option<String>,
{
    outcomes
        .iter()
        .map(|outcome| {
            let image = outcome
                .selected
                .as_ref()
                .and_then(|_| user_image(outcome));
            (report_key(outcome.class), PoseReport::from_outcome(outcome, image))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AnalysisConfig,
        consensus::ConsensusTracker,
        evaluate::{tests::library, tests::pose, FrameEvaluator},
    };

    #[test]
    fn percentage_has_two_decimals() {
        assert_eq!(similarity_percentage(0.87654), "87.65%");
        assert_eq!(similarity_percentage(1.0), "100.00%");
        assert_eq!(similarity_percentage(0.0), "0.00%");
        assert_eq!(similarity_percentage(-0.1), "0.00%");
    }

    #[test]
    fn reports_every_class() {
        let library = library();
        let evaluator = FrameEvaluator::sequential(&library);
        let mut tracker = ConsensusTracker::new(AnalysisConfig::default(), &library);

        // class 4 has a single variant, so it confirms after three identical frames
        let candidate = pose(0.6, 0.0);
        for i in 0..3 {
            tracker.observe(i, &i, &candidate, &evaluator.evaluate(&candidate));
        }
        let outcomes = tracker.finish(&library);
        let report = build_report(&outcomes, |outcome| {
            Some(format!("/user_pose_data/u/user_pose_{}.jpg", outcome.class))
        });

        assert_eq!(report.len(), 6);

        let confirmed = &report["pose 4"];
        assert_eq!(confirmed.similarity, "100.00%");
        assert_eq!(confirmed.professional_image, "/professional_poses/pose4-1.jpg");
        assert_eq!(
            confirmed.user_image.as_deref(),
            Some("/user_pose_data/u/user_pose_4.jpg")
        );
        assert!(confirmed.feedback.starts_with("The hip angle is appropriate."));

        let empty = &report["pose 2"];
        assert_eq!(empty.similarity, "0.00%");
        assert_eq!(empty.feedback, NOT_RECOGNIZED);
        assert_eq!(empty.user_image, None);
        assert_eq!(empty.professional_image, "/professional_poses/pose2-1.jpg");
    }

    #[test]
    fn serializes_with_null_user_image() {
        let report = PoseReport {
            user_image: None,
            similarity: "0.00%".to_owned(),
            feedback: NOT_RECOGNIZED.to_owned(),
            professional_image: "/professional_poses/pose1-1.jpg".to_owned(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["user_image"].is_null());
        assert_eq!(value["similarity"], "0.00%");
    }
}
