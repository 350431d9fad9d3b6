use crate::{
    config::AnalysisConfig,
    consensus::{ClassOutcome, ConsensusTracker},
    error::Error,
    evaluate::{ClassMatch, FrameEvaluator},
    landmark::LandmarkSet,
    library::ReferenceLibrary,
    normalize::normalize_or_degrade,
};
use tracing::{info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frames: usize,
    pub frames_with_pose: usize,
    pub unnormalized: usize,
}

#[derive(Debug)]
pub struct Analysis<F> {
    pub outcomes: Vec<ClassOutcome<F>>,
    pub stats: FrameStats,
}

/// Runs normalization, scoring and consensus over an ordered frame stream.
///
/// `F` is whatever handle the caller wants back for the frames that end up
/// representing a pose class; it is cloned only when a record improves.
pub struct Analyzer<'a, F> {
    evaluator: FrameEvaluator<'a>,
    tracker: ConsensusTracker<F>,
    stats: FrameStats,
}

impl<'a, F> Analyzer<'a, F>
where
    F: Clone,
{
    pub fn new(library: &'a ReferenceLibrary, config: AnalysisConfig) -> Result<Self, Error> {
        Ok(Self::with_evaluator(
            FrameEvaluator::new(library, config.max_workers)?,
            config,
        ))
    }

    pub fn with_evaluator(evaluator: FrameEvaluator<'a>, config: AnalysisConfig) -> Self {
        let tracker = ConsensusTracker::new(config, evaluator.library());
        Self {
            evaluator,
            tracker,
            stats: FrameStats::default(),
        }
    }

    /// Feed the next frame. A frame without landmarks is counted and skipped.
    pub fn process(&mut self, frame: &F, landmarks: Option<&LandmarkSet>) -> Vec<ClassMatch> {
        let frame_index = self.stats.frames;
        self.stats.frames += 1;

        let landmarks = match landmarks {
            Some(landmarks) => landmarks,
            None => {
                trace!(message = "no pose in frame", frame_index);
                return vec![];
            }
        };
        self.stats.frames_with_pose += 1;

        let candidate = normalize_or_degrade(landmarks);
        if !candidate.is_normalized() {
            self.stats.unnormalized += 1;
        }

        let matches = self.evaluator.evaluate(&candidate);
        self.tracker
            .observe(frame_index, frame, &candidate, &matches);
        matches
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn finish(self) -> Analysis<F> {
        let Self {
            evaluator,
            tracker,
            stats,
        } = self;
        info!(
            message = "analysis finished",
            frames = stats.frames,
            frames_with_pose = stats.frames_with_pose,
            unnormalized = stats.unnormalized,
        );
        Analysis {
            outcomes: tracker.finish(evaluator.library()),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        consensus::Resolution,
        evaluate::tests::{library, raw_pose},
        landmark::{Landmark, Point3},
    };
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn identical_candidate_confirms_its_variant() {
        let library = library();
        let mut analyzer = Analyzer::new(&library, AnalysisConfig::default()).unwrap();

        // class 3 variant 2
        let candidate = raw_pose(0.2, 0.3);
        let frames = [None, Some(candidate), Some(candidate), None, Some(candidate)];
        for (i, landmarks) in frames.iter().enumerate() {
            analyzer.process(&i, landmarks.as_ref());
        }
        let stats = analyzer.stats();
        assert_eq!(stats.frames, 5);
        assert_eq!(stats.frames_with_pose, 3);
        assert_eq!(stats.unnormalized, 0);

        let analysis = analyzer.finish();
        let outcome = &analysis.outcomes[2];
        assert_eq!(outcome.class.get(), 3);
        assert_eq!(outcome.resolution, Resolution::Confirmed);
        assert_approx_eq!(outcome.average_similarity, 1.0);
        assert_eq!(outcome.professional_variant().get(), 2);

        let selected = outcome.selected.as_ref().unwrap();
        // detection misses do not break the run, the third pose frame confirms
        assert_eq!(selected.frame, 4);
        assert_eq!(selected.frame_index, 4);
    }

    #[test]
    fn stream_cut_short_still_resolves_what_was_seen() {
        let library = library();
        let mut analyzer = Analyzer::new(&library, AnalysisConfig::default()).unwrap();

        // class 4 has one variant; the stream stops after four frames
        let candidate = raw_pose(0.6, 0.0);
        for i in 0..4 {
            analyzer.process(&i, Some(&candidate));
        }
        assert_eq!(analyzer.stats().frames, 4);

        let analysis = analyzer.finish();
        assert_eq!(analysis.outcomes.len(), 6);
        let outcome = &analysis.outcomes[3];
        assert_eq!(outcome.class.get(), 4);
        assert_eq!(outcome.resolution, Resolution::Confirmed);
        assert_eq!(outcome.selected.as_ref().unwrap().frame, 2);
    }

    #[test]
    fn degenerate_scale_is_scored_unnormalized() {
        let library = library();
        let mut analyzer =
            Analyzer::with_evaluator(FrameEvaluator::sequential(&library), AnalysisConfig::default());

        let mut points = *raw_pose(0.0, 0.0).points();
        points[Landmark::LeftKnee.idx()] = Point3::new(1e308, 1e308, 0.0);
        let overflowing = LandmarkSet::new(points).unwrap();

        let matches = analyzer.process(&0, Some(&overflowing));
        analyzer.process(&1, Some(&raw_pose(0.0, 0.0)));

        let stats = analyzer.stats();
        assert_eq!(stats.frames_with_pose, 2);
        assert_eq!(stats.unnormalized, 1);
        assert_eq!(matches.len(), 4);
        for matched in &matches {
            assert!((0.0..=1.0).contains(&matched.score()), "{:?}", matched);
        }
    }

    #[test]
    fn no_pose_anywhere_is_not_recognized() {
        let library = library();
        let mut analyzer =
            Analyzer::with_evaluator(FrameEvaluator::sequential(&library), AnalysisConfig::default());
        for i in 0..10 {
            assert!(analyzer.process(&i, None).is_empty());
        }
        let analysis = analyzer.finish();
        assert!(analysis
            .outcomes
            .iter()
            .all(|outcome| outcome.resolution == Resolution::NotRecognized));
    }
}
