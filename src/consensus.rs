//! Per-class streaming state deciding which frame represents each pose class.
//!
//! Every class keeps two records. The running maximum follows the best score
//! seen on any frame. The confirmed record only moves once the class has scored
//! at or above the threshold on enough consecutive frames, so a single noisy
//! frame cannot become the representative match. At the end of the stream the
//! confirmed record wins when present, otherwise the running maximum is used.

use crate::{
    config::AnalysisConfig,
    evaluate::ClassMatch,
    library::{PoseClassId, ReferenceLibrary, VariantIndex},
    normalize::NormalizedPose,
};
use num_traits::ToPrimitive;
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// A frame that was, at some point, the best match for a class.
#[derive(Debug, Clone)]
pub struct Snapshot<F> {
    pub frame_index: usize,
    pub frame: F,
    pub candidate: NormalizedPose,
    pub matched: ClassMatch,
}

impl<F> Snapshot<F> {
    pub fn score(&self) -> f64 {
        self.matched.score()
    }
}

#[derive(Debug, Clone)]
pub struct PoseClassState<F> {
    confirmed: Option<Snapshot<F>>,
    running_max: Option<Snapshot<F>>,
    consecutive: usize,
}

impl<F> Default for PoseClassState<F> {
    fn default() -> Self {
        Self {
            confirmed: None,
            running_max: None,
            consecutive: 0,
        }
    }
}

fn stored_score<F>(snapshot: &Option<Snapshot<F>>) -> f64 {
    snapshot.as_ref().map_or(0.0, Snapshot::score)
}

impl<F> PoseClassState<F>
where
    F: Clone,
{
    fn observe(
        &mut self,
        config: &AnalysisConfig,
        frame_index: usize,
        frame: &F,
        candidate: &NormalizedPose,
        matched: &ClassMatch,
    ) {
        let score = matched.score();
        let snapshot = || Snapshot {
            frame_index,
            frame: frame.clone(),
            candidate: *candidate,
            matched: *matched,
        };

        if score > stored_score(&self.running_max) {
            self.running_max = Some(snapshot());
        }

        if score >= config.similarity_threshold {
            self.consecutive += 1;
            if self.consecutive >= config.consecutive_required
                && score > stored_score(&self.confirmed)
            {
                debug!(
                    message = "confirmed match",
                    class = %matched.class,
                    variant = %matched.reference.index,
                    frame_index,
                    score,
                );
                self.confirmed = Some(snapshot());
            }
        } else {
            self.consecutive = 0;
        }
    }

    pub fn confirmed(&self) -> Option<&Snapshot<F>> {
        self.confirmed.as_ref()
    }

    pub fn running_max(&self) -> Option<&Snapshot<F>> {
        self.running_max.as_ref()
    }

    pub fn consecutive(&self) -> usize {
        self.consecutive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Sustained a run of qualifying frames.
    Confirmed,
    /// Never confirmed; the best single frame is reported.
    Fallback,
    NotRecognized,
}

#[derive(Debug, Clone)]
pub struct ClassOutcome<F> {
    pub class: PoseClassId,
    pub resolution: Resolution,
    pub average_similarity: f64,
    pub selected: Option<Snapshot<F>>,
}

impl<F> ClassOutcome<F> {
    /// Professional variant to show next to the candidate frame.
    pub fn professional_variant(&self) -> VariantIndex {
        self.selected
            .as_ref()
            .map_or(VariantIndex::DEFAULT, |s| s.matched.reference.index)
    }
}

pub struct ConsensusTracker<F> {
    config: AnalysisConfig,
    states: BTreeMap<PoseClassId, PoseClassState<F>>,
}

impl<F> ConsensusTracker<F>
where
    F: Clone,
{
    /// Track every class of `library` that has at least one variant.
    pub fn new(config: AnalysisConfig, library: &ReferenceLibrary) -> Self {
        Self {
            config,
            states: library
                .scorable()
                .map(|class| (class.id(), PoseClassState::default()))
                .collect(),
        }
    }

    /// Feed one frame's matches. Frames must arrive in stream order.
    pub fn observe(
        &mut self,
        frame_index: usize,
        frame: &F,
        candidate: &NormalizedPose,
        matches: &[ClassMatch],
    ) {
        for matched in matches {
            match self.states.get_mut(&matched.class) {
                Some(state) => {
                    state.observe(&self.config, frame_index, frame, candidate, matched);
                    trace!(
                        class = %matched.class,
                        frame_index,
                        score = matched.score(),
                        consecutive = state.consecutive,
                    );
                }
                None => warn!(message = "match for untracked pose class", class = %matched.class),
            }
        }
    }

    pub fn state(&self, class: PoseClassId) -> Option<&PoseClassState<F>> {
        self.states.get(&class)
    }

    /// Resolve every class of `library`, in class order.
    pub fn finish(mut self, library: &ReferenceLibrary) -> Vec<ClassOutcome<F>> {
        library
            .classes()
            .iter()
            .map(|class| {
                let id = class.id();
                let state = self.states.remove(&id).unwrap_or_default();
                resolve(id, state, library.variant_count(id))
            })
            .collect()
    }
}

fn resolve<F>(class: PoseClassId, state: PoseClassState<F>, variant_count: usize) -> ClassOutcome<F> {
    let PoseClassState {
        confirmed,
        running_max,
        ..
    } = state;

    if let Some(confirmed) = confirmed {
        return ClassOutcome {
            class,
            resolution: Resolution::Confirmed,
            average_similarity: confirmed.score(),
            selected: Some(confirmed),
        };
    }

    match running_max {
        Some(best) => {
            // the running maximum is spread over the class's variant count
            let average_similarity = match variant_count.to_f64() {
                Some(count) if variant_count > 0 => best.score() / count,
                _ => {
                    warn!(message = "pose class has no variants, reporting zero similarity", %class);
                    0.0
                }
            };
            ClassOutcome {
                class,
                resolution: Resolution::Fallback,
                average_similarity,
                selected: Some(best),
            }
        }
        None => ClassOutcome {
            class,
            resolution: Resolution::NotRecognized,
            average_similarity: 0.0,
            selected: None,
        },
    }
}
