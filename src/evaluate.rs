use crate::{
    error::Error,
    library::{PoseClass, PoseClassId, ReferenceLibrary, ReferenceVariant},
    normalize::NormalizedPose,
    similarity::{similarity, SimilarityResult},
};
use rayon::prelude::*;
use tracing::debug;

/// The best-scoring reference variant of one pose class for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMatch {
    pub class: PoseClassId,
    pub reference: ReferenceVariant,
    pub similarity: SimilarityResult,
}

impl ClassMatch {
    #[inline]
    pub fn score(&self) -> f64 {
        self.similarity.composite
    }
}

/// Score `pose` against every variant of `class`, keeping the first variant
/// with the highest composite score. `None` when the class has no variants.
pub fn best_variant(pose: &NormalizedPose, class: &PoseClass) -> Option<ClassMatch> {
    class
        .variants()
        .iter()
        .map(|reference| (reference, similarity(pose, &reference.pose)))
        .fold(None::<(&ReferenceVariant, SimilarityResult)>, |best, next| match best {
            Some(best) if best.1.composite >= next.1.composite => Some(best),
            _ => Some(next),
        })
        .map(|(reference, similarity)| ClassMatch {
            class: class.id(),
            reference: *reference,
            similarity,
        })
}

/// Scores one frame against the whole reference library.
pub struct FrameEvaluator<'a> {
    library: &'a ReferenceLibrary,
    pool: Option<rayon::ThreadPool>,
}

impl<'a> FrameEvaluator<'a> {
    /// Fan out across at most `max_workers` threads, bounded by the number of
    /// cores. One worker scores on the calling thread.
    pub fn new(library: &'a ReferenceLibrary, max_workers: usize) -> Result<Self, Error> {
        let workers = num_cpus::get().min(max_workers).max(1);
        let pool = if workers > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("pose-score-{}", i))
                    .build()
                    .map_err(Error::BuildThreadPool)?,
            )
        } else {
            None
        };
        debug!(message = "constructed frame evaluator", workers);
        Ok(Self { library, pool })
    }

    pub fn sequential(library: &'a ReferenceLibrary) -> Self {
        Self {
            library,
            pool: None,
        }
    }

    pub fn library(&self) -> &'a ReferenceLibrary {
        self.library
    }

    /// One match per scorable class, in class order.
    pub fn evaluate(&self, pose: &NormalizedPose) -> Vec<ClassMatch> {
        let classes = self.library.scorable().collect::<Vec<_>>();
        match &self.pool {
            Some(pool) => pool.install(|| {
                classes
                    .par_iter()
                    .filter_map(|class| best_variant(pose, class))
                    .collect()
            }),
            None => classes
                .iter()
                .filter_map(|class| best_variant(pose, class))
                .collect(),
        }
    }
}
