const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;
const DEFAULT_CONSECUTIVE_REQUIRED: usize = 3;
const DEFAULT_MAX_WORKERS: usize = 6;

/// Knobs of the consensus gate and the scoring pool.
#[derive(Debug, Clone, Copy, PartialEq, structopt::StructOpt)]
pub struct AnalysisConfig {
    /// Composite score a frame needs to count towards the consensus gate.
    #[structopt(short = "t", long = "threshold", default_value = "0.8")]
    pub similarity_threshold: f64,

    /// Consecutive qualifying frames before a match is confirmed.
    #[structopt(short = "c", long = "consecutive", default_value = "3")]
    pub consecutive_required: usize,

    /// Upper bound on scoring threads per frame.
    #[structopt(long, default_value = "6")]
    pub max_workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            consecutive_required: DEFAULT_CONSECUTIVE_REQUIRED,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}
