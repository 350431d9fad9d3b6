use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to construct NotNan from f64: {1}")]
    ConstructNotNan(#[source] ordered_float::FloatIsNan, f64),

    #[error("coordinate is not finite: {0}")]
    NonFiniteCoordinate(f64),

    #[error("expected {0} landmarks, got {1}")]
    GetExpectedNumLandmarks(usize, usize),

    #[error("pose class id out of range: {0}")]
    PoseClassId(u8),

    #[error("variant index out of range: {0}")]
    VariantIndex(u8),

    #[error("no pose class has a usable reference variant")]
    EmptyReferenceLibrary,

    #[error("failed to build scoring thread pool")]
    BuildThreadPool(#[source] rayon::ThreadPoolBuildError),

    #[error("failed to open video: {0:?}")]
    OpenVideo(PathBuf),

    #[error("failed to construct video capture for {1:?}")]
    ConstructVideoCapture(#[source] opencv::Error, PathBuf),

    #[error("failed to query video capture property")]
    GetCaptureProperty(#[source] opencv::Error),

    #[error("failed reading frame")]
    ReadFrame(#[source] opencv::Error),

    #[error("failed to allocate frame")]
    AllocFrame(#[source] opencv::Error),

    #[error("failed to copy frame")]
    CopyFrame(#[source] opencv::Error),

    #[error("failed to read image: {1:?}")]
    ReadImage(#[source] opencv::Error, PathBuf),

    #[error("failed to write image: {1:?}")]
    WriteImage(#[source] opencv::Error, PathBuf),

    #[error("image encoder refused to write: {0:?}")]
    EncodeImage(PathBuf),

    #[error("failed to draw line")]
    DrawLine(#[source] opencv::Error),

    #[error("failed to draw circle")]
    DrawCircle(#[source] opencv::Error),

    #[error("failed to draw text")]
    PutText(#[source] opencv::Error),

    #[error("failed to convert landmark ({0}, {1}) to pixel coordinates")]
    ConvertLandmarkToPixel(f64, f64),

    #[error("failed to get path as &str: {0:?}")]
    GetPathAsStr(PathBuf),

    #[error("failed to read landmark sidecar: {1:?}")]
    ReadSidecar(#[source] std::io::Error, PathBuf),

    #[error("failed to parse landmark sidecar {1:?} at line {2}")]
    ParseSidecar(#[source] serde_json::Error, PathBuf, usize),
}
