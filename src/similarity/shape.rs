use crate::{
    normalize::NormalizedPose,
    similarity::metrics::{finite, MetricError},
};
use ndarray::Array1;

fn flatten(pose: &NormalizedPose) -> Array1<f64> {
    pose.points()
        .iter()
        .flat_map(|point| [point.x, point.y, point.z])
        .collect()
}

/// Mean of cosine similarity and inverse euclidean distance between the two
/// flattened coordinate vectors.
pub(crate) fn shape_similarity(
    candidate: &NormalizedPose,
    reference: &NormalizedPose,
) -> Result<f64, MetricError> {
    let a = flatten(candidate);
    let b = flatten(reference);

    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 {
        return Err(MetricError::ZeroMagnitude("candidate coordinate"));
    }
    if norm_b == 0.0 {
        return Err(MetricError::ZeroMagnitude("reference coordinate"));
    }

    // anti-correlated shapes score zero rather than negative
    let cosine = finite("cosine similarity", a.dot(&b) / (norm_a * norm_b))?.clamp(0.0, 1.0);

    let delta = &a - &b;
    let euclidean = finite("euclidean distance", delta.dot(&delta).sqrt())?;

    Ok((cosine + 1.0 / (1.0 + euclidean)) / 2.0)
}
