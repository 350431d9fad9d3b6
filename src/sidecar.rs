//! Replays landmarks an external detector wrote next to the media files.
//!
//! A video's landmarks live in a JSON-lines track, one line per frame holding
//! either `null` or an array of `[x, y, z]` triples (the 10 scored landmarks or
//! a full 33-point MediaPipe result). An image's landmarks live in a `.json`
//! file beside it with the same array format.

use crate::{
    error::Error,
    landmark::LandmarkSet,
    provider::{Image, LandmarkProvider, Origin},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, trace};

fn parse_entry(text: &str, path: &Path, line: usize) -> Result<Option<LandmarkSet>, Error> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let triples: Option<Vec<[f64; 3]>> = serde_json::from_str(text)
        .map_err(|e| Error::ParseSidecar(e, path.to_path_buf(), line))?;
    triples
        .map(|triples| LandmarkSet::from_triples(&triples))
        .transpose()
}

#[derive(Debug, Default)]
pub struct SidecarProvider {
    frames: Vec<Option<LandmarkSet>>,
}

impl SidecarProvider {
    /// Provider for reference images only; every video frame is a miss.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_track<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|e| Error::ReadSidecar(e, path.to_path_buf()))?;
        let frames = text
            .lines()
            .enumerate()
            .map(|(i, line)| parse_entry(line, path, i + 1))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            message = "loaded landmark track",
            ?path,
            frames = frames.len(),
            with_pose = frames.iter().filter(|frame| frame.is_some()).count(),
        );
        Ok(Self { frames })
    }

    /// `clip.mp4` → `clip.landmarks.jsonl`
    pub fn track_path(video: &Path) -> PathBuf {
        video.with_extension("landmarks.jsonl")
    }

    /// `pose1-2.jpg` → `pose1-2.json`
    pub fn image_sidecar_path(image: &Path) -> PathBuf {
        image.with_extension("json")
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl LandmarkProvider for SidecarProvider {
    fn detect(&mut self, image: &Image<'_>) -> Result<Option<LandmarkSet>, Error> {
        match image.origin {
            Origin::VideoFrame(index) => {
                let found = self.frames.get(index).copied().flatten();
                if index >= self.frames.len() {
                    trace!(message = "frame is past the end of the landmark track", index);
                }
                Ok(found)
            }
            Origin::File(path) => {
                let sidecar = Self::image_sidecar_path(path);
                if !sidecar.exists() {
                    return Ok(None);
                }
                let text = fs::read_to_string(&sidecar)
                    .map_err(|e| Error::ReadSidecar(e, sidecar.clone()))?;
                parse_entry(&text, &sidecar, 1)
            }
        }
    }
}
