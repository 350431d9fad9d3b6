use crate::error::Error;
use num_traits::cast::ToPrimitive;
use opencv::{
    core::{Mat, CV_8UC3},
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_COUNT},
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Decoded frames of a video file, in stream order.
pub struct VideoFrames {
    capture: VideoCapture,
    path: PathBuf,
    next_index: usize,
}

impl VideoFrames {
    pub fn open<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        let path_str = path.to_str().ok_or_else(|| Error::GetPathAsStr(path.clone()))?;
        let capture = VideoCapture::from_file(path_str, CAP_ANY)
            .map_err(|e| Error::ConstructVideoCapture(e, path.clone()))?;
        if !capture
            .is_opened()
            .map_err(|e| Error::ConstructVideoCapture(e, path.clone()))?
        {
            return Err(Error::OpenVideo(path));
        }
        info!(message = "opened video", ?path);
        Ok(Self {
            capture,
            path,
            next_index: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frame count reported by the container, when it reports one.
    pub fn frame_count(&self) -> Result<Option<u64>, Error> {
        let count = self
            .capture
            .get(CAP_PROP_FRAME_COUNT)
            .map_err(Error::GetCaptureProperty)?;
        Ok(count.to_u64().filter(|&count| count > 0))
    }

    fn read(&mut self) -> Result<Option<Mat>, Error> {
        let mut frame = Mat::zeros(1, 1, CV_8UC3)
            .and_then(|expr| expr.to_mat())
            .map_err(Error::AllocFrame)?;
        if self.capture.read(&mut frame).map_err(Error::ReadFrame)? {
            Ok(Some(frame))
        } else {
            Ok(None)
        }
    }
}

impl Iterator for VideoFrames {
    type Item = Result<(usize, Mat), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read() {
            Ok(Some(frame)) => {
                let index = self.next_index;
                self.next_index += 1;
                Some(Ok((index, frame)))
            }
            Ok(None) => None,
            Err(error) => Some(Err(error)),
        }
    }
}
