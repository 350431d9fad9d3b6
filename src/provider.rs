use crate::{error::Error, landmark::LandmarkSet};
use opencv::core::Mat;
use std::path::Path;

/// Where an image handed to a [`LandmarkProvider`] came from.
#[derive(Debug, Clone, Copy)]
pub enum Origin<'a> {
    /// Zero-based position in the analysed video.
    VideoFrame(usize),
    File(&'a Path),
}

#[derive(Debug, Clone, Copy)]
pub struct Image<'a> {
    pub mat: &'a Mat,
    pub origin: Origin<'a>,
}

pub trait LandmarkProvider {
    /// Find the scored landmarks in `image`, or `None` when no pose is visible.
    fn detect(&mut self, image: &Image<'_>) -> Result<Option<LandmarkSet>, Error>;
}

impl<P> LandmarkProvider for &mut P
where
    P: LandmarkProvider + ?Sized,
{
    fn detect(&mut self, image: &Image<'_>) -> Result<Option<LandmarkSet>, Error> {
        (**self).detect(image)
    }
}
