use crate::{
    error::Error,
    normalize::{normalize_or_degrade, NormalizedPose},
    provider::{Image, LandmarkProvider, Origin},
};
use opencv::{core::Mat, imgcodecs, prelude::*};
use std::{
    fmt,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoseClassId(u8);

impl PoseClassId {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(id: u8) -> Result<Self, Error> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(Self(id))
        } else {
            Err(Error::PoseClassId(id))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl fmt::Display for PoseClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One-based position of a reference example within its pose class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantIndex(u8);

impl VariantIndex {
    pub const MAX: u8 = 4;
    /// Variant shown when a class has no match of its own.
    pub const DEFAULT: Self = Self(1);

    pub fn new(index: u8) -> Result<Self, Error> {
        if (1..=Self::MAX).contains(&index) {
            Ok(Self(index))
        } else {
            Err(Error::VariantIndex(index))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=Self::MAX).map(Self)
    }
}

impl fmt::Display for VariantIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceVariant {
    pub index: VariantIndex,
    pub pose: NormalizedPose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoseClass {
    id: PoseClassId,
    variants: Vec<ReferenceVariant>,
}

impl PoseClass {
    pub fn new(id: PoseClassId, variants: Vec<ReferenceVariant>) -> Self {
        Self { id, variants }
    }

    pub fn id(&self) -> PoseClassId {
        self.id
    }

    pub fn variants(&self) -> &[ReferenceVariant] {
        &self.variants
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Addressable store of professional reference images.
pub trait ReferenceSource {
    fn image(&self, class: PoseClassId, variant: VariantIndex) -> Result<Option<Mat>, Error>;

    fn image_path(&self, class: PoseClassId, variant: VariantIndex) -> PathBuf;
}

/// Reference images named `pose{class}-{variant}.jpg` inside one directory.
#[derive(Debug, Clone)]
pub struct ReferenceDirectory {
    root: PathBuf,
}

impl ReferenceDirectory {
    pub fn new<P>(root: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn file_name(class: PoseClassId, variant: VariantIndex) -> String {
        format!("pose{}-{}.jpg", class, variant)
    }
}

impl ReferenceSource for ReferenceDirectory {
    fn image(&self, class: PoseClassId, variant: VariantIndex) -> Result<Option<Mat>, Error> {
        let path = self.image_path(class, variant);
        if !path.exists() {
            return Ok(None);
        }
        let path_str = path.to_str().ok_or_else(|| Error::GetPathAsStr(path.clone()))?;
        let image = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR)
            .map_err(|e| Error::ReadImage(e, path.clone()))?;
        if image.empty().map_err(|e| Error::ReadImage(e, path.clone()))? {
            return Ok(None);
        }
        Ok(Some(image))
    }

    fn image_path(&self, class: PoseClassId, variant: VariantIndex) -> PathBuf {
        self.root.join(Self::file_name(class, variant))
    }
}

/// Normalized reference variants for every pose class, fixed for the run.
#[derive(Debug, Clone)]
pub struct ReferenceLibrary {
    classes: Vec<PoseClass>,
}

impl ReferenceLibrary {
    /// Fails when no class has a single usable variant.
    pub fn from_classes(mut classes: Vec<PoseClass>) -> Result<Self, Error> {
        if classes.iter().all(PoseClass::is_empty) {
            return Err(Error::EmptyReferenceLibrary);
        }
        classes.sort_by_key(PoseClass::id);
        Ok(Self { classes })
    }

    pub fn load<S, P>(source: &S, mut provider: P) -> Result<Self, Error>
    where
        S: ReferenceSource + ?Sized,
        P: LandmarkProvider,
    {
        let mut classes = Vec::with_capacity(usize::from(PoseClassId::MAX));

        for class in PoseClassId::all() {
            let mut variants = Vec::with_capacity(usize::from(VariantIndex::MAX));

            for index in VariantIndex::all() {
                let path = source.image_path(class, index);
                let image = match source.image(class, index) {
                    Ok(Some(image)) => image,
                    Ok(None) => {
                        error!(message = "reference image is missing", ?path);
                        continue;
                    }
                    Err(error) => {
                        error!(message = "failed to load reference image", ?path, %error);
                        continue;
                    }
                };

                let detected = provider.detect(&Image {
                    mat: &image,
                    origin: Origin::File(&path),
                });
                match detected {
                    Ok(Some(landmarks)) => {
                        debug!(message = "loaded reference variant", %class, %index);
                        variants.push(ReferenceVariant {
                            index,
                            pose: normalize_or_degrade(&landmarks),
                        });
                    }
                    Ok(None) => warn!(message = "no landmarks in reference image", ?path),
                    Err(error) => {
                        warn!(message = "landmark detection failed for reference image", ?path, %error)
                    }
                }
            }

            if variants.is_empty() {
                error!(message = "pose class has no usable reference images", %class);
            }
            classes.push(PoseClass::new(class, variants));
        }

        let library = Self::from_classes(classes)?;
        info!(
            message = "loaded reference library",
            usable_classes = library.scorable().count(),
            variants = library.classes.iter().map(|c| c.variants.len()).sum::<usize>(),
        );
        Ok(library)
    }

    /// All classes, including those without variants.
    pub fn classes(&self) -> &[PoseClass] {
        &self.classes
    }

    /// Classes with at least one variant.
    pub fn scorable(&self) -> impl Iterator<Item = &PoseClass> {
        self.classes.iter().filter(|class| !class.is_empty())
    }

    pub fn class(&self, id: PoseClassId) -> Option<&PoseClass> {
        self.classes.iter().find(|class| class.id == id)
    }

    pub fn variant_count(&self, id: PoseClassId) -> usize {
        self.class(id).map_or(0, |class| class.variants.len())
    }
}
