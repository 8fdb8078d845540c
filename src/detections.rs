//! Person detections produced upstream, keyed by image.
//!
//! The artifact is a JSON object mapping an image path to
//! the boxes found in it:
//!
//! ```json
//! {
//!   "frames/video-00123.jpg": [[10, 20, 80, 210], [120, 25, 190, 230]],
//!   "frames/video-00124.jpg": []
//! }
//! ```
use std::{collections::BTreeMap, fs::File, io::BufReader, io::Read, path::Path};

use serde_derive::*;

use crate::{error::ScreeningError, geometry::BoundingBox};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct DetectionMap(BTreeMap<String, Vec<BoundingBox>>);

impl DetectionMap {
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, ScreeningError> {
        Ok(serde_json::from_reader(rdr)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ScreeningError> {
        let file = File::open(path).map_err(|source| ScreeningError::DetectionsUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn insert(&mut self, image: impl Into<String>, boxes: Vec<BoundingBox>) {
        self.0.insert(image.into(), boxes);
    }

    /// Images in identifier order, each with its boxes in
    /// detector order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[BoundingBox])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn box_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl From<BTreeMap<String, Vec<BoundingBox>>> for DetectionMap {
    fn from(map: BTreeMap<String, Vec<BoundingBox>>) -> Self {
        DetectionMap(map)
    }
}
