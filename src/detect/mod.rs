//! Detection: backends, box decoding, suppression, labels.

pub mod backend;
pub mod backends;
pub mod decode;
pub mod labels;
pub mod nms;

pub use backend::{DetectorBackend, RawPrediction};
pub use decode::{decode, Detection};
pub use labels::Labels;
pub use nms::{iou, suppress};
