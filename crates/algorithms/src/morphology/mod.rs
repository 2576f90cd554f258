//! Mathematical morphology over rasters and masks

mod dilate;
mod element;
mod erode;
mod opening;

pub use dilate::{dilate, Dilate, DilateParams};
pub use element::StructuringElement;
pub use erode::{erode, Erode, ErodeParams};
pub use opening::{opening, Opening, OpeningParams};
