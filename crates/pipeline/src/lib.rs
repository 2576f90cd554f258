//! # Verdis Pipeline
//!
//! Temporal windowing, per-window compositing and time-series assembly:
//! turns filtered imagery into tidy per-region vegetation-index tables.
//!
//! The imagery catalog and the map renderer are external collaborators,
//! reached through the [`provider::ImageryProvider`] and
//! [`display::MapRenderer`] traits.

pub mod display;
pub mod mosaic;
pub mod provider;
pub mod series;
pub mod table;
pub mod windows;

pub use display::{LayerSpec, MapRenderer};
pub use mosaic::masked_composite;
pub use provider::{ImageryProvider, MemoryProvider};
pub use series::{assemble, assemble_all, IndexSource, SeriesRow, SeriesSource};
pub use table::{write_table, write_table_to};
pub use windows::{monthly_windows, DateWindow};
