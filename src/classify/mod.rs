//! Per-batch classification of flight records.
//!
//! - [`domestic`]: keep flights whose endpoints are both domestic
//! - [`carrier`]: keep flights of the target carrier
//! - [`airports`]: keep a carrier's flights within an airport set

pub mod airports;
pub mod carrier;
pub mod domestic;

pub use airports::{AirportFilter, DEFAULT_AIRPORTS, pick_column};
pub use carrier::{CarrierResolution, select_carrier};
pub use domestic::{DomesticSignal, classify_domestic};
