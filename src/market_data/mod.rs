pub mod eps_series;
pub mod price_series;

// Re-export the core input types (e.g. `use crate::market_data::PriceSeries`).
pub use eps_series::{EpsFrequency, EpsObservation, EpsSeries};
pub use price_series::{PricePoint, PriceSeries};
