// =============================================================================
// 3-Tranche Support Level Strategy
// =============================================================================
//
// levels:        Fibonacci + ATR tranche levels and their normalisation
// confirmation:  trailing-window confirmation scan per level
// publisher:     watch-channel feed for deferred confirmation refinement
// support:       historical support levels from repeated touches
// trend_filter:  200-DMA filter reported alongside the levels

pub mod confirmation;
pub mod levels;
pub mod publisher;
pub mod support;
pub mod trend_filter;

pub use confirmation::{scan_confirmations, ConfirmationKind, ConfirmationSignal};
pub use levels::{compute_tranche_levels, Tranche, TrancheLevels, TrancheWeights};
pub use publisher::{TrancheFeed, TrancheSlot};
pub use support::{identify_support_levels, DEFAULT_SUPPORT_WINDOW};
pub use trend_filter::{trend_filter, TrendFilter};
