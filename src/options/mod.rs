//! Options-chain analytics drawn over the price chart.

pub mod gamma;

pub use gamma::{
    black_scholes_gamma, gamma_exposure, gamma_profile, time_to_expiration, GammaProfile,
    OptionChain, OptionContract, OptionKind, StrikeExposure,
};
