// =============================================================================
// Gamma Exposure (GEX) by strike
// =============================================================================
//
// Black-Scholes gamma for spot S, strike K, time T (years), rate r, vol σ:
//
//   d1    = (ln(S/K) + (r + σ²/2)·T) / (σ·√T)
//   gamma = e^(−d1²/2) / (S·σ·√T·√(2π))
//
// Dealer exposure per strike:
//
//   GEX = gamma · openInterest · S² · contractMultiplier
//
// Calls contribute positive GEX, puts negative. The call wall is the strike
// with the largest call GEX; the put wall the strike with the largest |put
// GEX|. The first strike wins a tie.
// =============================================================================

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::runtime_config::OptionsParams;

const MILLIS_PER_DAY: f64 = 86_400_000.0;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub kind: OptionKind,
    pub strike: f64,
    pub open_interest: f64,
    /// Implied volatility in percent (25.0 means σ = 0.25).
    pub implied_volatility_pct: f64,
}

impl OptionContract {
    /// Contracts missing a strike, open interest or implied volatility carry
    /// no exposure and are skipped.
    fn is_usable(&self) -> bool {
        [self.strike, self.open_interest, self.implied_volatility_pct]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// One expiry of an option chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    /// Time the chain was quoted; time to expiration is measured from here.
    pub quoted_at: DateTime<Utc>,
    pub expiration: DateTime<Utc>,
    /// Underlying price from the quote, when the provider supplied one.
    pub spot: Option<f64>,
    pub contracts: Vec<OptionContract>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrikeExposure {
    pub strike: f64,
    pub kind: OptionKind,
    pub open_interest: f64,
    pub gex: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GammaProfile {
    pub spot: f64,
    pub expiration: DateTime<Utc>,
    pub days_to_expiration: f64,
    /// Calls first, then puts, each in chain order.
    pub strikes: Vec<StrikeExposure>,
    pub call_wall: Option<f64>,
    pub put_wall: Option<f64>,
}

impl GammaProfile {
    /// Sum of call and put GEX across all strikes.
    pub fn net_gex(&self) -> f64 {
        self.strikes.iter().map(|s| s.gex).sum()
    }
}

/// Black-Scholes gamma; 0 when any of spot, strike, time or vol is not positive.
pub fn black_scholes_gamma(spot: f64, strike: f64, years: f64, rate: f64, sigma: f64) -> f64 {
    if years <= 0.0 || sigma <= 0.0 || spot <= 0.0 || strike <= 0.0 {
        return 0.0;
    }
    let sqrt_t = years.sqrt();
    let d1 = ((spot / strike).ln() + (rate + 0.5 * sigma * sigma) * years) / (sigma * sqrt_t);
    (-0.5 * d1 * d1).exp() / (spot * sigma * sqrt_t * (2.0 * PI).sqrt())
}

pub fn gamma_exposure(gamma: f64, open_interest: f64, spot: f64, multiplier: f64) -> f64 {
    gamma * open_interest * spot * spot * multiplier
}

/// Days and floored years from `from` to `to`.
pub fn time_to_expiration(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    min_years: f64,
) -> (f64, f64) {
    let days = (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY;
    (days, (days / DAYS_PER_YEAR).max(min_years))
}

/// GEX per strike plus call / put walls for one expiry.
///
/// The chain's own spot is used when valid, otherwise `fallback_spot` (the
/// last close of the chart). `None` without a positive spot or without a
/// single usable contract.
pub fn gamma_profile(
    chain: &OptionChain,
    fallback_spot: Option<f64>,
    params: &OptionsParams,
) -> Option<GammaProfile> {
    let valid = |s: &f64| s.is_finite() && *s > 0.0;
    let Some(spot) = chain.spot.filter(valid).or(fallback_spot.filter(valid)) else {
        debug!("gamma profile: no usable spot price");
        return None;
    };

    let (days, years) =
        time_to_expiration(chain.quoted_at, chain.expiration, params.min_years_to_expiration);

    let exposure = |c: &OptionContract| {
        let sigma = c.implied_volatility_pct / 100.0;
        let gamma = black_scholes_gamma(spot, c.strike, years, params.risk_free_rate, sigma);
        let gex = gamma_exposure(gamma, c.open_interest, spot, params.contract_multiplier);
        StrikeExposure {
            strike: c.strike,
            kind: c.kind,
            open_interest: c.open_interest,
            gex: match c.kind {
                OptionKind::Call => gex,
                OptionKind::Put => -gex,
            },
        }
    };

    let usable = |kind: OptionKind| {
        chain
            .contracts
            .iter()
            .filter(move |c| c.kind == kind && c.is_usable())
    };
    let strikes: Vec<StrikeExposure> = usable(OptionKind::Call)
        .chain(usable(OptionKind::Put))
        .map(exposure)
        .collect();

    if strikes.is_empty() {
        debug!(contracts = chain.contracts.len(), "gamma profile: no usable contracts");
        return None;
    }

    // --- Walls ---------------------------------------------------------------
    let mut call_wall: Option<(f64, f64)> = None;
    let mut put_wall: Option<(f64, f64)> = None;
    for s in &strikes {
        match s.kind {
            OptionKind::Call => {
                if s.gex > call_wall.map_or(0.0, |(_, g)| g) {
                    call_wall = Some((s.strike, s.gex));
                }
            }
            OptionKind::Put => {
                if s.gex.abs() > put_wall.map_or(0.0, |(_, g)| g.abs()) {
                    put_wall = Some((s.strike, s.gex));
                }
            }
        }
    }

    trace!(
        spot,
        days,
        strikes = strikes.len(),
        call_wall = ?call_wall.map(|(k, _)| k),
        put_wall = ?put_wall.map(|(k, _)| k),
        "gamma profile"
    );

    Some(GammaProfile {
        spot,
        expiration: chain.expiration,
        days_to_expiration: days,
        strikes,
        call_wall: call_wall.map(|(k, _)| k),
        put_wall: put_wall.map(|(k, _)| k),
    })
}
