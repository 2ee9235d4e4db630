// =============================================================================
// Historical Support Levels
// =============================================================================
//
// A bar is a support candidate when its close sits within 2% of the lowest
// close in the surrounding `[i - window, i + window)` bars. The candidate
// level (that local minimum) counts once for every close inside a 3x wider
// window that lies within 2% of it; three touches make it a support level.
//
// Candidates within 2% of each other are merged (the most-touched one wins),
// then the survivors are sorted high to low and any level within 5% of the
// previously kept one is dropped.
// =============================================================================

use tracing::trace;

use crate::indicators::rolling_extremes;

pub const DEFAULT_SUPPORT_WINDOW: usize = 30;

const MATCH_TOLERANCE: f64 = 0.02;
const MIN_TOUCHES: usize = 3;
const MIN_SEPARATION: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    price: f64,
    touches: usize,
}

/// Support prices found in `closes`, highest first.
pub fn identify_support_levels(closes: &[f64], window: usize) -> Vec<f64> {
    let n = closes.len();
    if window == 0 || n <= 2 * window {
        return Vec::new();
    }

    // Trailing minimum over 2w bars ending at i + w - 1 == min of [i - w, i + w).
    let extremes = rolling_extremes(closes, closes, 2 * window);

    let mut candidates: Vec<Candidate> = Vec::new();
    for i in window..n - window {
        let Some((_, local_min)) = extremes[i + window - 1] else {
            continue;
        };
        if local_min <= 0.0 || (closes[i] - local_min).abs() / local_min >= MATCH_TOLERANCE {
            continue;
        }

        let band = local_min * MATCH_TOLERANCE;
        let wide = &closes[i.saturating_sub(3 * window)..(i + 3 * window).min(n)];
        let touches = wide.iter().filter(|c| (*c - local_min).abs() < band).count();
        if touches >= MIN_TOUCHES {
            candidates.push(Candidate {
                price: local_min,
                touches,
            });
        }
    }

    // --- Group nearby candidates, keeping the most-touched -------------------
    let mut grouped: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        match grouped
            .iter_mut()
            .find(|g| (g.price - candidate.price).abs() / candidate.price < MATCH_TOLERANCE)
        {
            Some(group) => {
                if candidate.touches > group.touches {
                    *group = candidate;
                }
            }
            None => grouped.push(candidate),
        }
    }

    grouped.sort_by(|a, b| b.price.total_cmp(&a.price));

    let mut levels: Vec<f64> = Vec::new();
    for candidate in grouped {
        let far_enough = levels.last().map_or(true, |&prev| {
            (prev - candidate.price).abs() / candidate.price > MIN_SEPARATION
        });
        if far_enough {
            levels.push(candidate.price);
        }
    }

    trace!(count = levels.len(), window, "support levels identified");
    levels
}
