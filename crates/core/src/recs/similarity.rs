//! Content-based similarity between two products.

use crate::domain::product::Product;

const CATEGORY_MATCH_POINTS: f64 = 40.0;
const PRICE_CLOSE_POINTS: f64 = 30.0;
const PRICE_NEAR_POINTS: f64 = 15.0;
const RATING_PROXIMITY_POINTS: f64 = 20.0;
const QUALITY_BOOST_POINTS: f64 = 10.0;

const PRICE_CLOSE_RATIO: f64 = 0.3;
const PRICE_NEAR_RATIO: f64 = 0.5;
const RATING_PROXIMITY_STARS: f64 = 1.0;
const QUALITY_BOOST_THRESHOLD: f64 = 4.5;

/// Heuristic match score between a base product and a candidate.
///
/// Additive and side-effect free. Category, price, and rating terms are
/// symmetric; the quality boost is not: it looks only at the candidate's
/// rating, so `similarity_score(a, b)` and `similarity_score(b, a)` can
/// differ by exactly the boost.
pub fn similarity_score(base: &Product, candidate: &Product) -> f64 {
    let mut score = 0.0;

    if base.category == candidate.category {
        score += CATEGORY_MATCH_POINTS;
    }

    let distance = relative_price_distance(base.price, candidate.price);
    if distance <= PRICE_CLOSE_RATIO {
        score += PRICE_CLOSE_POINTS;
    } else if distance <= PRICE_NEAR_RATIO {
        score += PRICE_NEAR_POINTS;
    }

    if (base.rating - candidate.rating).abs() <= RATING_PROXIMITY_STARS {
        score += RATING_PROXIMITY_POINTS;
    }

    if candidate.rating >= QUALITY_BOOST_THRESHOLD {
        score += QUALITY_BOOST_POINTS;
    }

    score
}

/// |p1 - p2| relative to the pair's average price. Two zero prices are
/// treated as identical rather than producing 0/0.
fn relative_price_distance(p1: f64, p2: f64) -> f64 {
    let average = (p1 + p2) / 2.0;
    if average == 0.0 {
        return 0.0;
    }
    (p1 - p2).abs() / average
}
