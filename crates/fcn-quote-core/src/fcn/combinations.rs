use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::QuoteLimits;
use crate::error::FcnError;
use crate::fcn::params::validate_assets;
use crate::types::{with_metadata, ComputationOutput, Symbol};
use crate::FcnResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One basket drawn from the pool. `index` is the position in enumeration
/// order and serves as the final ranking tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combination {
    pub index: usize,
    pub basket_size: usize,
    pub assets: Vec<Symbol>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumeration {
    pub combinations: Vec<Combination>,
    /// Requested sizes larger than the pool; they contribute nothing.
    pub skipped_sizes: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationInput {
    pub pool: Vec<Symbol>,
    pub basket_sizes: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationOutput {
    pub total_count: usize,
    pub count_by_size: Vec<(usize, usize)>,
    pub combinations: Vec<Combination>,
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

/// C(n, k), computed incrementally so intermediate values stay exact.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result = 1usize;
    for i in 0..k {
        result = result * (n - i) / (i + 1);
    }
    result
}

/// Number of baskets `enumerate` will produce for these sizes.
pub fn combination_count(pool_size: usize, basket_sizes: &[usize]) -> usize {
    normalise_sizes(basket_sizes)
        .into_iter()
        .map(|k| binomial(pool_size, k))
        .sum()
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// Drops repeated sizes, keeping the first occurrence.
fn normalise_sizes(basket_sizes: &[usize]) -> Vec<usize> {
    let mut sizes = Vec::with_capacity(basket_sizes.len());
    for &k in basket_sizes {
        if !sizes.contains(&k) {
            sizes.push(k);
        }
    }
    sizes
}

/// Index sets of every k-subset of 0..n in lexicographic order.
fn index_subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        let Some(i) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
            break;
        };
        idx[i] += 1;
        for j in i + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
    out
}

/// Every k-subset of `pool` for each requested k. Sizes are visited in the
/// order given and subsets are lexicographic on pool order, so identical
/// inputs always enumerate identically.
pub fn enumerate(
    pool: &[Symbol],
    basket_sizes: &[usize],
    limits: &QuoteLimits,
) -> FcnResult<Enumeration> {
    if pool.is_empty() {
        return Err(FcnError::InvalidRequest(
            "asset pool must not be empty".into(),
        ));
    }
    if basket_sizes.is_empty() {
        return Err(FcnError::InvalidRequest(
            "at least one basket size is required".into(),
        ));
    }
    if let Some(&bad) = basket_sizes
        .iter()
        .find(|&&k| k == 0 || k > limits.max_basket_size)
    {
        return Err(FcnError::InvalidRequest(format!(
            "basket size {bad} outside 1..={}",
            limits.max_basket_size
        )));
    }
    validate_assets(pool, limits.max_pool_assets)?;

    let mut enumeration = Enumeration::default();
    for k in normalise_sizes(basket_sizes) {
        if k > pool.len() {
            enumeration.skipped_sizes.push(k);
            continue;
        }
        for subset in index_subsets(pool.len(), k) {
            let index = enumeration.combinations.len();
            enumeration.combinations.push(Combination {
                index,
                basket_size: k,
                assets: subset.into_iter().map(|i| pool[i].clone()).collect(),
            });
        }
    }
    Ok(enumeration)
}

/// Enumerates a request and wraps it in the standard output envelope.
pub fn generate_combinations(
    input: &CombinationInput,
    limits: &QuoteLimits,
) -> FcnResult<ComputationOutput<CombinationOutput>> {
    let start = Instant::now();
    let enumeration = enumerate(&input.pool, &input.basket_sizes, limits)?;

    let warnings: Vec<String> = enumeration
        .skipped_sizes
        .iter()
        .map(|k| {
            format!(
                "Basket size {k} exceeds pool size {}; no combinations generated",
                input.pool.len()
            )
        })
        .collect();

    let count_by_size = normalise_sizes(&input.basket_sizes)
        .into_iter()
        .map(|k| (k, binomial(input.pool.len(), k)))
        .collect();

    let assumptions = serde_json::json!({
        "pool_size": input.pool.len(),
        "basket_sizes": input.basket_sizes,
        "order": "requested size order, lexicographic on pool order within a size",
    });

    let output = CombinationOutput {
        total_count: enumeration.combinations.len(),
        count_by_size,
        combinations: enumeration.combinations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Exhaustive k-subset enumeration",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
