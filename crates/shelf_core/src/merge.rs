use crate::{canonicalize_url, ProductRecord};

/// Put the seed first (flagged), then every analog whose canonical URL differs
/// from the seed's, in harvested order and flagged as non-seed.
pub fn merge_with_seed(mut seed: ProductRecord, analogs: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let seed_key = canonicalize_url(&seed.url).unwrap_or_else(|| seed.url.clone());
    seed.is_seed = Some(true);

    let mut merged = Vec::with_capacity(analogs.len() + 1);
    merged.push(seed);
    merged.extend(
        analogs
            .into_iter()
            .filter(|analog| {
                canonicalize_url(&analog.url).as_deref().unwrap_or(&analog.url) != seed_key
            })
            .map(|mut analog| {
                analog.is_seed = Some(false);
                analog
            }),
    );
    merged
}
