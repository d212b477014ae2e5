use std::{collections::HashMap, hash::Hash};

///
/// Min-max normalize all values of a map to `[0, 1]`
///
/// If all values are equal (including the single-value case), every value is mapped to `1.0`.
///
pub fn normalize<K: Clone + Eq + Hash>(values: &HashMap<K, f64>) -> HashMap<K, f64> {
    let (min, max) = match min_max(values.values().copied()) {
        Some(bounds) => bounds,
        None => return HashMap::new(),
    };
    values
        .iter()
        .map(|(k, v)| (k.clone(), scale(*v, min, max)))
        .collect()
}

///
/// Min-max normalize a nested map (matrix) to `[0, 1]`
///
/// Minimum and maximum are taken over all entries of all rows.
///
pub fn normalize_nested<K: Clone + Eq + Hash>(
    values: &HashMap<K, HashMap<K, f64>>,
) -> HashMap<K, HashMap<K, f64>> {
    let (min, max) = match min_max(values.values().flat_map(|row| row.values().copied())) {
        Some(bounds) => bounds,
        None => return values.keys().map(|k| (k.clone(), HashMap::new())).collect(),
    };
    values
        .iter()
        .map(|(k, row)| {
            (
                k.clone(),
                row.iter()
                    .map(|(k2, v)| (k2.clone(), scale(*v, min, max)))
                    .collect(),
            )
        })
        .collect()
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}

fn scale(v: f64, min: f64, max: f64) -> f64 {
    if max - min == 0.0 {
        1.0
    } else {
        (v - min) / (max - min)
    }
}
