use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::Add;

/// Bucket for items whose key is missing or blank
pub const UNDEFINED_KEY: &str = "undefined";

/// Count items per key value. Totals always equal `items.len()`.
pub fn count_by<T, K, F>(items: &[T], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&T) -> Option<K>,
    K: Display,
{
    let mut counts = BTreeMap::new();
    for item in items {
        let bucket = key(item)
            .map(|k| k.to_string())
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| UNDEFINED_KEY.to_string());
        *counts.entry(bucket).or_insert(0) += 1;
    }
    counts
}

/// Sum a numeric field, treating missing values as zero
pub fn sum_by<T, V, F>(items: &[T], value: F) -> V
where
    F: Fn(&T) -> Option<V>,
    V: Default + Add<Output = V>,
{
    items
        .iter()
        .fold(V::default(), |acc, item| acc + value(item).unwrap_or_default())
}

/// `part` as a rounded percentage of `whole`; zero when `whole` is zero
pub fn percentage_of<P: ToPrimitive, W: ToPrimitive>(part: P, whole: W) -> i64 {
    let part = part.to_f64().unwrap_or(0.0);
    let whole = whole.to_f64().unwrap_or(0.0);
    if whole == 0.0 || !whole.is_finite() {
        return 0;
    }
    (part / whole * 100.0).round() as i64
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgeStats {
    pub mean: i64,
    pub min: i64,
    pub max: i64,
}

/// Rounded mean, min and max over items with a defined age
pub fn age_stats<T, F>(items: &[T], age: F) -> AgeStats
where
    F: Fn(&T) -> Option<i64>,
{
    let ages: Vec<i64> = items.iter().filter_map(|item| age(item)).collect();
    if ages.is_empty() {
        return AgeStats::default();
    }

    let total: i64 = ages.iter().sum();
    AgeStats {
        mean: (total as f64 / ages.len() as f64).round() as i64,
        min: ages.iter().copied().min().unwrap_or(0),
        max: ages.iter().copied().max().unwrap_or(0),
    }
}

/// The `n` items with the largest key, ties kept in input order
pub fn top_n<T, K, F>(items: &[T], key: F, n: usize) -> Vec<&T>
where
    F: Fn(&T) -> K,
    K: PartialOrd,
{
    let mut ranked: Vec<&T> = items.iter().collect();
    ranked.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[derive(Debug, PartialEq)]
    struct Item {
        kind: Option<&'static str>,
        age: Option<i64>,
        budget: Option<Decimal>,
    }

    fn item(kind: Option<&'static str>, age: Option<i64>, budget: Option<Decimal>) -> Item {
        Item { kind, age, budget }
    }

    #[test]
    fn test_count_by_types() {
        let items = vec![
            item(Some("training"), None, None),
            item(Some("training"), None, None),
            item(Some("workshop"), None, None),
        ];
        let counts = count_by(&items, |i| i.kind);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["training"], 2);
        assert_eq!(counts["workshop"], 1);
    }

    #[test]
    fn test_count_by_totals_include_undefined() {
        let items = vec![
            item(Some("women"), None, None),
            item(None, None, None),
            item(Some("  "), None, None),
            item(Some("youth"), None, None),
        ];
        let counts = count_by(&items, |i| i.kind);
        assert_eq!(counts[UNDEFINED_KEY], 2);
        assert_eq!(counts.values().sum::<usize>(), items.len());
        assert!(count_by(&Vec::<Item>::new(), |i| i.kind).is_empty());
    }

    #[test]
    fn test_sum_by_treats_missing_as_zero() {
        let items = vec![
            item(None, None, Some(dec!(1500.50))),
            item(None, None, None),
            item(None, None, Some(dec!(499.50))),
        ];
        assert_eq!(sum_by(&items, |i| i.budget), dec!(2000.00));
        assert_eq!(sum_by(&items, |i| i.age), 0);
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(0, 0), 0);
        assert_eq!(percentage_of(5, 10), 50);
        assert_eq!(percentage_of(4, 10), 40);
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(dec!(750), dec!(1000)), 75);
        assert_eq!(percentage_of(7, 0), 0);
    }

    #[test]
    fn test_age_stats() {
        assert_eq!(age_stats(&Vec::<Item>::new(), |i| i.age), AgeStats { mean: 0, min: 0, max: 0 });

        let items = vec![item(None, Some(10), None), item(None, Some(20), None)];
        assert_eq!(age_stats(&items, |i| i.age), AgeStats { mean: 15, min: 10, max: 20 });

        let with_gaps = vec![item(None, None, None), item(None, Some(0), None), item(None, Some(5), None)];
        assert_eq!(age_stats(&with_gaps, |i| i.age), AgeStats { mean: 3, min: 0, max: 5 });
    }

    #[test]
    fn test_top_n_is_stable() {
        let items = vec![
            item(Some("a"), Some(1), Some(dec!(100))),
            item(Some("b"), Some(2), Some(dec!(300))),
            item(Some("c"), Some(3), Some(dec!(100))),
            item(Some("d"), Some(4), Some(dec!(200))),
        ];
        let top = top_n(&items, |i| i.budget.unwrap_or_default(), 3);
        let kinds: Vec<_> = top.iter().map(|i| i.kind.unwrap()).collect();
        assert_eq!(kinds, vec!["b", "d", "a"]);

        assert_eq!(top_n(&items, |i| i.age, 10).len(), 4);
    }
}
