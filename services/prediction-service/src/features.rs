//! Deterministic feature extraction from (items, container).
//!
//! Both extractors are pure. Quantities are expanded logically: every statistic is the
//! one of the flat list holding one volume per physical unit, accumulated with weights
//! so large quantities never allocate. Empty item lists, zero-volume containers and
//! zero-length item edges degrade to fixed defaults instead of failing.

use serde::Serialize;

use crate::domain::{Container, Item};

pub const UTILIZATION_FEATURE_COUNT: usize = 10;
pub const ALGORITHM_FEATURE_COUNT: usize = 5;

/// Positional contract of the utilization regressor input.
pub const UTILIZATION_FEATURE_NAMES: [&str; UTILIZATION_FEATURE_COUNT] = [
    "num_types",
    "total_items",
    "items_per_type",
    "fill_ratio",
    "avg_box_volume",
    "max_box_volume",
    "min_box_volume",
    "volume_std",
    "avg_box_ratio",
    "max_box_ratio",
];

/// Positional contract of the algorithm classifier input row.
pub const ALGORITHM_FEATURE_NAMES: [&str; ALGORITHM_FEATURE_COUNT] = [
    "num_item_types",
    "total_items",
    "fill_ratio",
    "size_variance_normalized",
    "avg_aspect_ratio",
];

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct UtilizationFeatures {
    pub num_types: f64,
    pub total_items: f64,
    pub items_per_type: f64,
    pub fill_ratio: f64,
    pub avg_box_volume: f64,
    pub max_box_volume: f64,
    pub min_box_volume: f64,
    pub volume_std: f64,
    pub avg_box_ratio: f64,
    pub max_box_ratio: f64,
}

impl UtilizationFeatures {
    /// Row in [`UTILIZATION_FEATURE_NAMES`] order.
    pub fn to_row(&self) -> [f64; UTILIZATION_FEATURE_COUNT] {
        [
            self.num_types,
            self.total_items,
            self.items_per_type,
            self.fill_ratio,
            self.avg_box_volume,
            self.max_box_volume,
            self.min_box_volume,
            self.volume_std,
            self.avg_box_ratio,
            self.max_box_ratio,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlgorithmFeatures {
    pub num_item_types: usize,
    pub total_items: u64,
    pub fill_ratio: f64,
    pub size_variance_normalized: f64,
    pub avg_aspect_ratio: f64,
}

impl AlgorithmFeatures {
    /// Row in [`ALGORITHM_FEATURE_NAMES`] order.
    pub fn to_row(&self) -> [f64; ALGORITHM_FEATURE_COUNT] {
        [
            self.num_item_types as f64,
            self.total_items as f64,
            self.fill_ratio,
            self.size_variance_normalized,
            self.avg_aspect_ratio,
        ]
    }
}

/// Statistics of the expanded volume list. All zero when the list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct VolumeStats {
    count: u64,
    sum: f64,
    mean: f64,
    min: f64,
    max: f64,
    /// Population standard deviation (divides by N).
    std: f64,
}

fn volume_stats(items: &[Item]) -> VolumeStats {
    let count: u64 = items.iter().map(Item::units).sum();
    if count == 0 { return VolumeStats::default(); }
    let n = count as f64;
    let sum: f64 = items.iter().map(|i| i.volume() * i.units() as f64).sum();
    let mean = sum / n;
    let (min, max) = items.iter().map(Item::volume)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let variance = items.iter()
        .map(|i| { let d = i.volume() - mean; d * d * i.units() as f64 })
        .sum::<f64>() / n;
    VolumeStats { count, sum, mean, min, max, std: variance.sqrt() }
}

fn ratio(numerator: f64, container_volume: f64) -> f64 {
    if container_volume > 0.0 { numerator / container_volume } else { 0.0 }
}

pub fn extract_utilization_features(items: &[Item], container: &Container) -> UtilizationFeatures {
    let container_volume = container.volume();
    let stats = volume_stats(items);
    let num_types = items.len() as f64;
    let total_items = stats.count as f64;
    UtilizationFeatures {
        num_types,
        total_items,
        items_per_type: if items.is_empty() { 0.0 } else { total_items / num_types },
        fill_ratio: ratio(stats.sum, container_volume),
        avg_box_volume: stats.mean,
        max_box_volume: stats.max,
        min_box_volume: stats.min,
        volume_std: stats.std,
        avg_box_ratio: ratio(stats.mean, container_volume),
        max_box_ratio: ratio(stats.max, container_volume),
    }
}

/// Largest over smallest edge; 1.0 when the smallest edge is not positive.
fn aspect_ratio(item: &Item) -> f64 {
    let mut dims = item.dimensions();
    dims.sort_by(f64::total_cmp);
    if dims[0] > 0.0 { dims[2] / dims[0] } else { 1.0 }
}

pub fn extract_algorithm_features(items: &[Item], container: &Container) -> AlgorithmFeatures {
    let container_volume = container.volume();
    let stats = volume_stats(items);

    let mut total_volume = 0.0;
    for item in items {
        total_volume += item.volume() * item.units() as f64;
    }

    let size_variance_normalized = if stats.count > 1 && stats.mean > 0.0 { stats.std / stats.mean } else { 0.0 };
    let avg_aspect_ratio = if items.is_empty() {
        1.0
    } else {
        items.iter().map(aspect_ratio).sum::<f64>() / items.len() as f64
    };

    AlgorithmFeatures {
        num_item_types: items.len(),
        total_items: stats.count,
        fill_ratio: ratio(total_volume, container_volume),
        size_variance_normalized,
        avg_aspect_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool { (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0) }

    #[test]
    fn single_type_with_quantity() {
        let items = vec![Item::new(10.0, 10.0, 10.0, 2)];
        let f = extract_utilization_features(&items, &Container::new(100.0, 100.0, 100.0));
        assert_eq!(f.num_types, 1.0);
        assert_eq!(f.total_items, 2.0);
        assert_eq!(f.items_per_type, 2.0);
        assert!(close(f.fill_ratio, 0.002));
        assert_eq!(f.avg_box_volume, 1000.0);
        assert_eq!(f.max_box_volume, 1000.0);
        assert_eq!(f.min_box_volume, 1000.0);
        assert_eq!(f.volume_std, 0.0);
        assert!(close(f.avg_box_ratio, 0.001));
        assert!(close(f.max_box_ratio, 0.001));
    }

    #[test]
    fn row_order_matches_names() {
        let f = UtilizationFeatures {
            num_types: 0.0, total_items: 1.0, items_per_type: 2.0, fill_ratio: 3.0, avg_box_volume: 4.0,
            max_box_volume: 5.0, min_box_volume: 6.0, volume_std: 7.0, avg_box_ratio: 8.0, max_box_ratio: 9.0,
        };
        let row = f.to_row();
        for (i, v) in row.iter().enumerate() { assert_eq!(*v, i as f64, "{}", UTILIZATION_FEATURE_NAMES[i]); }
        assert_eq!(UTILIZATION_FEATURE_NAMES[3], "fill_ratio");
    }

    #[test]
    fn population_std_over_expanded_units() {
        // expanded volumes: [1, 1, 1, 8] -> mean 2.75, var = (3*1.75^2 + 5.25^2) / 4
        let items = vec![Item::new(1.0, 1.0, 1.0, 3), Item::new(2.0, 2.0, 2.0, 1)];
        let f = extract_utilization_features(&items, &Container::new(10.0, 10.0, 10.0));
        let expected = ((3.0 * 1.75f64.powi(2) + 5.25f64.powi(2)) / 4.0).sqrt();
        assert!(close(f.volume_std, expected));
        assert!(close(f.avg_box_volume, 2.75));
        assert_eq!(f.min_box_volume, 1.0);
        assert_eq!(f.max_box_volume, 8.0);
        assert_eq!(f.items_per_type, 2.0);

        let a = extract_algorithm_features(&items, &Container::new(10.0, 10.0, 10.0));
        assert!(close(a.size_variance_normalized, expected / 2.75));
    }

    #[test]
    fn empty_items_degrade_to_defaults() {
        let c = Container::new(10.0, 10.0, 10.0);
        assert_eq!(extract_utilization_features(&[], &c).to_row(), [0.0; UTILIZATION_FEATURE_COUNT]);
        let a = extract_algorithm_features(&[], &c);
        assert_eq!(a, AlgorithmFeatures {
            num_item_types: 0, total_items: 0, fill_ratio: 0.0, size_variance_normalized: 0.0, avg_aspect_ratio: 1.0,
        });
    }

    #[test]
    fn zero_volume_container_zeroes_ratios() {
        let items = vec![Item::new(2.0, 3.0, 4.0, 5)];
        let c = Container::new(10.0, 0.0, 10.0);
        let f = extract_utilization_features(&items, &c);
        assert_eq!((f.fill_ratio, f.avg_box_ratio, f.max_box_ratio), (0.0, 0.0, 0.0));
        assert_eq!(f.avg_box_volume, 24.0);
        assert_eq!(extract_algorithm_features(&items, &c).fill_ratio, 0.0);
    }

    #[test]
    fn fill_ratio_agrees_across_extractors() {
        let items = vec![
            Item::new(12.5, 3.3, 7.1, 4),
            Item::new(0.7, 0.9, 1.3, 17),
            Item::new(40.0, 20.0, 10.0, 1),
        ];
        let c = Container::new(120.0, 80.0, 95.5);
        let u = extract_utilization_features(&items, &c);
        let a = extract_algorithm_features(&items, &c);
        assert!((u.fill_ratio - a.fill_ratio).abs() < 1e-12);
        assert_eq!(a.total_items, 22);
        assert_eq!(a.num_item_types, 3);
    }

    #[test]
    fn aspect_ratio_handles_zero_edge() {
        let items = vec![Item::new(4.0, 2.0, 1.0, 1), Item::new(0.0, 5.0, 5.0, 1)];
        let a = extract_algorithm_features(&items, &Container::new(10.0, 10.0, 10.0));
        // (4/1 + 1.0) / 2
        assert!(close(a.avg_aspect_ratio, 2.5));
    }

    #[test]
    fn single_box_has_no_size_variance() {
        let a = extract_algorithm_features(&[Item::new(1.0, 2.0, 3.0, 1)], &Container::new(10.0, 10.0, 10.0));
        assert_eq!(a.size_variance_normalized, 0.0);
        assert_eq!(a.to_row(), [1.0, 1.0, 0.006, 0.0, 3.0]);
    }

    #[test]
    fn huge_quantity_does_not_expand_in_memory() {
        let items = vec![Item::new(1.0, 1.0, 1.0, u32::MAX)];
        let f = extract_utilization_features(&items, &Container::new(1.0, 1.0, 1.0));
        assert_eq!(f.total_items, u32::MAX as f64);
        assert_eq!(f.volume_std, 0.0);
    }
}
