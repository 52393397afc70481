//! N-dimensional k-d tree with incremental insertion
//!
//! Stores samples in insertion order and links them into a binary
//! space-partitioning tree that splits on axis `depth mod D`. Supports
//! exact-coordinate lookup and k-nearest-neighbor queries in O(log n)
//! on average; insertion order alone decides the shape, so a sorted
//! input degrades to O(n).
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use shepard_core::Sample;

/// A k-d tree over samples of a fixed dimension.
#[derive(Debug, Clone)]
pub struct KdTree {
    dimensions: usize,
    /// `nodes[i]` links `samples[i]` into the tree; node 0 is the root
    nodes: Vec<KdNode>,
    samples: Vec<Sample>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Split axis: depth mod dimensions
    split_dim: usize,
    /// Left child index (coordinate < node on split axis)
    left: Option<usize>,
    /// Right child index (coordinate >= node on split axis)
    right: Option<usize>,
}

/// One result of a k-nearest-neighbor query
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub sample: &'a Sample,
    pub distance_sq: f64,
    /// Insertion index of the sample
    pub index: usize,
}

impl Neighbor<'_> {
    /// Euclidean distance to the query coordinate.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance_sq.sqrt()
    }
}

impl KdTree {
    /// Create an empty tree for coordinates of length `dimensions` (at least 1).
    pub fn new(dimensions: usize) -> Self {
        debug_assert!(dimensions >= 1);
        Self {
            dimensions,
            nodes: Vec::new(),
            samples: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of samples in the tree.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stored samples in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Remove every sample.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.samples.clear();
    }

    /// Insert a sample.
    ///
    /// Duplicate coordinates are kept; equal split values descend right.
    ///
    /// # Panics
    /// If `sample.dimensions() != self.dimensions()`. Use
    /// [`Interpolator::add_sample`](super::Interpolator::add_sample) for a
    /// checked insertion.
    pub fn insert(&mut self, sample: Sample) {
        assert_eq!(
            sample.dimensions(),
            self.dimensions,
            "sample dimensions must match the tree"
        );

        let new_idx = self.samples.len();
        if self.nodes.is_empty() {
            self.nodes.push(KdNode {
                split_dim: 0,
                left: None,
                right: None,
            });
            self.samples.push(sample);
            return;
        }

        let mut current = 0;
        let mut depth = 0;
        loop {
            let axis = self.nodes[current].split_dim;
            let go_left = sample.coordinate()[axis] < self.samples[current].coordinate()[axis];
            let next = if go_left {
                self.nodes[current].left
            } else {
                self.nodes[current].right
            };
            depth += 1;

            match next {
                Some(child) => current = child,
                None => {
                    if go_left {
                        self.nodes[current].left = Some(new_idx);
                    } else {
                        self.nodes[current].right = Some(new_idx);
                    }
                    break;
                }
            }
        }

        self.nodes.push(KdNode {
            split_dim: depth % self.dimensions,
            left: None,
            right: None,
        });
        self.samples.push(sample);
    }

    /// Find the sample whose coordinate equals `coordinate` componentwise.
    ///
    /// Uses exact `==` comparison. With duplicates, the earliest inserted
    /// match is returned.
    pub fn find_exact(&self, coordinate: &[f64]) -> Option<&Sample> {
        let mut next = if self.nodes.is_empty() { None } else { Some(0) };

        while let Some(idx) = next {
            let sample = &self.samples[idx];
            if sample.coordinate() == coordinate {
                return Some(sample);
            }
            let node = &self.nodes[idx];
            let axis = node.split_dim;
            // Mirrors the insertion descent, so an equal coordinate
            // can only live on this path.
            next = if coordinate[axis] < sample.coordinate()[axis] {
                node.left
            } else {
                node.right
            };
        }

        None
    }

    /// Find the k nearest samples to `coordinate`.
    ///
    /// Returns up to k results sorted by ascending distance; equidistant
    /// samples are ordered by insertion index. Returns every sample when
    /// the tree holds fewer than k.
    pub fn k_nearest(&self, coordinate: &[f64], k: usize) -> Vec<Neighbor<'_>> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        // Sorted descending by (distance, index): best[0] is the current worst
        let mut best: Vec<(f64, usize)> = Vec::with_capacity(k + 1);
        // Explicit stack of (node, lower bound on squared distance to its region)
        let mut stack: Vec<(usize, f64)> = vec![(0, 0.0)];

        while let Some((idx, bound_sq)) = stack.pop() {
            if best.len() >= k && bound_sq > best[0].0 {
                continue;
            }

            let sample = &self.samples[idx];
            let dist_sq = sample.dist_sq(coordinate);
            let candidate = (dist_sq, idx);

            if best.len() < k || precedes(candidate, best[0]) {
                if best.len() >= k {
                    best.remove(0);
                }
                let pos = best
                    .binary_search_by(|probe| compare(*probe, candidate).reverse())
                    .unwrap_or_else(|e| e);
                best.insert(pos, candidate);
            }

            let node = &self.nodes[idx];
            let diff = coordinate[node.split_dim] - sample.coordinate()[node.split_dim];
            let (near, far) = if diff < 0.0 {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };

            // Far side first so the near side is popped next
            if let Some(child) = far {
                stack.push((child, bound_sq.max(diff * diff)));
            }
            if let Some(child) = near {
                stack.push((child, bound_sq));
            }
        }

        best.iter()
            .rev()
            .map(|&(distance_sq, index)| Neighbor {
                sample: &self.samples[index],
                distance_sq,
                index,
            })
            .collect()
    }
}

/// Total order on (squared distance, insertion index).
#[inline]
fn compare(a: (f64, usize), b: (f64, usize)) -> std::cmp::Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[inline]
fn precedes(a: (f64, usize), b: (f64, usize)) -> bool {
    compare(a, b) == std::cmp::Ordering::Less
}

impl<'a> IntoIterator for &'a KdTree {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<Sample> {
        vec![
            Sample::new(10.0, [2.0, 3.0]),
            Sample::new(20.0, [5.0, 4.0]),
            Sample::new(30.0, [9.0, 6.0]),
            Sample::new(40.0, [4.0, 7.0]),
            Sample::new(50.0, [8.0, 1.0]),
            Sample::new(60.0, [7.0, 2.0]),
            Sample::new(70.0, [1.0, 8.0]),
            Sample::new(80.0, [6.0, 5.0]),
        ]
    }

    fn build(dimensions: usize, samples: &[Sample]) -> KdTree {
        let mut tree = KdTree::new(dimensions);
        for s in samples {
            tree.insert(s.clone());
        }
        tree
    }

    /// Walk the tree and check the partition invariant on every node.
    fn assert_partitioned(tree: &KdTree, idx: usize) {
        let node = &tree.nodes[idx];
        let axis = node.split_dim;
        let split = tree.samples[idx].coordinate()[axis];

        fn collect(tree: &KdTree, idx: Option<usize>, out: &mut Vec<usize>) {
            if let Some(i) = idx {
                out.push(i);
                collect(tree, tree.nodes[i].left, out);
                collect(tree, tree.nodes[i].right, out);
            }
        }

        let mut left = Vec::new();
        collect(tree, node.left, &mut left);
        for i in left {
            assert!(tree.samples[i].coordinate()[axis] < split);
        }
        let mut right = Vec::new();
        collect(tree, node.right, &mut right);
        for i in right {
            assert!(tree.samples[i].coordinate()[axis] >= split);
        }

        if let Some(l) = node.left {
            assert_partitioned(tree, l);
        }
        if let Some(r) = node.right {
            assert_partitioned(tree, r);
        }
    }

    #[test]
    fn test_insert_and_size() {
        let tree = build(2, &sample_points());
        assert_eq!(tree.len(), 8);
        assert!(!tree.is_empty());
        assert_partitioned(&tree, 0);
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::new(3);
        assert!(tree.is_empty());
        assert!(tree.find_exact(&[0.0, 0.0, 0.0]).is_none());
        assert!(tree.k_nearest(&[0.0, 0.0, 0.0], 3).is_empty());
    }

    #[test]
    fn test_split_axis_cycles() {
        // Strictly increasing along both axes: every insert goes right
        let samples: Vec<Sample> = (0..5)
            .map(|i| Sample::new(i as f64, [i as f64, i as f64, i as f64]))
            .collect();
        let tree = build(3, &samples);
        let axes: Vec<usize> = tree.nodes.iter().map(|n| n.split_dim).collect();
        assert_eq!(axes, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_ties_descend_right() {
        let mut tree = KdTree::new(2);
        tree.insert(Sample::new(1.0, [1.0, 0.0]));
        tree.insert(Sample::new(2.0, [1.0, 5.0]));
        assert!(tree.nodes[0].left.is_none());
        assert_eq!(tree.nodes[0].right, Some(1));
    }

    #[test]
    fn test_find_exact() {
        let tree = build(2, &sample_points());
        for s in sample_points() {
            let found = tree.find_exact(s.coordinate()).unwrap();
            assert_eq!(found.value(), s.value());
        }
        assert!(tree.find_exact(&[5.0, 4.000001]).is_none());
        assert!(tree.find_exact(&[3.0, 3.0]).is_none());
    }

    #[test]
    fn test_find_exact_shared_axis_value() {
        // Same x as the root but a different y must still be found
        let mut tree = KdTree::new(2);
        tree.insert(Sample::new(1.0, [2.0, 2.0]));
        tree.insert(Sample::new(2.0, [2.0, 9.0]));
        tree.insert(Sample::new(3.0, [2.0, -1.0]));
        assert_eq!(tree.find_exact(&[2.0, -1.0]).unwrap().value(), 3.0);
        assert_eq!(tree.find_exact(&[2.0, 9.0]).unwrap().value(), 2.0);
    }

    #[test]
    fn test_duplicates_retained() {
        let mut tree = KdTree::new(2);
        tree.insert(Sample::new(1.0, [0.0, 0.0]));
        tree.insert(Sample::new(2.0, [0.0, 0.0]));
        assert_eq!(tree.len(), 2);
        // Earliest inserted wins
        assert_eq!(tree.find_exact(&[0.0, 0.0]).unwrap().value(), 1.0);

        let knn = tree.k_nearest(&[1.0, 1.0], 2);
        assert_eq!(knn.len(), 2);
        assert_eq!(knn[0].index, 0);
        assert_eq!(knn[1].index, 1);
    }

    #[test]
    fn test_k_nearest_matches_brute_force() {
        let pts = sample_points();
        let tree = build(2, &pts);

        for qx in 0..10 {
            for qy in 0..10 {
                let q = [qx as f64 + 0.5, qy as f64 + 0.5];
                for k in 1..=pts.len() {
                    let results = tree.k_nearest(&q, k);
                    assert_eq!(results.len(), k);

                    let mut bf: Vec<(f64, usize)> = pts
                        .iter()
                        .enumerate()
                        .map(|(i, p)| (p.dist_sq(&q), i))
                        .collect();
                    bf.sort_by(|a, b| compare(*a, *b));

                    for (r, expected) in results.iter().zip(&bf) {
                        assert!(
                            (r.distance_sq - expected.0).abs() < 1e-10,
                            "Mismatch at {:?} k={}: tree={:.4}, bf={:.4}",
                            q,
                            k,
                            r.distance_sq,
                            expected.0
                        );
                        assert_eq!(r.index, expected.1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_k_nearest_sorted_ascending() {
        let tree = build(2, &sample_points());
        let results = tree.k_nearest(&[5.0, 5.0], 4);
        for i in 1..results.len() {
            assert!(results[i].distance_sq >= results[i - 1].distance_sq);
        }
        assert!((results[0].distance() - results[0].distance_sq.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn test_k_nearest_more_than_points() {
        let pts = sample_points();
        let tree = build(2, &pts);
        assert_eq!(tree.k_nearest(&[5.0, 5.0], 100).len(), pts.len());
        assert!(tree.k_nearest(&[5.0, 5.0], 0).is_empty());
    }

    #[test]
    fn test_equidistant_ties_follow_insertion_order() {
        // Four corners equidistant from the centre
        let pts = vec![
            Sample::new(1.0, [1.0, 1.0]),
            Sample::new(2.0, [-1.0, 1.0]),
            Sample::new(3.0, [-1.0, -1.0]),
            Sample::new(4.0, [1.0, -1.0]),
        ];
        let tree = build(2, &pts);
        let knn = tree.k_nearest(&[0.0, 0.0], 2);
        let idx: Vec<usize> = knn.iter().map(|n| n.index).collect();
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn test_sorted_insertion_does_not_overflow() {
        // Degenerates into a linked list
        let n = 50_000;
        let mut tree = KdTree::new(1);
        for i in 0..n {
            tree.insert(Sample::new(i as f64, [i as f64]));
        }
        let knn = tree.k_nearest(&[(n - 1) as f64 + 0.25], 2);
        assert_eq!(knn[0].index, n - 1);
        assert_eq!(knn[1].index, n - 2);
        assert!(tree.find_exact(&[(n - 1) as f64]).is_some());
    }

    #[test]
    fn test_higher_dimensions() {
        let pts: Vec<Sample> = (0..500)
            .map(|i| {
                let a = ((i * 7 + 13) % 97) as f64;
                let b = ((i * 11 + 37) % 89) as f64;
                let c = ((i * 5 + 3) % 83) as f64;
                let d = ((i * 3 + 1) % 79) as f64;
                Sample::new(i as f64, vec![a, b, c, d])
            })
            .collect();
        let tree = build(4, &pts);
        assert_partitioned(&tree, 0);

        let q = [40.5, 41.5, 42.5, 43.5];
        let results = tree.k_nearest(&q, 7);
        let mut bf: Vec<f64> = pts.iter().map(|p| p.dist_sq(&q)).collect();
        bf.sort_by(|a, b| a.total_cmp(b));
        for (r, expected) in results.iter().zip(&bf) {
            assert!((r.distance_sq - expected).abs() < 1e-10);
        }
    }

    #[test]
    #[should_panic(expected = "sample dimensions must match the tree")]
    fn test_insert_short_sample_panics() {
        let mut tree = KdTree::new(3);
        tree.insert(Sample::new(1.0, [0.0, 0.0, 0.0]));
        tree.insert(Sample::new(2.0, [1.0, 1.0]));
    }

    #[test]
    #[should_panic(expected = "sample dimensions must match the tree")]
    fn test_insert_long_sample_panics() {
        let mut tree = KdTree::new(2);
        tree.insert(Sample::new(1.0, [0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_clear() {
        let mut tree = build(2, &sample_points());
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.k_nearest(&[0.0, 0.0], 1).is_empty());

        tree.insert(Sample::new(9.0, [1.0, 1.0]));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.find_exact(&[1.0, 1.0]).unwrap().value(), 9.0);
    }

    #[test]
    fn test_iter_insertion_order() {
        let pts = sample_points();
        let tree = build(2, &pts);
        let values: Vec<f64> = tree.iter().map(|s| s.value()).collect();
        let expected: Vec<f64> = pts.iter().map(|s| s.value()).collect();
        assert_eq!(values, expected);
        assert_eq!((&tree).into_iter().count(), pts.len());
    }
}
