// Distance helpers, Prim's MST, and the union-find used to build the
// single-linkage tree.

use serde::{Deserialize, Serialize};

/// An edge of the mutual-reachability minimum spanning tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MstEdge {
    pub from: usize,
    pub to: usize,
    pub distance: f64,
}

#[inline]
pub(crate) fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x as f64) - (*y as f64);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Minimum spanning tree of a dense complete graph using Prim's algorithm.
///
/// `dist_fn(i, j)` returns the edge weight between points `i` and `j`. Edges
/// come back sorted by ascending distance. O(n^2) time, O(n) memory: weights
/// are computed on demand rather than stored as a matrix.
pub(crate) fn prim_mst(n: usize, dist_fn: impl Fn(usize, usize) -> f64) -> Vec<MstEdge> {
    if n <= 1 {
        return Vec::new();
    }

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut parent = vec![usize::MAX; n];

    best[0] = 0.0;

    for _ in 0..n {
        let mut u = usize::MAX;
        let mut best_val = f64::INFINITY;
        for i in 0..n {
            if !in_tree[i] && (u == usize::MAX || best[i] < best_val) {
                best_val = best[i];
                u = i;
            }
        }

        if u == usize::MAX {
            break;
        }
        in_tree[u] = true;

        for v in 0..n {
            if in_tree[v] {
                continue;
            }
            let d = dist_fn(u, v);
            if d < best[v] {
                best[v] = d;
                parent[v] = u;
            }
        }
    }

    let mut edges: Vec<MstEdge> = (1..n)
        .filter(|&v| parent[v] != usize::MAX)
        .map(|v| MstEdge {
            from: parent[v],
            to: v,
            distance: best[v],
        })
        .collect();
    edges.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    edges
}

/// Union-find over the `2n - 1` nodes of a single-linkage tree.
///
/// Every union allocates a fresh node id (`n`, `n + 1`, ...) that becomes the
/// parent of both merged components, mirroring the scipy linkage layout.
pub(crate) struct LinkageUnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
    next_label: usize,
}

impl LinkageUnionFind {
    pub(crate) fn new(n: usize) -> Self {
        let total = 2 * n - 1;
        let mut size = vec![0; total];
        for s in size.iter_mut().take(n) {
            *s = 1;
        }
        Self {
            parent: (0..total).collect(),
            size,
            next_label: n,
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression.
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    pub(crate) fn size(&self, root: usize) -> usize {
        self.size[root]
    }

    /// Merge two roots under a new node and return its id.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> usize {
        let label = self.next_label;
        self.parent[a] = label;
        self.parent[b] = label;
        self.size[label] = self.size[a] + self.size[b];
        self.next_label += 1;
        label
    }
}
