// src/dedup/disjoint.rs
//! Array-backed disjoint set over integer indices, used to compute
//! connected components of the similarity relation.

#[derive(Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    /// `n` singleton sets, one per index.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    /// Representative of `x`'s set, with path compression.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }

    /// Groups of member indices, ordered by each group's first-seen index;
    /// members within a group keep ascending index order.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut order: Vec<usize> = Vec::new();
        let mut by_root: std::collections::HashMap<usize, Vec<usize>> =
            std::collections::HashMap::new();
        for i in 0..n {
            let root = self.find(i);
            let entry = by_root.entry(root).or_default();
            if entry.is_empty() {
                order.push(root);
            }
            entry.push(i);
        }
        order
            .into_iter()
            .map(|root| by_root.remove(&root).unwrap_or_default())
            .collect()
    }
}
