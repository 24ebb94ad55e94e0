//! Disjoint-set forest over pool indices.

/// Union-find over `0..len`, stored as a flat parent array.
///
/// `find` is iterative with path compression, so deep chains cannot
/// overflow the stack.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    /// Every index starts in its own set
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Root of the set containing `x`
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Point every node on the walked path straight at the root
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Merge the sets containing `a` and `b`.
    ///
    /// Returns false if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        self.parent[root_b] = root_a;
        true
    }

    /// Members of every set with at least `min_size` members.
    ///
    /// Sets are ordered by their smallest index, members ascending.
    pub fn components(&mut self, min_size: usize) -> Vec<Vec<usize>> {
        let mut by_root: std::collections::HashMap<usize, Vec<usize>> =
            std::collections::HashMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            by_root.entry(root).or_default().push(i);
        }

        let mut components: Vec<Vec<usize>> = by_root
            .into_values()
            .filter(|members| members.len() >= min_size)
            .collect();
        components.sort_by_key(|members| members[0]);
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disjoint() {
        let mut set = DisjointSet::new(3);
        assert_ne!(set.find(0), set.find(1));
        assert!(set.components(2).is_empty());
    }

    #[test]
    fn union_is_transitive() {
        let mut set = DisjointSet::new(4);
        assert!(set.union(0, 1));
        assert!(set.union(1, 2));
        assert!(!set.union(0, 2));

        assert_eq!(set.find(0), set.find(2));
        assert_ne!(set.find(0), set.find(3));
        assert_eq!(set.components(2), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let n = 200_000;
        let mut set = DisjointSet::new(n);
        for i in 1..n {
            set.union(i, i - 1);
        }
        let root = set.find(0);
        assert_eq!(set.find(n - 1), root);
    }

    #[test]
    fn components_respect_min_size() {
        let mut set = DisjointSet::new(5);
        set.union(3, 4);
        assert_eq!(set.components(1).len(), 4);
        assert_eq!(set.components(2), vec![vec![3, 4]]);
    }
}
