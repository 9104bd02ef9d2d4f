//! Union-find over point indices, used to turn pairwise links into groups.

/// Find root of element `i` with path halving for amortized near-O(1).
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Collect union-find sets into groups of point indices.
///
/// Members are ascending and groups are ordered by their smallest member,
/// so the output depends only on the partition, not on union order.
pub fn collect_groups(parent: &mut [usize]) -> Vec<Vec<usize>> {
    let n = parent.len();
    let mut slot_of_root: Vec<Option<usize>> = vec![None; n];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for i in 0..n {
        let root = find(parent, i);
        match slot_of_root[root] {
            Some(slot) => groups[slot].push(i),
            None => {
                slot_of_root[root] = Some(groups.len());
                groups.push(vec![i]);
            }
        }
    }
    groups
}
