//! Partitions of `{0,..,n-1}` in Freese normal form.
//!
//! A partition is stored as an array where the root of each block holds
//! the negative of the block size and every other element points
//! directly at its root. Normalization makes the root the smallest
//! element of its block, so equal partitions have byte-for-byte equal
//! arrays and hashing/equality are O(n).

use serde::Serialize;
use std::fmt;

use crate::error::{UACalcError, UACalcResult};

// Serialize only: reconstruction goes through `from_array` so the
// normal form is never bypassed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Partition {
    array: Vec<i32>,
}

impl Partition {
    /// The identity partition: every element is its own block.
    pub fn zero(size: usize) -> Self {
        Partition { array: vec![-1; size] }
    }

    /// The all-in-one-block partition.
    pub fn one(size: usize) -> Self {
        if size == 0 {
            return Partition { array: Vec::new() };
        }
        let mut array = vec![0; size];
        array[0] = -(size as i32);
        Partition { array }
    }

    /// Build from a raw union-find array: negative entries are roots,
    /// non-negative entries point (possibly indirectly) toward a root.
    /// The input is validated and brought into normal form; block sizes
    /// are recomputed rather than trusted.
    pub fn from_array(array: Vec<i32>) -> UACalcResult<Self> {
        let n = array.len();
        // Reject out-of-range pointers and cycles.
        for start in 0..n {
            let mut slow = start;
            let mut hops = 0;
            while array[slow] >= 0 {
                let next = array[slow] as usize;
                if next >= n {
                    return Err(UACalcError::invariant(format!(
                        "partition: element {} points to {} outside the carrier of size {}",
                        slow, next, n
                    )));
                }
                slow = next;
                hops += 1;
                if hops > n {
                    return Err(UACalcError::invariant(format!(
                        "partition: cycle reached from element {}",
                        start
                    )));
                }
            }
        }
        // Recompute roots (minimum element per class) and sizes.
        let mut root_of = vec![0usize; n];
        for i in 0..n {
            let mut j = i;
            while array[j] >= 0 {
                j = array[j] as usize;
            }
            root_of[i] = j;
        }
        let mut min_of_class = vec![usize::MAX; n];
        for i in 0..n {
            let r = root_of[i];
            if i < min_of_class[r] {
                min_of_class[r] = i;
            }
        }
        let mut normalized = vec![-1i32; n];
        let mut sizes = vec![0i32; n];
        for i in 0..n {
            sizes[min_of_class[root_of[i]]] += 1;
        }
        for i in 0..n {
            let m = min_of_class[root_of[i]];
            if i == m {
                normalized[i] = -sizes[m];
            } else {
                normalized[i] = m as i32;
            }
        }
        Ok(Partition { array: normalized })
    }

    /// Build from explicit blocks; elements not mentioned become
    /// singletons.
    pub fn from_blocks(size: usize, blocks: &[Vec<usize>]) -> UACalcResult<Self> {
        let mut array: Vec<i32> = vec![-1; size];
        let mut seen = vec![false; size];
        for block in blocks {
            if block.is_empty() {
                continue;
            }
            for &e in block {
                if e >= size {
                    return Err(UACalcError::invariant(format!(
                        "partition: block element {} outside the carrier of size {}",
                        e, size
                    )));
                }
                if seen[e] {
                    return Err(UACalcError::invariant(format!(
                        "partition: element {} occurs in two blocks",
                        e
                    )));
                }
                seen[e] = true;
            }
            let root = *block.iter().min().expect("non-empty block");
            array[root] = -(block.len() as i32);
            for &e in block {
                if e != root {
                    array[e] = root as i32;
                }
            }
        }
        Ok(Partition { array })
    }

    pub fn universe_size(&self) -> usize {
        self.array.len()
    }

    pub fn number_of_blocks(&self) -> usize {
        self.array.iter().filter(|&&v| v < 0).count()
    }

    /// Universe size minus number of blocks; the height of this element
    /// in the partition lattice.
    pub fn rank(&self) -> usize {
        self.universe_size() - self.number_of_blocks()
    }

    /// The root of the block containing `i`. O(1) on the normal form.
    pub fn representative(&self, i: usize) -> usize {
        let v = self.array[i];
        if v < 0 {
            i
        } else {
            v as usize
        }
    }

    pub fn is_representative(&self, i: usize) -> bool {
        self.array[i] < 0
    }

    pub fn is_related(&self, i: usize, j: usize) -> bool {
        self.representative(i) == self.representative(j)
    }

    /// Block roots in ascending order.
    pub fn representatives(&self) -> Vec<usize> {
        (0..self.array.len()).filter(|&i| self.array[i] < 0).collect()
    }

    /// Index of the block of `i` in the root-ordered block list; the
    /// image of `i` under the canonical map onto the quotient.
    pub fn block_index(&self, i: usize) -> usize {
        let rep = self.representative(i);
        (0..rep).filter(|&j| self.array[j] < 0).count()
    }

    /// Blocks in canonical order: sorted ascending, ordered by root.
    pub fn blocks(&self) -> Vec<Vec<usize>> {
        let n = self.array.len();
        let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); n];
        for i in 0..n {
            by_root[self.representative(i)].push(i);
        }
        by_root.into_iter().filter(|b| !b.is_empty()).collect()
    }

    pub fn is_zero(&self) -> bool {
        self.array.iter().all(|&v| v == -1)
    }

    pub fn is_one(&self) -> bool {
        self.number_of_blocks() <= 1
    }

    /// All blocks the same size.
    pub fn is_uniform(&self) -> bool {
        let mut size = None;
        for &v in &self.array {
            if v < 0 {
                match size {
                    None => size = Some(v),
                    Some(s) if s != v => return false,
                    _ => {}
                }
            }
        }
        true
    }

    /// Refinement order: true iff every block of `self` lies inside a
    /// block of `other`.
    pub fn leq(&self, other: &Partition) -> bool {
        if self.universe_size() != other.universe_size() {
            return false;
        }
        for i in 0..self.array.len() {
            let v = self.array[i];
            if v >= 0 && other.representative(i) != other.representative(v as usize) {
                return false;
            }
        }
        true
    }

    /// Join in the partition lattice, by merging each element with its
    /// parent from `self` inside a copy of `other`.
    pub fn join(&self, other: &Partition) -> UACalcResult<Partition> {
        self.check_same_size(other, "join")?;
        let mut part = other.array.clone();
        for i in 0..self.array.len() {
            let v = self.array[i];
            if v >= 0 {
                let r = find_root(i, &part);
                let s = find_root(v as usize, &part);
                if r != s {
                    join_blocks(r, s, &mut part);
                }
            }
        }
        normalize_array(&mut part);
        Ok(Partition { array: part })
    }

    /// Meet in the partition lattice: related iff related in both.
    pub fn meet(&self, other: &Partition) -> UACalcResult<Partition> {
        self.check_same_size(other, "meet")?;
        let n = self.array.len();
        let mut first_with_pair: ahash::AHashMap<(usize, usize), usize> =
            ahash::AHashMap::with_capacity(n);
        let mut part = vec![-1i32; n];
        for i in 0..n {
            let key = (self.representative(i), other.representative(i));
            match first_with_pair.get(&key) {
                Some(&root) => {
                    part[root] -= 1;
                    part[i] = root as i32;
                }
                None => {
                    first_with_pair.insert(key, i);
                }
            }
        }
        Ok(Partition { array: part })
    }

    /// Least `k >= 2` such that the alternating relational composite
    /// `a o b o a o ...` with `k` factors equals the join; 2 means the
    /// pair permutes.
    pub fn permutability_level(&self, other: &Partition) -> UACalcResult<usize> {
        self.check_same_size(other, "permutability_level")?;
        let n = self.array.len();
        let join = self.join(other)?;
        // reach[i] holds the set reachable from i along the chain so far.
        let mut reach: Vec<Vec<bool>> = (0..n)
            .map(|i| {
                let mut row = vec![false; n];
                row[i] = true;
                row
            })
            .collect();
        let mut level = 0usize;
        loop {
            let par = if level % 2 == 0 { self } else { other };
            level += 1;
            // One composition factor: close each row under par-blocks.
            for row in reach.iter_mut() {
                let mut hit = vec![false; n];
                for j in 0..n {
                    if row[j] {
                        hit[par.representative(j)] = true;
                    }
                }
                for j in 0..n {
                    if hit[par.representative(j)] {
                        row[j] = true;
                    }
                }
            }
            let done = (0..n)
                .all(|i| (0..n).all(|j| reach[i][j] == join.is_related(i, j)));
            if done {
                return Ok(level.max(2));
            }
            if level > 2 * n + 2 {
                return Err(UACalcError::invariant(
                    "permutability_level failed to converge",
                ));
            }
        }
    }

    /// The raw normalized array.
    pub fn to_vec(&self) -> Vec<i32> {
        self.array.clone()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.array
    }

    fn check_same_size(&self, other: &Partition, op: &str) -> UACalcResult<()> {
        if self.universe_size() != other.universe_size() {
            return Err(UACalcError::invariant(format!(
                "{}: partitions on carriers of size {} and {}",
                op,
                self.universe_size(),
                other.universe_size()
            )));
        }
        Ok(())
    }
}

/// Root of `i` in a raw (possibly unnormalized) array.
pub(crate) fn find_root(mut i: usize, part: &[i32]) -> usize {
    while part[i] >= 0 {
        i = part[i] as usize;
    }
    i
}

/// Merge the blocks rooted at `r` and `s`, larger block absorbing.
pub(crate) fn join_blocks(r: usize, s: usize, part: &mut [i32]) {
    debug_assert!(r != s && part[r] < 0 && part[s] < 0);
    let size_r = -part[r];
    let size_s = -part[s];
    if size_r >= size_s {
        part[s] = r as i32;
        part[r] = -(size_r + size_s);
    } else {
        part[r] = s as i32;
        part[s] = -(size_r + size_s);
    }
}

/// Bring a raw array into normal form: smallest element of each block at
/// the root, every other element pointing directly at it.
pub(crate) fn normalize_array(part: &mut [i32]) {
    let n = part.len();
    for i in 0..n {
        let r = find_root(i, part);
        if r > i {
            part[i] = part[r];
            part[r] = i as i32;
        }
    }
    for i in 0..n {
        let r = find_root(i, part);
        if r != i {
            part[i] = r as i32;
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|")?;
        for block in self.blocks() {
            for (i, e) in block.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", e)?;
            }
            write!(f, "|")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_one() {
        let z = Partition::zero(4);
        assert!(z.is_zero());
        assert_eq!(z.number_of_blocks(), 4);
        let o = Partition::one(4);
        assert!(o.is_one());
        assert_eq!(o.number_of_blocks(), 1);
        assert!(z.leq(&o));
        assert!(!o.leq(&z));
    }

    #[test]
    fn join_and_meet_example() {
        // pi = {{0,1},{2},{3}}, sigma = {{0},{1,2},{3}}.
        let pi = Partition::from_blocks(4, &[vec![0, 1]]).unwrap();
        let sigma = Partition::from_blocks(4, &[vec![1, 2]]).unwrap();
        let join = pi.join(&sigma).unwrap();
        assert_eq!(join, Partition::from_blocks(4, &[vec![0, 1, 2]]).unwrap());
        let meet = pi.meet(&sigma).unwrap();
        assert!(meet.is_zero());
    }

    #[test]
    fn from_array_normalizes() {
        // {{0,2},{1}} written with 2 as a root.
        let p = Partition::from_array(vec![2, -1, -2]).unwrap();
        assert_eq!(p.as_slice(), &[-2, -1, 0]);
        // Idempotent on the normal form.
        let q = Partition::from_array(p.to_vec()).unwrap();
        assert_eq!(p, q);
    }

    #[test]
    fn from_array_rejects_garbage() {
        assert!(Partition::from_array(vec![5, -1]).is_err());
        assert!(Partition::from_array(vec![1, 0]).is_err());
    }

    #[test]
    fn blocks_are_canonically_ordered() {
        let p = Partition::from_blocks(5, &[vec![3, 1], vec![4, 0]]).unwrap();
        assert_eq!(p.blocks(), vec![vec![0, 4], vec![1, 3], vec![2]]);
        assert_eq!(p.representatives(), vec![0, 1, 2]);
        assert_eq!(p.block_index(3), 1);
        assert_eq!(p.to_string(), "|0,4|1,3|2|");
    }

    #[test]
    fn lattice_laws_spot_check() {
        let a = Partition::from_blocks(5, &[vec![0, 1], vec![2, 3]]).unwrap();
        let b = Partition::from_blocks(5, &[vec![1, 2]]).unwrap();
        let j = a.join(&b).unwrap();
        let m = a.meet(&b).unwrap();
        assert!(a.leq(&j) && b.leq(&j));
        assert!(m.leq(&a) && m.leq(&b));
        assert_eq!(a.join(&b).unwrap(), b.join(&a).unwrap());
        assert_eq!(a.meet(&b).unwrap(), b.meet(&a).unwrap());
        // Absorption.
        assert_eq!(a.join(&m).unwrap(), a);
        assert_eq!(a.meet(&j).unwrap(), a);
    }

    #[test]
    fn permutability_of_permuting_pair() {
        // Two factor congruences of a 2x2 square permute.
        let rows = Partition::from_blocks(4, &[vec![0, 1], vec![2, 3]]).unwrap();
        let cols = Partition::from_blocks(4, &[vec![0, 2], vec![1, 3]]).unwrap();
        assert_eq!(rows.permutability_level(&cols).unwrap(), 2);
    }

    #[test]
    fn is_uniform() {
        let p = Partition::from_blocks(4, &[vec![0, 1], vec![2, 3]]).unwrap();
        assert!(p.is_uniform());
        let q = Partition::from_blocks(4, &[vec![0, 1, 2]]).unwrap();
        assert!(!q.is_uniform());
    }
}
