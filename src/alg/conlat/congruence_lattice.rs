//! The congruence lattice of a finite algebra.
//!
//! Congruences are partitions respected by every operation. The lattice
//! is generated from the principal congruences `Cg(a,b)`; everything
//! else (the universe, join irreducibles, atoms, distributivity) derives
//! from them and is cached on first use. Failed or truncated
//! computations leave the caches untouched so they can be retried.

use ahash::{AHashMap, AHashSet};
use once_cell::sync::OnceCell;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::alg::conlat::partition::{find_root, join_blocks, Partition};
use crate::alg::conlat::type_finder::TypeFinder;
use crate::alg::op::operation::Operation;
use crate::error::{UACalcError, UACalcResult};
use crate::progress::Effort;
use crate::util::sequence::OdometerExcept;

#[derive(Debug)]
struct PrincipalData {
    /// Distinct principal congruences, sorted by rank.
    list: Vec<Partition>,
    /// `(a,b) -> Cg(a,b)` for every pair `a < b`.
    lookup: AHashMap<(usize, usize), Partition>,
    /// A generating pair for each distinct principal congruence.
    reps: AHashMap<Partition, (usize, usize)>,
}

#[derive(Debug)]
struct JoinIrreducibleData {
    list: Vec<Partition>,
    /// The unique lower cover of each join irreducible.
    lower_covers: AHashMap<Partition, Partition>,
}

#[derive(Debug)]
pub struct CongruenceLattice {
    alg_name: String,
    alg_size: usize,
    operations: Vec<Arc<dyn Operation>>,
    zero: Partition,
    one: Partition,
    principals: OnceCell<PrincipalData>,
    join_irreducibles: OnceCell<JoinIrreducibleData>,
    universe: OnceCell<Vec<Partition>>,
    atoms: OnceCell<Vec<Partition>>,
    coatoms: OnceCell<Vec<Partition>>,
    upper_covers: OnceCell<AHashMap<Partition, Vec<Partition>>>,
    meet_irreducibles: OnceCell<Vec<Partition>>,
    distributive: OnceCell<bool>,
    modular: OnceCell<bool>,
    type_set: OnceCell<BTreeSet<u8>>,
}

impl CongruenceLattice {
    pub fn new(alg_name: String, alg_size: usize, operations: Vec<Arc<dyn Operation>>) -> Self {
        CongruenceLattice {
            alg_name,
            alg_size,
            operations,
            zero: Partition::zero(alg_size),
            one: Partition::one(alg_size),
            principals: OnceCell::new(),
            join_irreducibles: OnceCell::new(),
            universe: OnceCell::new(),
            atoms: OnceCell::new(),
            coatoms: OnceCell::new(),
            upper_covers: OnceCell::new(),
            meet_irreducibles: OnceCell::new(),
            distributive: OnceCell::new(),
            modular: OnceCell::new(),
            type_set: OnceCell::new(),
        }
    }

    pub fn alg_name(&self) -> &str {
        &self.alg_name
    }

    pub fn alg_size(&self) -> usize {
        self.alg_size
    }

    pub fn operations(&self) -> &[Arc<dyn Operation>] {
        &self.operations
    }

    pub fn zero(&self) -> &Partition {
        &self.zero
    }

    pub fn one(&self) -> &Partition {
        &self.one
    }

    /// The principal congruence `Cg(a, b)`: the least congruence
    /// relating `a` and `b`.
    pub fn cg(&self, a: usize, b: usize) -> UACalcResult<Partition> {
        self.cg_with_effort(a, b, &Effort::unbounded())
    }

    pub fn cg_with_effort(&self, a: usize, b: usize, effort: &Effort) -> UACalcResult<Partition> {
        if a >= self.alg_size || b >= self.alg_size {
            return Err(UACalcError::out_of_range(format!(
                "Cg on {}: pair ({}, {}) outside carrier of size {}",
                self.alg_name, a, b, self.alg_size
            )));
        }
        if a == b {
            return Ok(self.zero.clone());
        }
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        if let Some(data) = self.principals.get() {
            if let Some(p) = data.lookup.get(&(a, b)) {
                return Ok(p.clone());
            }
        }
        let mut part = vec![-1i32; self.alg_size];
        part[a] = -2;
        part[b] = a as i32;
        let mut pairs = VecDeque::new();
        pairs.push_back((a, b));
        self.close_under_operations(part, pairs, effort)
    }

    /// The least congruence containing a given partition.
    pub fn cg_partition(&self, init: &Partition) -> UACalcResult<Partition> {
        self.cg_partition_with_effort(init, &Effort::unbounded())
    }

    pub fn cg_partition_with_effort(
        &self,
        init: &Partition,
        effort: &Effort,
    ) -> UACalcResult<Partition> {
        if init.universe_size() != self.alg_size {
            return Err(UACalcError::invariant(format!(
                "Cg on {}: partition on {} elements, algebra has {}",
                self.alg_name,
                init.universe_size(),
                self.alg_size
            )));
        }
        let part = init.to_vec();
        let mut pairs = VecDeque::new();
        for block in init.blocks() {
            let root = block[0];
            for &e in &block[1..] {
                pairs.push_back((root, e));
            }
        }
        self.close_under_operations(part, pairs, effort)
    }

    /// The workhorse: merge pairs until every operation respects the
    /// partition. For each pending pair `(x, y)`, each operation, and
    /// each coordinate, the remaining coordinates sweep the carrier in
    /// odometer order; disagreeing images are merged and enqueued (FIFO).
    fn close_under_operations(
        &self,
        mut part: Vec<i32>,
        mut pairs: VecDeque<(usize, usize)>,
        effort: &Effort,
    ) -> UACalcResult<Partition> {
        let n = self.alg_size;
        while let Some((x, y)) = pairs.pop_front() {
            effort.tick("Cg")?;
            for op in &self.operations {
                let arity = op.arity();
                if arity == 0 {
                    continue;
                }
                for coord in 0..arity {
                    let mut odo = OdometerExcept::new(arity, coord, n.saturating_sub(1));
                    loop {
                        match odo.current() {
                            Some(arg) => {
                                arg[coord] = x;
                                let r_val = op.int_value_at(arg)?;
                                arg[coord] = y;
                                let s_val = op.int_value_at(arg)?;
                                let r = find_root(r_val, &part);
                                let s = find_root(s_val, &part);
                                if r != s {
                                    join_blocks(r, s, &mut part);
                                    pairs.push_back((r, s));
                                }
                            }
                            None => break,
                        }
                        if !odo.increment() {
                            break;
                        }
                    }
                }
            }
        }
        Partition::from_array(part)
    }

    fn principal_data(&self) -> UACalcResult<&PrincipalData> {
        self.principals.get_or_try_init(|| {
            let mut list: Vec<Partition> = Vec::new();
            let mut lookup = AHashMap::new();
            let mut reps: AHashMap<Partition, (usize, usize)> = AHashMap::new();
            for a in 0..self.alg_size {
                for b in (a + 1)..self.alg_size {
                    let mut part = vec![-1i32; self.alg_size];
                    part[a] = -2;
                    part[b] = a as i32;
                    let mut pairs = VecDeque::new();
                    pairs.push_back((a, b));
                    let cg = self.close_under_operations(part, pairs, &Effort::unbounded())?;
                    if !reps.contains_key(&cg) {
                        reps.insert(cg.clone(), (a, b));
                        list.push(cg.clone());
                    }
                    lookup.insert((a, b), cg);
                }
            }
            list.sort_by(|p, q| p.rank().cmp(&q.rank()).then_with(|| p.cmp(q)));
            Ok(PrincipalData { list, lookup, reps })
        })
    }

    /// Distinct principal congruences, rank order.
    pub fn principals(&self) -> UACalcResult<&[Partition]> {
        Ok(&self.principal_data()?.list)
    }

    /// A pair generating the given principal congruence.
    pub fn generating_pair(&self, beta: &Partition) -> UACalcResult<Option<(usize, usize)>> {
        Ok(self.principal_data()?.reps.get(beta).copied())
    }

    fn ji_data(&self) -> UACalcResult<&JoinIrreducibleData> {
        self.join_irreducibles.get_or_try_init(|| {
            let principals = &self.principal_data()?.list;
            let mut list = Vec::new();
            let mut lower_covers = AHashMap::new();
            for p in principals {
                let mut join = self.zero.clone();
                for q in principals {
                    if q != p && q.leq(p) {
                        join = join.join(q)?;
                        if &join == p {
                            break;
                        }
                    }
                }
                if &join != p {
                    list.push(p.clone());
                    lower_covers.insert(p.clone(), join);
                }
            }
            Ok(JoinIrreducibleData { list, lower_covers })
        })
    }

    /// Congruences not equal to the join of strictly smaller ones.
    pub fn join_irreducibles(&self) -> UACalcResult<&[Partition]> {
        Ok(&self.ji_data()?.list)
    }

    pub fn is_join_irreducible(&self, beta: &Partition) -> UACalcResult<bool> {
        Ok(self.ji_data()?.lower_covers.contains_key(beta))
    }

    /// The unique lower cover of a join irreducible; None otherwise.
    pub fn lower_star(&self, beta: &Partition) -> UACalcResult<Option<Partition>> {
        Ok(self.ji_data()?.lower_covers.get(beta).cloned())
    }

    /// All congruences: the join closure of the join irreducibles, with
    /// zero in front. Discovery order is deterministic.
    pub fn universe(&self) -> UACalcResult<&[Partition]> {
        if let Some(u) = self.universe.get() {
            return Ok(u);
        }
        let computed = self.compute_universe(&Effort::unbounded())?;
        Ok(self.universe.get_or_init(|| computed))
    }

    /// Budgeted variant: on truncation nothing is cached and the
    /// computation can be retried with a larger budget.
    pub fn universe_with_effort(&self, effort: &Effort) -> UACalcResult<&[Partition]> {
        if let Some(u) = self.universe.get() {
            return Ok(u);
        }
        let computed = self.compute_universe(effort)?;
        Ok(self.universe.get_or_init(|| computed))
    }

    fn compute_universe(&self, effort: &Effort) -> UACalcResult<Vec<Partition>> {
        let jis = self.join_irreducibles()?.to_vec();
        let mut univ: Vec<Partition> = jis.clone();
        let mut seen: AHashSet<Partition> = jis.iter().cloned().collect();
        for k in 0..jis.len() {
            let elem = jis[k].clone();
            let mut i = k;
            while i < univ.len() {
                effort.tick("Con universe")?;
                let join = elem.join(&univ[i])?;
                if seen.insert(join.clone()) {
                    univ.push(join);
                }
                i += 1;
            }
        }
        if seen.insert(self.zero.clone()) {
            univ.insert(0, self.zero.clone());
        }
        Ok(univ)
    }

    pub fn cardinality(&self) -> UACalcResult<usize> {
        Ok(self.universe()?.len())
    }

    /// Minimal nonzero congruences. Every atom is join irreducible, so
    /// these are the minimal elements of the rank-ordered irreducibles.
    pub fn atoms(&self) -> UACalcResult<&[Partition]> {
        self.atoms
            .get_or_try_init(|| {
                let jis = self.join_irreducibles()?;
                let mut atoms: Vec<Partition> = Vec::new();
                for ji in jis {
                    if !atoms.iter().any(|a| a.leq(ji)) {
                        atoms.push(ji.clone());
                    }
                }
                Ok(atoms)
            })
            .map(|v| v.as_slice())
    }

    /// Maximal congruences strictly below one.
    pub fn coatoms(&self) -> UACalcResult<&[Partition]> {
        self.coatoms
            .get_or_try_init(|| {
                let univ = self.universe()?;
                let mut coatoms = Vec::new();
                for p in univ {
                    if p == &self.one {
                        continue;
                    }
                    let covered_only_by_one = univ
                        .iter()
                        .all(|q| q == p || q == &self.one || !p.leq(q));
                    if covered_only_by_one {
                        coatoms.push(p.clone());
                    }
                }
                Ok(coatoms)
            })
            .map(|v| v.as_slice())
    }

    fn upper_covers_map(&self) -> UACalcResult<&AHashMap<Partition, Vec<Partition>>> {
        self.upper_covers.get_or_try_init(|| {
            let univ = self.universe()?.to_vec();
            let jis = self.join_irreducibles()?.to_vec();
            let mut map = AHashMap::new();
            for elem in &univ {
                let mut seen = AHashSet::new();
                let mut covers: Vec<Partition> = Vec::new();
                for ji in &jis {
                    if ji.leq(elem) {
                        continue;
                    }
                    let join = ji.join(elem)?;
                    if !seen.insert(join.clone()) {
                        continue;
                    }
                    let mut dominated = false;
                    covers.retain(|cov| {
                        if cov.leq(&join) {
                            dominated = true;
                            true
                        } else {
                            !join.leq(cov)
                        }
                    });
                    if !dominated {
                        covers.push(join);
                    }
                }
                map.insert(elem.clone(), covers);
            }
            Ok(map)
        })
    }

    /// Upper covers of a congruence in the lattice order.
    pub fn upper_covers(&self, elem: &Partition) -> UACalcResult<Vec<Partition>> {
        Ok(self
            .upper_covers_map()?
            .get(elem)
            .cloned()
            .unwrap_or_default())
    }

    /// Congruences with exactly one upper cover.
    pub fn meet_irreducibles(&self) -> UACalcResult<&[Partition]> {
        self.meet_irreducibles
            .get_or_try_init(|| {
                let univ = self.universe()?.to_vec();
                let map = self.upper_covers_map()?;
                let mut mis = Vec::new();
                for elem in &univ {
                    if map.get(elem).map(|c| c.len()) == Some(1) {
                        mis.push(elem.clone());
                    }
                }
                Ok(mis)
            })
            .map(|v| v.as_slice())
    }

    /// An upper cover of the given congruence, None for one.
    pub fn find_upper_cover(&self, congr: &Partition) -> UACalcResult<Option<Partition>> {
        if congr == &self.one {
            return Ok(None);
        }
        let jis = self.join_irreducibles()?;
        let not_below: Vec<&Partition> = jis.iter().filter(|ji| !ji.leq(congr)).collect();
        let mut minimal: Vec<&Partition> = Vec::new();
        for p in &not_below {
            if !minimal.iter().any(|m| m.leq(p)) {
                minimal.push(p);
            }
        }
        let mut ans = self.one.clone();
        for p in minimal {
            let join = congr.join(p)?;
            if join.leq(&ans) {
                ans = join;
            }
        }
        Ok(Some(ans))
    }

    /// A maximal chain from zero to one, each step joining in one
    /// principal congruence.
    pub fn find_principal_chain(&self) -> UACalcResult<Vec<Partition>> {
        let mut chain = Vec::new();
        if self.alg_size <= 1 {
            chain.push(self.zero.clone());
            return Ok(chain);
        }
        let mut congr = self.zero.clone();
        loop {
            chain.push(congr.clone());
            if congr == self.one {
                return Ok(chain);
            }
            let reps = congr.representatives();
            let next = congr.join(&self.cg(reps[0], reps[1])?)?;
            if next == congr {
                return Err(UACalcError::invariant(
                    "principal chain failed to ascend",
                ));
            }
            congr = next;
        }
    }

    /// Complements of a congruence: meet zero, join one.
    pub fn complements(&self, par: &Partition) -> UACalcResult<Vec<Partition>> {
        let mut ans = Vec::new();
        for q in self.universe()? {
            if par.meet(q)?.is_zero() && par.join(q)? == self.one {
                ans.push(q.clone());
            }
        }
        Ok(ans)
    }

    /// Distributive iff every join irreducible is join prime.
    pub fn is_distributive(&self) -> UACalcResult<bool> {
        self.distributive
            .get_or_try_init(|| {
                for ji in self.join_irreducibles()? {
                    if !self.is_join_prime(ji)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            })
            .copied()
    }

    /// `beta` is join prime when it lies below no join of irreducibles
    /// that all avoid it.
    pub fn is_join_prime(&self, beta: &Partition) -> UACalcResult<bool> {
        let mut join = self.zero.clone();
        for ji in self.join_irreducibles()? {
            if !beta.leq(ji) {
                join = join.join(ji)?;
                if beta.leq(&join) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// The modular law checked on every triple of the universe.
    pub fn is_modular(&self) -> UACalcResult<bool> {
        self.modular
            .get_or_try_init(|| {
                let univ = self.universe()?;
                for a in univ {
                    for b in univ {
                        if !a.leq(b) {
                            continue;
                        }
                        for c in univ {
                            let left = a.join(&c.meet(b)?)?;
                            let right = a.join(c)?.meet(b)?;
                            if left != right {
                                return Ok(false);
                            }
                        }
                    }
                }
                Ok(true)
            })
            .copied()
    }

    /// The set of tame-congruence types over all prime quotients
    /// `lower_star(beta) < beta` for join irreducible `beta`.
    pub fn type_set(&self) -> UACalcResult<&BTreeSet<u8>> {
        self.type_set.get_or_try_init(|| {
            let mut finder = TypeFinder::new(self)?;
            finder.find_type_set()
        })
    }
}
