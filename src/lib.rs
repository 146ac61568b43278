//! Universal algebra computational kernel.
//!
//! Given a finite algebra `A = <{0,..,n-1}, F>` this crate computes the
//! structural invariants studied in universal algebra: the congruence
//! lattice `Con(A)`, the subalgebra lattice `Sub(A)`, term operations,
//! tame-congruence-theory type labels on prime quotients, and derived
//! algebras (quotient, product, power, subalgebra, reduct, free).

pub mod alg;
pub mod eq;
pub mod error;
pub mod io;
pub mod progress;
pub mod terms;
pub mod util;

pub use alg::algebra::{BasicAlgebra, SmallAlgebra};
pub use alg::big_product_algebra::BigProductAlgebra;
pub use alg::closer::Closer;
pub use alg::conlat::congruence_lattice::CongruenceLattice;
pub use alg::conlat::partition::Partition;
pub use alg::conlat::subtrace::{CentralityData, Subtrace};
pub use alg::conlat::type_finder::TypeFinder;
pub use alg::free_algebra::FreeAlgebra;
pub use alg::op::operation::{FunctionOperation, IntOperation, Operation};
pub use alg::op::operation_symbol::{OperationSymbol, SimilarityType};
pub use alg::product_algebra::{PowerAlgebra, ProductAlgebra};
pub use alg::quotient_algebra::QuotientAlgebra;
pub use alg::reduct::Reduct;
pub use alg::subalgebra::Subalgebra;
pub use alg::sublat::{BasicSet, SubalgebraLattice};
pub use eq::Equation;
pub use error::{UACalcError, UACalcResult};
pub use progress::{CancelToken, Effort};
pub use terms::{Term, TermOperation, Variable};

/// Re-export of the names most callers need.
pub mod prelude {
    pub use crate::alg::algebra::{BasicAlgebra, SmallAlgebra};
    pub use crate::alg::big_product_algebra::BigProductAlgebra;
    pub use crate::alg::conlat::congruence_lattice::CongruenceLattice;
    pub use crate::alg::conlat::partition::Partition;
    pub use crate::alg::conlat::type_finder::TypeFinder;
    pub use crate::alg::free_algebra::FreeAlgebra;
    pub use crate::alg::malcev;
    pub use crate::alg::op::operation::{FunctionOperation, IntOperation, Operation};
    pub use crate::alg::op::operation_symbol::{OperationSymbol, SimilarityType};
    pub use crate::alg::op::operations;
    pub use crate::alg::product_algebra::{PowerAlgebra, ProductAlgebra};
    pub use crate::alg::quotient_algebra::QuotientAlgebra;
    pub use crate::alg::reduct::Reduct;
    pub use crate::alg::subalgebra::Subalgebra;
    pub use crate::alg::sublat::{BasicSet, SubalgebraLattice};
    pub use crate::eq::Equation;
    pub use crate::error::{UACalcError, UACalcResult};
    pub use crate::progress::{CancelToken, Effort};
    pub use crate::terms::{Term, TermOperation, Variable};
    pub use crate::util::horner;
    pub use crate::util::int_array::IntArray;
}
