pub mod congruence_lattice;
pub mod partition;
pub mod subtrace;
pub mod type_finder;

pub use congruence_lattice::CongruenceLattice;
pub use partition::Partition;
pub use subtrace::{CentralityData, Subtrace};
pub use type_finder::TypeFinder;
