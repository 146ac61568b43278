pub mod operation;
pub mod operation_symbol;
pub mod operations;

pub use operation::{FunctionOperation, IntOperation, Operation};
pub use operation_symbol::{OperationSymbol, SimilarityType};
