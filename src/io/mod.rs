pub mod algebra_reader;
pub mod algebra_writer;
pub mod mace4;

pub use algebra_reader::{read, read_from_str, read_list, read_list_from_str, AlgebraReader};
pub use algebra_writer::{write, write_to_string, WriteStyle};
pub use mace4::{read_mace4, read_mace4_from_str};
