pub mod horner;
pub mod int_array;
pub mod sequence;
