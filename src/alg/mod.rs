pub mod algebra;
pub mod big_product_algebra;
pub mod closer;
pub mod conlat;
pub mod free_algebra;
pub mod malcev;
pub mod op;
pub mod product_algebra;
pub mod quotient_algebra;
pub mod reduct;
pub mod subalgebra;
pub mod sublat;
