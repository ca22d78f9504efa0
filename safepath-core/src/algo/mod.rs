//! Pure computations shared by graph construction and search

pub mod geodesic;
pub mod safety;
