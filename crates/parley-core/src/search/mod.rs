//! External context augmentation: the search port and the retrieval gate
//! that decides when to use it.

pub mod backend;
pub mod gate;
