//! Tizaraa Domain Concerns

pub mod carts;
