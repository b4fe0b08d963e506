//! Storefront cart application: the cart store, its persistence and
//! cross-context sync, and the CLI composition root.

pub mod config;
pub mod context;
pub mod domain;
pub mod observability;

#[cfg(test)]
mod test;
