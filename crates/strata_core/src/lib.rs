pub mod analyzer;
pub mod arrays;
pub mod catalog;
pub mod config;
pub mod explain;
pub mod expr;
pub mod functions;
pub mod logical;
pub mod transform;

#[cfg(test)]
pub(crate) mod testutil;
