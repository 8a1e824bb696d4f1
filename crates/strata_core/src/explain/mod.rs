pub mod explainable;
pub mod formatter;
pub mod node;
