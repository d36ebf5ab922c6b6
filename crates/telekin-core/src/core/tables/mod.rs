pub mod elements;
pub mod masses;
