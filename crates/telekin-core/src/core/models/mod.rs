pub mod fragment;
pub mod layer;
pub mod particle;
pub mod stack;
