//! Core types shared by handles and the gather

mod dtype;
mod element;
mod grid;

pub use dtype::DType;
pub use element::Element;
pub use grid::{BlockIter, ChunkGrid};
