//! Prompt generation over the demographic × item × perspective × style
//! cross product.

mod generator;

pub use generator::*;
