// Modules
mod model;

pub use model::{Gradients, Mlp, Mode};
