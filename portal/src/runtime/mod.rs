mod shim;

pub use shim::{Shim, ShimStats};
