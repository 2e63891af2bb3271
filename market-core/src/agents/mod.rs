pub mod inventory;
pub mod vendor;

pub use inventory::*;
pub use vendor::*;
