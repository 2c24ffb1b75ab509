mod effective;
mod models;
mod patch;
mod provider;

pub use effective::*;
pub use models::*;
pub use patch::Patch;
pub use provider::*;
