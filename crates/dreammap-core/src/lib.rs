pub mod config_manager;
pub mod error;
pub mod phase;
pub mod traits;
pub mod types;

pub use config_manager::*;
pub use error::*;
pub use phase::*;
pub use traits::*;
pub use types::*;
