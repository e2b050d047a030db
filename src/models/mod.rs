pub mod attendance;
pub mod config;
pub mod document;
pub mod marathon;
pub mod person;

pub use attendance::*;
pub use config::*;
pub use document::*;
pub use marathon::*;
pub use person::*;
