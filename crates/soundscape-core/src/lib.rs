pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod mapper;
pub mod notes;
pub mod pointer;
pub mod reverb;
pub mod scheduler;
pub mod session;
pub mod wind;

pub use backend::*;
pub use config::*;
pub use error::*;
pub use mapper::*;
pub use notes::*;
pub use pointer::*;
pub use reverb::*;
pub use scheduler::*;
pub use session::*;
pub use wind::*;
