//! Application state module

mod app_state;
mod cascade;
mod entities;
mod forms;
mod submission;
mod wizard;

pub use app_state::*;
pub use cascade::*;
pub use entities::*;
pub use forms::*;
pub use submission::*;
pub use wizard::*;
