pub mod amount;
pub mod clipboard;
pub mod csv;
pub mod engine;
pub mod history;
pub mod model;
pub mod report;
pub mod store;

pub use amount::{Amount, Won};
pub use engine::{Engine, EngineError, ValidationError};
pub use history::History;
pub use model::{Category, Record, Request};
pub use report::{Render, Report};
pub use store::{FileStorage, MemoryStorage, RecordStore, Storage};
