pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod services;
pub mod store;
pub mod watch;

pub use config::AppConfig;
pub use error::StoreError;
pub use model::*;
pub use services::TodoSession;
pub use store::DailyNoteStore;
