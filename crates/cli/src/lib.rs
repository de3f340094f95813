pub mod cli;
pub mod commands;
pub mod config;

pub use dailydo_core as core;
pub use dailydo_core::model;
pub use dailydo_core::parser;
pub use dailydo_core::services;
pub use dailydo_core::store;
pub use dailydo_core::watch;

pub use dailydo_core::AppConfig;
