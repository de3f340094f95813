pub use dailydo_cli::cli;
pub use dailydo_cli::commands;
pub use dailydo_cli::config;

pub use dailydo_core as core;
pub use dailydo_core::model;
pub use dailydo_core::parser;
pub use dailydo_core::services;
pub use dailydo_core::store;
pub use dailydo_core::watch;
