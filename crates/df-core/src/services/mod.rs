pub mod balance;
pub mod compose;
pub mod config_loader;
pub mod identity;
pub mod inventory;
pub mod planner;
pub mod ports;
pub mod state;
