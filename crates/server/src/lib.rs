pub mod broadcast;
pub mod config;
pub mod fight_log;
pub mod finalize;
pub mod live;
pub mod notifier;
pub mod recovery;
pub mod schedule;
pub mod spectators;
pub mod store;
pub mod web;
