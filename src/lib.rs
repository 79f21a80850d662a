pub mod app;
pub mod backup;
pub mod db;
pub mod diff;
pub mod filter;
pub mod generator;
pub mod grid;
pub mod install;
pub mod keybindings;
pub mod logging;
pub mod model;
pub mod palette;
pub mod realm;
pub mod reconcile;
pub mod settings;
pub mod theme;
pub mod types;
pub mod ui;
pub mod youtube;
