pub mod agenda;
pub mod app;
pub mod calendar;
pub mod components;
pub mod config;
pub mod error;
pub mod event;
pub mod startup;
pub mod theme;
pub mod tui;
