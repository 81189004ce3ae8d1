pub mod activities;
pub mod api;
pub mod models;
