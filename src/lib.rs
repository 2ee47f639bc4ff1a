pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod credential;
pub mod logging;
pub mod model;
pub mod render;
pub mod view;
pub mod web;
