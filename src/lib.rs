//! 8M-Chirper: post a meme URL with an explanation, browse the newest fifty,
//! edit or delete them.

pub mod aws_clients;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flash;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod startup;
pub mod validation;
pub mod views;

use services::MemeService;

/// AppState holds shared resources for the web server.
#[derive(Clone)]
pub struct AppState {
    pub memes: MemeService,
}
