use std::sync::Arc;

use courier_core::transport::Transport;
use courier_core::Controllers;

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

/// Everything a command handler needs. Built once in `main`.
pub struct AppContext {
    pub controllers: Controllers,
}

impl AppContext {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            controllers: Controllers::new(transport),
        }
    }
}
