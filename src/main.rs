// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

mod api;
mod app;
mod config;
mod models;
mod mvu;
mod ui;

use std::process::ExitCode;

use crate::api::ApiClient;
use crate::config::AppConfig;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err:#}");
            return ExitCode::FAILURE;
        }
    };
    log::info!("using backend {}", config.api.base_url);

    let client = match ApiClient::new(&config.api) {
        Ok(client) => client,
        Err(err) => {
            log::error!("failed to build HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };

    match app::run(config, client) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("ui terminated: {err}");
            ExitCode::FAILURE
        }
    }
}
