#![deny(missing_docs)]
//! CTD issues server executable.
//!
//! Serves a built CTD processing issues site and its summary as JSON.

mod openapi;
mod routes;

#[cfg(not(test))]
use actix_cors::Cors;
#[cfg(not(test))]
use actix_web::{App, HttpServer, http::header, web};
#[cfg(not(test))]
use dotenvy::dotenv;

#[allow(unused_imports)]
use std::str::FromStr;

#[cfg(not(test))]
use crate::routes::{AppState, get_issue, list_issues, openapi_json, site_file};

#[cfg(not(test))]
fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let state = web::Data::new(AppState::from_env());
    if !state.site_dir.join("summary.json").is_file() {
        log::warn!(
            "no summary.json in {}; run `ctd-issues build` first",
            state.site_dir.display()
        );
    }

    let origins = std::env::var("CTD_ISSUES_UI_ORIGINS")
        .unwrap_or_else(|_| "http://127.0.0.1:4200,http://localhost:4200".to_string());
    let allowed_origins: Vec<String> = origins
        .split(',')
        .map(|value| value.trim())
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect();

    let listen_addr =
        std::env::var("CTD_ISSUES_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let raw_port = std::env::var("CTD_ISSUES_PORT").unwrap_or_else(|_| "8000".to_string());
    let listen_port = u16::from_str(&raw_port).map_err(|err| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("CTD_ISSUES_PORT must be a u16 number: {err}"),
        )
    })?;
    log::info!(
        "Serving {} on {listen_addr}:{listen_port}",
        state.site_dir.display()
    );

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "OPTIONS"])
                .allowed_headers(vec![header::CONTENT_TYPE])
                .max_age(3600);
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            App::new()
                .wrap(actix_web::middleware::Logger::default())
                .wrap(cors)
                .app_data(state.clone())
                .service(list_issues)
                .service(get_issue)
                .service(openapi_json)
                .service(site_file)
        })
        .bind((listen_addr, listen_port))?
        .run()
        .await
    })
}

#[cfg(test)]
fn main() {}
