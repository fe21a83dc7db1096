// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::path::PathBuf;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::Header;
use rocket::{options, routes, Build, Rocket};
use rocket::{Request, Response};

use super::{handlers, ApiState};

/// Adds CORS headers to responses for requests coming from an allowed origin.
pub struct CORS {
    allowed_origins: Vec<String>,
}

impl CORS {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == "*" || o == origin)
    }
}

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let Some(origin) = request.headers().get_one("Origin") else {
            return;
        };
        if !self.allows(origin) {
            return;
        }
        response.set_header(Header::new("Access-Control-Allow-Origin", origin.to_string()));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        response.set_header(Header::new("Vary", "Origin"));
    }
}

/// # Answers to OPTIONS requests
#[options("/<_path..>")]
async fn options(_path: PathBuf) -> Result<(), std::io::Error> {
    Ok(())
}

/// Build the API server from a Rocket figment.
///
/// `allowed_origins` feeds the [`CORS`] fairing; `"*"` allows any origin.
pub fn build_rocket(figment: Figment, state: ApiState, allowed_origins: Vec<String>) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(CORS::new(allowed_origins))
        .mount("/", routes![options])
        .mount(
            "/modbus",
            routes![
                handlers::read_all,
                handlers::read_discrete_inputs,
                handlers::read_input_registers,
                handlers::read_coils,
                handlers::read_holding_registers,
                handlers::write_coil,
                handlers::write_holding_register,
            ],
        )
        .mount("/missionWorks", routes![handlers::stop_all_mission_works])
        .mount("/vehicles", routes![handlers::emergency_stop])
        .manage(state)
}
