// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP client for the mission management service

use std::time::Duration;

use log::debug;
use reqwest::{Method, Response};
use url::Url;

use super::{MissionError, MissionWork, MissionWorkId};
use crate::config::MissionsConfig;

#[derive(Debug, Clone)]
pub struct MissionClient {
    http: reqwest::Client,
    base_url: Url,
    mission_works_path: String,
    stop_path: String,
    emergency_stop_path: String,
}

impl MissionClient {
    pub fn new(config: &MissionsConfig) -> Result<Self, MissionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|source| MissionError::Transport {
                operation: "build mission service client".to_string(),
                source,
            })?;

        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(MissionError::BaseUrl(config.base_url.clone()));
        }

        Ok(Self {
            http,
            base_url,
            mission_works_path: config.mission_works_path.clone(),
            stop_path: config.stop_path.clone(),
            emergency_stop_path: config.emergency_stop_path.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append the segments of `path` to the base URL, keeping any path prefix
    /// of the base. The `{id}` placeholder is replaced by `id` and
    /// percent-encoded as part of its segment.
    fn endpoint(&self, path: &str, id: Option<&MissionWorkId>) -> Result<Url, MissionError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| MissionError::BaseUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                match id {
                    Some(id) => segments.push(&segment.replace("{id}", &id.to_string())),
                    None => segments.push(segment),
                };
            }
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, operation: &str) -> Result<Response, MissionError> {
        debug!("{} {}", method, url);

        let response = self
            .http
            .request(method, url)
            .send()
            .await
            .map_err(|source| MissionError::Transport {
                operation: operation.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MissionError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Fetch every mission work known to the service.
    pub async fn list_mission_works(&self) -> Result<Vec<MissionWork>, MissionError> {
        let operation = "fetch mission works";
        let works: Vec<MissionWork> = self
            .send(
                Method::GET,
                self.endpoint(&self.mission_works_path, None)?,
                operation,
            )
            .await?
            .json()
            .await
            .map_err(|source| MissionError::Transport {
                operation: operation.to_string(),
                source,
            })?;
        debug!("Mission works fetched: {:?}", works);
        Ok(works)
    }

    /// Ask the service to stop one mission work.
    pub async fn stop_mission_work(&self, id: &MissionWorkId) -> Result<(), MissionError> {
        let url = self.endpoint(&self.stop_path, Some(id))?;
        self.send(Method::POST, url, &format!("stop mission work {id}"))
            .await
            .map(|_| ())
    }

    /// Open the vehicles emergency stop.
    pub async fn emergency_stop(&self) -> Result<(), MissionError> {
        let url = self.endpoint(&self.emergency_stop_path, None)?;
        self.send(Method::PUT, url, "initiate emergency stop")
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> MissionClient {
        MissionClient::new(&MissionsConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoints_keep_the_base_path_prefix() {
        for base in ["http://host:8080/fleet", "http://host:8080/fleet/"] {
            let url = client(base)
                .endpoint("/api/v3/missionWorks", None)
                .unwrap();
            assert_eq!(url.as_str(), "http://host:8080/fleet/api/v3/missionWorks");
        }

        let url = client("http://host:8080")
            .endpoint("/api/v3/vehicles/devices/emergencyStop/open", None)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://host:8080/api/v3/vehicles/devices/emergencyStop/open"
        );
    }

    #[test]
    fn mission_work_ids_are_encoded_in_their_segment() {
        let client = client("http://host:8080");
        let stop = "/api/v3/missionWorks/{id}/controls/stop";

        let url = client
            .endpoint(stop, Some(&MissionWorkId::Number(42)))
            .unwrap();
        assert_eq!(url.path(), "/api/v3/missionWorks/42/controls/stop");

        let url = client
            .endpoint(stop, Some(&MissionWorkId::Text("a/b?c#d".to_string())))
            .unwrap();
        assert_eq!(url.path(), "/api/v3/missionWorks/a%2Fb%3Fc%23d/controls/stop");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn opaque_base_urls_are_rejected() {
        let result = MissionClient::new(&MissionsConfig {
            base_url: "mailto:fleet@example.com".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(MissionError::BaseUrl(_))));
    }
}
