// BgpSim: BGP Network Simulator written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! This module contains the code for reading the configuration.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};

macro_rules! expect {
    ($result:expr, $($rest:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!("Error: {}: {}\n", format!($($rest)*), e);
            panic!()
        })
    };
}

lazy_static! {
    pub static ref CONFIG_DIR: String = {
        if cfg!(test) {
            concat!(env!("OUT_DIR"), "/.config").to_string()
        } else {
            expect!(
                std::env::var("UHD_LAB_CONFIG"),
                "Environment variable 'UHD_LAB_CONFIG' is not defined!"
            )
        }
    };
    pub static ref CONFIG: Config = {
        let config_str = expect!(
            std::fs::read_to_string(format!("{}/config.toml", *CONFIG_DIR)),
            "Cannot read '{}/config.toml'",
            *CONFIG_DIR
        );
        expect!(
            toml::from_str(&config_str),
            "Cannot parse '{}/config.toml'",
            *CONFIG_DIR
        )
    };
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ports: PortConfig,
    pub results: ResultConfig,
    pub timing: TimingConfig,
}

/// Configuration for reaching the UHD API server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Hostname or IP address of the UHD API server.
    pub addr: String,
    /// REST port of the API server. Defaults to 443.
    #[serde(default = "default_rest_port")]
    pub rest_port: u16,
    /// Username used to authenticate with the API server.
    pub username: String,
    /// Password used to authenticate with the API server.
    pub password: String,
    /// Whether to verify the TLS certificate of the API server. The appliance ships with a
    /// self-signed certificate, so this defaults to `false`.
    #[serde(default)]
    pub verify_tls: bool,
}

/// The physical test port inventory of the lab.
#[derive(Debug, Clone, Deserialize)]
pub struct PortConfig {
    /// All port locations available in the lab, in the order in which demos assign them.
    #[serde(deserialize_with = "deserialize_port_locations")]
    pub locations: Vec<PortLocation>,
}

/// Configuration for storing test result artifacts.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultConfig {
    /// Local folder where result files (CSV, PDF) are stored.
    pub folder: String,
    /// Whether to append a `HHMMSS` timestamp to result filenames, so that reruns do not
    /// overwrite earlier results.
    #[serde(default = "default_true")]
    pub include_timestamp: bool,
}

/// Timeouts and poll intervals, all in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// How long to wait for all protocol sessions to come up.
    #[serde(default = "default_protocol_timeout")]
    pub protocol_timeout: u64,
    /// How long to wait for assigned ports to report link-up.
    #[serde(default = "default_port_timeout")]
    pub port_up_timeout: u64,
    /// How long to wait for an asynchronous appliance operation to complete.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout: u64,
    /// Interval between two progress queries while a Quick Test trial is running.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_rest_port() -> u16 {
    443
}

fn default_true() -> bool {
    true
}

fn default_protocol_timeout() -> u64 {
    60
}

fn default_port_timeout() -> u64 {
    90
}

fn default_operation_timeout() -> u64 {
    180
}

fn default_progress_interval() -> u64 {
    10
}

/// The location of a physical test port, written as `chassis/port` or `chassis/card/port`
/// (e.g. `localuhd/1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortLocation {
    /// The chassis name or address.
    pub chassis: String,
    /// The card number, if the chassis has multiple cards.
    pub card: Option<u32>,
    /// The port number on the chassis (or card).
    pub port: u32,
}

impl PortLocation {
    /// Parse a port location. Accepts `chassis/port` and `chassis/card/port`.
    pub fn new(s: impl AsRef<str>) -> Result<Self, InvalidPortLocation> {
        lazy_static! {
            static ref LOCATION_RE: Regex =
                Regex::new(r"^([a-zA-Z0-9_.:-]+)/([0-9]+)(?:/([0-9]+))?$").unwrap();
        }
        let s = s.as_ref();
        let c = LOCATION_RE
            .captures(s)
            .ok_or_else(|| InvalidPortLocation(s.to_string()))?;
        let first: u32 = c.get(2).unwrap().as_str().parse().unwrap();
        Ok(match c.get(3) {
            Some(port) => PortLocation {
                chassis: c.get(1).unwrap().as_str().to_string(),
                card: Some(first),
                port: port.as_str().parse().unwrap(),
            },
            None => PortLocation {
                chassis: c.get(1).unwrap().as_str().to_string(),
                card: None,
                port: first,
            },
        })
    }
}

impl fmt::Display for PortLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.card {
            Some(card) => write!(f, "{}/{}/{}", self.chassis, card, self.port),
            None => write!(f, "{}/{}", self.chassis, self.port),
        }
    }
}

impl FromStr for PortLocation {
    type Err = InvalidPortLocation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The port location string does not match `chassis/port` or `chassis/card/port`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid port location: {0} (should be 'chassis/port' or 'chassis/card/port')")]
pub struct InvalidPortLocation(pub String);

fn deserialize_port_locations<'de, D>(de: D) -> Result<Vec<PortLocation>, D::Error>
where
    D: Deserializer<'de>,
{
    let x: Vec<String> = Vec::deserialize(de)?;
    Ok(x.into_iter()
        .map(|loc| match PortLocation::new(&loc) {
            Ok(loc) => loc,
            Err(e) => panic!("{e}"),
        })
        .collect())
}
