use crate::cloudflare::requests::Request;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Cloudflare datacenter (colo) information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Colo {
    /// IATA airport code for the datacenter location
    pub iata: String,
    pub lat: f64,
    pub lon: f64,
    /// ISO 3166-1 alpha-2 country code
    pub cca2: String,
    pub region: String,
    pub city: String,
}

/// The client's view of the connection, including the colo serving it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Meta {
    pub hostname: String,
    #[serde(rename = "clientIp")]
    pub client_ip: String,
    #[serde(rename = "asOrganization")]
    pub as_organization: String,
    pub colo: Option<Colo>,
    pub country: String,
    pub city: String,
    pub latitude: String,
    pub longitude: String,
}

impl Meta {
    /// Client coordinates, when the service could geolocate the client.
    pub fn client_coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.trim().parse::<f64>().ok()?;
        let lon = self.longitude.trim().parse::<f64>().ok()?;
        Some((lat, lon))
    }
}

pub(crate) struct MetaRequest {}

impl Request for MetaRequest {
    type Response = Meta;

    fn endpoint(&self) -> Cow<'_, str> {
        "/meta".into()
    }
}
