use crate::cloudflare::requests::Request;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Deserialize, Debug)]
#[serde(transparent)]
pub struct LocationsResponse(Vec<Location>);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct Location {
    pub iata: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub cca2: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub city: String,
}

pub(crate) struct Locations {}

impl Request for Locations {
    type Response = LocationsResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        "/locations".into()
    }
}

impl LocationsResponse {
    pub(crate) fn into_inner(self) -> Vec<Location> {
        self.0
    }
}
