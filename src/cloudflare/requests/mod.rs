pub mod download;
pub mod locations;
pub mod meta;
pub mod upload;

use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Method,
};
use serde::de::DeserializeOwned;
use std::borrow::Cow;

pub(crate) const UA: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_REPOSITORY"),
    ")"
);

pub trait Request {
    type Response: DeserializeOwned;

    const METHOD: Method = Method::GET;

    fn endpoint(&self) -> Cow<'_, str>;

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, HeaderValue::from_static(UA));

        headers
    }

    fn body(&self) -> Option<Vec<u8>> {
        None
    }

    /// Number of payload bytes this request sends.
    fn body_len(&self) -> u64 {
        0
    }
}

impl<R: Request> Request for &R {
    type Response = R::Response;

    const METHOD: Method = R::METHOD;

    fn endpoint(&self) -> Cow<'_, str> {
        (**self).endpoint()
    }

    fn headers(&self) -> HeaderMap {
        (**self).headers()
    }

    fn body(&self) -> Option<Vec<u8>> {
        (**self).body()
    }

    fn body_len(&self) -> u64 {
        (**self).body_len()
    }
}
