use crate::cloudflare::requests::{Request, UA};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use std::borrow::Cow;

/// `POST /__up` with a payload of zeros.
#[derive(Debug, Clone)]
pub(crate) struct Upload {
    data: Vec<u8>,
}

impl Upload {
    pub fn new(bytes: u64) -> Self {
        Self { data: vec![b'0'; bytes as usize] }
    }
}

impl Request for Upload {
    type Response = ();

    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/__up".into()
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, HeaderValue::from_static(UA));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        headers
    }

    fn body(&self) -> Option<Vec<u8>> {
        Some(self.data.clone())
    }

    fn body_len(&self) -> u64 {
        self.data.len() as u64
    }
}
