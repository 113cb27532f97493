//! HTTP access to the imagery provider.

use crate::AcquireError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the provider API key.
pub const API_KEY_VAR: &str = "PLANET_KEY";

/// The two requests the acquisition loop makes.
pub trait HttpTransport {
    /// GET `url` with `query` appended and decode the body as JSON.
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, AcquireError>;

    /// GET `url` and stream the body into `dest`, returning the byte count.
    fn download(&self, url: &str, dest: &Path) -> Result<u64, AcquireError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, AcquireError> {
        (**self).get_json(url, query)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, AcquireError> {
        (**self).download(url, dest)
    }
}

/// Blocking client authenticating with the API key as basic-auth user.
pub struct UreqTransport {
    agent: ureq::Agent,
    authorization: String,
}

impl UreqTransport {
    pub fn new(api_key: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .timeout_read(Duration::from_secs(300))
            .build();
        let authorization = format!("Basic {}", STANDARD.encode(format!("{api_key}:")));
        Self {
            agent,
            authorization,
        }
    }

    /// Read the key from `PLANET_KEY`.
    pub fn from_env() -> Result<Self, AcquireError> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(AcquireError::MissingApiKey),
        }
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<ureq::Response, AcquireError> {
        let mut request = self
            .agent
            .get(url)
            .set("Authorization", &self.authorization);
        for (key, value) in query {
            request = request.query(key, value);
        }
        request.call().map_err(|e| AcquireError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl HttpTransport for UreqTransport {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, AcquireError> {
        let response = self.get(url, query)?;
        response.into_json::<Value>().map_err(|e| AcquireError::Http {
            url: url.to_string(),
            message: format!("invalid JSON body: {e}"),
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, AcquireError> {
        let response = self.get(url, &[])?;
        let mut reader = response.into_reader();
        let mut out = BufWriter::new(File::create(dest)?);
        let written = io::copy(&mut reader, &mut out)?;
        out.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_uses_key_as_user_name() {
        let transport = UreqTransport::new("secret");
        // base64("secret:")
        assert_eq!(transport.authorization, "Basic c2VjcmV0Og==");
    }
}
