use thiserror::Error;
use url::Url;

use crate::monitoring::Probe;

/// Rejections for the address argument; sent back to the chat verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("{0} is not a valid URL")]
    Invalid(String),
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Normalize an address into a scheme-qualified URL.
///
/// Already-qualified addresses pass through after validation. A bare
/// host is probed as `https://` first, then `http://`; whichever
/// answers wins, and `https://` stands when neither does. "Answers"
/// means any HTTP response at all: a 500 from the right scheme still
/// identifies the scheme.
pub async fn resolve_scheme(prober: &dyn Probe, address: &str) -> Result<String, AddressError> {
    // An explicit scheme passes through; anything but http(s) is refused
    // rather than silently re-prefixed.
    if address.contains("://") {
        let parsed =
            Url::parse(address).map_err(|_| AddressError::Invalid(address.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(AddressError::UnsupportedScheme(other.to_string())),
        }
        if !parsed.has_host() {
            return Err(AddressError::Invalid(address.to_string()));
        }
        return Ok(address.to_string());
    }

    let https = format!("https://{address}");
    let parsed = Url::parse(&https).map_err(|_| AddressError::Invalid(address.to_string()))?;
    if !parsed.has_host() {
        return Err(AddressError::Invalid(address.to_string()));
    }

    if answers(prober, &https).await {
        return Ok(https);
    }

    let http = format!("http://{address}");
    if answers(prober, &http).await {
        return Ok(http);
    }

    Ok(https)
}

async fn answers(prober: &dyn Probe, url: &str) -> bool {
    prober.probe(url).await.error.is_none()
}
