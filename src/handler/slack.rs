use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use lambda_http::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::HandlerError;
use crate::types::SlashCommand;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

const SIGNATURE_VERSION: &str = "v0";

/// Maximum clock skew accepted between Slack and us (replay protection).
pub const MAX_TIMESTAMP_SKEW_SECS: u64 = 60 * 5;

/// Verify a request against Slack's signing secret, using the current time.
///
/// <https://api.slack.com/authentication/verifying-requests-from-slack>
pub fn verify_slack_request(
    signing_secret: &SecretString,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), HandlerError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| HandlerError::SignatureInvalid(e.to_string()))?
        .as_secs();

    verify_slack_request_at(signing_secret, headers, body, now)
}

pub fn verify_slack_request_at(
    signing_secret: &SecretString,
    headers: &HeaderMap,
    body: &[u8],
    now: u64,
) -> Result<(), HandlerError> {
    let timestamp = header_str(headers, TIMESTAMP_HEADER)?;
    let signature = header_str(headers, SIGNATURE_HEADER)?;

    verify_slack_signature(signing_secret.expose_secret(), body, timestamp, signature, now)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, HandlerError> {
    headers
        .get(name)
        .ok_or_else(|| HandlerError::SignatureInvalid(format!("{name} header missing")))?
        .to_str()
        .map_err(|_| HandlerError::SignatureInvalid(format!("{name} header is not ASCII")))
}

pub fn verify_slack_signature(
    signing_secret: &str,
    body: &[u8],
    timestamp: &str,
    signature: &str,
    now: u64,
) -> Result<(), HandlerError> {
    if signing_secret.is_empty() {
        return Err(HandlerError::SignatureInvalid(
            "signing secret is empty".to_string(),
        ));
    }

    let request_timestamp: u64 = timestamp
        .parse()
        .map_err(|_| HandlerError::SignatureInvalid("invalid timestamp".to_string()))?;

    if now.abs_diff(request_timestamp) > MAX_TIMESTAMP_SKEW_SECS {
        return Err(HandlerError::SignatureInvalid(
            "request timestamp outside tolerance".to_string(),
        ));
    }

    let signature_hex = signature
        .strip_prefix(SIGNATURE_VERSION)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| HandlerError::SignatureInvalid("invalid signature format".to_string()))?;
    let expected = hex::decode(signature_hex)
        .map_err(|_| HandlerError::SignatureInvalid("invalid signature hex".to_string()))?;

    let mac = signing_mac(signing_secret, timestamp, body)?;

    // verify_slice compares in constant time
    mac.verify_slice(&expected)
        .map_err(|_| HandlerError::SignatureInvalid("signature mismatch".to_string()))
}

/// HMAC over `v0:<timestamp>:<body>`.
fn signing_mac(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<HmacSha256, HandlerError> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|e| HandlerError::SignatureInvalid(e.to_string()))?;
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

/// Compute the `X-Slack-Signature` value Slack would send for this body.
#[cfg(test)]
pub(crate) fn sign_slack_request(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<String, HandlerError> {
    let mac = signing_mac(signing_secret, timestamp, body)?;
    Ok(format!(
        "{SIGNATURE_VERSION}={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

pub fn parse_slash_command(body: &[u8]) -> Result<SlashCommand, HandlerError> {
    serde_urlencoded::from_bytes(body).map_err(|e| HandlerError::PayloadMalformed(e.to_string()))
}
