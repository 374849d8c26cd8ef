//! CLI command implementations

pub mod check;
pub mod create;
pub mod parse;
pub mod url;

use anyhow::Result;
use ppppp_invite::uri_from_display_url;

/// Accept either a raw invite URI or a display URL carrying one in its fragment.
pub fn invite_uri_from_input(input: &str) -> Result<String> {
    let input = input.trim();
    if input.starts_with("ppppp:") {
        return Ok(input.to_string());
    }
    Ok(uri_from_display_url(input)?)
}
