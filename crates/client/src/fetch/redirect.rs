//! Redirect detection and `Location` resolution.

use super::url::check_target;
use textweb_core::{Error, Response};
use url::Url;

/// True for any 3xx status.
pub fn is_redirect(response: &Response) -> bool {
    response.is_redirect()
}

/// Resolve the `Location` header of `response` against `base`.
///
/// Returns `Ok(None)` when there is no `location` header; a 3xx without one
/// is a final response. Absolute and relative references are both accepted.
///
/// # Errors
///
/// Returns `Error::InvalidUrl` if the location cannot be resolved or points
/// at something other than an http(s) URL.
pub fn resolve_location(response: &Response, base: &Url) -> Result<Option<Url>, Error> {
    let Some(location) = response.header("location") else {
        return Ok(None);
    };

    let location = location.trim();
    if location.is_empty() {
        return Ok(None);
    }

    let resolved = base
        .join(location)
        .map_err(|e| Error::InvalidUrl(format!("bad redirect location {location:?}: {e}")))?;
    check_target(&resolved)?;

    Ok(Some(resolved))
}
