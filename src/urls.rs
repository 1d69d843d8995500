//! URL builders for the image endpoint.
//!
//! Templates call these instead of concatenating query strings by hand. The
//! presets are the sizes the frontend uses.

use crate::imaging::Fit;

/// Route prefix the endpoint is mounted under.
pub const IMAGE_ROUTE: &str = "/images";

pub const THUMBNAIL_SIZE: u32 = 150;
pub const MEDIUM_WIDTH: u32 = 800;
pub const LARGE_WIDTH: u32 = 1200;

/// Percent-encode each segment of a logical path, keeping the `/` separators.
pub fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// `/images/<path>` plus whichever of `w`, `h` and `fit` are given.
///
/// With neither dimension the URL points at the original and `fit` is left
/// off, since it would be ignored.
pub fn image_url(path: &str, width: Option<u32>, height: Option<u32>, fit: Option<Fit>) -> String {
    let mut url = format!("{IMAGE_ROUTE}/{}", encode_path(path));
    let mut params = Vec::new();
    if let Some(w) = width {
        params.push(format!("w={w}"));
    }
    if let Some(h) = height {
        params.push(format!("h={h}"));
    }
    if let Some(fit) = fit
        && !params.is_empty()
    {
        params.push(format!("fit={fit}"));
    }
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
    url
}

pub fn thumbnail_url(path: &str) -> String {
    image_url(path, Some(THUMBNAIL_SIZE), Some(THUMBNAIL_SIZE), None)
}

pub fn medium_url(path: &str) -> String {
    image_url(path, Some(MEDIUM_WIDTH), None, None)
}

pub fn large_url(path: &str) -> String {
    image_url(path, Some(LARGE_WIDTH), None, None)
}
