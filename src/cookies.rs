use percent_encoding::percent_decode_str;
use reqwest::cookie::CookieStore;
use url::Url;

/// The name of the cookie the server stores its CSRF token in.
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";

/// Look up a cookie by name in a `;`-delimited cookie string (the format
/// used by the `Cookie` header).
///
/// The first match wins and its value is percent-decoded. Returns `None`
/// when there are no cookies or none of them are called `name`.
pub fn read_cookie(cookies: Option<&str>, name: &str) -> Option<String> {
    let cookies = cookies?;

    if cookies.is_empty() {
        return None;
    }

    cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| {
            let value = cookie.strip_prefix(name)?.strip_prefix('=')?;
            Some(percent_decode_str(value).decode_utf8_lossy().into_owned())
        })
}

/// Read the CSRF token the cookie jar would send to `url`.
pub fn csrf_token(
    jar: &dyn CookieStore,
    url: &Url,
    cookie_name: &str,
) -> Option<String> {
    let header = jar.cookies(url)?;
    read_cookie(header.to_str().ok(), cookie_name)
}
