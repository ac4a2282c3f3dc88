use std::time::Duration;

use axum::http::{header, HeaderMap};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// HttpOnly + Secure cookie carrying a token, scoped to the whole site.
pub fn token_cookie(name: &str, value: &str, max_age: Duration) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
        name,
        value,
        max_age.as_secs()
    )
}

pub fn clear_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0", name)
}

/// Look up one cookie by name across all Cookie headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, val) = cookie.split_once('=')?;
            if key.trim() == name {
                Some(val.trim().to_string())
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_cookie_is_http_only_and_secure() {
        let cookie = token_cookie(ACCESS_COOKIE, "abc", Duration::from_secs(900));
        assert!(cookie.starts_with("accessToken=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Max-Age=900"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie(REFRESH_COOKIE);
        assert!(cookie.starts_with("refreshToken=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=tok123; refreshToken=tok456"),
        );
        assert_eq!(cookie_value(&headers, ACCESS_COOKIE).as_deref(), Some("tok123"));
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE).as_deref(), Some("tok456"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_value_handles_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("accessToken=tok"));
        assert_eq!(cookie_value(&headers, ACCESS_COOKIE).as_deref(), Some("tok"));
    }
}
