use axum::http::HeaderValue;
use color_eyre::Result;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn cookie(name: &str, value: &str, secure: bool) -> Result<HeaderValue> {
    let secure_flag = if secure { " Secure;" } else { "" };
    let cookie =
        format!("{name}={value}; HttpOnly; Max-Age=3600;{secure_flag} Path=/; SameSite=Strict");
    Ok(HeaderValue::from_str(&cookie)?)
}
