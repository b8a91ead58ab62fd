const fn unwrap_or_cargo_version(opt: Option<&'static str>) -> &'static str {
    match opt {
        Some(val) => val,
        None => env!("CARGO_PKG_VERSION"),
    }
}

/// Build version, overridable at compile time through `BLOG_SENTINEL_VERSION`.
pub const VERSION: &str = unwrap_or_cargo_version(option_env!("BLOG_SENTINEL_VERSION"));

/// User agent sent by the uptime monitor's probes.
pub fn monitor_user_agent() -> String {
    format!("blog-sentinel-uptime-monitor/{VERSION}")
}
