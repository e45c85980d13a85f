use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

pub(super) fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

pub(super) fn default_updates() -> String {
    "polling".to_string()
}

pub(super) const fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

pub(super) const fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

pub(super) const fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

pub(super) const fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

pub(super) const fn default_port() -> u16 {
    3333
}

pub(super) fn default_service_name() -> String {
    "Savolia Error Logger Bot".to_string()
}

pub(super) const fn default_update_queue_bound() -> usize {
    64
}

pub(super) const fn default_dedup_cache_size() -> usize {
    256
}
