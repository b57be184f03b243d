// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./futureguide.toml` > `~/.config/futureguide/futureguide.toml`
//! > `/etc/futureguide/futureguide.toml`, with `FUTUREGUIDE_` environment
//! variables overriding all files.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FutureGuideConfig;

const SYSTEM_CONFIG: &str = "/etc/futureguide/futureguide.toml";
const LOCAL_CONFIG: &str = "futureguide.toml";

/// Top-level sections, used to map `FUTUREGUIDE_<SECTION>_<KEY>` to
/// `<section>.<key>`.
const SECTIONS: &[&str] = &[
    "logging", "gateway", "upstream", "mock", "realtime", "poller", "session", "client",
];

/// Load configuration from the standard lookup hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/futureguide/futureguide.toml`
/// 3. `~/.config/futureguide/futureguide.toml`
/// 4. `./futureguide.toml`
/// 5. `FUTUREGUIDE_*` environment variables
pub fn load_config() -> Result<FutureGuideConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<FutureGuideConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FutureGuideConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FutureGuideConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FutureGuideConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FutureGuideConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("futureguide").join("futureguide.toml"))
}

pub(crate) fn config_file_candidates() -> Vec<std::path::PathBuf> {
    let mut paths = vec![std::path::PathBuf::from(LOCAL_CONFIG)];
    if let Some(user) = user_config_path() {
        paths.push(user);
    }
    paths.push(std::path::PathBuf::from(SYSTEM_CONFIG));
    paths
}

/// Environment provider mapping the first `_` after a known section name to a
/// dot, so `FUTUREGUIDE_UPSTREAM_BASE_URL` becomes `upstream.base_url` and not
/// `upstream.base.url`.
fn env_provider() -> Env {
    Env::prefixed("FUTUREGUIDE_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
