// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

/// Environment used when neither `PB_ENV` nor `APP_ENV` is set.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Variable holding the store URL when `REDIS_PROVIDER` is unset.
pub const DEFAULT_URL_VAR: &str = "REDIS_URL";

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Config environment name: PB_ENV > APP_ENV > development
pub fn environment() -> String {
    non_empty("PB_ENV")
        .or_else(|| non_empty("APP_ENV"))
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Store URL read from the variable named by `REDIS_PROVIDER`, else from
/// `REDIS_URL`.
pub fn store_url() -> Option<String> {
    let var = match non_empty("REDIS_PROVIDER") {
        Some(provider) => {
            if !is_var_name(&provider) {
                tracing::error!(
                    provider = %provider,
                    "REDIS_PROVIDER should be set to the name of the environment variable that contains the store URL"
                );
            }
            provider
        }
        None => DEFAULT_URL_VAR.to_string(),
    };
    non_empty(&var)
}

fn is_var_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphabetic() || c == '_')
}

/// Hostname for process identities: DYNO > OS hostname
pub fn hostname() -> String {
    non_empty("DYNO").unwrap_or_else(pb_engine::local_hostname)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
