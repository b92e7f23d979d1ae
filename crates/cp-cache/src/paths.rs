//! Default cache directory discovery.
//!
//! Enumerates the cache locations of Discord clients and Chromium browsers
//! per platform, including multi-profile browser installs ("Default",
//! "Profile 1", ...) and both the `Cache/Cache_Data` and bare `Cache/`
//! layouts.

use std::path::{Path, PathBuf};

const DISCORD_CLIENTS: &[&str] = &[
    "discord",
    "discordptb",
    "discordcanary",
    "discorddevelopment",
];

/// Candidate cache directories for the current OS, most likely first.
///
/// Paths are returned whether or not they exist; callers pair this with
/// [`crate::listing::validate_cache_path`] to show availability.
pub fn default_cache_paths() -> Vec<String> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            for client in DISCORD_CLIENTS {
                let p = PathBuf::from(&appdata)
                    .join(client)
                    .join("Cache")
                    .join("Cache_Data");
                paths.push(p.to_string_lossy().to_string());
            }
        }
        if let Ok(localappdata) = std::env::var("LOCALAPPDATA") {
            for browser in ["Google/Chrome", "BraveSoftware/Brave-Browser", "Microsoft/Edge"] {
                let user_data = PathBuf::from(&localappdata).join(browser).join("User Data");
                collect_chromium_profiles(&user_data, &mut paths);
            }
            // Opera keeps its cache directly under the app folder.
            let opera = PathBuf::from(&localappdata)
                .join("Opera Software/Opera Stable")
                .join("Cache")
                .join("Cache_Data");
            paths.push(opera.to_string_lossy().to_string());
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            let app_support = PathBuf::from(&home).join("Library/Application Support");
            let lib_caches = PathBuf::from(&home).join("Library/Caches");
            for client in DISCORD_CLIENTS {
                let p = app_support.join(client).join("Cache/Cache_Data");
                paths.push(p.to_string_lossy().to_string());
            }
            for browser in [
                "Google/Chrome",
                "BraveSoftware/Brave-Browser",
                "Microsoft Edge",
            ] {
                collect_chromium_profiles(&app_support.join(browser), &mut paths);
                collect_chromium_profiles(&lib_caches.join(browser), &mut paths);
            }
            collect_chromium_profiles(&app_support.join("com.operasoftware.Opera"), &mut paths);
            collect_chromium_profiles(&lib_caches.join("com.operasoftware.Opera"), &mut paths);
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(home) = std::env::var("HOME") {
            let config_dir = PathBuf::from(&home).join(".config");
            let cache_dir = PathBuf::from(&home).join(".cache");
            for client in DISCORD_CLIENTS {
                let p = config_dir.join(client).join("Cache/Cache_Data");
                paths.push(p.to_string_lossy().to_string());
            }
            // Chromium browsers keep profile data in ~/.config but cache in ~/.cache.
            for browser in ["google-chrome", "BraveSoftware/Brave-Browser", "microsoft-edge"] {
                collect_chromium_profiles(&config_dir.join(browser), &mut paths);
                collect_chromium_profiles(&cache_dir.join(browser), &mut paths);
            }
            collect_chromium_profiles(&config_dir.join("opera"), &mut paths);
            collect_chromium_profiles(&cache_dir.join("opera"), &mut paths);
        }
    }

    paths
}

/// Resolve the cache directory for a profile folder: `Cache/Cache_Data`
/// first, then bare `Cache/`, defaulting to the former when neither exists.
fn resolve_cache_dir(profile_dir: &Path) -> PathBuf {
    let cache_data = profile_dir.join("Cache").join("Cache_Data");
    if cache_data.is_dir() {
        return cache_data;
    }
    let cache_only = profile_dir.join("Cache");
    if cache_only.is_dir() {
        return cache_only;
    }
    cache_data
}

/// Collect cache folders for every profile of a Chromium browser directory
/// ("Default", "Profile 1", "Profile 2", ...).
fn collect_chromium_profiles(browser_dir: &Path, paths: &mut Vec<String>) {
    if !browser_dir.is_dir() {
        // Still surface the Default path so it shows as "not found" rather
        // than silently missing from the list.
        let default_cache = browser_dir.join("Default").join("Cache").join("Cache_Data");
        paths.push(default_cache.to_string_lossy().to_string());
        return;
    }

    let default_cache = resolve_cache_dir(&browser_dir.join("Default"));
    paths.push(default_cache.to_string_lossy().to_string());

    if let Ok(entries) = std::fs::read_dir(browser_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("Profile ") && entry.path().is_dir() {
                let profile_cache = resolve_cache_dir(&entry.path());
                if profile_cache.is_dir() {
                    paths.push(profile_cache.to_string_lossy().to_string());
                }
            }
        }
    }
}

/// Human-readable client name for a cache path, with profile label when the
/// path runs through a non-default browser profile.
pub fn client_name(path: &str) -> String {
    let lower = path.to_lowercase();
    let profile = profile_label(path);

    let base = if lower.contains("discorddevelopment") {
        "Discord Development"
    } else if lower.contains("discordcanary") {
        "Discord Canary"
    } else if lower.contains("discordptb") {
        "Discord PTB"
    } else if lower.contains("discord") {
        "Discord"
    } else if lower.contains("brave") {
        "Brave"
    } else if lower.contains("chrome") {
        "Chrome"
    } else if lower.contains("edge") {
        "Edge"
    } else if lower.contains("opera") {
        "Opera"
    } else {
        "Custom"
    };

    match profile {
        Some(p) => format!("{base} ({p})"),
        None => base.to_string(),
    }
}

/// Extract a "Profile N" segment from a cache path. "Default" is implied and
/// yields `None`.
fn profile_label(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    normalized
        .split('/')
        .find(|part| part.starts_with("Profile "))
        .map(|part| part.to_string())
}
