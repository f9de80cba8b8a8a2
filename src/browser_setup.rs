//! Locating and launching Chrome for research sessions
//!
//! Chrome runs against a persistent profile so that logins prepared by hand
//! survive between runs, and without the switches that tell page scripts the
//! browser is automated. Search engines and social platforms block automated
//! sessions far more eagerly than ordinary ones.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::BrowserConfig;
use crate::utils::constants::CHROME_USER_AGENT;

/// Environment variable pointing at a Chrome/Chromium binary to use.
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

/// chromiumoxide's default switches without `--enable-automation`, which
/// shows the automation infobar and sets `navigator.webdriver`.
const BASE_ARGS: &[&str] = &[
    "--disable-background-networking",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--metrics-recording-only",
    "--no-first-run",
    "--no-default-browser-check",
    "--password-store=basic",
    "--use-mock-keychain",
];

/// Switches that keep Blink from advertising automation.
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--start-maximized",
    "--mute-audio",
];

const INSECURE_ARGS: &[&str] = &[
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process",
    "--ignore-certificate-errors",
];

const NO_SANDBOX_ARGS: &[&str] = &["--no-sandbox", "--disable-setuid-sandbox"];

/// Binary names searched on `PATH`.
const PATH_BINARIES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Well-known install locations for the current platform.
fn install_locations() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        let mut paths: Vec<PathBuf> = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            paths.push(PathBuf::from(local).join(r"Google\Chrome\Application\chrome.exe"));
        }
        paths
    } else if cfg!(target_os = "macos") {
        let mut paths: Vec<PathBuf> = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("Applications/Google Chrome.app/Contents/MacOS/Google Chrome"));
        }
        paths
    } else {
        [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
        .iter()
        .map(PathBuf::from)
        .collect()
    }
}

/// First match for one of [`PATH_BINARIES`] in the directories of `path_var`.
fn search_path(path_var: &std::ffi::OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var).find_map(|dir| {
        PATH_BINARIES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Find a local Chrome/Chromium: `CHROMIUM_PATH`, then the platform's install
/// locations, then `PATH`.
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CHROMIUM_PATH_ENV).map(PathBuf::from) {
        if path.is_file() {
            info!("Using browser from {}: {}", CHROMIUM_PATH_ENV, path.display());
            return Ok(path);
        }
        warn!("{} points to a missing file: {}", CHROMIUM_PATH_ENV, path.display());
    }

    if let Some(path) = install_locations().into_iter().find(|p| p.is_file()) {
        info!("Found browser at: {}", path.display());
        return Ok(path);
    }

    if let Some(path) = std::env::var_os("PATH").as_deref().and_then(search_path) {
        info!("Found browser on PATH: {}", path.display());
        return Ok(path);
    }

    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Download a managed Chromium into the user cache directory.
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kodegen/brand-research/chromium");
    info!("Downloading managed Chromium into {}", cache_dir.display());

    std::fs::create_dir_all(&cache_dir).context("Failed to create browser cache directory")?;

    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .context("Failed to build fetcher options")?;
    let revision = BrowserFetcher::new(options)
        .fetch()
        .await
        .context("Failed to fetch browser")?;

    info!("Downloaded Chromium to: {}", revision.folder_path.display());
    Ok(revision.executable_path)
}

/// Create the persistent profile directory if it does not exist yet.
///
/// The directory outlives every run: cookies and logins stored there are what
/// lets the agent browse platforms that require an account.
pub fn ensure_profile_dir(path: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(path).with_context(|| {
        format!("Failed to create browser profile directory {}", path.display())
    })?;
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    Ok(absolute)
}

/// Command-line switches for a research session.
pub fn launch_args(config: &BrowserConfig, in_container: bool) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGS
        .iter()
        .chain(STEALTH_ARGS)
        .map(|arg| arg.to_string())
        .collect();
    args.push(format!("--user-agent={}", CHROME_USER_AGENT));

    if config.disable_security {
        args.extend(INSECURE_ARGS.iter().map(|arg| arg.to_string()));
    }
    // setuid sandboxing does not work inside containers
    if in_container || config.disable_security {
        args.extend(NO_SANDBOX_ARGS.iter().map(|arg| arg.to_string()));
    }
    args
}

/// Launch Chrome against `config.profile_dir`, finding or downloading the
/// executable first.
pub async fn launch_browser(config: &BrowserConfig) -> Result<(Browser, JoinHandle<()>)> {
    let chrome_path = match find_browser_executable().await {
        Ok(path) => path,
        Err(e) => {
            warn!("{}; downloading a managed browser", e);
            download_managed_browser().await?
        }
    };
    let user_data_dir = ensure_profile_dir(&config.profile_dir)?;

    if config.disable_security {
        warn!("Browser security features disabled (disable_security=true)");
    }
    let in_container = running_in_container();
    if in_container {
        info!("Detected containerized environment, disabling sandbox");
    }

    let mut builder = BrowserConfigBuilder::default()
        .disable_default_args()
        .args(launch_args(config, in_container))
        .request_timeout(Duration::from_secs(30))
        .window_size(config.window.width, config.window.height)
        .viewport(None)
        .user_data_dir(user_data_dir)
        .chrome_executable(chrome_path);
    builder = if config.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let message = e.to_string();
                if is_unknown_cdp_message(&message) {
                    debug!("Ignoring unrecognised CDP message: {}", message);
                } else {
                    error!("Browser handler error: {:?}", e);
                }
            }
        }
        info!("Browser handler task completed");
    });

    Ok((browser, handler_task))
}

/// chromiumoxide reports CDP events it has no type for as errors; they are
/// harmless (mattsse/chromiumoxide#167, #229).
fn is_unknown_cdp_message(message: &str) -> bool {
    message.contains("data did not match any variant of untagged enum Message")
        || message.contains("Failed to deserialize WS response")
}

fn running_in_container() -> bool {
    Path::new("/.dockerenv").exists()
        || std::env::var_os("container").is_some()
        || std::env::var_os("KUBERNETES_SERVICE_HOST").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_never_announces_automation() {
        let args = launch_args(&BrowserConfig::default(), false);

        assert!(!args.iter().any(|a| a == "--enable-automation"));
        assert!(args.iter().any(|a| a == "--disable-blink-features=AutomationControlled"));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=")));
        assert!(!args.iter().any(|a| a == "--no-sandbox"));
        assert!(!args.iter().any(|a| a == "--disable-web-security"));
    }

    #[test]
    fn sandbox_and_security_switches_follow_config() {
        let insecure = BrowserConfig {
            disable_security: true,
            ..BrowserConfig::default()
        };
        let args = launch_args(&insecure, false);
        assert!(args.iter().any(|a| a == "--disable-web-security"));
        assert!(args.iter().any(|a| a == "--no-sandbox"));

        let contained = launch_args(&BrowserConfig::default(), true);
        assert!(contained.iter().any(|a| a == "--no-sandbox"));
        assert!(!contained.iter().any(|a| a == "--disable-web-security"));
    }

    #[test]
    fn path_search_finds_first_known_binary() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("chromium");
        std::fs::write(&binary, "").unwrap();

        let path_var = std::env::join_paths([Path::new("/nonexistent"), dir.path()]).unwrap();
        assert_eq!(search_path(&path_var), Some(binary));

        let empty = tempfile::tempdir().unwrap();
        assert_eq!(search_path(empty.path().as_os_str()), None);
    }

    #[test]
    fn unknown_cdp_messages_are_recognised() {
        assert!(is_unknown_cdp_message(
            "data did not match any variant of untagged enum Message"
        ));
        assert!(!is_unknown_cdp_message("Browser process exited"));
    }

    #[test]
    fn profile_dir_is_created_and_kept() {
        let root = tempfile::tempdir().unwrap();
        let profile = root.path().join("nexus_browser_data");
        let resolved = ensure_profile_dir(&profile).unwrap();
        assert!(resolved.is_absolute());
        assert!(profile.is_dir());
        // second call on an existing directory is fine
        ensure_profile_dir(&profile).unwrap();
    }
}
