// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from `Siteforge.toml`.
///
/// ```toml
/// [paths]
/// source = "app"
/// dist = "dist"
///
/// [server]
/// dev_port = 3000
/// dist_port = 3001
///
/// [styles]
/// entries = ["home", "login"]
///
/// [images]
/// cache = true
/// png_level = 5
///
/// [watch]
/// defer_until_built = true
/// ```
///
/// All sections are optional; the defaults reproduce the conventional site
/// layout, so a project with the standard `app/` → `dist/` structure needs
/// no config file at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Source and destination roots from `[paths]`.
    #[serde(default)]
    pub paths: PathsSection,

    /// Static-server ports from `[server]`.
    #[serde(default)]
    pub server: ServerSection,

    /// Stylesheet entry points from `[styles]`.
    #[serde(default)]
    pub styles: StylesSection,

    /// Image transform settings from `[images]`.
    #[serde(default)]
    pub images: ImagesSection,

    /// Watch-session behaviour from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,
}

/// `[paths]` section.
///
/// `source` holds `js/`, `images/`, `images/posts/`, `scripts/`, `styles/`
/// and arbitrary `*.html`; `dist` mirrors `images/`, `styles/`, `scripts/`
/// and root-level HTML.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default = "default_dist")]
    pub dist: String,
}

fn default_source() -> String {
    "app".to_string()
}

fn default_dist() -> String {
    "dist".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            dist: default_dist(),
        }
    }
}

/// `[server]` section.
///
/// Two ports so a live-development server and a dist-verification server can
/// run at the same time.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_dev_port")]
    pub dev_port: u16,

    #[serde(default = "default_dist_port")]
    pub dist_port: u16,
}

fn default_dev_port() -> u16 {
    3000
}

fn default_dist_port() -> u16 {
    3001
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            dev_port: default_dev_port(),
            dist_port: default_dist_port(),
        }
    }
}

/// `[styles]` section.
///
/// Each entry `name` compiles `<source>/styles/<name>.scss` to
/// `<dist>/styles/<name>.css`. Partials pulled in via `@import` are not
/// listed here.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    #[serde(default = "default_style_entries")]
    pub entries: Vec<String>,
}

fn default_style_entries() -> Vec<String> {
    [
        "home",
        "login",
        "signup",
        "dashboard",
        "facebook",
        "twitter",
        "instagram",
        "contact",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            entries: default_style_entries(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    /// Content cache: skip inputs whose bytes have not changed since the
    /// last run and whose output still exists.
    #[serde(default = "default_cache")]
    pub cache: bool,

    /// oxipng preset, 0..=6.
    #[serde(default = "default_png_level")]
    pub png_level: u8,

    /// JPEG re-encode quality, 1..=100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Quality for the lossy `webp` conversion task, 0.0..=100.0.
    #[serde(default = "default_webp_quality")]
    pub webp_quality: f32,
}

fn default_cache() -> bool {
    true
}

fn default_png_level() -> u8 {
    5
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_webp_quality() -> f32 {
    50.0
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            cache: default_cache(),
            png_level: default_png_level(),
            jpeg_quality: default_jpeg_quality(),
            webp_quality: default_webp_quality(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// If true, watch bindings activate only after the initial `dev` build
    /// sequence has completed. If false, they are registered immediately at
    /// session startup, so changes landing mid-build already dispatch.
    #[serde(default = "default_defer_until_built")]
    pub defer_until_built: bool,

    /// Maximum number of coalesced dispatch batches to remember while a run
    /// is active.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_defer_until_built() -> bool {
    true
}

fn default_queue_length() -> usize {
    1
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            defer_until_built: default_defer_until_built(),
            queue_length: default_queue_length(),
        }
    }
}
