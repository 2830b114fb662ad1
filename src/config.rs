use crate::game::players::{MAX_PLAYERS, PlayerId};
use log::{LevelFilter, info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

const CONFIG_PATH: &str = "multidisplay.ini";

// --- Minimal INI reader ---
#[derive(Debug, Default)]
pub struct SimpleIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SimpleIni {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        self.parse(&content);
        Ok(())
    }

    pub fn parse(&mut self, content: &str) {
        self.sections.clear();

        let mut current_section: Option<String> = None;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            // Section header: [SectionName]
            if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
                let section = line[1..line.len() - 1].trim().to_string();
                current_section = Some(section.clone());
                self.sections.entry(section).or_default();
                continue;
            }

            // Key/value pair: key=value
            if let Some(eq_idx) = line.find('=') {
                let (key_raw, value_raw) = line.split_at(eq_idx);
                let key = key_raw.trim();
                if key.is_empty() {
                    continue;
                }
                let value = value_raw[1..].trim().to_string();
                let section = current_section.clone().unwrap_or_default();
                self.sections
                    .entry(section)
                    .or_default()
                    .insert(key.to_string(), value);
            }
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section).and_then(|s| s.get(key)).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenType {
    Exclusive,
    Borderless,
}

impl FullscreenType {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Exclusive => "Exclusive",
            Self::Borderless => "Borderless",
        }
    }
}

impl FromStr for FullscreenType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclusive" => Ok(Self::Exclusive),
            "borderless" => Ok(Self::Borderless),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    /// Development mode: pretend two displays exist and never drive real
    /// secondary outputs.
    pub dev_mode: bool,
    /// How secondary output windows go fullscreen.
    pub fullscreen_type: FullscreenType,
    pub window_width: u32,
    pub window_height: u32,
    /// Saved display per player, indexed by `PlayerId::slot()`.
    pub player_displays: [usize; MAX_PLAYERS],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            dev_mode: cfg!(debug_assertions),
            fullscreen_type: FullscreenType::Borderless,
            window_width: 1280,
            window_height: 720,
            player_displays: [1; MAX_PLAYERS],
        }
    }
}

impl Config {
    pub const fn display_for(&self, id: PlayerId) -> usize {
        self.player_displays[id.slot()]
    }
}

// Global, mutable configuration instance.
static CONFIG: std::sync::LazyLock<Mutex<Config>> =
    std::sync::LazyLock::new(|| Mutex::new(Config::default()));

#[inline(always)]
fn lock() -> MutexGuard<'static, Config> {
    CONFIG.lock().unwrap_or_else(PoisonError::into_inner)
}

#[inline(always)]
const fn bool_str(v: bool) -> &'static str {
    if v { "1" } else { "0" }
}

fn parse_bool(v: &str) -> Option<bool> {
    let v = v.trim();
    if v.is_empty() {
        None
    } else if v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
    {
        Some(true)
    } else if v.eq_ignore_ascii_case("false")
        || v.eq_ignore_ascii_case("no")
        || v.eq_ignore_ascii_case("off")
    {
        Some(false)
    } else {
        v.parse::<u8>().ok().map(|n| n != 0)
    }
}

// --- File I/O ---

/// Build a config from parsed INI, using defaults for missing or malformed keys.
fn config_from_ini(conf: &SimpleIni) -> Config {
    let default = Config::default();
    let mut cfg = default;

    cfg.log_level = conf
        .get("Options", "LogLevel")
        .and_then(|v| LogLevel::from_str(&v).ok())
        .unwrap_or(default.log_level);
    cfg.dev_mode = conf
        .get("Options", "DevMode")
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default.dev_mode);
    cfg.fullscreen_type = conf
        .get("Options", "FullscreenType")
        .and_then(|v| FullscreenType::from_str(&v).ok())
        .unwrap_or(default.fullscreen_type);
    cfg.window_width = conf
        .get("Options", "WindowWidth")
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|w| *w > 0)
        .unwrap_or(default.window_width);
    cfg.window_height = conf
        .get("Options", "WindowHeight")
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|h| *h > 0)
        .unwrap_or(default.window_height);

    // Out-of-range displays are kept as-is; routing ignores them at runtime.
    for id in PlayerId::all() {
        cfg.player_displays[id.slot()] = conf
            .get("Players", &format!("P{}Display", id.number()))
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|d| *d >= 1)
            .unwrap_or(default.player_displays[id.slot()]);
    }

    cfg
}

fn render_ini(cfg: &Config) -> String {
    let mut content = String::new();

    // [Options] section - keys in alphabetical order
    content.push_str("[Options]\n");
    content.push_str(&format!("DevMode={}\n", bool_str(cfg.dev_mode)));
    content.push_str(&format!("FullscreenType={}\n", cfg.fullscreen_type.as_str()));
    content.push_str(&format!("LogLevel={}\n", cfg.log_level.as_str()));
    content.push_str(&format!("WindowHeight={}\n", cfg.window_height));
    content.push_str(&format!("WindowWidth={}\n", cfg.window_width));
    content.push('\n');

    content.push_str("[Players]\n");
    for id in PlayerId::all() {
        content.push_str(&format!(
            "P{}Display={}\n",
            id.number(),
            cfg.display_for(id)
        ));
    }
    content.push('\n');

    content
}

fn create_default_config_file() -> Result<(), std::io::Error> {
    info!("'{CONFIG_PATH}' not found, creating with default values.");
    std::fs::write(CONFIG_PATH, render_ini(&Config::default()))
}

pub fn load() {
    if !Path::new(CONFIG_PATH).exists()
        && let Err(e) = create_default_config_file()
    {
        warn!("Failed to create default config file: {e}");
    }

    let mut conf = SimpleIni::new();
    match conf.load(CONFIG_PATH) {
        Ok(()) => {
            let cfg = config_from_ini(&conf);
            *lock() = cfg;
            info!("Configuration loaded from '{CONFIG_PATH}'.");
        }
        Err(e) => {
            warn!("Failed to load '{CONFIG_PATH}': {e}. Using default values.");
        }
    }
}

fn save() {
    let content = render_ini(&lock());
    if let Err(e) = std::fs::write(CONFIG_PATH, content) {
        warn!("Failed to save config file: {e}");
    }
}

pub fn get() -> Config {
    *lock()
}

pub fn update_player_display(id: PlayerId, display_number: usize) {
    {
        let mut cfg = lock();
        if cfg.player_displays[id.slot()] == display_number {
            return;
        }
        cfg.player_displays[id.slot()] = display_number;
    }
    save();
}

#[cfg(test)]
mod tests {
    use super::{Config, FullscreenType, LogLevel, SimpleIni, config_from_ini, parse_bool, render_ini};
    use crate::game::players::PlayerId;
    use log::LevelFilter;

    fn parsed(text: &str) -> Config {
        let mut ini = SimpleIni::new();
        ini.parse(text);
        config_from_ini(&ini)
    }

    #[test]
    fn ini_reader_handles_sections_comments_and_spacing() {
        let mut ini = SimpleIni::new();
        ini.parse("; comment\nRoot=1\n[Options]\n  LogLevel = Debug \n# other\n=skipped\n");
        assert_eq!(ini.get("", "Root").as_deref(), Some("1"));
        assert_eq!(ini.get("Options", "LogLevel").as_deref(), Some("Debug"));
        assert_eq!(ini.get("Options", ""), None);
    }

    #[test]
    fn missing_and_malformed_keys_fall_back_to_defaults() {
        let cfg = parsed("[Options]\nLogLevel=loud\nWindowWidth=0\nFullscreenType=weird\n");
        let default = Config::default();
        assert_eq!(cfg.log_level, default.log_level);
        assert_eq!(cfg.window_width, default.window_width);
        assert_eq!(cfg.fullscreen_type, default.fullscreen_type);
    }

    #[test]
    fn options_and_player_displays_are_read() {
        let cfg = parsed(
            "[Options]\nLogLevel=trace\nDevMode=off\nFullscreenType=Exclusive\n\
             [Players]\nP1Display=1\nP2Display=3\nP3Display=0\n",
        );
        assert_eq!(cfg.log_level, LogLevel::Trace);
        assert!(!cfg.dev_mode);
        assert_eq!(cfg.fullscreen_type, FullscreenType::Exclusive);
        assert_eq!(cfg.display_for(PlayerId::P2), 3);
        let p3 = PlayerId::new(3).expect("P3");
        assert_eq!(cfg.display_for(p3), 1, "display 0 is invalid and defaults");
    }

    #[test]
    fn rendered_ini_reads_back() {
        let mut cfg = Config::default();
        cfg.player_displays[1] = 2;
        cfg.log_level = LogLevel::Info;
        cfg.dev_mode = true;
        assert_eq!(parsed(&render_ini(&cfg)), cfg);
    }

    #[test]
    fn bool_and_level_parsing() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(LogLevel::Warn.as_level_filter(), LevelFilter::Warn);
    }
}
