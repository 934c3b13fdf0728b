/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD or
/// `~/.local/share/eepers`. Falls back to defaults if the file is missing
/// or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub rules: Rules,
    pub worlds: Vec<WorldDef>,
    pub levels_dir: PathBuf,
    pub seed: u64,
    pub frame_ms: u64,
}

/// Gameplay tuning. Turn-clock values are in turns, frame-clock values in
/// frames, session timers in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Rules {
    pub bomb_countdown: u32,
    pub explosion_damage: f32,
    pub explosion_lifetime: u32,   // frames
    pub explosion_range: i32,
    pub guard_attack_cooldown: i32,
    pub eeper_heal_rate: f32,
    pub bomb_refill_cooldown: u32,
    pub guard_step_limit: i32,
    pub guard_step_stride: i32,
    pub gnome_step_limit: i32,
    pub father_wake_radius: i32,
    pub portal_open_distance_sq: i32,
    pub portal_open_speed: f32,    // per frame
    pub portal_close_speed: f32,   // per frame
    pub portal_enter_progress: f32,
    pub portal_entry_seconds: f64,
    pub death_restore_seconds: f64,
    pub victory_seconds: f64,
}

impl Default for Rules {
    fn default() -> Self {
        TomlRules::default().into()
    }
}

/// One world: a hub and the levels its portals lead to (portal 1 → levels[0]).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WorldDef {
    pub name: String,
    pub hub: String,
    #[serde(default)]
    pub levels: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    worlds: Vec<WorldDef>,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_bomb_countdown")]
    bomb_countdown: u32,
    #[serde(default = "default_explosion_damage")]
    explosion_damage: f32,
    #[serde(default = "default_explosion_lifetime")]
    explosion_lifetime: u32,
    #[serde(default = "default_explosion_range")]
    explosion_range: i32,
    #[serde(default = "default_guard_attack_cooldown")]
    guard_attack_cooldown: i32,
    #[serde(default = "default_eeper_heal_rate")]
    eeper_heal_rate: f32,
    #[serde(default = "default_bomb_refill_cooldown")]
    bomb_refill_cooldown: u32,
    #[serde(default = "default_guard_step_limit")]
    guard_step_limit: i32,
    #[serde(default = "default_guard_step_stride")]
    guard_step_stride: i32,
    #[serde(default = "default_gnome_step_limit")]
    gnome_step_limit: i32,
    #[serde(default = "default_father_wake_radius")]
    father_wake_radius: i32,
    #[serde(default = "default_portal_open_distance_sq")]
    portal_open_distance_sq: i32,
    #[serde(default = "default_portal_speed")]
    portal_open_speed: f32,
    #[serde(default = "default_portal_speed")]
    portal_close_speed: f32,
    #[serde(default = "default_portal_enter_progress")]
    portal_enter_progress: f32,
    #[serde(default = "default_portal_entry_seconds")]
    portal_entry_seconds: f64,
    #[serde(default = "default_death_restore_seconds")]
    death_restore_seconds: f64,
    #[serde(default = "default_victory_seconds")]
    victory_seconds: f64,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

// ── Defaults ──

fn default_bomb_countdown() -> u32 { 3 }
fn default_explosion_damage() -> f32 { 0.45 }
fn default_explosion_lifetime() -> u32 { 20 }
fn default_explosion_range() -> i32 { 4 }
fn default_guard_attack_cooldown() -> i32 { 10 }
fn default_eeper_heal_rate() -> f32 { 0.01 }
fn default_bomb_refill_cooldown() -> u32 { 10 }
fn default_guard_step_limit() -> i32 { 4 }
fn default_guard_step_stride() -> i32 { 100 } // lunges run until blocked
fn default_gnome_step_limit() -> i32 { 4 }
fn default_father_wake_radius() -> i32 { 3 }
fn default_portal_open_distance_sq() -> i32 { 9 } // 3 cells
fn default_portal_speed() -> f32 { 0.15 }
fn default_portal_enter_progress() -> f32 { 0.8 }
fn default_portal_entry_seconds() -> f64 { 0.8 }
fn default_death_restore_seconds() -> f64 { 2.0 }
fn default_victory_seconds() -> f64 { 11.0 }

fn default_levels_dir() -> String { "levels".into() }
fn default_seed() -> u64 { 0x00EE_9E25 }
fn default_frame_ms() -> u64 { 16 }

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            bomb_countdown: default_bomb_countdown(),
            explosion_damage: default_explosion_damage(),
            explosion_lifetime: default_explosion_lifetime(),
            explosion_range: default_explosion_range(),
            guard_attack_cooldown: default_guard_attack_cooldown(),
            eeper_heal_rate: default_eeper_heal_rate(),
            bomb_refill_cooldown: default_bomb_refill_cooldown(),
            guard_step_limit: default_guard_step_limit(),
            guard_step_stride: default_guard_step_stride(),
            gnome_step_limit: default_gnome_step_limit(),
            father_wake_radius: default_father_wake_radius(),
            portal_open_distance_sq: default_portal_open_distance_sq(),
            portal_open_speed: default_portal_speed(),
            portal_close_speed: default_portal_speed(),
            portal_enter_progress: default_portal_enter_progress(),
            portal_entry_seconds: default_portal_entry_seconds(),
            death_restore_seconds: default_death_restore_seconds(),
            victory_seconds: default_victory_seconds(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            seed: default_seed(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl From<TomlRules> for Rules {
    fn from(t: TomlRules) -> Self {
        Rules {
            bomb_countdown: t.bomb_countdown.max(1),
            explosion_damage: t.explosion_damage,
            explosion_lifetime: t.explosion_lifetime,
            explosion_range: t.explosion_range,
            guard_attack_cooldown: t.guard_attack_cooldown,
            eeper_heal_rate: t.eeper_heal_rate,
            bomb_refill_cooldown: t.bomb_refill_cooldown,
            guard_step_limit: t.guard_step_limit,
            guard_step_stride: t.guard_step_stride.max(1),
            gnome_step_limit: t.gnome_step_limit,
            father_wake_radius: t.father_wake_radius,
            portal_open_distance_sq: t.portal_open_distance_sq,
            portal_open_speed: t.portal_open_speed,
            portal_close_speed: t.portal_close_speed,
            portal_enter_progress: t.portal_enter_progress,
            portal_entry_seconds: t.portal_entry_seconds,
            death_restore_seconds: t.death_restore_seconds,
            victory_seconds: t.victory_seconds,
        }
    }
}

/// The built-in world served by `EmbeddedLevels` when no config names one.
pub fn default_worlds() -> Vec<WorldDef> {
    vec![WorldDef {
        name: "The Burrow".into(),
        hub: "hub".into(),
        levels: vec!["level-1".into(), "level-2".into()],
    }]
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory, (3) XDG data.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        Self::from_parts(toml_cfg, levels_dir)
    }

    /// Parse config text directly. Parse errors fall back to defaults.
    pub fn from_toml_str(text: &str) -> Self {
        let cfg = parse_toml(text, "<inline>");
        let levels_dir = PathBuf::from(&cfg.general.levels_dir);
        Self::from_parts(cfg, levels_dir)
    }

    fn from_parts(cfg: TomlConfig, levels_dir: PathBuf) -> Self {
        let worlds = if cfg.worlds.is_empty() { default_worlds() } else { cfg.worlds };
        GameConfig {
            rules: cfg.rules.into(),
            worlds,
            levels_dir,
            seed: cfg.general.seed,
            frame_ms: cfg.general.frame_ms.max(1),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_parts(TomlConfig::default(), PathBuf::from(default_levels_dir()))
    }
}

/// Where the binary writes its log. The terminal belongs to the game view,
/// so logs never go to stdout or stderr while playing.
pub fn log_file_path() -> PathBuf {
    log_path_for(std::env::var_os("HOME").map(PathBuf::from))
}

fn log_path_for(home: Option<PathBuf>) -> PathBuf {
    home.map(|h| h.join(".local/share/eepers"))
        .unwrap_or_else(std::env::temp_dir)
        .join("eepers.log")
}

/// Candidate directories to search: exe dir + CWD + XDG data (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/eepers)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/eepers");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                info!(path = %path.display(), "config_loaded");
                return parse_toml(&text, &path.display().to_string());
            }
            Err(e) => warn!(path = %path.display(), error = %e, "config_unreadable"),
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, origin: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(origin, error = %e, "config parse error, using default settings");
            TomlConfig::default()
        }
    }
}
