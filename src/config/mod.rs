//! Configuration management for padmap
//!
//! Handles loading, validating, and hot-reloading of the YAML config file.

pub mod watcher;

use crate::dispatch::NoticeFilter;
use crate::engine::EngineSettings;
use crate::gesture::Rect;
use crate::resolver::ResolverSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Virtual desktop used to clamp the cursor instead of the host's bounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<Rect>,
    #[serde(default)]
    pub notices: NoticeConfig,
    /// Overrides the profiles directory next to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_dir: Option<PathBuf>,
    /// Flag numbers cycled by a bare `flag` binding
    #[serde(default = "default_flags")]
    pub flags: Vec<u8>,
}

/// Polling loop and gesture timing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_hold_threshold")]
    pub hold_threshold_ms: u64,
    /// Recognize 8BitDo controllers by name
    #[serde(default)]
    pub detect_8bitdo: bool,
    #[serde(default = "default_stick_hysteresis")]
    pub stick_hysteresis_deg: f32,
    /// Deflection where a button-mode stick starts pressing a direction
    #[serde(default = "default_stick_activation")]
    pub stick_activation: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            hold_threshold_ms: default_hold_threshold(),
            detect_8bitdo: false,
            stick_hysteresis_deg: default_stick_hysteresis(),
            stick_activation: default_stick_activation(),
        }
    }
}

/// Which notices reach the notification surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct NoticeConfig {
    #[serde(default = "default_true")]
    pub connection: bool,
    #[serde(default = "default_true")]
    pub errors: bool,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            connection: true,
            errors: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            desktop: None,
            notices: NoticeConfig::default(),
            profiles_dir: None,
            flags: default_flags(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a YAML document
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(contents).context("Failed to parse YAML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with validation
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Load the config, writing the defaults first if the file is missing
    pub async fn load_or_init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            return Self::load(path).await;
        }
        let config = Self::default();
        config.save(path).await?;
        info!("Wrote default config to {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        if !(1..=1000).contains(&engine.poll_interval_ms) {
            anyhow::bail!("engine.poll_interval_ms must be 1-1000, got {}", engine.poll_interval_ms);
        }
        if !(50..=10_000).contains(&engine.hold_threshold_ms) {
            anyhow::bail!("engine.hold_threshold_ms must be 50-10000, got {}", engine.hold_threshold_ms);
        }
        if !(engine.stick_activation > 0.0 && engine.stick_activation < 1.0) {
            anyhow::bail!("engine.stick_activation must be between 0 and 1, got {}", engine.stick_activation);
        }
        if !(0.0..=45.0).contains(&engine.stick_hysteresis_deg) {
            anyhow::bail!(
                "engine.stick_hysteresis_deg must be 0-45, got {}",
                engine.stick_hysteresis_deg
            );
        }

        if let Some(desktop) = &self.desktop {
            if desktop.width == 0 || desktop.height == 0 {
                anyhow::bail!("desktop must have a non-zero size");
            }
        }

        let mut seen = BTreeSet::new();
        for flag in &self.flags {
            if !(1..=7).contains(flag) {
                anyhow::bail!("flag {} is invalid (must be 1-7)", flag);
            }
            if !seen.insert(flag) {
                anyhow::bail!("flag {} listed twice", flag);
            }
        }

        Ok(())
    }

    /// Settings handed to the engine, at startup and on every reload
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            resolver: ResolverSettings {
                hold_threshold_ms: self.engine.hold_threshold_ms,
                stick_activation: self.engine.stick_activation,
                stick_hysteresis_deg: self.engine.stick_hysteresis_deg,
            },
            detect_8bitdo: self.engine.detect_8bitdo,
            desktop: self.desktop,
            notices: NoticeFilter {
                connection: self.notices.connection,
                errors: self.notices.errors,
            },
            flags: self.flags.clone(),
        }
    }
}

fn default_true() -> bool { true }
fn default_poll_interval() -> u64 { 16 }
fn default_hold_threshold() -> u64 { 500 }
fn default_stick_hysteresis() -> f32 { 10.0 }
fn default_stick_activation() -> f32 { 0.5 }
fn default_flags() -> Vec<u8> { (1..=7).collect() }
