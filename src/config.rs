// src/config.rs
//! Region configuration: region code -> instance domain list.
//!
//! Parsed exactly once at process start and passed by reference into the
//! request pipeline; never re-parsed per request.

use anyhow::{anyhow, Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ApiError;

pub const ENV_REGIONS: &str = "TIMELINE_REGIONS";
pub const ENV_REGIONS_PATH: &str = "TIMELINE_REGIONS_PATH";
const DEFAULT_TOML_PATH: &str = "config/regions.toml";
const DEFAULT_JSON_PATH: &str = "config/regions.json";

/// Immutable mapping from upper-cased region code to an ordered,
/// deduplicated list of instance domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionMap {
    regions: HashMap<String, Vec<String>>,
}

impl RegionMap {
    /// Load using env + fallbacks:
    /// 1) $TIMELINE_REGIONS (inline JSON object: {"DE": "a.example,b.example"})
    /// 2) $TIMELINE_REGIONS_PATH (TOML or JSON file)
    /// 3) config/regions.toml
    /// 4) config/regions.json
    pub fn load_default() -> Result<Self> {
        if let Ok(raw) = std::env::var(ENV_REGIONS) {
            return Self::from_json_str(&raw).context("parsing TIMELINE_REGIONS");
        }
        if let Ok(p) = std::env::var(ENV_REGIONS_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("TIMELINE_REGIONS_PATH points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from(DEFAULT_JSON_PATH);
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Err(anyhow!("no region configuration found"))
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading regions from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if ext == "toml" {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Flat JSON object: {"DE": "a.example, b.example", ...}
    pub fn from_json_str(s: &str) -> Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(s)?;
        Ok(Self::from_raw(raw))
    }

    /// TOML with a [regions] table of code -> comma-separated list.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        #[derive(serde::Deserialize)]
        struct TomlRegions {
            regions: HashMap<String, String>,
        }
        let v: TomlRegions = toml::from_str(s)?;
        Ok(Self::from_raw(v.regions))
    }

    fn from_raw(raw: HashMap<String, String>) -> Self {
        let regions = raw
            .into_iter()
            .map(|(code, list)| (code.trim().to_ascii_uppercase(), split_domains(&list)))
            .collect();
        Self { regions }
    }

    /// Resolve a region code (case-insensitive) to its instance domains.
    pub fn resolve(&self, code: &str) -> Result<&[String], ApiError> {
        let code = code.trim().to_ascii_uppercase();
        let domains = self
            .regions
            .get(&code)
            .ok_or_else(|| ApiError::UnknownRegion(code.clone()))?;
        if domains.is_empty() {
            return Err(ApiError::EmptyInstanceList(code));
        }
        Ok(domains)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }
}

/// Comma-split, trim, drop empties, dedup preserving first occurrence.
fn split_domains(list: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for part in list.split(',') {
        let d = part.trim();
        if d.is_empty() {
            continue;
        }
        if seen.insert(d.to_string()) {
            out.push(d.to_string());
        }
    }
    out
}
