use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{AtlasError, Result},
    naming::{AliasTable, NamePolicy},
    viewport::{ViewState, ZoomPolicy, ZoomStep},
};

/// Konfiguracja aplikacji (plik TOML, każda sekcja ma wartości domyślne)
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub names: NamesConfig,
    pub view: ViewConfig,
    pub style: StyleConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    /// Plik z granicami wszystkich stanów (opcjonalny)
    pub national_file: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("data"), national_file: None }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NamesConfig {
    pub candidates: Vec<String>,
    pub hints: Vec<String>,
    /// Skrót → pełna nazwa; kolejność wpisów zachowana
    pub aliases: Vec<(String, String)>,
}

impl Default for NamesConfig {
    fn default() -> Self {
        let policy = NamePolicy::default();
        Self {
            candidates: policy.candidates().to_vec(),
            hints: policy.hints().to_vec(),
            aliases: AliasTable::DEFAULT
                .iter()
                .map(|(a, c)| (a.to_string(), c.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ViewConfig {
    pub default_center: [f64; 2],
    pub default_zoom: f64,
    pub steps: Vec<ZoomStep>,
    pub wide_zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        let policy = ZoomPolicy::default();
        Self {
            default_center: policy.fallback.center,
            default_zoom: policy.fallback.zoom,
            steps: policy.steps,
            wide_zoom: policy.wide_zoom,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StyleConfig {
    pub base_opacity: f64,
    pub selection_opacity: f64,
    pub line_width: f64,
    pub base_color: [u8; 3],
    pub selection_color: [u8; 3],
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            base_opacity: 0.35,
            selection_opacity: 0.7,
            line_width: 1.0,
            // lightgray / royalblue
            base_color: [211, 211, 211],
            selection_color: [65, 105, 225],
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|source| AtlasError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&content)
            .map_err(|source| AtlasError::Config { path: path.to_path_buf(), source })
    }

    pub fn zoom_policy(&self) -> ZoomPolicy {
        ZoomPolicy::new(
            self.view.steps.clone(),
            self.view.wide_zoom,
            ViewState { center: self.view.default_center, zoom: self.view.default_zoom },
        )
    }

    pub fn name_policy(&self) -> NamePolicy {
        NamePolicy::new(self.names.candidates.clone(), self.names.hints.clone())
    }

    pub fn alias_table(&self) -> AliasTable {
        AliasTable::new(self.names.aliases.iter().map(|(a, c)| (a.as_str(), c.as_str())))
    }
}
