use std::path::PathBuf;
use thiserror::Error;

/// Błędy ładowania danych i konfiguracji.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON in {path:?}: {source}")]
    GeoJson {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },

    #[error("invalid config {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0:?} is not a FeatureCollection")]
    NotFeatureCollection(PathBuf),

    #[error("unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    #[error("no name column among {columns:?}")]
    NoNameColumn { columns: Vec<String> },

    #[error("no region matches {0:?}")]
    UnknownLabel(String),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
