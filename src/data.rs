use geojson::{FeatureCollection, GeoJson, JsonValue};
use std::{
    collections::{BTreeMap, HashMap},
    fmt, fs,
    path::{Path, PathBuf},
    rc::Rc,
};
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    error::{AtlasError, Result},
    geometry::FeatureSet,
    naming::{AliasTable, NamePolicy, find_name_attribute, resolve},
    viewport::BoundingBox,
};

/// Poziomy: kraj → stan (gminy)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeoLevel {
    National,
    State,
}

/// Plik z granicami jednego stanu w katalogu danych
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateEntry {
    pub label: String,
    pub path: PathBuf,
}

/// Stan układu współrzędnych po sprawdzeniu pliku
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CrsStatus {
    /// Plik deklaruje lon/lat (CRS84 / EPSG:4326)
    LonLat(String),
    /// Brak deklaracji, przyjmujemy lon/lat
    Assumed,
    /// Deklaracja nieobsługiwana, mimo to traktujemy jak lon/lat
    Forced(String),
}

impl fmt::Display for CrsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsStatus::LonLat(name) => write!(f, "{name}"),
            CrsStatus::Assumed => write!(f, "brak (EPSG:4326)"),
            CrsStatus::Forced(name) => write!(f, "{name} → EPSG:4326"),
        }
    }
}

/// Podsumowanie wczytanego pliku do panelu diagnostyki.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub file: PathBuf,
    pub crs: CrsStatus,
    pub rows: usize,
    pub columns: Vec<String>,
    pub geometry_counts: BTreeMap<&'static str, usize>,
    pub dropped: usize,
    pub bounds: Option<BoundingBox>,
    pub name_column: String,
}

/// Wczytany region: same wielokąty + kolumna z nazwą.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedRegion {
    pub features: FeatureSet,
    pub name_column: String,
    pub diagnostics: Diagnostics,
}

impl LoadedRegion {
    /// Posortowane nazwy regionów do listy wyboru
    pub fn labels(&self) -> Vec<String> {
        self.features.labels(&self.name_column)
    }

    pub fn select(&self, label: &str) -> FeatureSet {
        self.features.select(&self.name_column, label)
    }
}

/// Sprawdza deklarację `crs` (stary GeoJSON). Błąd oznacza układ inny niż lon/lat.
pub fn check_crs(fc: &FeatureCollection) -> Result<CrsStatus> {
    let Some(crs) = fc.foreign_members.as_ref().and_then(|m| m.get("crs")) else {
        return Ok(CrsStatus::Assumed);
    };
    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(JsonValue::as_str)
        .ok_or_else(|| AtlasError::UnsupportedCrs(crs.to_string()))?;

    let upper = name.to_uppercase();
    if upper.ends_with("CRS84") || upper.ends_with(":4326") {
        Ok(CrsStatus::LonLat(name.to_string()))
    } else {
        Err(AtlasError::UnsupportedCrs(name.to_string()))
    }
}

/// Wczytuje FeatureCollection, zostawia wielokąty i wykrywa kolumnę z nazwą.
pub fn load_region(path: &Path, names: &NamePolicy) -> Result<LoadedRegion> {
    let txt = fs::read_to_string(path).map_err(|source| AtlasError::Io { path: path.to_path_buf(), source })?;
    let raw: GeoJson = txt
        .parse()
        .map_err(|source| AtlasError::GeoJson { path: path.to_path_buf(), source: Box::new(source) })?;
    let GeoJson::FeatureCollection(fc) = raw else {
        return Err(AtlasError::NotFeatureCollection(path.to_path_buf()));
    };

    let crs = match check_crs(&fc) {
        Ok(status) => status,
        Err(err) => {
            warn!(file = ?path, %err, "treating coordinates as EPSG:4326");
            match err {
                AtlasError::UnsupportedCrs(name) => CrsStatus::Forced(name),
                other => CrsStatus::Forced(other.to_string()),
            }
        }
    };

    let mut features = FeatureSet::from_collection(fc);
    let geometry_counts = features.geometry_counts();
    let dropped = features.retain_areal();
    if dropped > 0 {
        debug!(file = ?path, dropped, "skipped non-polygon features");
    }

    let columns = features.attribute_keys();
    let name_column = detect_name_column(&features, &columns, names)?;

    let bounds = BoundingBox::of(&features);
    if bounds.is_some_and(|b| !b.is_lon_lat()) {
        warn!(file = ?path, ?bounds, "coordinates outside lon/lat range, reprojection is not supported");
    }

    info!(file = ?path, rows = features.len(), %name_column, "loaded region");
    let diagnostics = Diagnostics {
        file: path.to_path_buf(),
        crs,
        rows: features.len(),
        columns: columns.clone(),
        geometry_counts,
        dropped,
        bounds,
        name_column: name_column.clone(),
    };
    Ok(LoadedRegion { features, name_column, diagnostics })
}

/// Znana kolumna z nazwą, a w ostateczności pierwsza kolumna tekstowa.
fn detect_name_column(features: &FeatureSet, columns: &[String], names: &NamePolicy) -> Result<String> {
    if let Some(col) = find_name_attribute(columns, names) {
        return Ok(col.to_string());
    }
    let text_col = columns.iter().find(|c| features.is_text_column(c));
    match text_col {
        Some(col) => {
            warn!(column = %col, "no known name column, using first text column");
            Ok(col.clone())
        }
        None => Err(AtlasError::NoNameColumn { columns: columns.to_vec() }),
    }
}

/// Etykieta z nazwy pliku: `Ciudad_de_Mexico` → `Ciudad de Mexico`
pub fn label_from_stem(stem: &str) -> String {
    stem.replace(['_', '-'], " ")
}

/// Katalog danych: lista plików stanów i pamięć podręczna wczytanych plików.
pub struct DataCatalog {
    base: PathBuf,
    national_file: Option<PathBuf>,
    names: NamePolicy,
    aliases: AliasTable,
    loaded: HashMap<PathBuf, Rc<LoadedRegion>>,
}

impl DataCatalog {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base: config.data.dir.clone(),
            national_file: config.data.national_file.clone(),
            names: config.name_policy(),
            aliases: config.alias_table(),
            loaded: HashMap::new(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Pliki `.json` / `.geojson` w katalogu (bez pliku krajowego), posortowane po etykiecie.
    pub fn list_states(&self) -> Result<Vec<StateEntry>> {
        let dir = fs::read_dir(&self.base).map_err(|source| AtlasError::Io { path: self.base.clone(), source })?;
        let mut entries = Vec::new();
        for entry in dir {
            let path = entry.map_err(|source| AtlasError::Io { path: self.base.clone(), source })?.path();
            let is_geo = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json") || e.eq_ignore_ascii_case("geojson"));
            if !is_geo || self.is_national(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                entries.push(StateEntry { label: label_from_stem(stem), path });
            }
        }
        entries.sort_by(|a, b| a.label.cmp(&b.label));
        debug!(dir = ?self.base, count = entries.len(), "listed state files");
        Ok(entries)
    }

    fn is_national(&self, path: &Path) -> bool {
        match &self.national_file {
            Some(national) => path.file_name().is_some() && path.file_name() == national.file_name(),
            None => false,
        }
    }

    /// Pozycja stanu na liście dla etykiety użytkownika (aliasy, np. "cdmx")
    pub fn find_state(&self, states: &[StateEntry], label: &str) -> Result<usize> {
        let labels: Vec<&str> = states.iter().map(|s| s.label.as_str()).collect();
        let hit = resolve(label, &labels, &self.aliases).ok_or_else(|| AtlasError::UnknownLabel(label.to_string()))?;
        debug!(label, resolved = hit.label, "resolved state file");
        Ok(hit.index)
    }

    pub fn load(&mut self, path: &Path) -> Result<Rc<LoadedRegion>> {
        if let Some(region) = self.loaded.get(path) {
            return Ok(Rc::clone(region));
        }
        let region = Rc::new(load_region(path, &self.names)?);
        self.loaded.insert(path.to_path_buf(), Rc::clone(&region));
        Ok(region)
    }

    /// Mapa krajowa, jeśli skonfigurowana
    pub fn load_national(&mut self) -> Option<Result<Rc<LoadedRegion>>> {
        let path = self.national_file.clone()?;
        Some(self.load(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(name_key: &str, name: &str, ring: &str) -> String {
        format!(
            r#"{{"type":"Feature","properties":{{"CVEGEO":"01","{name_key}":"{name}"}},
               "geometry":{{"type":"Polygon","coordinates":[{ring}]}}}}"#
        )
    }

    fn collection(features: &[String], crs: Option<&str>) -> String {
        let crs = crs
            .map(|name| format!(r#","crs":{{"type":"name","properties":{{"name":"{name}"}}}}"#))
            .unwrap_or_default();
        format!(r#"{{"type":"FeatureCollection","features":[{}]{crs}}}"#, features.join(","))
    }

    const RING_A: &str = "[[-102.5,22.0],[-102.0,22.0],[-102.0,22.5],[-102.5,22.5],[-102.5,22.0]]";
    const RING_B: &str = "[[-102.0,22.0],[-101.5,22.0],[-101.5,22.5],[-102.0,22.0]]";

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let ags = collection(
            &[feature("NOMGEO", "Calvillo", RING_A), feature("NOMGEO", "Asientos", RING_B)],
            Some("urn:ogc:def:crs:OGC:1.3:CRS84"),
        );
        fs::write(dir.path().join("Aguascalientes.json"), ags).unwrap();
        let cdmx = collection(&[feature("NOMGEO", "Coyoacán", RING_A)], None);
        fs::write(dir.path().join("Ciudad_de_Mexico.geojson"), cdmx).unwrap();
        let national = collection(&[feature("NOM_ENT", "Aguascalientes", RING_A)], None);
        fs::write(dir.path().join("Mexico.json"), national).unwrap();
        fs::write(dir.path().join("README.txt"), "not data").unwrap();
        dir
    }

    fn catalog(dir: &Path) -> DataCatalog {
        let mut config = AppConfig::default();
        config.data.dir = dir.to_path_buf();
        config.data.national_file = Some(dir.join("Mexico.json"));
        DataCatalog::new(&config)
    }

    #[test]
    fn test_list_states_skips_national_and_other_files() {
        let dir = data_dir();
        let states = catalog(dir.path()).list_states().unwrap();
        let labels: Vec<&str> = states.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Aguascalientes", "Ciudad de Mexico"]);
    }

    #[test]
    fn test_find_state_through_alias() {
        let dir = data_dir();
        let catalog = catalog(dir.path());
        let states = catalog.list_states().unwrap();
        let index = catalog.find_state(&states, "CDMX").unwrap();
        assert_eq!(states[index].path, dir.path().join("Ciudad_de_Mexico.geojson"));
        assert!(matches!(catalog.find_state(&states, "Yucatán"), Err(AtlasError::UnknownLabel(_))));
        assert!(matches!(catalog.find_state(&[], "CDMX"), Err(AtlasError::UnknownLabel(_))));
    }

    #[test]
    fn test_load_region_and_cache() {
        let dir = data_dir();
        let mut catalog = catalog(dir.path());
        let path = dir.path().join("Aguascalientes.json");
        let region = catalog.load(&path).unwrap();
        assert_eq!(region.name_column, "NOMGEO");
        assert_eq!(region.labels(), vec!["Asientos", "Calvillo"]);
        assert_eq!(region.select("Calvillo").len(), 1);

        let diag = &region.diagnostics;
        assert_eq!(diag.rows, 2);
        assert_eq!(diag.columns, vec!["CVEGEO", "NOMGEO"]);
        assert_eq!(diag.crs, CrsStatus::LonLat("urn:ogc:def:crs:OGC:1.3:CRS84".into()));
        let bounds = diag.bounds.unwrap();
        assert_eq!((bounds.min_lon, bounds.max_lon), (-102.5, -101.5));

        let again = catalog.load(&path).unwrap();
        assert!(Rc::ptr_eq(&region, &again));
    }

    #[test]
    fn test_national_file_uses_state_column() {
        let dir = data_dir();
        let mut catalog = catalog(dir.path());
        let national = catalog.load_national().unwrap().unwrap();
        assert_eq!(national.name_column, "NOM_ENT");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let names = NamePolicy::default();

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_region(&missing, &names), Err(AtlasError::Io { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(load_region(&broken, &names), Err(AtlasError::GeoJson { .. })));

        let point = dir.path().join("point.json");
        fs::write(&point, r#"{"type":"Point","coordinates":[1,2]}"#).unwrap();
        assert!(matches!(load_region(&point, &names), Err(AtlasError::NotFeatureCollection(_))));

        let nameless = dir.path().join("nameless.json");
        let fc = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"AREA":1.5},
            "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}]}"#;
        fs::write(&nameless, fc).unwrap();
        assert!(matches!(load_region(&nameless, &names), Err(AtlasError::NoNameColumn { .. })));
    }

    #[test]
    fn test_text_column_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Colima.json");
        fs::write(&path, collection(&[feature("ETIQUETA", "Manzanillo", RING_A)], None)).unwrap();
        // CVEGEO to pierwsza kolumna tekstowa
        let region = load_region(&path, &NamePolicy::default()).unwrap();
        assert_eq!(region.name_column, "CVEGEO");
    }

    #[test]
    fn test_unsupported_crs_is_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Sonora.json");
        fs::write(&path, collection(&[feature("NOMGEO", "Hermosillo", RING_A)], Some("EPSG:6372"))).unwrap();
        let region = load_region(&path, &NamePolicy::default()).unwrap();
        assert!(matches!(region.diagnostics.crs, CrsStatus::Forced(_)));
    }

    #[test]
    fn test_check_crs() {
        let fc = |crs: Option<&str>| {
            let raw: GeoJson = collection(&[], crs).parse().unwrap();
            FeatureCollection::try_from(raw).unwrap()
        };
        assert_eq!(check_crs(&fc(None)).unwrap(), CrsStatus::Assumed);
        assert!(matches!(check_crs(&fc(Some("EPSG:4326"))), Ok(CrsStatus::LonLat(_))));
        assert!(matches!(check_crs(&fc(Some("urn:ogc:def:crs:EPSG::4326"))), Ok(CrsStatus::LonLat(_))));
        assert!(matches!(check_crs(&fc(Some("EPSG:32614"))), Err(AtlasError::UnsupportedCrs(_))));
    }

    #[test]
    fn test_label_from_stem() {
        assert_eq!(label_from_stem("Ciudad_de_Mexico"), "Ciudad de Mexico");
        assert_eq!(label_from_stem("baja-california-sur"), "baja california sur");
    }
}
