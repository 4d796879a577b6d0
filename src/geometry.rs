//! Obiekty geograficzne: zamknięty zbiór typów geometrii + atrybuty.

use geo::{Coord, MultiPolygon, Polygon};
use geojson::{FeatureCollection, JsonObject, JsonValue};
use std::collections::BTreeMap;

/// Geometria obiektu. Rysujemy i mierzymy tylko wielokąty,
/// pozostałe typy zostają jako `Other` z nazwą typu.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    Other(&'static str),
}

impl Geometry {
    /// Konwersja z GeoJSON; błędna geometria wielokąta daje `Other`.
    pub fn from_geojson(value: geojson::Value) -> Self {
        let kind = kind_of(&value);
        match geo::Geometry::<f64>::try_from(value) {
            Ok(geo::Geometry::Polygon(p)) => Geometry::Polygon(p),
            Ok(geo::Geometry::MultiPolygon(m)) => Geometry::MultiPolygon(m),
            Ok(_) | Err(_) => Geometry::Other(kind),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::Other(kind) => *kind,
        }
    }

    pub fn is_areal(&self) -> bool {
        !matches!(self, Geometry::Other(_))
    }

    /// Wielokąty składowe (pusty wycinek dla `Other`)
    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            Geometry::Polygon(p) => std::slice::from_ref(p),
            Geometry::MultiPolygon(m) => &m.0,
            Geometry::Other(_) => &[],
        }
    }

    /// Wszystkie pary współrzędnych: pierścienie zewnętrzne i wewnętrzne.
    pub fn coords(&self) -> impl Iterator<Item = &Coord<f64>> + '_ {
        self.polygons().iter().flat_map(|poly| {
            poly.exterior()
                .0
                .iter()
                .chain(poly.interiors().iter().flat_map(|ring| ring.0.iter()))
        })
    }
}

fn kind_of(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: JsonObject,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: JsonObject) -> Self {
        Self { geometry, properties }
    }

    /// Wartość atrybutu jako tekst (liczby też, jak `astype(str)`)
    pub fn attr_text(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Uporządkowany zbiór obiektów w jednym układzie (lon/lat).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Obiekty bez geometrii są pomijane.
    pub fn from_collection(fc: FeatureCollection) -> Self {
        let features = fc
            .features
            .into_iter()
            .filter_map(|f| {
                let geometry = Geometry::from_geojson(f.geometry?.value);
                Some(Feature::new(geometry, f.properties.unwrap_or_default()))
            })
            .collect();
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Zostawia tylko wielokąty.
    pub fn retain_areal(&mut self) -> usize {
        let before = self.features.len();
        self.features.retain(|f| f.geometry.is_areal());
        before - self.features.len()
    }

    /// Nazwy atrybutów w kolejności pierwszego wystąpienia.
    pub fn attribute_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for feature in &self.features {
            for key in feature.properties.keys() {
                if !keys.iter().any(|k| k == key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Czy kolumna zawiera wyłącznie teksty (puste pomijamy)
    pub fn is_text_column(&self, key: &str) -> bool {
        let mut seen = false;
        for feature in &self.features {
            match feature.properties.get(key) {
                Some(JsonValue::String(_)) => seen = true,
                None | Some(JsonValue::Null) => {}
                Some(_) => return false,
            }
        }
        seen
    }

    /// Unikalne, posortowane wartości kolumny.
    pub fn labels(&self, key: &str) -> Vec<String> {
        let mut labels: Vec<String> = self.features.iter().filter_map(|f| f.attr_text(key)).collect();
        labels.sort();
        labels.dedup();
        labels
    }

    /// Podzbiór obiektów o danej wartości atrybutu
    pub fn select(&self, key: &str, value: &str) -> FeatureSet {
        let features = self
            .features
            .iter()
            .filter(|f| f.attr_text(key).as_deref() == Some(value))
            .cloned()
            .collect();
        FeatureSet { features }
    }

    pub fn geometry_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for feature in &self.features {
            *counts.entry(feature.geometry.kind()).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
