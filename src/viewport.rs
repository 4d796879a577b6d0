//! Zakres współrzędnych zbioru obiektów, środek widoku i zoom.

use serde::Deserialize;

use crate::geometry::FeatureSet;

/// Prostokąt (min_lon, min_lat, max_lon, max_lat).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// `None`, gdy zbiór nie ma ani jednej pary współrzędnych.
    pub fn of(set: &FeatureSet) -> Option<Self> {
        let (mut minx, mut miny, mut maxx, mut maxy) =
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut found = false;
        for coord in set.iter().flat_map(|f| f.geometry.coords()) {
            minx = minx.min(coord.x);
            miny = miny.min(coord.y);
            maxx = maxx.max(coord.x);
            maxy = maxy.max(coord.y);
            found = true;
        }
        found.then_some(Self { min_lon: minx, min_lat: miny, max_lon: maxx, max_lat: maxy })
    }

    pub fn center(&self) -> [f64; 2] {
        [(self.min_lon + self.max_lon) / 2.0, (self.min_lat + self.max_lat) / 2.0]
    }

    /// Większy z dwóch wymiarów
    pub fn diag(&self) -> f64 {
        (self.max_lon - self.min_lon).max(self.max_lat - self.min_lat)
    }

    /// Czy mieści się w zakresie stopni geograficznych.
    pub fn is_lon_lat(&self) -> bool {
        self.min_lon >= -180.0 && self.max_lon <= 180.0 && self.min_lat >= -90.0 && self.max_lat <= 90.0
    }
}

/// Próg: dla `diag < below` zoom wynosi `zoom`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ZoomStep {
    pub below: f64,
    pub zoom: f64,
}

/// Środek (lon, lat) i zoom mapy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub center: [f64; 2],
    pub zoom: f64,
}

impl ViewState {
    /// Widok dopasowany do zbioru; bez współrzędnych zwraca widok domyślny.
    pub fn fit(set: &FeatureSet, policy: &ZoomPolicy) -> Self {
        match BoundingBox::of(set) {
            Some(bbox) => policy.view_for(&bbox),
            None => policy.fallback,
        }
    }

    /// Rozpiętość (lon, lat) widoczna na płótnie `width` x `height` komórek.
    ///
    /// Jak w mapach kafelkowych: przy zoomie 0 szerokość widoku to 360°,
    /// każdy poziom zoomu ją połowi. Komórka terminala jest ok. dwa razy
    /// wyższa niż szersza.
    pub fn visible_extent(&self, width: u16, height: u16) -> (f64, f64) {
        let lon_span = 360.0 / self.zoom.exp2();
        let lat_span = if width == 0 {
            lon_span
        } else {
            lon_span * 2.0 * f64::from(height) / f64::from(width)
        };
        (lon_span, lat_span)
    }

    /// Granice x/y dla `Canvas`
    pub fn canvas_bounds(&self, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
        let (lon_span, lat_span) = self.visible_extent(width, height);
        let [cx, cy] = self.center;
        (
            [cx - lon_span / 2.0, cx + lon_span / 2.0],
            [cy - lat_span / 2.0, cy + lat_span / 2.0],
        )
    }
}

/// Progi zoomu i widok awaryjny. Wartości to polityka, nie prawo natury.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomPolicy {
    pub steps: Vec<ZoomStep>,
    pub wide_zoom: f64,
    pub fallback: ViewState,
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self {
            steps: vec![
                ZoomStep { below: 1.5, zoom: 6.2 },
                ZoomStep { below: 3.0, zoom: 5.4 },
                ZoomStep { below: 6.0, zoom: 4.8 },
            ],
            wide_zoom: 4.5,
            fallback: ViewState { center: [-102.3, 22.0], zoom: 6.0 },
        }
    }
}

impl ZoomPolicy {
    /// Progi są sortowane rosnąco po `below`.
    pub fn new(mut steps: Vec<ZoomStep>, wide_zoom: f64, fallback: ViewState) -> Self {
        steps.sort_by(|a, b| a.below.total_cmp(&b.below));
        Self { steps, wide_zoom, fallback }
    }

    pub fn zoom_for_diag(&self, diag: f64) -> f64 {
        self.steps
            .iter()
            .find(|step| diag < step.below)
            .map_or(self.wide_zoom, |step| step.zoom)
    }

    pub fn view_for(&self, bbox: &BoundingBox) -> ViewState {
        ViewState { center: bbox.center(), zoom: self.zoom_for_diag(bbox.diag()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Feature, Geometry, tests::square};
    use geo::{MultiPolygon, polygon};
    use serde_json::Map;

    #[test]
    fn test_square_scenario() {
        let set = FeatureSet::new(vec![square("Aguascalientes", -102.5, 22.0, 0.5)]);
        let bbox = BoundingBox::of(&set).unwrap();
        assert_eq!(
            bbox,
            BoundingBox { min_lon: -102.5, min_lat: 22.0, max_lon: -102.0, max_lat: 22.5 }
        );
        assert_eq!(bbox.center(), [-102.25, 22.25]);
        assert_eq!(bbox.diag(), 0.5);

        let view = ViewState::fit(&set, &ZoomPolicy::default());
        assert_eq!(view, ViewState { center: [-102.25, 22.25], zoom: 6.2 });
    }

    #[test]
    fn test_empty_set_falls_back() {
        let set = FeatureSet::default();
        assert_eq!(BoundingBox::of(&set), None);
        let view = ViewState::fit(&set, &ZoomPolicy::default());
        assert_eq!(view, ViewState { center: [-102.3, 22.0], zoom: 6.0 });
    }

    #[test]
    fn test_non_areal_geometry_has_no_bounds() {
        let set = FeatureSet::new(vec![Feature::new(Geometry::Other("Point"), Map::new())]);
        assert_eq!(BoundingBox::of(&set), None);
    }

    #[test]
    fn test_bounds_span_all_features_and_members() {
        let far = polygon![(x: -90.0, y: 15.0), (x: -89.0, y: 15.0), (x: -89.0, y: 16.0), (x: -90.0, y: 15.0)];
        let near = polygon![(x: -117.0, y: 32.0), (x: -116.0, y: 32.0), (x: -116.0, y: 32.7), (x: -117.0, y: 32.0)];
        let set = FeatureSet::new(vec![
            square("Zacatecas", -103.0, 23.0, 1.0),
            Feature::new(Geometry::MultiPolygon(MultiPolygon(vec![far, near])), Map::new()),
        ]);
        let bbox = BoundingBox::of(&set).unwrap();
        assert!(bbox.min_lon <= bbox.max_lon && bbox.min_lat <= bbox.max_lat);
        assert_eq!((bbox.min_lon, bbox.max_lon), (-117.0, -89.0));
        assert_eq!((bbox.min_lat, bbox.max_lat), (15.0, 32.7));
        assert_eq!(ZoomPolicy::default().zoom_for_diag(bbox.diag()), 4.5);
    }

    #[test]
    fn test_threshold_edges() {
        let policy = ZoomPolicy::default();
        assert_eq!(policy.zoom_for_diag(0.0), 6.2);
        assert_eq!(policy.zoom_for_diag(1.4999), 6.2);
        assert_eq!(policy.zoom_for_diag(1.5), 5.4);
        assert_eq!(policy.zoom_for_diag(3.0), 4.8);
        assert_eq!(policy.zoom_for_diag(5.99), 4.8);
        assert_eq!(policy.zoom_for_diag(6.0), 4.5);
        assert_eq!(policy.zoom_for_diag(40.0), 4.5);
        // powtarzalność
        assert_eq!(policy.zoom_for_diag(2.2), policy.zoom_for_diag(2.2));
    }

    #[test]
    fn test_unsorted_steps_are_ordered() {
        let policy = ZoomPolicy::new(
            vec![ZoomStep { below: 6.0, zoom: 4.8 }, ZoomStep { below: 1.5, zoom: 6.2 }],
            4.0,
            ViewState { center: [0.0, 0.0], zoom: 1.0 },
        );
        assert_eq!(policy.zoom_for_diag(1.0), 6.2);
        assert_eq!(policy.zoom_for_diag(2.0), 4.8);
        assert_eq!(policy.zoom_for_diag(7.0), 4.0);
    }

    #[test]
    fn test_canvas_bounds_centered() {
        let view = ViewState { center: [-102.0, 22.0], zoom: 6.0 };
        let (x, y) = view.canvas_bounds(80, 40);
        assert!((x[1] - x[0] - 5.625).abs() < 1e-9);
        assert!((y[1] - y[0] - 5.625).abs() < 1e-9);
        assert!(((x[0] + x[1]) / 2.0 + 102.0).abs() < 1e-9);
        assert!(((y[0] + y[1]) / 2.0 - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_projected_bounds_detected() {
        let set = FeatureSet::new(vec![square("x", 2_400_000.0, 1_100_000.0, 1000.0)]);
        assert!(!BoundingBox::of(&set).unwrap().is_lon_lat());
    }
}
