use geo::{BoundingRect, Contains, LineString, Point, Polygon};
use ratatui::layout::Rect as TuiRect;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Context, Line, Points};
use ratatui::widgets::{Block, Borders};
use ratatui::{Frame, style::Color};
use std::rc::Rc;

use crate::{config::StyleConfig, data::LoadedRegion, viewport::ViewState};

/// Wygląd mapy: kolory, przezroczystość, grubość linii
#[derive(Clone, Debug, PartialEq)]
pub struct MapStyle {
    pub base_opacity: f64,
    pub selection_opacity: f64,
    pub line_width: f64,
    pub base_color: [u8; 3],
    pub selection_color: [u8; 3],
}

impl From<&StyleConfig> for MapStyle {
    fn from(cfg: &StyleConfig) -> Self {
        Self {
            base_opacity: cfg.base_opacity,
            selection_opacity: cfg.selection_opacity,
            line_width: cfg.line_width,
            base_color: cfg.base_color,
            selection_color: cfg.selection_color,
        }
    }
}

/// Kolor na ciemnym tle przy danej nieprzezroczystości.
pub fn blend(rgb: [u8; 3], opacity: f64) -> Color {
    let a = opacity.clamp(0.0, 1.0);
    let [r, g, b] = rgb.map(|c| (f64::from(c) * a).round() as u8);
    Color::Rgb(r, g, b)
}

/// Ile równoległych przejść rysuje linię danej grubości.
pub fn line_passes(line_width: f64) -> usize {
    line_width.round().max(1.0) as usize
}

/// Warstwa bazowa (wszystkie regiony) + podświetlony wybór
pub struct MapView {
    region: Rc<LoadedRegion>,
}

impl MapView {
    pub fn new(region: Rc<LoadedRegion>) -> Self {
        Self { region }
    }

    /// Liczba obiektów (np. gmin)
    pub fn feature_count(&self) -> usize {
        self.region.features.len()
    }

    pub fn region(&self) -> &LoadedRegion {
        &self.region
    }

    /// Rysuje najpierw wszystkie granice przygaszone, potem wypełnia i obrysowuje wybrany region.
    pub fn render(
        &self,
        f: &mut Frame<'_>,
        area: TuiRect,
        title: &str,
        view: &ViewState,
        highlight: Option<&str>,
        style: &MapStyle,
    ) {
        let inner_w = area.width.saturating_sub(2);
        let inner_h = area.height.saturating_sub(2);
        let (x_bounds, y_bounds) = view.canvas_bounds(inner_w, inner_h);
        // rozmiar jednej kropki braille w stopniach
        let dot = (
            (x_bounds[1] - x_bounds[0]) / f64::from(inner_w.max(1) * 2),
            (y_bounds[1] - y_bounds[0]) / f64::from(inner_h.max(1) * 4),
        );

        let base_color = blend(style.base_color, style.base_opacity);
        let sel_color = blend(style.selection_color, style.selection_opacity);
        let outline = blend(style.selection_color, 1.0);
        let passes = line_passes(style.line_width);

        let selected: Vec<&Polygon<f64>> = match highlight {
            Some(label) => self
                .region
                .features
                .iter()
                .filter(|feat| feat.attr_text(&self.region.name_column).as_deref() == Some(label))
                .flat_map(|feat| feat.geometry.polygons())
                .collect(),
            None => Vec::new(),
        };
        let fill = fill_points(&selected, x_bounds, y_bounds, dot);

        let canvas = Canvas::default()
            .block(Block::default().title(title.to_string()).borders(Borders::ALL))
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                // 1) Wszystkie granice w kolorze bazowym
                for feat in self.region.features.iter() {
                    for poly in feat.geometry.polygons() {
                        draw_polygon(ctx, poly, base_color, passes, dot);
                    }
                }
                ctx.layer();

                // 2) Wypełnienie i obrys wybranego regionu
                ctx.draw(&Points { coords: &fill, color: sel_color });
                for poly in &selected {
                    draw_polygon(ctx, poly, outline, passes, dot);
                }
            });
        f.render_widget(canvas, area);
    }
}

fn draw_polygon(ctx: &mut Context<'_>, poly: &Polygon<f64>, color: Color, passes: usize, dot: (f64, f64)) {
    for ring in std::iter::once(poly.exterior()).chain(poly.interiors()) {
        for pass in 0..passes {
            // przesunięcia 0, +1, -1, +2, ... kropki
            let k = ((pass + 1) / 2) as f64 * if pass % 2 == 1 { 1.0 } else { -1.0 };
            draw_ring(ctx, ring, color, (k * dot.0, k * dot.1));
        }
    }
}

fn draw_ring(ctx: &mut Context<'_>, ring: &LineString<f64>, color: Color, offset: (f64, f64)) {
    let (dx, dy) = offset;
    for window in ring.0.windows(2) {
        let a = window[0];
        let b = window[1];
        ctx.draw(&Line { x1: a.x + dx, y1: a.y + dy, x2: b.x + dx, y2: b.y + dy, color });
    }
    if let (Some(first), Some(last)) = (ring.0.first(), ring.0.last()) {
        if first != last {
            ctx.draw(&Line { x1: last.x + dx, y1: last.y + dy, x2: first.x + dx, y2: first.y + dy, color });
        }
    }
}

/// Środki kropek siatki płótna leżące wewnątrz wielokątów.
pub fn fill_points(polys: &[&Polygon<f64>], x_bounds: [f64; 2], y_bounds: [f64; 2], dot: (f64, f64)) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    if dot.0 <= 0.0 || dot.1 <= 0.0 {
        return points;
    }
    for poly in polys {
        let Some(rect) = poly.bounding_rect() else { continue };
        let x0 = rect.min().x.max(x_bounds[0]);
        let x1 = rect.max().x.min(x_bounds[1]);
        let y0 = rect.min().y.max(y_bounds[0]);
        let y1 = rect.max().y.min(y_bounds[1]);
        // wyrównanie do siatki płótna
        let mut x = x_bounds[0] + ((x0 - x_bounds[0]) / dot.0).floor() * dot.0 + dot.0 / 2.0;
        while x <= x1 {
            let mut y = y_bounds[0] + ((y0 - y_bounds[0]) / dot.1).floor() * dot.1 + dot.1 / 2.0;
            while y <= y1 {
                if poly.contains(&Point::new(x, y)) {
                    points.push((x, y));
                }
                y += dot.1;
            }
            x += dot.0;
        }
    }
    points
}
