use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::data::{Diagnostics, GeoLevel};
use crate::state::{AppState, Control, FitMode, Slider};

pub fn draw(f: &mut Frame<'_>, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(55),
            Constraint::Percentage(25),
        ])
        .split(f.area());

    // Lewy panel: lista
    let items: Vec<ListItem> = state.list_items
        .iter()
        .map(|i| ListItem::new(i.clone()))
        .collect();
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));
    let list_title = match state.level {
        GeoLevel::National => "Stan",
        GeoLevel::State => "Gmina",
    };
    let list = List::new(items)
        .block(focused_block(list_title, state.active == Control::List))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::LightBlue));
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    // Środek: mapa
    if let Some(map) = &state.map {
        let title = format!(
            "{} · ({:.2}, {:.2}) zoom {:.1}{}",
            state.highlight.as_deref().unwrap_or("—"),
            state.view.center[0],
            state.view.center[1],
            state.view.zoom,
            if state.fit == FitMode::Region { " · całość" } else { "" },
        );
        map.render(f, chunks[1], &title, &state.view, state.highlight.as_deref(), &state.style());
    } else {
        let txt = Paragraph::new("Brak mapy krajowej. Wybierz stan i naciśnij Enter.")
            .block(Block::default().borders(Borders::ALL).title("Mapa"))
            .wrap(Wrap { trim: true });
        f.render_widget(txt, chunks[1]);
    }

    // Prawy panel: informacje, suwaki, diagnostyka
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(9),
            Constraint::Min(6),
        ])
        .split(chunks[2]);

    let info_paragraph = Paragraph::new(state.info.as_str())
        .block(Block::default().borders(Borders::ALL).title("Informacje"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_paragraph, right_chunks[0]);

    let slider_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3); 3])
        .split(right_chunks[1]);
    let sliders = [
        ("Krycie bazy", &state.base_opacity, Control::BaseOpacity),
        ("Krycie wyboru", &state.selection_opacity, Control::SelectionOpacity),
        ("Grubość linii", &state.line_width, Control::LineWidth),
    ];
    for ((label, slider, control), row) in sliders.into_iter().zip(slider_rows.iter()) {
        f.render_widget(slider_gauge(label, slider, state.active == control), *row);
    }

    let diag_text = match state.map.as_ref() {
        Some(map) => diagnostics_text(&map.region().diagnostics),
        None => format!("Katalog: {:?}\nPliki: {}", state.catalog.base(), state.states.len()),
    };
    let diag_paragraph = Paragraph::new(diag_text)
        .block(Block::default().borders(Borders::ALL).title("Diagnostyka"))
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    f.render_widget(diag_paragraph, right_chunks[2]);
}

fn focused_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused { Style::default().fg(Color::Yellow) } else { Style::default() };
    Block::default().borders(Borders::ALL).title(title).border_style(style)
}

fn slider_gauge<'a>(label: &'a str, slider: &Slider, focused: bool) -> Gauge<'a> {
    let ratio = if slider.max > slider.min {
        (slider.value - slider.min) / (slider.max - slider.min)
    } else {
        1.0
    };
    Gauge::default()
        .block(focused_block(label, focused))
        .gauge_style(Style::default().fg(Color::LightBlue))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{:.2}", slider.value))
}

pub fn diagnostics_text(diag: &Diagnostics) -> String {
    let geom = diag
        .geometry_counts
        .iter()
        .map(|(kind, n)| format!("{kind}: {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    let bounds = match &diag.bounds {
        Some(b) => format!("[{:.3}, {:.3}, {:.3}, {:.3}]", b.min_lon, b.min_lat, b.max_lon, b.max_lat),
        None => "brak".to_string(),
    };
    format!(
        "Plik: {}\nCRS: {}\nWiersze: {} (pominięte: {})\nKolumny: {}\nGeometrie: {}\nZakres: {}\nKolumna nazwy: {}",
        diag.file.display(),
        diag.crs,
        diag.rows,
        diag.dropped,
        diag.columns.join(", "),
        geom,
        bounds,
        diag.name_column,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CrsStatus;
    use crate::viewport::BoundingBox;
    use std::{collections::BTreeMap, path::PathBuf};

    #[test]
    fn test_diagnostics_text() {
        let diag = Diagnostics {
            file: PathBuf::from("data/Aguascalientes.json"),
            crs: CrsStatus::Assumed,
            rows: 11,
            columns: vec!["CVEGEO".into(), "NOMGEO".into()],
            geometry_counts: BTreeMap::from([("MultiPolygon", 2), ("Polygon", 9)]),
            dropped: 0,
            bounds: Some(BoundingBox { min_lon: -102.87, min_lat: 21.62, max_lon: -101.84, max_lat: 22.46 }),
            name_column: "NOMGEO".into(),
        };
        let text = diagnostics_text(&diag);
        assert!(text.contains("Plik: data/Aguascalientes.json"));
        assert!(text.contains("CRS: brak (EPSG:4326)"));
        assert!(text.contains("Geometrie: MultiPolygon: 2, Polygon: 9"));
        assert!(text.contains("Zakres: [-102.870, 21.620, -101.840, 22.460]"));
        assert!(text.ends_with("Kolumna nazwy: NOMGEO"));
    }
}
