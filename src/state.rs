use crossterm::event::KeyCode;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    data::{DataCatalog, GeoLevel, LoadedRegion, StateEntry},
    error::Result,
    geometry::FeatureSet,
    map_draw::{MapStyle, MapView},
    naming::resolve,
    viewport::{ViewState, ZoomPolicy},
};

/// Aktywny element sterowania (Tab przełącza)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    List,
    BaseOpacity,
    SelectionOpacity,
    LineWidth,
}

/// Do czego dopasowujemy widok
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitMode {
    Selection,
    Region,
}

/// Suwak z krokiem i zakresem
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slider {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Slider {
    pub fn new(value: f64, min: f64, max: f64, step: f64) -> Self {
        Self { value: value.clamp(min, max), min, max, step }
    }

    pub fn nudge(&mut self, steps: i32) {
        let raw = self.value + self.step * f64::from(steps);
        // zaokrąglenie do siatki kroku, żeby nie zbierać błędów 0.05 + 0.05 + ...
        let snapped = (raw / self.step).round() * self.step;
        self.value = snapped.clamp(self.min, self.max);
    }
}

pub struct AppState {
    pub catalog: DataCatalog,
    pub policy: ZoomPolicy,
    pub level: GeoLevel,
    pub states: Vec<StateEntry>,
    pub current_state: Option<StateEntry>,
    pub list_items: Vec<String>,
    pub selected: usize,
    pub history: Vec<(GeoLevel, usize)>,
    pub map: Option<MapView>,
    national: Option<Rc<LoadedRegion>>,
    pub highlight: Option<String>,
    pub view: ViewState,
    pub fit: FitMode,
    pub info: String,
    pub active: Control,
    pub base_opacity: Slider,
    pub selection_opacity: Slider,
    pub line_width: Slider,
    base_style: MapStyle,
}

impl AppState {
    const HELP_TEXT: &'static str = "\
↑/↓: ruch w liście
Enter: wejście do stanu
Esc / Backspace: wstecz
Tab: lista / suwaki, ←/→: zmiana
f: widok wyboru / całości
q: wyjście";

    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut catalog = DataCatalog::new(config);
        let states = catalog.list_states()?;
        let national = match catalog.load_national() {
            Some(Ok(region)) => Some(region),
            Some(Err(err)) => {
                warn!(%err, "national map unavailable");
                None
            }
            None => None,
        };
        let style = MapStyle::from(&config.style);
        let policy = config.zoom_policy();

        let mut state = Self {
            catalog,
            view: policy.fallback,
            policy,
            level: GeoLevel::National,
            list_items: states.iter().map(|s| s.label.clone()).collect(),
            states,
            current_state: None,
            selected: 0,
            history: Vec::new(),
            map: national.clone().map(MapView::new),
            national,
            highlight: None,
            fit: FitMode::Selection,
            info: String::new(),
            active: Control::List,
            base_opacity: Slider::new(style.base_opacity, 0.1, 1.0, 0.05),
            selection_opacity: Slider::new(style.selection_opacity, 0.1, 1.0, 0.05),
            line_width: Slider::new(style.line_width, 0.5, 5.0, 0.5),
            base_style: style,
        };
        state.refresh();
        Ok(state)
    }

    /// Otwiera stan wskazany etykietą (aliasy dozwolone), szukając na liście
    /// wczytanej przy starcie.
    pub fn open_state(&mut self, label: &str) -> Result<()> {
        let index = self.catalog.find_state(&self.states, label)?;
        self.selected = index;
        self.enter_state(index);
        Ok(())
    }

    /// Zaznacza pozycję listy pasującą do etykiety; false gdy brak.
    pub fn select_label(&mut self, label: &str) -> bool {
        match resolve(label, &self.list_items, self.catalog.aliases()).map(|hit| hit.index) {
            Some(index) => {
                self.selected = index;
                self.refresh();
                true
            }
            None => {
                self.info = format!("Nie znaleziono: {label}\n\n{}", Self::HELP_TEXT);
                false
            }
        }
    }

    pub fn style(&self) -> MapStyle {
        MapStyle {
            base_opacity: self.base_opacity.value,
            selection_opacity: self.selection_opacity.value,
            line_width: self.line_width.value,
            ..self.base_style.clone()
        }
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.list_items.get(self.selected).map(String::as_str)
    }

    fn enter_state(&mut self, index: usize) {
        let Some(entry) = self.states.get(index).cloned() else { return };
        match self.catalog.load(&entry.path) {
            Ok(region) => {
                info!(state = %entry.label, "entering state");
                self.history.push((GeoLevel::National, index));
                self.level = GeoLevel::State;
                self.list_items = region.labels();
                self.selected = 0;
                self.map = Some(MapView::new(region));
                self.current_state = Some(entry);
                self.refresh();
            }
            Err(err) => {
                warn!(file = ?entry.path, %err, "cannot open state");
                self.info = format!("{}: {err}\n\n{}", entry.label, Self::HELP_TEXT);
            }
        }
    }

    fn back(&mut self) {
        if let Some((GeoLevel::National, index)) = self.history.pop() {
            self.level = GeoLevel::National;
            self.list_items = self.states.iter().map(|s| s.label.clone()).collect();
            self.selected = index.min(self.list_items.len().saturating_sub(1));
            self.map = self.national.clone().map(MapView::new);
            self.current_state = None;
            self.refresh();
        }
    }

    /// Przelicza podświetlenie, widok i opis po każdej zmianie wyboru.
    pub fn refresh(&mut self) {
        let label = self.selected_label().map(str::to_string);
        let Some(map) = &self.map else {
            self.highlight = None;
            self.view = self.policy.fallback;
            self.info = format!("Stany: {}\n\n{}", self.list_items.len(), Self::HELP_TEXT);
            return;
        };
        let region = map.region();

        self.highlight = match (&label, self.level) {
            // lista stanów pochodzi z nazw plików, mapa krajowa ma własne nazwy
            (Some(l), GeoLevel::National) => {
                let names = region.labels();
                resolve(l, &names, self.catalog.aliases()).map(|hit| hit.label.to_string())
            }
            (Some(l), GeoLevel::State) => Some(l.clone()),
            (None, _) => None,
        };

        let subset = match (&self.highlight, self.fit) {
            (Some(h), FitMode::Selection) => region.select(h),
            _ => FeatureSet::default(),
        };
        self.view = if subset.is_empty() {
            ViewState::fit(&region.features, &self.policy)
        } else {
            ViewState::fit(&subset, &self.policy)
        };

        let title = match &self.current_state {
            Some(entry) => entry.label.clone(),
            None => "México".to_string(),
        };
        let found = match (&label, &self.highlight) {
            (Some(_), Some(h)) => format!("Wybrano: {h}"),
            (Some(l), None) => format!("Nie znaleziono na mapie: {l}"),
            (None, _) => String::new(),
        };
        self.info = format!("{title} – {} obiektów\n{found}\n\n{}", map.feature_count(), Self::HELP_TEXT);
        debug!(highlight = ?self.highlight, center = ?self.view.center, zoom = self.view.zoom, "view updated");
    }

    fn adjust(&mut self, steps: i32) {
        let slider = match self.active {
            Control::List => return,
            Control::BaseOpacity => &mut self.base_opacity,
            Control::SelectionOpacity => &mut self.selection_opacity,
            Control::LineWidth => &mut self.line_width,
        };
        slider.nudge(steps);
    }

    /// Zwraca true, jeśli trzeba wyjść
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        match key {
            Char('q') => return true,
            Tab => {
                self.active = match self.active {
                    Control::List => Control::BaseOpacity,
                    Control::BaseOpacity => Control::SelectionOpacity,
                    Control::SelectionOpacity => Control::LineWidth,
                    Control::LineWidth => Control::List,
                };
            }
            Char('f') => {
                self.fit = match self.fit {
                    FitMode::Selection => FitMode::Region,
                    FitMode::Region => FitMode::Selection,
                };
                self.refresh();
            }
            Left => self.adjust(-1),
            Right => self.adjust(1),
            Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                    self.refresh();
                }
            }
            Down => {
                if self.selected + 1 < self.list_items.len() {
                    self.selected += 1;
                    self.refresh();
                }
            }
            Enter => {
                if self.level == GeoLevel::National {
                    self.enter_state(self.selected);
                }
            }
            Backspace | Esc => self.back(),
            _ => {}
        }
        false
    }
}
