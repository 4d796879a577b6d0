//! Dopasowywanie nazw: normalizacja etykiet, aliasy, kolumna z nazwą.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Małe litery, bez spacji na brzegach, pojedyncze spacje w środku, bez diakrytyków.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Niezmienna tabela skrót → pełna nazwa, przechowywana po normalizacji.
#[derive(Clone, Debug, PartialEq)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

impl AliasTable {
    pub const DEFAULT: &'static [(&'static str, &'static str)] = &[
        ("cdmx", "ciudad de mexico"),
        ("df", "ciudad de mexico"),
        ("distrito federal", "ciudad de mexico"),
        ("edomex", "estado de mexico"),
        ("edo mex", "estado de mexico"),
        ("coahuila", "coahuila de zaragoza"),
        ("michoacan", "michoacan de ocampo"),
        ("veracruz", "veracruz de ignacio de la llave"),
        ("qro", "queretaro"),
        ("queretaro de arteaga", "queretaro"),
        ("bcs", "baja california sur"),
        ("slp", "san luis potosi"),
        ("ags", "aguascalientes"),
    ];

    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(alias, canonical)| (normalize(alias), normalize(canonical)))
            .collect();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Pełna nazwa dla skrótu (pierwszy pasujący wpis)
    pub fn lookup(&self, text: &str) -> Option<&str> {
        let key = normalize(text);
        self.entries
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, canonical)| canonical.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new(Self::DEFAULT.iter().copied())
    }
}

/// Wynik dopasowania: pozycja i etykieta kandydata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub index: usize,
    pub label: &'a str,
}

/// Dopasowuje wybór użytkownika do listy kandydatów.
///
/// Kolejność prób: dokładna równość z wpisanym tekstem, dokładna równość
/// z pełną nazwą aliasu, potem zawieranie w dowolną stronę (najpierw dla
/// pełnej nazwy, potem dla wpisanego tekstu). W obrębie jednej próby
/// wygrywa pierwszy kandydat z listy. Pusty wybór niczego nie dopasowuje.
pub fn resolve<'a, S: AsRef<str>>(
    choice: &str,
    candidates: &'a [S],
    aliases: &AliasTable,
) -> Option<Resolved<'a>> {
    let typed = normalize(choice);
    if typed.is_empty() {
        return None;
    }
    let targets: Vec<&str> = match aliases.lookup(choice) {
        Some(canonical) if canonical != typed => vec![typed.as_str(), canonical],
        _ => vec![typed.as_str()],
    };

    let normalized: Vec<String> = candidates.iter().map(|c| normalize(c.as_ref())).collect();
    let exact = || {
        targets
            .iter()
            .find_map(|t| normalized.iter().position(|n| n == t))
    };
    let contained = || {
        targets.iter().rev().find_map(|t| {
            normalized
                .iter()
                .position(|n| !n.is_empty() && (n.contains(t) || t.contains(n.as_str())))
        })
    };
    let index = exact().or_else(contained)?;
    Some(Resolved { index, label: candidates[index].as_ref() })
}

/// Znane nazwy kolumn z nazwą regionu + podpowiedzi do przeszukania.
#[derive(Clone, Debug, PartialEq)]
pub struct NamePolicy {
    candidates: Vec<String>,
    hints: Vec<String>,
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self::new(
            ["NOMGEO", "NOM_MUN", "MUNICIPIO", "mun_name", "NOM_ENT", "NOMBRE", "name"]
                .map(String::from)
                .to_vec(),
            ["name", "nombre", "nom", "nomgeo"].map(String::from).to_vec(),
        )
    }
}

impl NamePolicy {
    pub fn new(candidates: Vec<String>, hints: Vec<String>) -> Self {
        let hints = hints.into_iter().map(|h| h.to_lowercase()).collect();
        Self { candidates, hints }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }
}

/// Kolumna z nazwą: najpierw lista priorytetowa (bez rozróżniania wielkości
/// liter), potem pierwsza kolumna, której człon (między `_`, `-`, spacjami)
/// jest równy podpowiedzi. `NOM_LOC` pasuje do `nom`, `ECONOMIA` nie.
pub fn find_name_attribute<'a, S: AsRef<str>>(keys: &'a [S], policy: &NamePolicy) -> Option<&'a str> {
    let known = policy.candidates.iter().find_map(|cand| {
        keys.iter()
            .map(|key| key.as_ref())
            .find(|key| key.to_lowercase() == cand.to_lowercase())
    });
    known.or_else(|| {
        keys.iter().map(|key| key.as_ref()).find(|key| {
            let lower = key.to_lowercase();
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| policy.hints.iter().any(|hint| token == hint))
        })
    })
}
