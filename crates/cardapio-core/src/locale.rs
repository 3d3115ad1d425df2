//! Weekday identifiers and locale-variant normalization.
//!
//! Models answer with whatever day spelling they like: `"monday"`,
//! `"Terça"`, `"sabado"`, `"Segunda-feira"`. [`normalize_day_key`] maps every
//! known variant to the canonical spelling of the target [`DayLocale`] and
//! passes unknown keys through untouched, leaving rejection to validation.
//!
//! Adding a language means adding rows to [`DAY_VARIANTS`] and a column to
//! [`DayLocale`]'s lookup methods; the normalization logic does not change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One of the seven fixed calendar days, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Look up a day from any known spelling (case-insensitive).
    pub fn from_key(key: &str) -> Option<Weekday> {
        let lowered = key.trim().to_lowercase();
        DAY_VARIANTS
            .iter()
            .find(|(variant, _)| *variant == lowered)
            .map(|(_, day)| *day)
    }
}

/// Known day spellings, lower-cased. Canonical spellings of every locale
/// must appear here so normalization is idempotent.
pub const DAY_VARIANTS: &[(&str, Weekday)] = &[
    // English
    ("monday", Weekday::Monday),
    ("tuesday", Weekday::Tuesday),
    ("wednesday", Weekday::Wednesday),
    ("thursday", Weekday::Thursday),
    ("friday", Weekday::Friday),
    ("saturday", Weekday::Saturday),
    ("sunday", Weekday::Sunday),
    // Portuguese, with and without diacritics and the "-feira" suffix
    ("segunda", Weekday::Monday),
    ("segunda-feira", Weekday::Monday),
    ("terça", Weekday::Tuesday),
    ("terca", Weekday::Tuesday),
    ("terça-feira", Weekday::Tuesday),
    ("terca-feira", Weekday::Tuesday),
    ("quarta", Weekday::Wednesday),
    ("quarta-feira", Weekday::Wednesday),
    ("quinta", Weekday::Thursday),
    ("quinta-feira", Weekday::Thursday),
    ("sexta", Weekday::Friday),
    ("sexta-feira", Weekday::Friday),
    ("sábado", Weekday::Saturday),
    ("sabado", Weekday::Saturday),
    ("domingo", Weekday::Sunday),
];

/// Target locale for canonical day names and the labels used in text files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayLocale {
    #[default]
    Portuguese,
    English,
}

impl DayLocale {
    /// Canonical spelling of `day` in this locale.
    pub fn day_name(self, day: Weekday) -> &'static str {
        match self {
            DayLocale::Portuguese => match day {
                Weekday::Monday => "Segunda",
                Weekday::Tuesday => "Terca",
                Weekday::Wednesday => "Quarta",
                Weekday::Thursday => "Quinta",
                Weekday::Friday => "Sexta",
                Weekday::Saturday => "Sabado",
                Weekday::Sunday => "Domingo",
            },
            DayLocale::English => match day {
                Weekday::Monday => "Monday",
                Weekday::Tuesday => "Tuesday",
                Weekday::Wednesday => "Wednesday",
                Weekday::Thursday => "Thursday",
                Weekday::Friday => "Friday",
                Weekday::Saturday => "Saturday",
                Weekday::Sunday => "Sunday",
            },
        }
    }

    /// Canonical names of all seven days, Monday first.
    pub fn day_names(self) -> Vec<&'static str> {
        Weekday::ALL.iter().map(|d| self.day_name(*d)).collect()
    }

    /// Labels for the midday and evening meal slots.
    pub fn meal_labels(self) -> [&'static str; 2] {
        match self {
            DayLocale::Portuguese => ["Almoço", "Jantar"],
            DayLocale::English => ["Lunch", "Dinner"],
        }
    }

    /// Recipe field keys as `[name, ingredients, preparation]`, used in
    /// prompts and in the plan JSON handed back to callers.
    pub fn recipe_keys(self) -> [&'static str; 3] {
        match self {
            DayLocale::Portuguese => ["nome", "ingredientes", "modo_preparo"],
            DayLocale::English => ["name", "ingredients", "preparation"],
        }
    }

    pub fn ingredients_label(self) -> &'static str {
        match self {
            DayLocale::Portuguese => "Ingredientes:",
            DayLocale::English => "Ingredients:",
        }
    }

    pub fn preparation_label(self) -> &'static str {
        match self {
            DayLocale::Portuguese => "Modo de preparo:",
            DayLocale::English => "Preparation:",
        }
    }

    pub fn shopping_list_title(self) -> &'static str {
        match self {
            DayLocale::Portuguese => "LISTA DE COMPRAS DA SEMANA",
            DayLocale::English => "WEEKLY SHOPPING LIST",
        }
    }

    /// Whether `key` is the canonical spelling of some day in this locale.
    pub fn is_canonical(self, key: &str) -> bool {
        Weekday::ALL.iter().any(|d| self.day_name(*d) == key)
    }
}

impl fmt::Display for DayLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayLocale::Portuguese => write!(f, "portuguese"),
            DayLocale::English => write!(f, "english"),
        }
    }
}

impl FromStr for DayLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portuguese" | "pt" | "pt-br" => Ok(DayLocale::Portuguese),
            "english" | "en" => Ok(DayLocale::English),
            other => Err(format!(
                "unknown locale {other:?} (expected portuguese or english)"
            )),
        }
    }
}

/// Map a day key to its canonical form in `locale`; unknown keys pass through.
pub fn normalize_day_key(key: &str, locale: DayLocale) -> String {
    match Weekday::from_key(key) {
        Some(day) => locale.day_name(day).to_string(),
        None => key.to_string(),
    }
}

/// Normalize every key of a decoded plan object, preserving key order.
///
/// If two input keys collapse to the same canonical day, the later value
/// replaces the earlier one in the earlier key's position.
pub fn normalize_plan_keys(plan: Map<String, Value>, locale: DayLocale) -> Map<String, Value> {
    let mut out = Map::with_capacity(plan.len());
    for (key, value) in plan {
        let canonical = normalize_day_key(&key, locale);
        if out.contains_key(&canonical) {
            tracing::warn!(key = %key, canonical = %canonical, "duplicate day after normalization");
        }
        out.insert(canonical, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn english_variants_collapse_to_canonical() {
        let en = DayLocale::English;
        assert_eq!(normalize_day_key("monday", en), "Monday");
        assert_eq!(normalize_day_key("Monday", en), "Monday");
        assert_eq!(normalize_day_key("MONDAY", en), "Monday");
        assert_eq!(normalize_day_key("segunda", en), "Monday");
    }

    #[test]
    fn portuguese_variants_collapse_to_canonical() {
        let pt = DayLocale::Portuguese;
        assert_eq!(normalize_day_key("monday", pt), "Segunda");
        assert_eq!(normalize_day_key("Terça", pt), "Terca");
        assert_eq!(normalize_day_key("terca-feira", pt), "Terca");
        assert_eq!(normalize_day_key("Sábado", pt), "Sabado");
        assert_eq!(normalize_day_key("sunday", pt), "Domingo");
    }

    #[test]
    fn unknown_keys_pass_through() {
        assert_eq!(normalize_day_key("Funday", DayLocale::English), "Funday");
        assert_eq!(normalize_day_key("Feriado", DayLocale::Portuguese), "Feriado");
    }

    #[test]
    fn normalization_is_idempotent() {
        let keys = [
            "monday", "Terça", "quarta-feira", "THURSDAY", "sexta", "sábado", "Sunday", "xyz",
        ];
        for locale in [DayLocale::Portuguese, DayLocale::English] {
            for key in keys {
                let once = normalize_day_key(key, locale);
                assert_eq!(normalize_day_key(&once, locale), once, "{key} in {locale}");
            }
        }
    }

    #[test]
    fn every_canonical_name_is_a_known_variant() {
        for locale in [DayLocale::Portuguese, DayLocale::English] {
            for name in locale.day_names() {
                assert!(Weekday::from_key(name).is_some(), "{name} missing from table");
                assert!(locale.is_canonical(name));
            }
        }
    }

    #[test]
    fn plan_keys_keep_their_order() {
        let plan = json!({"friday": 1, "monday": 2, "Quarta": 3, "Holiday": 4});
        let Value::Object(map) = plan else { unreachable!() };
        let normalized = normalize_plan_keys(map, DayLocale::Portuguese);
        let keys: Vec<&str> = normalized.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Sexta", "Segunda", "Quarta", "Holiday"]);
    }

    #[test]
    fn colliding_keys_keep_last_value() {
        let plan = json!({"Monday": 1, "segunda": 2});
        let Value::Object(map) = plan else { unreachable!() };
        let normalized = normalize_plan_keys(map, DayLocale::English);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized["Monday"], json!(2));
    }

    #[test]
    fn recipe_keys_follow_the_locale() {
        assert_eq!(
            DayLocale::Portuguese.recipe_keys(),
            ["nome", "ingredientes", "modo_preparo"]
        );
        assert_eq!(DayLocale::English.recipe_keys()[0], "name");
    }

    #[test]
    fn locale_parses_from_config_strings() {
        assert_eq!("portuguese".parse::<DayLocale>(), Ok(DayLocale::Portuguese));
        assert_eq!("EN".parse::<DayLocale>(), Ok(DayLocale::English));
        assert!("klingon".parse::<DayLocale>().is_err());
    }
}
