//! Localized strings for the two site languages.
//!
//! Translations are Fluent resources embedded at compile time. Lookups fall
//! back to English, then to a visible `MISSING:` marker.

use std::collections::HashMap;

use fluent_bundle::{FluentBundle, FluentResource};

use crate::prefs::Language;

const RESOURCES: [(Language, &str); 2] = [
    (Language::English, include_str!("../assets/i18n/en-US.ftl")),
    (Language::Spanish, include_str!("../assets/i18n/es.ftl")),
];

pub struct I18n {
    bundles: HashMap<Language, FluentBundle<FluentResource>>,
    current: Language,
}

impl Default for I18n {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl I18n {
    pub fn new(language: Language) -> Self {
        let mut bundles = HashMap::new();
        for (lang, source) in RESOURCES {
            let resource = FluentResource::try_new(source.to_string()).unwrap_or_else(|(res, errors)| {
                log::warn!("{} translation has {} syntax errors", lang.code(), errors.len());
                res
            });
            let mut bundle = FluentBundle::new(vec![lang.langid()]);
            bundle.set_use_isolating(false);
            if let Err(errors) = bundle.add_resource(resource) {
                log::warn!("{} translation has {} duplicate messages", lang.code(), errors.len());
            }
            bundles.insert(lang, bundle);
        }

        Self {
            bundles,
            current: language,
        }
    }

    pub fn language(&self) -> Language {
        self.current
    }

    pub fn set_language(&mut self, language: Language) {
        self.current = language;
    }

    pub fn tr(&self, key: &str) -> String {
        self.lookup(self.current, key)
            .or_else(|| self.lookup(Language::English, key))
            .unwrap_or_else(|| format!("MISSING: {}", key))
    }

    fn lookup(&self, language: Language, key: &str) -> Option<String> {
        let bundle = self.bundles.get(&language)?;
        let pattern = bundle.get_message(key)?.value()?;
        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, None, &mut errors);
        if errors.is_empty() {
            Some(value.into_owned())
        } else {
            None
        }
    }
}
