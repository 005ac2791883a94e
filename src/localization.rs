use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;
use unic_langid::LanguageIdentifier;

/// Languages with a bundled translation, the first one is the fallback
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "ru"];
pub const DEFAULT_LANGUAGE: &str = "en";

fn embedded_resource(language: &str) -> Option<&'static str> {
    match language {
        "en" => Some(include_str!("../locales/en/main.ftl")),
        "ru" => Some(include_str!("../locales/ru/main.ftl")),
        _ => None,
    }
}

/// Localization manager for the note bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every supported language loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for language in SUPPORTED_LANGUAGES {
            let source = embedded_resource(language)
                .ok_or_else(|| anyhow!("No resource bundled for {language}"))?;
            let locale: LanguageIdentifier = language.parse()?;
            bundles.insert(language.to_string(), Self::create_bundle(locale, source)?);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid resource for {locale}: {errors:?}"))?;

        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Unicode isolation marks would leak into plain Telegram text
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate messages for {locale}: {errors:?}"))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language, falling back to English
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let Some(bundle) = self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        else {
            return format!("Missing translation: {key}");
        };

        let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
            return format!("Missing translation: {key}");
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            warn!(key, language, errors = ?errors, "Errors while formatting message");
        }

        value.into_owned()
    }

    /// The same message in every supported language
    pub fn all_translations(&self, key: &str) -> Vec<String> {
        SUPPORTED_LANGUAGES
            .iter()
            .map(|language| self.get_message_in_language(key, language, None))
            .collect()
    }
}

static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager
pub fn init_localization() -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::new()?;
        // A concurrent initializer may have won, both built the same bundles
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

/// Get the global localization manager, initializing it on first use
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| match LocalizationManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            warn!(error = %e, "Failed to load translations, messages will show their keys");
            LocalizationManager {
                bundles: HashMap::new(),
            }
        }
    })
}

/// Map a Telegram language code to a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let Some(code) = language_code else {
        return DEFAULT_LANGUAGE;
    };
    let primary = code.split(['-', '_']).next().unwrap_or("").to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| **lang == primary)
        .copied()
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Convenience function to get a localized message for a Telegram language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(key, detect_language(language_code), None)
}

/// Convenience function to get a localized message with arguments
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    get_localization_manager().get_message_in_language(
        key,
        detect_language(language_code),
        Some(&args_map),
    )
}
