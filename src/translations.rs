//! Language catalogs for user-facing texts.
//!
//! A catalog is a CSV file with a header row followed by
//! `identifier,text[,context]` rows. The identifier is the English text
//! itself, so a missing entry, or a missing catalog, shows English.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::common::error::TranslationError;

#[derive(Debug, Clone, Default)]
pub struct Translator {
    language: String,
    texts: HashMap<String, String>,
}

impl Translator {
    /// A translator that returns every identifier unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Load `path` as the catalog of `language`.
    ///
    /// A missing file is not an error: identifiers are shown as they are.
    pub fn load(path: &Path, language: &str) -> Result<Self, TranslationError> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if language != "en" {
                    warn!(
                        "No catalog for language '{}' at {}, using English",
                        language,
                        path.display()
                    );
                }
                return Ok(Self {
                    language: language.to_string(),
                    ..Self::identity()
                });
            }
            Err(source) => {
                return Err(TranslationError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let translator = Self::from_reader(language, file)?;
        info!(
            "Loaded {} texts for language '{}'",
            translator.texts.len(),
            language
        );
        Ok(translator)
    }

    pub fn from_reader(language: &str, reader: impl Read) -> Result<Self, TranslationError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut texts = HashMap::new();
        for record in csv.records() {
            let record = record?;
            match (record.get(0), record.get(1)) {
                (Some(identifier), Some(text)) if !text.is_empty() => {
                    texts.insert(identifier.to_string(), text.to_string());
                }
                _ => debug!("Skipping untranslated catalog row {:?}", record.position()),
            }
        }

        Ok(Self {
            language: language.to_string(),
            texts,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// The text for `identifier`, or the identifier itself.
    pub fn translate<'a>(&'a self, identifier: &'a str) -> &'a str {
        self.texts
            .get(identifier)
            .map(String::as_str)
            .unwrap_or(identifier)
    }

    /// Translate `identifier`, then fill its `{name}` placeholders.
    pub fn format(&self, identifier: &str, args: &[(&str, &str)]) -> String {
        fill(self.translate(identifier), args)
    }
}

/// Replace `{name}` placeholders with the matching argument.
///
/// Unknown placeholders are kept as written; substituted values are not
/// scanned again.
pub fn fill(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            args.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
