use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{ProcessingError, Result};

/// Field name under which a style's generated text is returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKey {
    Summary,
    Educational,
    Balanced,
    QaGeneration,
    Narrative,
}

impl ResultKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKey::Summary => "summary",
            ResultKey::Educational => "educational",
            ResultKey::Balanced => "balanced",
            ResultKey::QaGeneration => "qa_generation",
            ResultKey::Narrative => "narrative",
        }
    }
}

/// One row of the style catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleEntry {
    /// Name accepted in requests and echoed back in metadata
    pub display_name: &'static str,

    /// Name the processing engine understands
    pub engine_name: &'static str,

    pub result_key: ResultKey,
}

/// Supported styles, in declaration order
pub const STYLE_CATALOG: [StyleEntry; 5] = [
    StyleEntry {
        display_name: "Summary",
        engine_name: "Summary",
        result_key: ResultKey::Summary,
    },
    StyleEntry {
        display_name: "Educational",
        engine_name: "Educational",
        result_key: ResultKey::Educational,
    },
    StyleEntry {
        display_name: "Balanced",
        engine_name: "Balanced and Detailed",
        result_key: ResultKey::Balanced,
    },
    StyleEntry {
        display_name: "QA Generation",
        engine_name: "Q&A Generation",
        result_key: ResultKey::QaGeneration,
    },
    StyleEntry {
        display_name: "Narrative",
        engine_name: "Narrative Rewriting",
        result_key: ResultKey::Narrative,
    },
];

/// Generated text per style; unset fields are left out of the JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub educational: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balanced: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_generation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl StyleResults {
    fn slot(&mut self, key: ResultKey) -> &mut Option<String> {
        match key {
            ResultKey::Summary => &mut self.summary,
            ResultKey::Educational => &mut self.educational,
            ResultKey::Balanced => &mut self.balanced,
            ResultKey::QaGeneration => &mut self.qa_generation,
            ResultKey::Narrative => &mut self.narrative,
        }
    }

    pub fn get(&self, key: ResultKey) -> Option<&str> {
        match key {
            ResultKey::Summary => self.summary.as_deref(),
            ResultKey::Educational => self.educational.as_deref(),
            ResultKey::Balanced => self.balanced.as_deref(),
            ResultKey::QaGeneration => self.qa_generation.as_deref(),
            ResultKey::Narrative => self.narrative.as_deref(),
        }
    }

    pub fn contains(&self, key: ResultKey) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: ResultKey, content: String) {
        *self.slot(key) = Some(content);
    }

    pub fn len(&self) -> usize {
        STYLE_CATALOG
            .iter()
            .filter(|entry| self.contains(entry.result_key))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn find_by_display_name(name: &str) -> Option<&'static StyleEntry> {
    STYLE_CATALOG.iter().find(|entry| entry.display_name == name)
}

pub fn find_by_engine_name(name: &str) -> Option<&'static StyleEntry> {
    STYLE_CATALOG.iter().find(|entry| entry.engine_name == name)
}

pub fn engine_name_for(display_name: &str) -> Option<&'static str> {
    find_by_display_name(display_name).map(|entry| entry.engine_name)
}

pub fn result_key_for(engine_name: &str) -> Option<ResultKey> {
    find_by_engine_name(engine_name).map(|entry| entry.result_key)
}

/// Reject display names the catalog does not know
pub fn validate_display_names(requested: &[String]) -> Result<()> {
    let invalid: Vec<&str> = requested
        .iter()
        .map(String::as_str)
        .filter(|name| find_by_display_name(name).is_none())
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ProcessingError::validation(format!(
            "Invalid styles: {}.",
            invalid.join(", ")
        )))
    }
}

/// Translate requested display names into engine names the engine currently advertises.
///
/// Without an explicit request every catalog style the engine supports is selected.
pub fn resolve_styles(
    requested: Option<&[String]>,
    available: &HashSet<String>,
) -> Result<Vec<String>> {
    let Some(requested) = requested else {
        let resolved: Vec<String> = STYLE_CATALOG
            .iter()
            .filter(|entry| available.contains(entry.engine_name))
            .map(|entry| entry.engine_name.to_string())
            .collect();

        if resolved.is_empty() {
            return Err(ProcessingError::external(
                "No compatible styles returned by the API.",
            ));
        }
        return Ok(resolved);
    };

    validate_display_names(requested)?;

    let mut engine_styles: Vec<String> = Vec::with_capacity(requested.len());
    for engine_name in requested.iter().filter_map(|name| engine_name_for(name)) {
        if !engine_styles.iter().any(|style| style == engine_name) {
            engine_styles.push(engine_name.to_string());
        }
    }

    let unsupported: Vec<&str> = engine_styles
        .iter()
        .map(String::as_str)
        .filter(|style| !available.contains(*style))
        .collect();

    if !unsupported.is_empty() {
        return Err(ProcessingError::validation(format!(
            "Styles not supported by the API: {}.",
            unsupported.join(", ")
        )));
    }

    Ok(engine_styles)
}

/// Map engine names back to display names, passing through anything unknown
pub fn display_names_for(engine_styles: &[String]) -> Vec<String> {
    engine_styles
        .iter()
        .map(|style| {
            find_by_engine_name(style)
                .map(|entry| entry.display_name.to_string())
                .unwrap_or_else(|| style.clone())
        })
        .collect()
}

/// First catalog engine name contained in `filename`, ignoring ASCII case
pub fn detect_engine_style(filename: &str) -> Option<&'static StyleEntry> {
    let lower_name = filename.to_ascii_lowercase();
    STYLE_CATALOG
        .iter()
        .find(|entry| lower_name.contains(&entry.engine_name.to_ascii_lowercase()))
}

/// Remove every catalog engine name from `text`, ignoring ASCII case.
///
/// Repeats until nothing matches, so removals cannot splice a new name together.
pub fn strip_engine_names(text: &str) -> String {
    let mut stripped = text.to_string();
    loop {
        let lower = stripped.to_ascii_lowercase();
        let found = STYLE_CATALOG.iter().find_map(|entry| {
            let name = entry.engine_name.to_ascii_lowercase();
            lower.find(&name).map(|index| (index, name.len()))
        });
        let Some((index, len)) = found else {
            return stripped;
        };
        stripped.replace_range(index..index + len, " ");
    }
}
