//! Content resolution for item sections

use serde::Serialize;

use super::models::Item;

/// A reviewable section of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDescriptor {
    pub key: String,
    pub label: String,
}

/// Knows which sections an item has and what they currently render to
pub trait ContentResolver {
    /// Current rendered content of a section, if it has any
    fn section_content(&self, item: &Item, key: &str) -> Option<String>;

    /// All sections of the item that can be reviewed
    fn sections(&self, item: &Item) -> Vec<SectionDescriptor>;
}

impl<R: ContentResolver + ?Sized> ContentResolver for &R {
    fn section_content(&self, item: &Item, key: &str) -> Option<String> {
        (**self).section_content(item, key)
    }

    fn sections(&self, item: &Item) -> Vec<SectionDescriptor> {
        (**self).sections(item)
    }
}

/// Resolves sections straight from the item's `sections` map
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemSectionResolver;

impl ContentResolver for ItemSectionResolver {
    fn section_content(&self, item: &Item, key: &str) -> Option<String> {
        item.sections
            .get(key)
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    fn sections(&self, item: &Item) -> Vec<SectionDescriptor> {
        item.sections
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(key, _)| SectionDescriptor {
                key: key.clone(),
                label: label_for(key),
            })
            .collect()
    }
}

/// "clinical_features" -> "Clinical features"
fn label_for(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_sections_are_skipped() {
        let item = Item::new("Gout")
            .with_section("clinical_features", "Podagra")
            .with_section("etiology", "   ");

        let resolver = ItemSectionResolver;
        let sections = resolver.sections(&item);
        assert_eq!(
            sections,
            vec![SectionDescriptor {
                key: "clinical_features".to_string(),
                label: "Clinical features".to_string(),
            }]
        );
        assert_eq!(resolver.section_content(&item, "etiology"), None);
        assert_eq!(resolver.section_content(&item, "missing"), None);
        assert_eq!(
            resolver.section_content(&item, "clinical_features").as_deref(),
            Some("Podagra")
        );
    }

    #[test]
    fn test_label_for() {
        assert_eq!(label_for("mechanism-of-action"), "Mechanism of action");
        assert_eq!(label_for("x"), "X");
    }
}
