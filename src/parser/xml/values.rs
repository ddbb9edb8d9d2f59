use super::{XmlDocument, XmlElement};
use std::ops::Range;

/// Map a values-file tag (and `<item type="...">`) to its resource type
pub fn resource_type_for(element: &XmlElement) -> Option<&str> {
    match element.tag.as_str() {
        "string" => Some("string"),
        "color" => Some("color"),
        "dimen" => Some("dimen"),
        "style" => Some("style"),
        "string-array" | "integer-array" | "array" => Some("array"),
        "plurals" => Some("plurals"),
        "bool" => Some("bool"),
        "integer" => Some("integer"),
        "attr" => Some("attr"),
        "fraction" => Some("fraction"),
        "drawable" => Some("drawable"),
        "declare-styleable" => Some("styleable"),
        "item" => element.attribute("type").map(|a| a.value.as_str()),
        _ => None,
    }
}

/// A named definition inside a `<resources>` document
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    pub resource_type: String,

    /// Name as written
    pub name: String,

    /// Range of the whole `name="..."` attribute
    pub name_range: Range<usize>,

    pub element: XmlElement,
}

impl ResourceDefinition {
    /// Name with `.`, `-` and `:` folded to `_`, the form used in `R` fields
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.replace(['.', '-', ':'], "_")
}

/// Definitions of one values XML file
#[derive(Debug, Clone, Default)]
pub struct ValuesFile {
    pub definitions: Vec<ResourceDefinition>,
}

impl ValuesFile {
    pub fn from_document(doc: &XmlDocument) -> Self {
        if doc.root.tag != "resources" {
            return Self::default();
        }

        let definitions = doc
            .root
            .children
            .iter()
            .filter_map(|element| {
                let resource_type = resource_type_for(element)?;
                let name = element.attribute("name")?;
                Some(ResourceDefinition {
                    resource_type: resource_type.to_string(),
                    name: name.value.clone(),
                    name_range: name.range.clone(),
                    element: element.clone(),
                })
            })
            .collect();

        Self { definitions }
    }

    pub fn strings(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.definitions.iter().filter(|d| d.resource_type == "string")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_definitions() {
        let xml = r#"<resources>
    <string name="app.name">App</string>
    <color name="red">#f00</color>
    <item type="id" name="button" />
    <string-array name="planets"><item>Mercury</item></string-array>
    <declare-styleable name="Custom"><attr name="size" format="dimension"/></declare-styleable>
    <eat-comment />
</resources>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let values = ValuesFile::from_document(&doc);

        let types: Vec<_> = values.definitions.iter().map(|d| d.resource_type.as_str()).collect();
        assert_eq!(types, vec!["string", "color", "id", "array", "styleable"]);
        assert_eq!(values.definitions[0].normalized_name(), "app_name");
        assert_eq!(&xml[values.definitions[1].name_range.clone()], r#"name="red""#);
        assert_eq!(values.strings().count(), 1);
    }

    #[test]
    fn test_non_resources_root() {
        let doc = XmlDocument::parse("<LinearLayout />").unwrap();
        assert!(ValuesFile::from_document(&doc).definitions.is_empty());
    }
}
