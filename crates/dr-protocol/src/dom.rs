use serde::{Deserialize, Deserializer, Serialize};

/// A page element reported by an agent.
///
/// Every field is optional on the wire: a missing key or an explicit
/// `null` leaves the zero value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DomInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tag_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub class: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text_content: String,
    #[serde(deserialize_with = "null_as_default")]
    pub xpath: String,
    #[serde(deserialize_with = "null_as_default")]
    pub css_selector: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bounding_box: BoundingBox,
}

/// Position and size of an element in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    #[serde(deserialize_with = "null_as_default")]
    pub x: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub y: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub width: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub height: f64,
}

impl DomInfo {
    /// `tag#id.class` label used in log lines.
    pub fn label(&self) -> String {
        let mut label = self.tag_name.clone();
        if !self.id.is_empty() {
            label.push('#');
            label.push_str(&self.id);
        }
        if !self.class.is_empty() {
            label.push('.');
            label.push_str(&self.class);
        }
        label
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
