//! Dataset text metadata and tag lookup.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A DICOM attribute tag: (group, element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(pub u16, pub u16);

impl TagId {
    pub const PATIENT_NAME: TagId = TagId(0x0010, 0x0010);
    pub const PATIENT_ID: TagId = TagId(0x0010, 0x0020);
    pub const STUDY_DATE: TagId = TagId(0x0008, 0x0020);
    pub const MODALITY: TagId = TagId(0x0008, 0x0060);
    pub const STUDY_DESCRIPTION: TagId = TagId(0x0008, 0x1030);
    pub const ROWS: TagId = TagId(0x0028, 0x0010);
    pub const COLUMNS: TagId = TagId(0x0028, 0x0011);
    pub const WINDOW_CENTER: TagId = TagId(0x0028, 0x1050);
    pub const PIXEL_DATA: TagId = TagId(0x7FE0, 0x0010);

    /// Group number.
    pub fn group(self) -> u16 {
        self.0
    }

    /// Element number.
    pub fn element(self) -> u16 {
        self.1
    }

    /// Parse `GGGG,EEEE`, `(GGGG,EEEE)` or `GGGGEEEE` (hex).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('(').trim_end_matches(')');
        let (group, element) = match s.split_once(',') {
            Some((g, e)) => (g.trim(), e.trim()),
            None if s.len() == 8 => (s.get(..4)?, s.get(4..)?),
            None => return None,
        };
        Some(TagId(
            u16::from_str_radix(group, 16).ok()?,
            u16::from_str_radix(element, 16).ok()?,
        ))
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl Serialize for TagId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<dicom_core::Tag> for TagId {
    fn from(tag: dicom_core::Tag) -> Self {
        TagId(tag.0, tag.1)
    }
}

impl From<TagId> for dicom_core::Tag {
    fn from(tag: TagId) -> Self {
        dicom_core::Tag(tag.0, tag.1)
    }
}

/// A person name split into its three component groups.
///
/// Each group uses `^` between family, given, middle, prefix and suffix names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientName {
    pub alphabetic: String,
    pub ideographic: String,
    pub phonetic: String,
}

impl PatientName {
    pub fn new(
        alphabetic: impl Into<String>,
        ideographic: impl Into<String>,
        phonetic: impl Into<String>,
    ) -> Self {
        Self {
            alphabetic: alphabetic.into(),
            ideographic: ideographic.into(),
            phonetic: phonetic.into(),
        }
    }

    /// Placeholder shown when a dataset carries no patient name.
    pub fn undefined() -> Self {
        Self::new("Undefined", "", "")
    }

    /// Split a PN value on `=` into its component groups.
    pub fn parse(value: &str) -> Self {
        let mut groups = value.trim_end_matches(['\0', ' ']).splitn(3, '=');
        Self::new(
            groups.next().unwrap_or_default().trim(),
            groups.next().unwrap_or_default().trim(),
            groups.next().unwrap_or_default().trim(),
        )
    }

    /// The alphabetic group as "Given Family" for display.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = self.alphabetic.split('^').map(str::trim).collect();
        match parts.as_slice() {
            [family, given, ..] if !given.is_empty() => format!("{} {}", given, family),
            [family, ..] => family.to_string(),
            [] => String::new(),
        }
    }
}

/// Text values of a dataset's elements, keyed by tag.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    elements: BTreeMap<TagId, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the text value of an element, replacing any previous value.
    pub fn insert(&mut self, tag: TagId, value: impl Into<String>) {
        self.elements.insert(tag, value.into());
    }

    /// Text of `tag`, if present.
    pub fn get(&self, tag: TagId) -> Option<&str> {
        self.elements.get(&tag).map(String::as_str)
    }

    /// Text of `tag`, or `default` when the dataset lacks it.
    pub fn text(&self, tag: TagId, default: &str) -> String {
        self.get(tag).unwrap_or(default).to_string()
    }

    /// The patient name, or `default` when absent.
    pub fn patient_name(&self, default: &PatientName) -> PatientName {
        match self.get(TagId::PATIENT_NAME) {
            Some(value) => PatientName::parse(value),
            None => default.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TagId, &str)> {
        self.elements.iter().map(|(tag, v)| (*tag, v.as_str()))
    }

    /// Keep only the listed tags.
    pub fn select(&self, tags: &[TagId]) -> Metadata {
        let elements = tags
            .iter()
            .filter_map(|tag| self.elements.get(tag).map(|v| (*tag, v.clone())))
            .collect();
        Metadata { elements }
    }
}

impl FromIterator<(TagId, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (TagId, String)>>(iter: I) -> Self {
        Metadata {
            elements: iter.into_iter().collect(),
        }
    }
}
