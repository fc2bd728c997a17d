//! Question records and header metadata
//!
//! Questions arrive from an upstream selection step as a JSON document. The
//! document may be a bare array, an object carrying `selectedQuestions`, or
//! `null`; anything that does not name a collection degrades to an empty one.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One exam item with optional multiple-choice options and its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within a collection
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Question prompt
    pub text: String,
    /// Options in display order (lettered A, B, C...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Answer text, shown only in the answers variant
    #[serde(default)]
    pub answer: String,
}

impl Question {
    /// Options as a slice, empty when the question has none
    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or(&[])
    }
}

// Ids show up as numbers or strings depending on the upstream source
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer question id")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Free-form header text shown at the top of both documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderMetadata {
    pub school_name: String,
    pub subject: String,
    pub date: String,
    pub watermark: String,
}

/// Names of the editable header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    SchoolName,
    Subject,
    Date,
    Watermark,
}

impl HeaderField {
    /// Look a field up by its form name (`schoolName`, `subject`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "schoolName" | "school_name" => Some(Self::SchoolName),
            "subject" => Some(Self::Subject),
            "date" => Some(Self::Date),
            "watermark" => Some(Self::Watermark),
            _ => None,
        }
    }
}

impl HeaderMetadata {
    /// Replace one field's value
    pub fn set(&mut self, field: HeaderField, value: impl Into<String>) {
        let value = value.into();
        match field {
            HeaderField::SchoolName => self.school_name = value,
            HeaderField::Subject => self.subject = value,
            HeaderField::Date => self.date = value,
            HeaderField::Watermark => self.watermark = value,
        }
    }

    /// Current value of one field
    pub fn get(&self, field: HeaderField) -> &str {
        match field {
            HeaderField::SchoolName => &self.school_name,
            HeaderField::Subject => &self.subject,
            HeaderField::Date => &self.date,
            HeaderField::Watermark => &self.watermark,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionFile {
    List(Vec<Question>),
    State {
        #[serde(rename = "selectedQuestions", default)]
        selected_questions: Option<Vec<Question>>,
    },
}

/// Parse a question collection from JSON
///
/// Returns `None` when the document does not carry a collection (`null`, or
/// an object without `selectedQuestions`).
pub fn parse_questions(json: &str) -> Result<Option<Vec<Question>>> {
    let file: Option<QuestionFile> = serde_json::from_str(json)?;
    Ok(match file {
        Some(QuestionFile::List(questions)) => Some(questions),
        Some(QuestionFile::State { selected_questions }) => selected_questions,
        None => None,
    })
}

/// Load a question collection from a JSON file
pub fn load_questions(path: &Path) -> Result<Option<Vec<Question>>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    parse_questions(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[{"id": 1, "text": "2+2=?", "options": ["3", "4", "5"], "answer": "4"}]"#;
        let questions = parse_questions(json).unwrap().unwrap();

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "1");
        assert_eq!(questions[0].options(), &["3", "4", "5"]);
        assert_eq!(questions[0].answer, "4");
    }

    #[test]
    fn test_parse_string_id_and_missing_options() {
        let json = r#"[{"id": "q-7", "text": "Name a prime", "answer": "7"}]"#;
        let questions = parse_questions(json).unwrap().unwrap();

        assert_eq!(questions[0].id, "q-7");
        assert!(questions[0].options.is_none());
        assert!(questions[0].options().is_empty());
    }

    #[test]
    fn test_parse_null_options() {
        let json = r#"[{"id": 2, "text": "Explain", "options": null, "answer": "..."}]"#;
        let questions = parse_questions(json).unwrap().unwrap();
        assert!(questions[0].options().is_empty());
    }

    #[test]
    fn test_parse_navigation_state() {
        let json = r#"{"selectedQuestions": [{"id": 3, "text": "x", "answer": "y"}]}"#;
        let questions = parse_questions(json).unwrap().unwrap();
        assert_eq!(questions.len(), 1);

        assert_eq!(parse_questions(r#"{}"#).unwrap(), None);
        assert_eq!(parse_questions("null").unwrap(), None);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_questions("[{\"id\": 1");
        assert!(matches!(result.unwrap_err(), Error::Json(_)));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_questions(Path::new("nonexistent.json"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_header_defaults_to_empty() {
        let header = HeaderMetadata::default();
        assert_eq!(header.school_name, "");
        assert_eq!(header.subject, "");
        assert_eq!(header.date, "");
        assert_eq!(header.watermark, "");

        let partial: HeaderMetadata =
            serde_json::from_str(r#"{"schoolName": "Lincoln High"}"#).unwrap();
        assert_eq!(partial.school_name, "Lincoln High");
        assert_eq!(partial.subject, "");
    }

    #[test]
    fn test_header_set_by_field_name() {
        let mut header = HeaderMetadata::default();
        let field = HeaderField::from_name("schoolName").unwrap();
        header.set(field, "Lincoln High");

        assert_eq!(header.get(HeaderField::SchoolName), "Lincoln High");
        assert_eq!(HeaderField::from_name("colour"), None);
    }
}
