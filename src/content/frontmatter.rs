//! Front-matter parsing

use indexmap::IndexMap;
use serde_yaml::Value;

/// Front-matter fields in the order the author wrote them
pub type Metadata = IndexMap<String, Value>;

const DELIMITER: &str = "---";

#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("missing closing `---` delimiter")]
    Unterminated,

    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("expected a mapping of keys to values")]
    NotAMapping,

    #[error("unsupported key {0:?}")]
    UnsupportedKey(Value),
}

/// Front-matter data from a post
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub metadata: Metadata,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let Some(rest) = strip_delimiter_line(content) else {
            return Ok((FrontMatter::default(), content));
        };

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end() == DELIMITER {
                let yaml = &rest[..offset];
                let body = &rest[offset + line.len()..];
                return Ok((Self::parse_yaml(yaml)?, body));
            }
            offset += line.len();
        }

        Err(FrontMatterError::Unterminated)
    }

    fn parse_yaml(yaml: &str) -> Result<Self, FrontMatterError> {
        if yaml.trim().is_empty() {
            return Ok(FrontMatter::default());
        }

        let mapping = match serde_yaml::from_str::<Value>(yaml)? {
            Value::Null => return Ok(FrontMatter::default()),
            Value::Mapping(mapping) => mapping,
            _ => return Err(FrontMatterError::NotAMapping),
        };

        let mut metadata = Metadata::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => return Err(FrontMatterError::UnsupportedKey(other)),
            };
            metadata.insert(key, value);
        }

        Ok(Self { metadata })
    }

    /// Look up a field as a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// If the text opens with a `---` line, return what follows that line
fn strip_delimiter_line(content: &str) -> Option<&str> {
    let (first, rest) = match content.find('\n') {
        Some(pos) => (&content[..pos], &content[pos + 1..]),
        None => (content, ""),
    };
    (first.trim_end() == DELIMITER).then_some(rest)
}
