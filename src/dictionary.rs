use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::error::{Error, Result};

/// Key of the metadata object inside a dictionary file.
pub const INFO_KEY: &str = "info";

/// Optional metadata block of a dictionary file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DictionaryInfo {
    pub fn is_empty(&self) -> bool {
        *self == DictionaryInfo::default()
    }
}

/// Rule list as stored on disk: a JSON object whose string members are
/// `pattern -> replacement` rules in file order, plus an optional `info`
/// object.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    path: Option<PathBuf>,
    pub info: DictionaryInfo,
    rules: Vec<(String, String)>,
}

impl Dictionary {
    pub fn new(info: DictionaryInfo) -> Self {
        Dictionary {
            path: None,
            info,
            rules: Vec::new(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut dict = Self::from_json(&content)?;
        dict.path = Some(path.to_path_buf());
        debug!("loaded dictionary {:?}: {} rules", path, dict.len());
        Ok(dict)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let Value::Object(members) = serde_json::from_str::<Value>(content)? else {
            return Err(Error::Dictionary(
                "top level must be a JSON object".to_string(),
            ));
        };

        let mut dict = Dictionary::default();
        for (key, value) in members {
            match value {
                Value::String(replacement) => dict.rules.push((key, replacement)),
                Value::Object(info) if key == INFO_KEY => {
                    dict.info = serde_json::from_value(Value::Object(info))?;
                }
                other => warn!("skipping dictionary member {:?}: not a string ({})", key, other),
            }
        }
        Ok(dict)
    }

    pub fn to_json(&self) -> Result<String> {
        let mut members = Map::new();
        if !self.info.is_empty() {
            if self.rules.iter().any(|(pattern, _)| pattern == INFO_KEY) {
                return Err(Error::Dictionary(format!(
                    "rule pattern {:?} collides with the metadata block",
                    INFO_KEY
                )));
            }
            members.insert(INFO_KEY.to_string(), serde_json::to_value(&self.info)?);
        }
        for (pattern, replacement) in &self.rules {
            members.insert(pattern.clone(), Value::String(replacement.clone()));
        }
        Ok(serde_json::to_string_pretty(&Value::Object(members))?)
    }

    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        debug!("wrote dictionary {:?}: {} rules", path, self.len());
        Ok(())
    }

    /// Adds a rule, replacing the replacement of an identical raw pattern.
    pub fn insert(&mut self, pattern: impl Into<String>, replacement: impl Into<String>) {
        let pattern = pattern.into();
        let replacement = replacement.into();
        match self.rules.iter_mut().find(|(p, _)| *p == pattern) {
            Some(rule) => rule.1 = replacement,
            None => self.rules.push((pattern, replacement)),
        }
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(p, r)| (p.as_str(), r.as_str()))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn engine(&self) -> Result<Engine> {
        Engine::build(self.pairs())
    }
}
