//! Experiment configurations.
//!
//! An experiment has a mapping of default hyperparameters and a table of named
//! variants, each a partial mapping patched on top of the defaults. A run requests a
//! sequence of variants; later ones override equally named keys of earlier ones and
//! of the defaults.
//!
//! By default a patch replaces the value of each of its keys wholesale, including
//! mappings: patching `{"a": {"x": 1, "y": 2}}` with `{"a": {"x": 3}}` yields
//! `{"a": {"x": 3}}`. [`MergeMode::Recursive`] merges mappings key-wise instead.
pub mod train_adversarial;
use crate::ConfigError;
use anyhow::Result;
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{Read, Write},
    path::Path,
};

/// Named hyperparameters.
pub type ConfigMap = Map<String, Value>;

/// How a patch is applied to a configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeMode {
    /// Each key of the patch replaces the value in the configuration.
    Shallow,

    /// Mappings are merged key-wise; other values are replaced.
    Recursive,
}

impl Default for MergeMode {
    fn default() -> Self {
        Self::Shallow
    }
}

/// Applies `patch` on `config`.
pub fn merge(config: &mut ConfigMap, patch: &ConfigMap, mode: MergeMode) {
    for (k, v) in patch.iter() {
        if mode == MergeMode::Recursive {
            if let (Some(Value::Object(dst)), Value::Object(src)) = (config.get_mut(k), v) {
                merge(dst, src, mode);
                continue;
            }
        }
        config.insert(k.clone(), v.clone());
    }
}

/// A named partial configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Variant {
    /// One-line description.
    pub doc: String,

    /// Keys overridden by the variant.
    pub patch: ConfigMap,
}

/// Defaults and named variants of an experiment.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigSet {
    name: String,
    defaults: ConfigMap,
    variants: BTreeMap<String, Variant>,
}

impl ConfigSet {
    /// A configuration set without variants.
    pub fn new(name: impl Into<String>, defaults: ConfigMap) -> Self {
        Self {
            name: name.into(),
            defaults,
            variants: BTreeMap::new(),
        }
    }

    /// Adds a variant.
    pub fn variant(
        mut self,
        name: impl Into<String>,
        doc: impl Into<String>,
        patch: ConfigMap,
    ) -> Self {
        let variant = Variant {
            doc: doc.into(),
            patch,
        };
        self.variants.insert(name.into(), variant);
        self
    }

    /// Name of the experiment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default configuration.
    pub fn defaults(&self) -> &ConfigMap {
        &self.defaults
    }

    /// Variants sorted by name.
    pub fn variants(&self) -> impl Iterator<Item = (&str, &Variant)> {
        self.variants.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the variant `name`.
    pub fn get_variant(&self, name: &str) -> Result<&Variant> {
        self.variants.get(name).ok_or_else(|| {
            let available: Vec<&str> = self.variants.keys().map(|k| k.as_str()).collect();
            ConfigError::UnknownVariant {
                name: name.to_string(),
                available: available.join(", "),
            }
            .into()
        })
    }

    /// Applies the variants `names`, in order, on the defaults.
    ///
    /// All names are checked before any variant is applied.
    pub fn apply_variants<S: AsRef<str>>(&self, names: &[S], mode: MergeMode) -> Result<ConfigMap> {
        let variants = names
            .iter()
            .map(|name| self.get_variant(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut config = self.defaults.clone();
        for variant in variants {
            merge(&mut config, &variant.patch, mode);
        }
        Ok(config)
    }
}

/// Parses an update of the form `key=value`.
///
/// The key may address nested mappings with dots, as in `init_trainer_kwargs.num_vec=4`.
/// The value is parsed as YAML, so `4` is a number, `true` a boolean, `[32, 32]` a
/// list, `null` a null, and anything else not valid YAML is taken as a string.
pub fn parse_update(update: &str) -> Result<(String, Value)> {
    let (key, value) = match update.find('=') {
        Some(i) => (update[..i].trim(), update[i + 1..].trim()),
        None => return Err(ConfigError::InvalidUpdate(update.to_string()).into()),
    };
    if key.is_empty() {
        return Err(ConfigError::InvalidUpdate(update.to_string()).into());
    }
    let value = if value.is_empty() {
        Value::String(String::new())
    } else {
        serde_yaml::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
    };
    Ok((key.to_string(), value))
}

/// Sets `value` at the dotted `key`, creating intermediate mappings as needed.
pub fn set_nested(config: &mut ConfigMap, key: &str, value: Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = match parts.split_last() {
        Some(x) => x,
        None => return Err(ConfigError::InvalidUpdate(key.to_string()).into()),
    };

    let mut curr = config;
    for (i, part) in parents.iter().enumerate() {
        let entry = curr
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        curr = match entry {
            Value::Object(m) => m,
            _ => {
                return Err(ConfigError::NotAMapping {
                    key: key.to_string(),
                    at: parts[..=i].join("."),
                }
                .into())
            }
        };
    }
    curr.insert(last.to_string(), value);
    Ok(())
}

/// Applies updates of the form `key=value`, see [`parse_update`].
pub fn apply_updates<S: AsRef<str>>(config: &mut ConfigMap, updates: &[S]) -> Result<()> {
    for update in updates {
        let (key, value) = parse_update(update.as_ref())?;
        set_nested(config, &key, value)?;
    }
    Ok(())
}

/// Reads a configuration from a YAML file. An empty file is an empty configuration.
pub fn load_config_map(path: impl AsRef<Path>) -> Result<ConfigMap> {
    let mut s = String::new();
    File::open(path)?.read_to_string(&mut s)?;
    if s.trim().is_empty() {
        return Ok(ConfigMap::new());
    }
    let value: Value = serde_yaml::from_str(&s)?;
    match value {
        Value::Object(m) => Ok(m),
        Value::Null => Ok(ConfigMap::new()),
        _ => Err(ConfigError::NotAMappingFile.into()),
    }
}

/// Writes a configuration to a YAML file.
pub fn save_config_map(path: impl AsRef<Path>, config: &ConfigMap) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(serde_yaml::to_string(config)?.as_bytes())?;
    Ok(())
}
