use super::{hotel, shop};
use rand::RngCore;
use serde::Serialize;
use std::collections::HashMap;

/// Request arguments, in the order they are sent.
pub type Params = Vec<(&'static str, String)>;

/// Builds the arguments of one request.
pub type ArgGenerator = fn(&mut dyn RngCore, Encoding) -> Params;

/// How argument values are rendered on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Strings are sent as-is; everything else as JSON.
    Original,
    /// Every value is JSON encoded, strings included.
    Json,
}

impl Encoding {
    pub fn new(is_original: bool) -> Self {
        if is_original {
            Encoding::Original
        } else {
            Encoding::Json
        }
    }

    pub fn text(self, value: &str) -> String {
        match self {
            Encoding::Original => value.to_string(),
            Encoding::Json => json(&value),
        }
    }

    pub fn value<T: Serialize + ?Sized>(self, value: &T) -> String {
        json(value)
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Operation name to argument generator, fixed once the workload is built.
#[derive(Clone, Default)]
pub struct Registry {
    generators: HashMap<String, ArgGenerator>,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// All generators shipped with surge.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, generator) in shop::GENERATORS.iter().chain(hotel::GENERATORS) {
            registry.register(*name, *generator);
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, generator: ArgGenerator) -> &mut Self {
        self.generators.insert(name.into(), generator);
        self
    }

    pub fn get(&self, name: &str) -> Option<ArgGenerator> {
        self.generators.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.generators.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("generators", &names).finish()
    }
}
