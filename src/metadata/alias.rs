//! Alias descriptors.

use crate::content::{CompressedContent, ContentParams, parse_compressed};
use crate::core::{ContentError, DecodeError, Readable, ToContent, Writeable};
use crate::wire::{StreamInput, StreamOutput};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Aliases keyed by alias name.
pub type AliasMap = BTreeMap<String, AliasMetadata>;

/// An alias attached to the indices a template creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasMetadata {
    alias: String,
    filter: Option<CompressedContent>,
    index_routing: Option<String>,
    search_routing: Option<String>,
    write_index: Option<bool>,
    hidden: Option<bool>,
}

impl AliasMetadata {
    /// Start building an alias.
    pub fn builder(alias: impl Into<String>) -> AliasBuilder {
        AliasBuilder {
            inner: AliasMetadata {
                alias: alias.into(),
                filter: None,
                index_routing: None,
                search_routing: None,
                write_index: None,
                hidden: None,
            },
        }
    }

    /// Alias name; the key this alias is stored under.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Filter query, if any.
    pub fn filter(&self) -> Option<&CompressedContent> {
        self.filter.as_ref()
    }

    /// Routing for index operations.
    pub fn index_routing(&self) -> Option<&str> {
        self.index_routing.as_deref()
    }

    /// Routing for search operations.
    pub fn search_routing(&self) -> Option<&str> {
        self.search_routing.as_deref()
    }

    /// Whether this alias is the write index.
    pub fn write_index(&self) -> Option<bool> {
        self.write_index
    }

    /// Whether this alias is hidden.
    pub fn hidden(&self) -> Option<bool> {
        self.hidden
    }

    /// Parse the body of an alias entry (`"name": { ... }`).
    pub fn from_content(alias: &str, body: &Value) -> Result<Self, ContentError> {
        let Value::Object(object) = body else {
            return Err(ContentError::unexpected(alias, body));
        };
        let mut builder = AliasMetadata::builder(alias);
        for (key, value) in object {
            builder = match key.as_str() {
                "filter" => builder.filter(parse_compressed("filter", value)?),
                "routing" => {
                    let routing = routing_value(key, value)?;
                    builder.index_routing(routing.clone()).search_routing(routing)
                }
                "index_routing" => builder.index_routing(routing_value(key, value)?),
                "search_routing" => builder.search_routing(routing_value(key, value)?),
                "is_write_index" => builder.write_index(bool_value(key, value)?),
                "is_hidden" => builder.hidden(bool_value(key, value)?),
                _ => {
                    return Err(ContentError::UnknownField {
                        object: "alias",
                        field: key.clone(),
                    });
                }
            };
        }
        Ok(builder.build())
    }

    /// Parse an `aliases` object into a map keyed by alias name.
    pub fn map_from_content(value: &Value) -> Result<AliasMap, ContentError> {
        let Value::Object(object) = value else {
            return Err(ContentError::unexpected("aliases", value));
        };
        object
            .iter()
            .map(|(name, body)| {
                let alias = AliasMetadata::from_content(name, body)?;
                Ok((alias.alias().to_string(), alias))
            })
            .collect()
    }
}

fn routing_value(key: &str, value: &Value) -> Result<String, ContentError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ContentError::unexpected(key, other)),
    }
}

fn bool_value(key: &str, value: &Value) -> Result<bool, ContentError> {
    value.as_bool().ok_or_else(|| ContentError::unexpected(key, value))
}

impl ToContent for AliasMetadata {
    /// Renders the alias body; the caller places it under the alias name.
    fn to_content(&self, params: &ContentParams) -> Result<Value, ContentError> {
        let mut object = Map::new();
        if let Some(filter) = &self.filter {
            let rendered = if params.expand_compressed() {
                filter.to_json()?
            } else {
                Value::String(STANDARD.encode(filter.compressed()))
            };
            object.insert("filter".to_string(), rendered);
        }
        if let Some(routing) = &self.index_routing {
            object.insert("index_routing".to_string(), Value::String(routing.clone()));
        }
        if let Some(routing) = &self.search_routing {
            object.insert("search_routing".to_string(), Value::String(routing.clone()));
        }
        if let Some(write_index) = self.write_index {
            object.insert("is_write_index".to_string(), Value::Bool(write_index));
        }
        if let Some(hidden) = self.hidden {
            object.insert("is_hidden".to_string(), Value::Bool(hidden));
        }
        Ok(Value::Object(object))
    }
}

impl Writeable for AliasMetadata {
    fn write_to(&self, out: &mut StreamOutput) {
        out.write_string(&self.alias);
        out.write_optional(self.filter.as_ref());
        out.write_optional_string(self.index_routing.as_deref());
        out.write_optional_string(self.search_routing.as_deref());
        out.write_optional_bool(self.write_index);
        out.write_optional_bool(self.hidden);
    }
}

impl Readable for AliasMetadata {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            alias: input.read_string()?,
            filter: input.read_optional()?,
            index_routing: input.read_optional_string()?,
            search_routing: input.read_optional_string()?,
            write_index: input.read_optional_bool()?,
            hidden: input.read_optional_bool()?,
        })
    }
}

/// Builder for [`AliasMetadata`].
#[derive(Debug)]
pub struct AliasBuilder {
    inner: AliasMetadata,
}

impl AliasBuilder {
    /// Set the filter query.
    pub fn filter(mut self, filter: CompressedContent) -> Self {
        self.inner.filter = Some(filter);
        self
    }

    /// Set both index and search routing.
    pub fn routing(self, routing: impl Into<String>) -> Self {
        let routing = routing.into();
        self.index_routing(routing.clone()).search_routing(routing)
    }

    /// Set index routing.
    pub fn index_routing(mut self, routing: impl Into<String>) -> Self {
        self.inner.index_routing = Some(routing.into());
        self
    }

    /// Set search routing.
    pub fn search_routing(mut self, routing: impl Into<String>) -> Self {
        self.inner.search_routing = Some(routing.into());
        self
    }

    /// Mark as write index.
    pub fn write_index(mut self, write_index: bool) -> Self {
        self.inner.write_index = Some(write_index);
        self
    }

    /// Mark as hidden.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.inner.hidden = Some(hidden);
        self
    }

    /// Build the alias.
    pub fn build(self) -> AliasMetadata {
        self.inner
    }
}
