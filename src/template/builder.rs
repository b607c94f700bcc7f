//! Staging builder for [`Template`].

use super::template::Template;
use crate::content::CompressedContent;
use crate::core::{ResettableValue, ValidationError};
use crate::metadata::{AliasMap, AliasMetadata, DataStreamOptionsTemplate, LifecycleTemplate, Settings};

/// Mutable staging area mirroring the five template fragments.
///
/// Data stream options start undefined. Use
/// [`TemplateBuilder::resettable_data_stream_options`] to stage an explicit
/// reset; [`TemplateBuilder::data_stream_options`] lifts `None` to undefined.
#[derive(Debug, Clone, Default)]
pub struct TemplateBuilder {
    settings: Option<Settings>,
    mappings: Option<CompressedContent>,
    aliases: Option<AliasMap>,
    lifecycle: Option<LifecycleTemplate>,
    data_stream_options: ResettableValue<DataStreamOptionsTemplate>,
}

impl TemplateBuilder {
    /// Stage settings.
    pub fn settings(mut self, settings: Option<Settings>) -> Self {
        self.settings = settings;
        self
    }

    /// Stage a mapping blob.
    pub fn mappings(mut self, mappings: Option<CompressedContent>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Stage the full alias map.
    pub fn aliases(mut self, aliases: Option<AliasMap>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Add one alias, creating the map if needed.
    pub fn alias(mut self, alias: AliasMetadata) -> Self {
        self.aliases
            .get_or_insert_with(AliasMap::new)
            .insert(alias.alias().to_string(), alias);
        self
    }

    /// Stage a lifecycle.
    pub fn lifecycle(mut self, lifecycle: Option<LifecycleTemplate>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Stage plain options; `None` stages undefined.
    pub fn data_stream_options(mut self, options: Option<DataStreamOptionsTemplate>) -> Self {
        self.data_stream_options = ResettableValue::create(options);
        self
    }

    /// Stage the options tri-state as given.
    pub fn resettable_data_stream_options(
        mut self,
        options: ResettableValue<DataStreamOptionsTemplate>,
    ) -> Self {
        self.data_stream_options = options;
        self
    }

    /// Build through [`Template::new`].
    pub fn build(self) -> Result<Template, ValidationError> {
        Template::new(
            self.settings,
            self.mappings,
            self.aliases,
            self.lifecycle,
            self.data_stream_options,
        )
    }
}

impl From<&Template> for TemplateBuilder {
    fn from(template: &Template) -> Self {
        Self {
            settings: template.settings().cloned(),
            mappings: template.mappings().cloned(),
            aliases: template.aliases().cloned(),
            lifecycle: template.lifecycle().cloned(),
            data_stream_options: template.resettable_data_stream_options().clone(),
        }
    }
}
