//! Tantivy schema for rendered pages.
//!
//! # Schema Fields
//!
//! | Field | Options | Purpose |
//! |-------|---------|---------|
//! | `id` | STRING \| STORED | Node id, the document key |
//! | `__IndexType` | STRING \| STORED | Logical content category |
//! | `nodeName` | TEXT \| STORED | Page name, the default title |
//! | `nodeTypeAlias` | STRING \| STORED | Document type alias |
//! | full-text field | TEXT \| STORED | Extracted page text (name configurable) |
//! | path field | TEXT \| STORED | Ancestor ids, one token each (name configurable) |
//! | `__properties` | JSON TEXT \| STORED | Every other document field, keyed by name |
//!
//! Queries on a field name outside the fixed set search the matching key
//! of `__properties`.

use pagesearch_core::{
    ID_FIELD, INDEX_TYPE_FIELD, NODE_NAME_FIELD, NODE_TYPE_ALIAS_FIELD, SearchConfig,
};
use tantivy::schema::{Field, STORED, STRING, Schema, SchemaBuilder, TEXT};

/// Name of the JSON field holding properties outside the fixed schema.
pub const PROPERTIES_FIELD: &str = "__properties";

/// Page schema holding field references and the Tantivy schema.
#[derive(Clone)]
pub struct PageSchema {
    schema: Schema,

    /// Node id.
    pub id: Field,
    /// Logical content category.
    pub index_type: Field,
    /// Page name.
    pub node_name: Field,
    /// Document type alias.
    pub node_type_alias: Field,
    /// Extracted page text.
    pub full_text: Field,
    /// Ancestor path.
    pub path: Field,
    /// Every other property, as a JSON object.
    pub properties: Field,
}

impl PageSchema {
    /// Build the schema with the given full-text and path field names.
    pub fn build(full_text_field: &str, path_field: &str) -> Self {
        let mut builder = SchemaBuilder::new();

        let id = builder.add_text_field(ID_FIELD, STRING | STORED);
        let index_type = builder.add_text_field(INDEX_TYPE_FIELD, STRING | STORED);
        let node_name = builder.add_text_field(NODE_NAME_FIELD, TEXT | STORED);
        let node_type_alias = builder.add_text_field(NODE_TYPE_ALIAS_FIELD, STRING | STORED);
        let full_text = builder.add_text_field(full_text_field, TEXT | STORED);
        let path = builder.add_text_field(path_field, TEXT | STORED);
        let properties = builder.add_json_field(PROPERTIES_FIELD, TEXT | STORED);

        Self {
            schema: builder.build(),
            id,
            index_type,
            node_name,
            node_type_alias,
            full_text,
            path,
            properties,
        }
    }

    /// Build the schema with the field names from configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::build(&config.full_text_field, &config.path_field)
    }

    /// The underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Look up a fixed text field by name.
    ///
    /// Returns `None` for names that live under [`PROPERTIES_FIELD`].
    pub fn field(&self, name: &str) -> Option<Field> {
        self.schema
            .get_field(name)
            .ok()
            .filter(|field| *field != self.properties)
    }

    /// Every fixed text field with its name, in schema order.
    pub fn fields(&self) -> Vec<(Field, &str)> {
        self.schema
            .fields()
            .filter(|(field, _)| *field != self.properties)
            .map(|(field, entry)| (field, entry.name()))
            .collect()
    }

    /// Whether a field is indexed as one untokenized keyword.
    pub fn is_keyword(&self, field: Field) -> bool {
        field == self.id || field == self.index_type || field == self.node_type_alias
    }

    /// Fields searched when a clause names no field.
    pub fn default_search_fields(&self) -> Vec<Field> {
        vec![self.node_name, self.full_text]
    }
}

impl std::fmt::Debug for PageSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.fields().into_iter().map(|(_, name)| name).collect();
        f.debug_struct("PageSchema").field("fields", &names).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
