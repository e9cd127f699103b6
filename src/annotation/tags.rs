//! Well-known annotation tags

/// `display` annotation (any object)
pub const DISPLAY: &str = "tag:misd.isi.edu,2015:display";
/// `visible-columns` annotation (tables)
pub const VISIBLE_COLUMNS: &str = "tag:isrd.isi.edu,2016:visible-columns";
/// `visible-foreign-keys` annotation (tables)
pub const VISIBLE_FOREIGN_KEYS: &str = "tag:isrd.isi.edu,2016:visible-foreign-keys";
/// `source-definitions` annotation (tables)
pub const SOURCE_DEFINITIONS: &str = "tag:isrd.isi.edu,2019:source-definitions";
/// `citation` annotation (tables)
pub const CITATION: &str = "tag:isrd.isi.edu,2018:citation";
/// `table-display` annotation (schemas, tables)
pub const TABLE_DISPLAY: &str = "tag:isrd.isi.edu,2016:table-display";
/// `column-display` annotation (columns)
pub const COLUMN_DISPLAY: &str = "tag:isrd.isi.edu,2016:column-display";
/// `key-display` annotation (keys)
pub const KEY_DISPLAY: &str = "tag:isrd.isi.edu,2017:key-display";
/// `foreign-key` annotation (foreign keys)
pub const FOREIGN_KEY: &str = "tag:isrd.isi.edu,2016:foreign-key";

pub const GENERATED: &str = "tag:isrd.isi.edu,2016:generated";
pub const IMMUTABLE: &str = "tag:isrd.isi.edu,2016:immutable";
pub const NON_DELETABLE: &str = "tag:isrd.isi.edu,2016:non-deletable";
pub const APP_LINKS: &str = "tag:isrd.isi.edu,2016:app-links";
pub const TABLE_ALTERNATIVES: &str = "tag:isrd.isi.edu,2016:table-alternatives";
pub const ASSET: &str = "tag:isrd.isi.edu,2017:asset";
pub const REQUIRED: &str = "tag:isrd.isi.edu,2018:required";
pub const EXPORT: &str = "tag:isrd.isi.edu,2019:export";
pub const CHAISE_CONFIG: &str = "tag:isrd.isi.edu,2019:chaise-config";

/// Every tag the workbench offers in its "add annotation" menu
pub const ALL: &[&str] = &[
    DISPLAY,
    VISIBLE_COLUMNS,
    VISIBLE_FOREIGN_KEYS,
    SOURCE_DEFINITIONS,
    CITATION,
    TABLE_DISPLAY,
    COLUMN_DISPLAY,
    KEY_DISPLAY,
    FOREIGN_KEY,
    GENERATED,
    IMMUTABLE,
    NON_DELETABLE,
    APP_LINKS,
    TABLE_ALTERNATIVES,
    ASSET,
    REQUIRED,
    EXPORT,
    CHAISE_CONFIG,
];

/// Short name of a tag: the part after the last `:` (`visible-columns`)
pub fn short_name(tag: &str) -> &str {
    tag.rsplit(':').next().unwrap_or(tag)
}

/// Resolve a short name (`visible-columns`) or a full tag to the full tag
pub fn expand(name: &str) -> Option<&'static str> {
    ALL.iter()
        .copied()
        .find(|tag| *tag == name || short_name(tag) == name)
}
