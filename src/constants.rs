//! Column and file name constants shared by both pipelines.

// Source library codes used by the downstream matching database
pub const NLS_SOURCE: &str = "NLS";

/// Keys of the National Library of Scotland key/value rows, in file order
pub const NLS_FIELDS: [&str; 15] = [
    "title",
    "creator",
    "type",
    "publisher",
    "date",
    "language",
    "format",
    "relation",
    "rights",
    "identifier",
    "description",
    "subject",
    "coverage",
    "contributor",
    "source",
];

pub const NLS_TITLE_INDEX: usize = 0;
pub const NLS_DATE_INDEX: usize = 4;

/// Default prefix for NLS export files: `<prefix>_<register>_export.tsv`
pub const DEFAULT_NLS_PREFIX: &str = "nls_catalog";

pub const EXPORT_LABEL: &str = "export";
pub const CLEAN_TITLE_COLUMN: &str = "clean_title";
pub const ID_COLUMN: &str = "id";

// Register (Stationers' Hall) CSV headers, matched exactly
pub const REGISTER_YEAR_HEADER: &str = "Register Year";
pub const REGISTER_TITLE_HEADER: &str = "Book Title";

pub const REGISTER_REQUIRED_HEADERS: [&str; 6] = [
    REGISTER_YEAR_HEADER,
    "Register Block",
    "Page in PDF",
    "Line number",
    REGISTER_TITLE_HEADER,
    "Publisher",
];

/// Build the NLS export header: `id`, the NLS fields with `clean_title` after
/// `title` and the year span after `date`, then provenance columns.
pub fn nls_export_header() -> Vec<&'static str> {
    let mut header = vec![ID_COLUMN];
    for field in NLS_FIELDS {
        header.push(field);
        match field {
            "title" => header.push(CLEAN_TITLE_COLUMN),
            "date" => {
                header.push("min_date");
                header.push("max_date");
            }
            _ => {}
        }
    }
    header.push("source_library");
    header.push("register");
    header
}
