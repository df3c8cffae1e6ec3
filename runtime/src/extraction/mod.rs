//! Turning parsed documents into positional rows.

pub mod tables;

pub use tables::{
    cell_text, element_text, extract_sections, extract_tables, headings, table_rows, Section,
    SectionRule,
};
