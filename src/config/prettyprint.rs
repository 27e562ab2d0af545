//! Configuration pretty-printing
// (c) 2026 Ferry contributors

use super::Manager;
use crate::cli::styles::use_colours;

use figment::{value::Value, Metadata};
use std::fmt::{Debug, Display};
use struct_field_names_as_array::FieldNamesAsSlice;
use tabled::{
    settings::{object::Rows, style::Style, Color},
    Table, Tabled,
};

/// One row of the rendered table
#[derive(Tabled)]
struct Row {
    field: String,
    value: String,
    source: String,
}

fn render_source(meta: Option<&Metadata>) -> String {
    meta.map_or_else(String::new, |m| {
        m.source
            .as_ref()
            .map_or_else(|| m.name.to_string(), figment::Source::to_string)
    })
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(_, s) => s.clone(),
        Value::Char(_, c) => c.to_string(),
        Value::Bool(_, b) => b.to_string(),
        Value::Num(_, num) => num
            .to_i128()
            .map(|i| i.to_string())
            .or_else(|| num.to_u128().map(|u| u.to_string()))
            .or_else(|| num.to_f64().map(|f| f.to_string()))
            .unwrap_or_default(),
        Value::Empty(_, _) => "<empty>".into(),
        Value::Dict(_, dict) => format!("{{{} entries}}", dict.len()),
        Value::Array(_, vec) => format!(
            "[{}]",
            vec.iter().map(render_value).collect::<Vec<_>>().join(",")
        ),
    }
}

/// Pretty-printing type wrapper to Manager
#[derive(Debug)]
pub struct DisplayAdapter<'a> {
    source: &'a Manager,
    fields: &'static [&'static str],
}

impl Manager {
    /// Creates a `DisplayAdapter` which shows the fields of `T`, in declaration order,
    /// with their current values and where each came from.
    #[must_use]
    pub fn to_display_adapter<T>(&self) -> DisplayAdapter<'_>
    where
        T: FieldNamesAsSlice,
    {
        DisplayAdapter {
            source: self,
            fields: T::FIELD_NAMES_AS_SLICE,
        }
    }
}

impl Display for DisplayAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = &self.source.data;
        let rows = self.fields.iter().filter_map(|field| {
            let value = data.find_value(field).ok()?;
            let meta = data.get_metadata(value.tag());
            Some(Row {
                field: field.replace('_', "-"),
                value: render_value(&value),
                source: render_source(meta),
            })
        });
        let mut table = Table::new(rows);
        let _ = table.with(Style::sharp());
        if use_colours() {
            let _ = table.modify(Rows::first(), Color::FG_CYAN);
        }
        write!(f, "{table}")
    }
}
