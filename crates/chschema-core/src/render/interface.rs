//! TypeScript interface declarations, optionally followed by zod schemas

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::resolver::{DecimalRepresentation, MappedTable};
use crate::types::{walk, AddressFamily, Leaf, TypeVisitor};

use super::validator::{object_expr, validator_expr};
use super::{property_key, validate_tables};

const HEADER: &str = "// Generated by chschema. Do not edit by hand.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceOptions {
    /// Emit a `<Name>Schema` zod object after each interface
    pub emit_validators: bool,
}

/// Render one `export interface` per table.
///
/// Every table is validated before anything is written; an invalid table
/// fails the whole call.
pub fn render_interfaces(tables: &[MappedTable], options: &InterfaceOptions) -> Result<String> {
    validate_tables(tables)?;

    let mut usage = Usage::default();
    for table in tables {
        for column in &table.columns {
            let used = walk(&UsageVisitor, &column.resolved_type)?;
            usage.decimal |= used.decimal
                && table.representation.decimal == DecimalRepresentation::ArbitraryPrecision;
            usage.ipv4 |= used.ipv4;
            usage.ipv6 |= used.ipv6;
        }
    }

    // Validators are built up front so a failure leaves no partial output
    let validators = if options.emit_validators {
        tables
            .iter()
            .map(table_validator)
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };

    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    let mut imports = Vec::new();
    if options.emit_validators {
        imports.push("import { z } from 'zod';");
    }
    if usage.decimal {
        imports.push("import Decimal from 'decimal.js';");
    }
    if !imports.is_empty() {
        out.push('\n');
        for import in imports {
            out.push_str(import);
            out.push('\n');
        }
    }

    let brands: Vec<AddressFamily> = [
        (usage.ipv4, AddressFamily::V4),
        (usage.ipv6, AddressFamily::V6),
    ]
    .into_iter()
    .filter_map(|(used, family)| used.then_some(family))
    .collect();
    if !brands.is_empty() {
        out.push('\n');
        for family in brands {
            let name = family.marker_name();
            let _ = writeln!(
                out,
                "export type {name} = string & {{ readonly __brand: '{name}' }};"
            );
        }
    }

    for (i, table) in tables.iter().enumerate() {
        out.push('\n');
        write_interface(&mut out, table);
        if let Some(validator) = validators.get(i) {
            out.push('\n');
            let _ = writeln!(out, "export const {}Schema = {};", table.declared_name, validator);
        }
    }

    Ok(out)
}

fn table_validator(table: &MappedTable) -> Result<String> {
    let fields = table
        .columns
        .iter()
        .map(|column| {
            validator_expr(&column.resolved_type, &table.representation)
                .map(|expr| (column.name.clone(), expr))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(object_expr(&fields))
}

fn write_interface(out: &mut String, table: &MappedTable) {
    let mut doc = vec![format!("Table `{}`", table.source_name)];
    if let Some(comment) = &table.meta.comment {
        doc.push(String::new());
        doc.push(comment.clone());
    }
    let meta = [
        ("Engine", &table.meta.engine),
        ("Partition by", &table.meta.partition_by),
        ("Order by", &table.meta.order_by),
    ];
    if meta.iter().any(|(_, value)| value.is_some()) {
        doc.push(String::new());
    }
    for (label, value) in meta {
        if let Some(value) = value {
            doc.push(format!("{label}: `{value}`"));
        }
    }
    write_doc(out, "", &doc);

    let _ = writeln!(out, "export interface {} {{", table.declared_name);
    for column in &table.columns {
        let source_type = format!("Source type: `{}`", column.raw_type_text);
        match &column.comment {
            Some(comment) => write_doc(out, "  ", &[comment.clone(), String::new(), source_type]),
            None => write_doc(out, "  ", &[source_type]),
        }
        let _ = writeln!(out, "  {}: {};", property_key(&column.name), column.mapped_type);
    }
    out.push_str("}\n");
}

fn write_doc(out: &mut String, indent: &str, lines: &[String]) {
    if let [line] = lines {
        let _ = writeln!(out, "{indent}/** {} */", escape_doc(line));
        return;
    }
    let _ = writeln!(out, "{indent}/**");
    for line in lines.iter().flat_map(|l| l.lines().chain(l.is_empty().then_some(""))) {
        if line.is_empty() {
            let _ = writeln!(out, "{indent} *");
        } else {
            let _ = writeln!(out, "{indent} * {}", escape_doc(line));
        }
    }
    let _ = writeln!(out, "{indent} */");
}

fn escape_doc(text: &str) -> String {
    text.replace("*/", "*\\/")
}

/// Auxiliary declarations a set of columns needs
#[derive(Debug, Clone, Copy, Default)]
struct Usage {
    decimal: bool,
    ipv4: bool,
    ipv6: bool,
}

impl Usage {
    fn merge(self, other: Usage) -> Usage {
        Usage {
            decimal: self.decimal || other.decimal,
            ipv4: self.ipv4 || other.ipv4,
            ipv6: self.ipv6 || other.ipv6,
        }
    }
}

struct UsageVisitor;

impl TypeVisitor for UsageVisitor {
    type Output = Usage;

    fn nullable(&self, inner: Usage) -> Usage {
        inner
    }

    fn array(&self, item: Usage) -> Usage {
        item
    }

    fn tuple(&self, items: Vec<Usage>) -> Usage {
        items.into_iter().fold(Usage::default(), Usage::merge)
    }

    fn map(&self, value: Usage) -> Usage {
        value
    }

    fn enumeration(&self, _keys: &[&str]) -> Usage {
        Usage::default()
    }

    fn leaf(&self, leaf: Leaf) -> Usage {
        Usage {
            decimal: leaf == Leaf::Decimal,
            ipv4: leaf == Leaf::Address(AddressFamily::V4),
            ipv6: leaf == Leaf::Address(AddressFamily::V6),
        }
    }

    fn unknown(&self, _name: &str) -> Result<Usage> {
        Ok(Usage::default())
    }
}
