//! Row materialization.
//!
//! Walks a result cursor and turns each position into an owned [`Row`],
//! applying the conversion registered for every column's wire type.

use serde::{Deserialize, Serialize};

use super::executor::{ResultSet, StatementExecutor};
use crate::db::{ConversionFn, ConversionRegistry, NativeDriver, Row, Value, WireType};
use crate::error::Result;

/// Transform applied to column names before they become row keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierCase {
    #[default]
    Preserve,
    Lowercase,
    Uppercase,
}

impl IdentifierCase {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Preserve => name.to_string(),
            Self::Lowercase => name.to_lowercase(),
            Self::Uppercase => name.to_uppercase(),
        }
    }
}

/// Per-call materialization options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchOptions {
    /// Convert `DT_SMALLINT` columns to booleans. Callers combine the
    /// dataset and database settings into this one flag.
    pub convert_smallint_to_bool: bool,

    pub identifier_case: IdentifierCase,
}

/// How one column's cells become values.
struct ColumnPlan {
    output: String,
    ordinal: usize,
    conversion: Option<ConversionFn>,
}

impl ColumnPlan {
    fn value<D: NativeDriver>(&self, result: &ResultSet<'_, D>) -> Result<Value> {
        let raw = result.get(self.ordinal)?;
        match self.conversion {
            Some(convert) => convert(raw),
            None => Ok(Value::from(raw)),
        }
    }
}

/// Reads column metadata once and resolves every column's conversion.
///
/// Returns the ordered output names alongside the plans.
fn plan_columns<D: NativeDriver>(
    result: &ResultSet<'_, D>,
    registry: &ConversionRegistry,
    options: &FetchOptions,
) -> Result<(Vec<String>, Vec<ColumnPlan>)> {
    let descriptors = result.columns()?;

    let mut columns = Vec::with_capacity(descriptors.len());
    let mut plans = Vec::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        let output = options.identifier_case.apply(&descriptor.name);
        let wire_type = WireType::from_code(descriptor.wire_type);
        let conversion = if wire_type.is_boolean() && !options.convert_smallint_to_bool {
            None
        } else {
            registry.lookup(wire_type)
        };
        plans.push(ColumnPlan {
            output: output.clone(),
            ordinal: descriptor.ordinal,
            conversion,
        });
        columns.push(output);
    }

    Ok((columns, plans))
}

/// Executes `sql` and delivers every row to `on_row` in cursor order.
///
/// Returns the output column names. A statement without a result set
/// produces no rows and no columns. The statement handle is released even
/// when `on_row` fails; its error is returned as-is.
pub fn fetch_rows<D, F>(
    executor: &mut StatementExecutor<'_, D>,
    registry: &ConversionRegistry,
    options: &FetchOptions,
    sql: &str,
    mut on_row: F,
) -> Result<Vec<String>>
where
    D: NativeDriver,
    F: FnMut(Row) -> Result<()>,
{
    executor.execute(sql, |result| {
        if result.num_columns() == 0 {
            return Ok(Vec::new());
        }

        let (columns, plans) = plan_columns(result, registry, options)?;

        while result.fetch_next() {
            let mut row = Row::with_capacity(plans.len());
            for plan in &plans {
                row.insert(plan.output.as_str(), plan.value(result)?);
            }
            on_row(row)?;
        }

        Ok(columns)
    })
}
