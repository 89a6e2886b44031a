/// Cypher to PostgreSQL function registry
///
/// Maps Cypher function names to the SQL form they lower to. Lookups are case-insensitive.
use std::collections::HashMap;

use crate::cypher::FunctionInvocation;
use crate::pgsql::ast::{Expression, FunctionCall};
use crate::pgsql::types::DataType;

use super::errors::TranslationError;

/// Value a temporal constructor produces when called without arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentValue {
    /// A bare SQL keyword such as `current_date`
    Keyword(&'static str),
    /// A zero-argument SQL function such as `now()`
    Call(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lowering {
    /// `id(x)` -> `x.id`
    Identity,
    /// `labels(n)` -> `n.kind_ids`, `type(r)` -> `r.kind_id`
    KindReference(DataType),
    /// A call passed through under a PostgreSQL name
    Rename(&'static str),
    /// A cast of the single argument, or the current value when called bare
    Temporal {
        data_type: DataType,
        current: CurrentValue,
    },
    /// `duration(x)` -> `x::interval`
    Duration,
}

/// Function mapping entry
#[derive(Debug, Clone)]
pub struct FunctionMapping {
    /// Cypher function name as written in queries
    pub cypher_name: &'static str,
    pub lowering: Lowering,
}

/// Get function mapping for a Cypher function name
pub fn get_function_mapping(name: &str) -> Option<FunctionMapping> {
    let name_lower = name.to_lowercase();
    FUNCTION_MAPPINGS.get(name_lower.as_str()).cloned()
}

pub fn is_supported(name: &str) -> bool {
    get_function_mapping(name).is_some()
}

// Static function mapping table
lazy_static::lazy_static! {
    static ref FUNCTION_MAPPINGS: HashMap<&'static str, FunctionMapping> = {
        let mut m = HashMap::new();

        // ===== GRAPH FUNCTIONS =====

        m.insert("id", FunctionMapping {
            cypher_name: "id",
            lowering: Lowering::Identity,
        });

        m.insert("labels", FunctionMapping {
            cypher_name: "labels",
            lowering: Lowering::KindReference(DataType::Node),
        });

        m.insert("type", FunctionMapping {
            cypher_name: "type",
            lowering: Lowering::KindReference(DataType::Edge),
        });

        // ===== AGGREGATE AND STRING FUNCTIONS =====

        m.insert("count", FunctionMapping {
            cypher_name: "count",
            lowering: Lowering::Rename("count"),
        });

        m.insert("tolower", FunctionMapping {
            cypher_name: "toLower",
            lowering: Lowering::Rename("lower"),
        });

        // ===== TEMPORAL FUNCTIONS =====

        m.insert("date", FunctionMapping {
            cypher_name: "date",
            lowering: Lowering::Temporal {
                data_type: DataType::Date,
                current: CurrentValue::Keyword("current_date"),
            },
        });

        m.insert("time", FunctionMapping {
            cypher_name: "time",
            lowering: Lowering::Temporal {
                data_type: DataType::TimeWithTimeZone,
                current: CurrentValue::Keyword("current_time"),
            },
        });

        m.insert("localtime", FunctionMapping {
            cypher_name: "localtime",
            lowering: Lowering::Temporal {
                data_type: DataType::TimeWithoutTimeZone,
                current: CurrentValue::Keyword("localtime"),
            },
        });

        m.insert("datetime", FunctionMapping {
            cypher_name: "datetime",
            lowering: Lowering::Temporal {
                data_type: DataType::TimestampWithTimeZone,
                current: CurrentValue::Call("now"),
            },
        });

        m.insert("localdatetime", FunctionMapping {
            cypher_name: "localdatetime",
            lowering: Lowering::Temporal {
                data_type: DataType::TimestampWithoutTimeZone,
                current: CurrentValue::Keyword("localtimestamp"),
            },
        });

        m.insert("duration", FunctionMapping {
            cypher_name: "duration",
            lowering: Lowering::Duration,
        });

        m
    };
}

fn single_argument(
    mapping: &FunctionMapping,
    mut arguments: Vec<Expression>,
) -> Result<Expression, TranslationError> {
    if arguments.len() != 1 {
        return Err(TranslationError::FunctionArguments {
            function: mapping.cypher_name,
            expected: 1,
            actual: arguments.len(),
        });
    }

    arguments.pop().ok_or(TranslationError::FunctionArguments {
        function: mapping.cypher_name,
        expected: 1,
        actual: 0,
    })
}

/// Lower `invocation` given its already lowered `arguments`.
pub fn lower_function(
    invocation: &FunctionInvocation,
    arguments: Vec<Expression>,
) -> Result<Expression, TranslationError> {
    let mapping = get_function_mapping(&invocation.name)
        .ok_or_else(|| TranslationError::UnsupportedFunction(invocation.name.clone()))?;

    match mapping.lowering {
        Lowering::Identity => match single_argument(&mapping, arguments)? {
            Expression::Identifier(binding) => Ok(Expression::column(&binding, "id")),
            other => Err(TranslationError::UnsupportedExpression(other.node_type())),
        },

        Lowering::KindReference(data_type) => match single_argument(&mapping, arguments)? {
            Expression::Identifier(binding) => Ok(Expression::KindReference { binding, data_type }),
            other => Err(TranslationError::UnsupportedExpression(other.node_type())),
        },

        Lowering::Rename(name) => Ok(Expression::FunctionCall(FunctionCall {
            name: name.to_string(),
            distinct: invocation.distinct,
            arguments,
        })),

        Lowering::Temporal { data_type, current } => {
            if arguments.is_empty() {
                return Ok(match current {
                    CurrentValue::Keyword(keyword) => Expression::identifier(keyword),
                    CurrentValue::Call(name) => Expression::function(name, Vec::new()),
                });
            }

            Ok(Expression::type_cast(single_argument(&mapping, arguments)?, data_type))
        }

        Lowering::Duration => Ok(Expression::type_cast(
            single_argument(&mapping, arguments)?,
            DataType::Interval,
        )),
    }
}
