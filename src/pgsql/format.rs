//! SQL emission for the PostgreSQL syntax tree
//!
//! Every node implements [`ToSql`], writing into a shared [`SqlWriter`]. The writer carries the
//! literal stripping switch so that a statement can be rendered for execution or, with every
//! literal replaced by `$STRIPPED`, for logging.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use super::ast::{
    Assignment, CommonTableExpression, CompoundIdentifier, Delete, Expression, FromClause,
    Identifier, Insert, Join, MatchedAction, Merge, MergeAction, NotMatchedAction, Query, Select,
    SetExpression, Statement, TableReference, Update, Values, With,
};
use super::errors::FormatError;
use super::types::{
    DataType, Value, COLUMN_END_ID, COLUMN_ID, COLUMN_KIND_ID, COLUMN_KIND_IDS,
    COLUMN_PROPERTIES, COLUMN_START_ID,
};

/// Placeholder written in place of every literal when stripping is enabled.
pub const STRIPPED_LITERAL: &str = "$STRIPPED";

static BARE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Output buffer shared by every [`ToSql`] implementation.
#[derive(Debug, Default)]
pub struct SqlWriter {
    buffer: String,
    strip_literals: bool,
}

impl SqlWriter {
    pub fn new(strip_literals: bool) -> Self {
        SqlWriter {
            buffer: String::new(),
            strip_literals,
        }
    }

    pub fn strip_literals(&self) -> bool {
        self.strip_literals
    }

    pub fn write_str(&mut self, value: &str) {
        self.buffer.push_str(value);
    }

    pub fn write_all(&mut self, values: &[&str]) {
        for value in values {
            self.buffer.push_str(value);
        }
    }

    /// Write each item with `separator` between consecutive items.
    pub fn write_separated<T: ToSql>(
        &mut self,
        items: &[T],
        separator: &str,
    ) -> Result<(), FormatError> {
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.write_str(separator);
            }

            item.write_sql(self)?;
        }

        Ok(())
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

/// Trait for converting syntax tree nodes to SQL
pub trait ToSql {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError>;

    /// Render this node with literals intact.
    fn to_sql(&self) -> Result<String, FormatError> {
        let mut writer = SqlWriter::new(false);
        self.write_sql(&mut writer)?;
        Ok(writer.into_string())
    }
}

impl<T: ToSql + ?Sized> ToSql for Box<T> {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        self.as_ref().write_sql(writer)
    }
}

/// Render a statement, optionally replacing every literal with [`STRIPPED_LITERAL`].
pub fn format_statement(statement: &Statement, strip_literals: bool) -> Result<String, FormatError> {
    let mut writer = SqlWriter::new(strip_literals);
    statement.write_sql(&mut writer)?;
    Ok(writer.into_string())
}

fn quote_string(writer: &mut SqlWriter, value: &str) {
    writer.write_str("'");
    writer.write_str(&value.replace('\'', "''"));
    writer.write_str("'");
}

fn write_display_array<T: std::fmt::Display>(
    writer: &mut SqlWriter,
    values: &[T],
) -> Result<(), FormatError> {
    writer.write_str("array[");

    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            writer.write_str(", ");
        }

        write!(writer.buffer, "{}", value)?;
    }

    writer.write_str("]");
    Ok(())
}

fn write_json(writer: &mut SqlWriter, value: &impl serde::Serialize) -> Result<(), FormatError> {
    let encoded = serde_json::to_string(value).map_err(|e| FormatError::Json(e.to_string()))?;
    quote_string(writer, &encoded);
    Ok(())
}

impl ToSql for Value {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        if writer.strip_literals {
            writer.write_str(STRIPPED_LITERAL);
            return Ok(());
        }

        match self {
            Value::Null => writer.write_str("null"),
            Value::Bool(value) => write!(writer.buffer, "{}", value)?,
            Value::Int16(value) => write!(writer.buffer, "{}", value)?,
            Value::Int32(value) => write!(writer.buffer, "{}", value)?,
            Value::Int64(value) => write!(writer.buffer, "{}", value)?,
            Value::Float32(value) => write!(writer.buffer, "{}", value)?,
            Value::Float64(value) => write!(writer.buffer, "{}", value)?,
            Value::String(value) => quote_string(writer, value),
            Value::Int16Array(values) => write_display_array(writer, values)?,
            Value::Int32Array(values) => write_display_array(writer, values)?,
            Value::Int64Array(values) => write_display_array(writer, values)?,
            Value::Float32Array(values) => write_display_array(writer, values)?,
            Value::Float64Array(values) => write_display_array(writer, values)?,
            Value::StringArray(values) => {
                writer.write_str("array[");

                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        writer.write_str(", ");
                    }

                    quote_string(writer, value);
                }

                writer.write_str("]");
            }
            Value::Timestamp(value) => quote_string(writer, &value.to_rfc3339()),
            Value::Jsonb(value) => write_json(writer, value)?,
            Value::Map(_) => write_json(writer, self)?,
            Value::List(values) => {
                writer.write_str("array[");
                writer.write_separated(values, ", ")?;
                writer.write_str("]");
            }
        }

        Ok(())
    }
}

impl ToSql for Identifier {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        if BARE_IDENTIFIER.is_match(&self.0) {
            writer.write_str(&self.0);
        } else {
            writer.write_str("\"");
            writer.write_str(&self.0.replace('"', "\"\""));
            writer.write_str("\"");
        }

        Ok(())
    }
}

impl ToSql for CompoundIdentifier {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        writer.write_separated(&self.0, ".")
    }
}

fn write_column(writer: &mut SqlWriter, binding: &Identifier, column: &str) -> Result<(), FormatError> {
    binding.write_sql(writer)?;
    writer.write_all(&[".", column]);
    Ok(())
}

impl ToSql for Expression {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        match self {
            Expression::Identifier(identifier) => identifier.write_sql(writer)?,
            Expression::CompoundIdentifier(identifier) => identifier.write_sql(writer)?,
            Expression::Literal(value) | Expression::AnnotatedLiteral { value, .. } => {
                value.write_sql(writer)?
            }
            Expression::Parameter(identifier)
            | Expression::AnnotatedParameter { identifier, .. } => {
                writer.write_all(&["@", identifier.as_str()]);
            }
            Expression::Wildcard => writer.write_str("*"),

            Expression::Binary(binary) => {
                binary.left.write_sql(writer)?;

                if binary.operator.is_json_navigation() {
                    writer.write_str(binary.operator.as_str());
                } else {
                    writer.write_all(&[" ", binary.operator.as_str(), " "]);
                }

                binary.right.write_sql(writer)?;
            }

            Expression::Unary(unary) => {
                let operator = unary.operator.as_str();
                writer.write_str(operator);

                if operator.chars().all(char::is_alphabetic) {
                    writer.write_str(" ");
                }

                unary.operand.write_sql(writer)?;
            }

            Expression::Parenthetical(inner) => {
                writer.write_str("(");
                inner.write_sql(writer)?;
                writer.write_str(")");
            }

            Expression::FunctionCall(call) => {
                writer.write_all(&[call.name.as_str(), "("]);

                if call.distinct {
                    writer.write_str("distinct ");
                }

                writer.write_separated(&call.arguments, ", ")?;
                writer.write_str(")");
            }

            Expression::ArrayLiteral(values) => {
                writer.write_str("array[");
                writer.write_separated(values, ", ")?;
                writer.write_str("]");
            }

            Expression::TypeCast {
                expression,
                data_type,
            } => {
                expression.write_sql(writer)?;
                writer.write_all(&["::", data_type.as_str()]);
            }

            Expression::Any(inner) => {
                writer.write_str("any(");
                inner.write_sql(writer)?;
                writer.write_str(")");
            }

            Expression::CompositeValue { values, data_type } => {
                writer.write_str("(");
                writer.write_separated(values, ", ")?;
                writer.write_all(&[")::", data_type.as_str()]);
            }

            Expression::Exists(query) => {
                writer.write_str("exists(");
                query.write_sql(writer)?;
                writer.write_str(")");
            }

            Expression::Aliased { expression, alias } => {
                expression.write_sql(writer)?;
                writer.write_str(" as ");
                alias.write_sql(writer)?;
            }

            Expression::Entity { binding, data_type } => {
                let columns: &[&str] = match data_type {
                    DataType::Node => &[COLUMN_ID, COLUMN_KIND_IDS, COLUMN_PROPERTIES],
                    DataType::Edge => &[
                        COLUMN_ID,
                        COLUMN_START_ID,
                        COLUMN_END_ID,
                        COLUMN_KIND_ID,
                        COLUMN_PROPERTIES,
                    ],
                    other => return Err(FormatError::UnsupportedEntityType(*other)),
                };

                writer.write_str("(");

                for (idx, column) in columns.iter().enumerate() {
                    if idx > 0 {
                        writer.write_str(", ");
                    }

                    write_column(writer, binding, column)?;
                }

                writer.write_all(&[")::", data_type.as_str()]);
            }

            Expression::KindReference { binding, data_type } => match data_type {
                DataType::Node => write_column(writer, binding, COLUMN_KIND_IDS)?,
                DataType::Edge => write_column(writer, binding, COLUMN_KIND_ID)?,
                other => return Err(FormatError::UnsupportedEntityType(*other)),
            },

            Expression::PropertyLookup { reference, key } => {
                write_column(writer, reference, COLUMN_PROPERTIES)?;
                writer.write_str("->");
                quote_string(writer, key);
            }

            Expression::AnnotatedPropertyLookup {
                reference,
                key,
                data_type,
            } => {
                writer.write_str("(");
                write_column(writer, reference, COLUMN_PROPERTIES)?;

                // JSONB cannot be cast straight to text or temporal types, so those are pulled
                // out as text first
                if data_type.requires_text_extraction() {
                    writer.write_str("->>");
                } else {
                    writer.write_str("->");
                }

                quote_string(writer, key);
                writer.write_all(&[")::", data_type.as_str()]);
            }

            Expression::AnnotatedKindMatcher {
                reference,
                kind_ids,
                data_type,
            } => match data_type {
                DataType::Node => {
                    write_column(writer, reference, COLUMN_KIND_IDS)?;
                    writer.write_str(" operator(pg_catalog.&&) ");
                    write_display_array(writer, kind_ids)?;
                    writer.write_str("::int2[]");
                }
                DataType::Edge => {
                    write_column(writer, reference, COLUMN_KIND_ID)?;
                    writer.write_str(" = any(");
                    write_display_array(writer, kind_ids)?;
                    writer.write_str("::int2[])");
                }
                other => return Err(FormatError::UnsupportedKindMatcherType(*other)),
            },
        }

        Ok(())
    }
}

impl ToSql for TableReference {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        self.name.write_sql(writer)?;

        if let Some(binding) = &self.binding {
            writer.write_str(" as ");
            binding.write_sql(writer)?;
        }

        Ok(())
    }
}

impl ToSql for Join {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        writer.write_all(&[" ", self.operator.join_type.as_str(), " "]);
        self.table.name.write_sql(writer)?;

        if let Some(binding) = &self.table.binding {
            writer.write_str(" ");
            binding.write_sql(writer)?;
        }

        writer.write_str(" on ");
        self.operator.constraint.write_sql(writer)
    }
}

impl ToSql for FromClause {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        self.source.write_sql(writer)?;

        for join in &self.joins {
            join.write_sql(writer)?;
        }

        Ok(())
    }
}

fn write_where(writer: &mut SqlWriter, where_clause: &Option<Expression>) -> Result<(), FormatError> {
    if let Some(expression) = where_clause {
        writer.write_str(" where ");
        expression.write_sql(writer)?;
    }

    Ok(())
}

fn write_returning(writer: &mut SqlWriter, returning: &[Expression]) -> Result<(), FormatError> {
    if !returning.is_empty() {
        writer.write_str(" returning ");
        writer.write_separated(returning, ", ")?;
    }

    Ok(())
}

impl ToSql for Select {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        writer.write_str("select ");

        if self.distinct {
            writer.write_str("distinct ");
        }

        writer.write_separated(&self.projection, ", ")?;

        if !self.from.is_empty() {
            writer.write_str(" from ");
            writer.write_separated(&self.from, ", ")?;
        }

        write_where(writer, &self.where_clause)?;

        if !self.group_by.is_empty() {
            writer.write_str(" group by ");
            writer.write_separated(&self.group_by, ", ")?;
        }

        if let Some(having) = &self.having {
            writer.write_str(" having ");
            having.write_sql(writer)?;
        }

        Ok(())
    }
}

impl ToSql for Values {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        writer.write_str("values ");

        for (idx, row) in self.rows.iter().enumerate() {
            if idx > 0 {
                writer.write_str(", ");
            }

            writer.write_str("(");
            writer.write_separated(row, ", ")?;
            writer.write_str(")");
        }

        Ok(())
    }
}

impl ToSql for SetExpression {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        match self {
            SetExpression::Select(select) => select.write_sql(writer),
            SetExpression::Values(values) => values.write_sql(writer),
            SetExpression::Query(query) => {
                writer.write_str("(");
                query.write_sql(writer)?;
                writer.write_str(")");
                Ok(())
            }
            SetExpression::SetOperation(operation) => {
                operation.lhs.write_sql(writer)?;
                writer.write_all(&[" ", operation.operator.as_str(), " "]);

                if operation.all {
                    writer.write_str("all ");
                }

                operation.rhs.write_sql(writer)
            }
        }
    }
}

impl ToSql for CommonTableExpression {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        self.alias.name.write_sql(writer)?;

        if let Some(shape) = &self.alias.shape {
            writer.write_str("(");
            writer.write_separated(shape, ", ")?;
            writer.write_str(")");
        }

        writer.write_str(" as (");
        self.query.write_sql(writer)?;
        writer.write_str(")");
        Ok(())
    }
}

impl ToSql for With {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        writer.write_str("with ");

        if self.recursive {
            writer.write_str("recursive ");
        }

        writer.write_separated(&self.expressions, ", ")
    }
}

impl ToSql for Query {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        if let Some(with) = &self.with {
            with.write_sql(writer)?;
            writer.write_str(" ");
        }

        self.body.write_sql(writer)?;

        if !self.order_by.is_empty() {
            writer.write_str(" order by ");

            for (idx, item) in self.order_by.iter().enumerate() {
                if idx > 0 {
                    writer.write_str(", ");
                }

                item.expression.write_sql(writer)?;
                writer.write_str(if item.ascending { " asc" } else { " desc" });
            }
        }

        if let Some(offset) = &self.offset {
            writer.write_str(" offset ");
            offset.write_sql(writer)?;
        }

        if let Some(limit) = &self.limit {
            writer.write_str(" limit ");
            limit.write_sql(writer)?;
        }

        Ok(())
    }
}

impl ToSql for Assignment {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        self.column.write_sql(writer)?;
        writer.write_str(" = ");
        self.value.write_sql(writer)
    }
}

impl ToSql for Insert {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        writer.write_str("insert into ");
        self.table.write_sql(writer)?;

        if !self.columns.is_empty() {
            writer.write_str(" (");
            writer.write_separated(&self.columns, ", ")?;
            writer.write_str(")");
        }

        writer.write_str(" ");
        self.source.write_sql(writer)?;
        write_returning(writer, &self.returning)
    }
}

impl ToSql for Update {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        if self.assignments.is_empty() {
            return Err(FormatError::EmptyStatement);
        }

        writer.write_str("update ");
        self.table.write_sql(writer)?;
        writer.write_str(" set ");
        writer.write_separated(&self.assignments, ", ")?;

        if !self.from.is_empty() {
            writer.write_str(" from ");
            writer.write_separated(&self.from, ", ")?;
        }

        write_where(writer, &self.where_clause)?;
        write_returning(writer, &self.returning)
    }
}

impl ToSql for Delete {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        writer.write_str("delete from ");
        self.table.write_sql(writer)?;

        if !self.using.is_empty() {
            writer.write_str(" using ");
            writer.write_separated(&self.using, ", ")?;
        }

        write_where(writer, &self.where_clause)?;
        write_returning(writer, &self.returning)
    }
}

impl ToSql for MergeAction {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        let predicate = match self {
            MergeAction::Matched { predicate, .. } => {
                writer.write_str("when matched");
                predicate
            }
            MergeAction::NotMatched { predicate, .. } => {
                writer.write_str("when not matched");
                predicate
            }
        };

        if let Some(predicate) = predicate {
            writer.write_str(" and ");
            predicate.write_sql(writer)?;
        }

        writer.write_str(" then ");

        match self {
            MergeAction::Matched { action, .. } => match action {
                MatchedAction::Update(assignments) => {
                    writer.write_str("update set ");
                    writer.write_separated(assignments, ", ")?;
                }
                MatchedAction::Delete => writer.write_str("delete"),
                MatchedAction::DoNothing => writer.write_str("do nothing"),
            },
            MergeAction::NotMatched { action, .. } => match action {
                NotMatchedAction::Insert { columns, values } => {
                    writer.write_str("insert (");
                    writer.write_separated(columns, ", ")?;
                    writer.write_str(") values (");
                    writer.write_separated(values, ", ")?;
                    writer.write_str(")");
                }
                NotMatchedAction::DoNothing => writer.write_str("do nothing"),
            },
        }

        Ok(())
    }
}

impl ToSql for Merge {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        writer.write_str("merge into ");
        self.target.write_sql(writer)?;
        writer.write_str(" using ");
        self.source.write_sql(writer)?;
        writer.write_str(" on ");
        self.on.write_sql(writer)?;

        for action in &self.actions {
            writer.write_str(" ");
            action.write_sql(writer)?;
        }

        Ok(())
    }
}

impl ToSql for Statement {
    fn write_sql(&self, writer: &mut SqlWriter) -> Result<(), FormatError> {
        match self {
            Statement::Query(query) => query.write_sql(writer),
            Statement::Insert(insert) => insert.write_sql(writer),
            Statement::Update(update) => update.write_sql(writer),
            Statement::Delete(delete) => delete.write_sql(writer),
            Statement::Merge(merge) => merge.write_sql(writer),
        }
    }
}
