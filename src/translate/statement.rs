//! Statement lowering
//!
//! A single-part query lowers to exactly one PostgreSQL statement. Reading queries become a
//! `select`, queries with a `delete` become a `delete ... using`, `set`/`remove` become an
//! `update ... from` and a lone `create` of one node becomes an `insert`.

use std::collections::BTreeMap;

use crate::cypher::{
    AssignmentOperator, Create, Delete, Direction, Expression, Match, PatternElement, PatternPart,
    Projection, ProjectionItem, Properties, PropertyLookup, ReadingClause, RegularQuery,
    RemoveItem, Return, SetItem, UpdatingClause,
};
use crate::kinds::{kind_names, Kind, KindId};
use crate::pgsql::ast::{
    Assignment, Expression as PgExpression, FromClause, Identifier, Insert, Operator, OrderBy,
    Query, Select, Statement, TableReference, Update,
};
use crate::pgsql::format::{SqlWriter, ToSql};
use crate::pgsql::types::{
    DataType, Value, COLUMN_END_ID, COLUMN_KIND_IDS, COLUMN_PROPERTIES, COLUMN_START_ID,
    EDGE_TABLE, NODE_TABLE,
};
use crate::pgsql::IdentifierSet;

use super::errors::TranslationError;
use super::expression::{element_binding, identity_column, pattern_from_clause, ExpressionTranslator};

/// Property and kind changes collected from the `set` and `remove` clauses of one query.
#[derive(Debug, Default)]
struct Mutations {
    target: Option<String>,
    property_additions: serde_json::Map<String, serde_json::Value>,
    property_removals: Vec<String>,
    kind_additions: Vec<Kind>,
    kind_removals: Vec<Kind>,
}

impl Mutations {
    fn claim(&mut self, symbol: &str) -> Result<(), TranslationError> {
        match &self.target {
            None => {
                self.target = Some(symbol.to_string());
                Ok(())
            }
            Some(existing) if existing == symbol => Ok(()),
            Some(existing) => Err(TranslationError::MultipleUpdateTargets(
                existing.clone(),
                symbol.to_string(),
            )),
        }
    }

    fn add_property(&mut self, key: &str, value: Value) -> Result<(), TranslationError> {
        // Assigning null removes the property
        if value == Value::Null {
            self.property_removals.push(key.to_string());
            return Ok(());
        }

        self.property_additions.insert(key.to_string(), json_value(key, &value)?);
        Ok(())
    }

    fn add_set_item(&mut self, item: &SetItem) -> Result<(), TranslationError> {
        match item.operator {
            AssignmentOperator::Assign => {
                let Expression::PropertyLookup(lookup) = &item.left else {
                    return Err(TranslationError::UnsupportedUpdateItem(
                        "assignment to something other than a property",
                    ));
                };

                let (symbol, key) = lookup_target(lookup)?;
                self.claim(symbol)?;
                self.add_property(key, constant_value(&item.right)?)
            }

            AssignmentOperator::AddAssign => {
                let Expression::Variable(variable) = &item.left else {
                    return Err(TranslationError::UnsupportedUpdateItem(
                        "property merge into something other than a variable",
                    ));
                };

                self.claim(&variable.symbol)?;

                if let Expression::Map(map) = &item.right {
                    for (key, value) in &map.entries {
                        self.add_property(key, constant_value(value)?)?;
                    }

                    return Ok(());
                }

                match constant_value(&item.right)? {
                    Value::Map(entries) => {
                        for (key, value) in entries {
                            self.add_property(&key, value)?;
                        }
                        Ok(())
                    }
                    Value::Jsonb(serde_json::Value::Object(object)) => {
                        self.property_additions.extend(object);
                        Ok(())
                    }
                    _ => Err(TranslationError::UnsupportedUpdateItem(
                        "property merge with a value that is not a map",
                    )),
                }
            }

            AssignmentOperator::LabelAssign => {
                let Expression::KindMatcher(matcher) = &item.right else {
                    return Err(TranslationError::UnsupportedUpdateItem(
                        "label assignment without kinds",
                    ));
                };

                let variable = matcher.variable().ok_or(TranslationError::UnsupportedUpdateItem(
                    "label assignment to something other than a variable",
                ))?;

                self.claim(&variable.symbol)?;
                self.kind_additions.extend(matcher.kinds.iter().cloned());
                Ok(())
            }
        }
    }

    fn add_remove_item(&mut self, item: &RemoveItem) -> Result<(), TranslationError> {
        match &item.expression {
            Expression::KindMatcher(matcher) => {
                let variable = matcher.variable().ok_or(TranslationError::UnsupportedUpdateItem(
                    "label removal from something other than a variable",
                ))?;

                self.claim(&variable.symbol)?;
                self.kind_removals.extend(matcher.kinds.iter().cloned());
                Ok(())
            }
            Expression::PropertyLookup(lookup) => {
                let (symbol, key) = lookup_target(lookup)?;
                self.claim(symbol)?;
                self.property_removals.push(key.to_string());
                Ok(())
            }
            other => Err(TranslationError::UnsupportedUpdateItem(other.node_type())),
        }
    }

    fn has_kind_changes(&self) -> bool {
        !self.kind_additions.is_empty() || !self.kind_removals.is_empty()
    }
}

fn lookup_target(lookup: &PropertyLookup) -> Result<(&str, &str), TranslationError> {
    match (lookup.variable(), lookup.symbols.as_slice()) {
        (Some(variable), [key]) => Ok((variable.symbol.as_str(), key.as_str())),
        _ => Err(TranslationError::UnsupportedUpdateItem(
            "property lookups that are not of the form x.p",
        )),
    }
}

fn constant_value(expression: &Expression) -> Result<Value, TranslationError> {
    match expression {
        Expression::Literal(literal) => Ok(literal.value.clone()),
        Expression::Parameter(parameter) => parameter
            .value
            .clone()
            .ok_or_else(|| TranslationError::UnboundVariable(parameter.symbol.clone())),
        _ => Err(TranslationError::UnsupportedUpdateItem(
            "property values other than literals and parameters",
        )),
    }
}

fn json_value(key: &str, value: &Value) -> Result<serde_json::Value, TranslationError> {
    serde_json::to_value(value).map_err(|err| TranslationError::Json(key.to_string(), err.to_string()))
}

fn table_for(element: &PatternElement) -> &'static str {
    match element {
        PatternElement::Node(_) => NODE_TABLE,
        PatternElement::Relationship(_) => EDGE_TABLE,
    }
}

/// One `node as x`/`edge as x` entry for every pattern element other than `target`, in
/// pattern order.
fn other_tables(patterns: &[PatternPart], target: &Identifier) -> Result<Vec<FromClause>, TranslationError> {
    let mut seen = IdentifierSet::new();
    seen.add(target.clone());

    let mut tables = Vec::new();

    for element in patterns.iter().flat_map(|part| part.elements.iter()) {
        let binding = element_binding(element)?;

        if seen.contains(&binding) {
            continue;
        }

        seen.add(binding.clone());
        tables.push(FromClause::new(TableReference::new(table_for(element), Some(binding))));
    }

    Ok(tables)
}

/// Equality constraints tying every edge of the patterns to its start and end nodes.
fn endpoint_constraints(patterns: &[PatternPart]) -> Result<Vec<PgExpression>, TranslationError> {
    let mut constraints = Vec::new();

    for part in patterns {
        for (index, element) in part.elements.iter().enumerate() {
            let PatternElement::Relationship(relationship) = element else {
                continue;
            };

            let previous = index.checked_sub(1).and_then(|index| part.elements.get(index));
            let (Some(previous), Some(next)) = (previous, part.elements.get(index + 1)) else {
                return Err(TranslationError::Unsupported(
                    "patterns that end with a relationship",
                ));
            };

            let (previous_column, next_column) = match relationship.direction {
                Direction::Outbound => (COLUMN_START_ID, COLUMN_END_ID),
                Direction::Inbound => (COLUMN_END_ID, COLUMN_START_ID),
                Direction::Both => return Err(TranslationError::InvalidDirection),
            };

            let edge = element_binding(element)?;

            constraints.push(PgExpression::binary(
                identity_column(&element_binding(previous)?),
                Operator::Equals,
                PgExpression::column(&edge, previous_column),
            ));
            constraints.push(PgExpression::binary(
                identity_column(&element_binding(next)?),
                Operator::Equals,
                PgExpression::column(&edge, next_column),
            ));
        }
    }

    Ok(constraints)
}

/// The user filter and-joined with the endpoint constraints of a mutation.
fn mutation_filter(
    where_clause: Option<PgExpression>,
    constraints: Vec<PgExpression>,
) -> Option<PgExpression> {
    let where_clause = where_clause.map(|expression| match expression {
        PgExpression::Binary(binary) if binary.operator == Operator::Or => {
            PgExpression::parenthetical(PgExpression::Binary(binary))
        }
        other => other,
    });

    PgExpression::join_with(Operator::And, where_clause.into_iter().chain(constraints))
}

/// `column - removals || additions`, or `None` when there is nothing to change.
fn merged_column(
    column: &str,
    removals: Option<PgExpression>,
    additions: Option<PgExpression>,
) -> Option<Assignment> {
    if removals.is_none() && additions.is_none() {
        return None;
    }

    let mut value = PgExpression::identifier(column);

    if let Some(removals) = removals {
        value = PgExpression::binary(value, Operator::Subtract, removals);
    }

    if let Some(additions) = additions {
        value = PgExpression::binary(value, Operator::Concatenate, additions);
    }

    Some(Assignment {
        column: Identifier::new(column),
        value,
    })
}

fn reading_clause(clauses: &[ReadingClause]) -> Result<Option<&Match>, TranslationError> {
    match clauses {
        [] => Ok(None),
        [ReadingClause::Match(match_clause)] if match_clause.optional => {
            Err(TranslationError::Unsupported("optional match"))
        }
        [ReadingClause::Match(match_clause)] => Ok(Some(match_clause)),
        [ReadingClause::Unwind(_)] => Err(TranslationError::Unsupported("unwind")),
        _ => Err(TranslationError::Unsupported("more than one reading clause")),
    }
}

fn check_patterns(patterns: &[PatternPart]) -> Result<(), TranslationError> {
    for part in patterns {
        if part.shortest_path || part.all_shortest_paths {
            return Err(TranslationError::Unsupported("shortest path patterns"));
        }

        let ranged = part.elements.iter().any(|element| {
            element
                .as_relationship()
                .is_some_and(|relationship| relationship.range.is_some())
        });

        if ranged {
            return Err(TranslationError::Unsupported("variable-length relationship patterns"));
        }
    }

    Ok(())
}

/// Lowers whole queries. Parameters minted while lowering mutations are kept until
/// [`StatementTranslator::into_parameters`] hands them back.
pub struct StatementTranslator<'t> {
    expressions: ExpressionTranslator<'t>,
    parameters: BTreeMap<String, Value>,
}

impl<'t> StatementTranslator<'t> {
    pub fn new(expressions: ExpressionTranslator<'t>) -> Self {
        StatementTranslator {
            expressions,
            parameters: BTreeMap::new(),
        }
    }

    pub fn into_parameters(self) -> BTreeMap<String, Value> {
        self.parameters
    }

    pub fn translate(&mut self, query: &RegularQuery) -> Result<Statement, TranslationError> {
        let single = query
            .as_single_part()
            .ok_or(TranslationError::Unsupported("multi-part queries"))?;

        let match_clause = reading_clause(&single.reading_clauses)?;
        let patterns: &[PatternPart] = match_clause.map(|m| m.pattern.as_slice()).unwrap_or(&[]);
        check_patterns(patterns)?;

        let where_clause = match match_clause.and_then(|m| m.where_clause.as_ref()) {
            Some(where_clause) => self.expressions.lower_where(where_clause)?,
            None => None,
        };

        let mut creates = Vec::new();
        let mut deletes = Vec::new();
        let mut mutations = Mutations::default();
        let mut mutates = false;

        for clause in &single.updating_clauses {
            match clause {
                UpdatingClause::Create(create) => creates.push(create),
                UpdatingClause::Delete(delete) => deletes.push(delete),
                UpdatingClause::Set(set) => {
                    mutates = true;
                    for item in &set.items {
                        mutations.add_set_item(item)?;
                    }
                }
                UpdatingClause::Remove(remove) => {
                    mutates = true;
                    for item in &remove.items {
                        mutations.add_remove_item(item)?;
                    }
                }
            }
        }

        let return_clause = single.return_clause.as_ref();

        match (!creates.is_empty(), !deletes.is_empty(), mutates) {
            (false, false, false) => {
                let return_clause = return_clause.ok_or(TranslationError::Unsupported(
                    "reading queries without a return clause",
                ))?;
                self.select(patterns, where_clause, &return_clause.projection)
            }
            (true, false, false) if match_clause.is_none() => self.insert(&creates, return_clause),
            (true, false, false) => Err(TranslationError::Unsupported("create alongside match")),
            (false, true, false) => self.delete(patterns, where_clause, &deletes, return_clause),
            (false, false, true) => self.update(patterns, where_clause, mutations, return_clause),
            _ => Err(TranslationError::Unsupported("mixing different updating clauses")),
        }
    }

    fn projection_item(&mut self, item: &ProjectionItem) -> Result<PgExpression, TranslationError> {
        if let Expression::Variable(variable) = &item.expression {
            let data_type = self
                .expressions
                .binder()
                .binding_type(&variable.symbol)
                .ok_or_else(|| TranslationError::UnboundVariable(variable.symbol.clone()))?;
            let alias = item.binding.as_ref().unwrap_or(variable).symbol.as_str();

            let expression = match data_type {
                DataType::Node | DataType::Edge => PgExpression::Entity {
                    binding: Identifier::new(variable.symbol.as_str()),
                    data_type,
                },
                DataType::Path => return Err(TranslationError::Unsupported("path projections")),
                _ => PgExpression::identifier(variable.symbol.as_str()),
            };

            return Ok(PgExpression::aliased(expression, alias));
        }

        let lowered = self.expressions.lower(&item.expression)?;

        let alias = match (&item.binding, &item.expression) {
            (Some(binding), _) => binding.symbol.clone(),
            (None, Expression::PropertyLookup(lookup)) if lookup.variable().is_some() => {
                let mut alias = lookup.variable().map(|v| v.symbol.clone()).unwrap_or_default();
                for symbol in &lookup.symbols {
                    alias.push('.');
                    alias.push_str(symbol);
                }
                alias
            }
            (None, _) => {
                let mut writer = SqlWriter::new(false);
                lowered.write_sql(&mut writer)?;
                writer.into_string()
            }
        };

        Ok(PgExpression::aliased(lowered, alias))
    }

    fn projection(&mut self, projection: &Projection) -> Result<Vec<PgExpression>, TranslationError> {
        if projection.all {
            return Err(TranslationError::Unsupported("projecting every binding with *"));
        }

        projection
            .items
            .iter()
            .map(|item| self.projection_item(item))
            .collect()
    }

    fn returning(&mut self, return_clause: Option<&Return>) -> Result<Vec<PgExpression>, TranslationError> {
        match return_clause {
            Some(return_clause) => self.projection(&return_clause.projection),
            None => Ok(Vec::new()),
        }
    }

    fn select(
        &mut self,
        patterns: &[PatternPart],
        where_clause: Option<PgExpression>,
        projection: &Projection,
    ) -> Result<Statement, TranslationError> {
        let mut select = Select {
            distinct: projection.distinct,
            projection: self.projection(projection)?,
            where_clause,
            ..Default::default()
        };

        for part in patterns {
            select.from.push(pattern_from_clause(&part.elements)?);
        }

        let mut query = Query::select(select);

        if let Some(order) = &projection.order {
            for item in &order.items {
                query.order_by.push(OrderBy {
                    expression: self.expressions.lower(&item.expression)?,
                    ascending: item.ascending,
                });
            }
        }

        query.offset = match &projection.skip {
            Some(skip) => Some(self.expressions.lower(&skip.value)?),
            None => None,
        };
        query.limit = match &projection.limit {
            Some(limit) => Some(self.expressions.lower(&limit.value)?),
            None => None,
        };

        Ok(Statement::Query(query))
    }

    fn delete(
        &mut self,
        patterns: &[PatternPart],
        where_clause: Option<PgExpression>,
        deletes: &[&Delete],
        return_clause: Option<&Return>,
    ) -> Result<Statement, TranslationError> {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        // detach has no effect: edges of a deleted node are left to the storage layer
        for expression in deletes.iter().flat_map(|delete| delete.expressions.iter()) {
            let Expression::Variable(variable) = expression else {
                return Err(TranslationError::Unsupported("deleting expressions other than variables"));
            };

            match self.expressions.binder().binding_type(&variable.symbol) {
                Some(DataType::Node) => nodes.push(variable.symbol.as_str()),
                Some(DataType::Edge) => edges.push(variable.symbol.as_str()),
                Some(_) => {
                    return Err(TranslationError::Unsupported(
                        "deleting bindings other than nodes and edges",
                    ))
                }
                None => return Err(TranslationError::UnboundVariable(variable.symbol.clone())),
            }
        }

        let (target, table) = match (nodes.as_slice(), edges.as_slice()) {
            (nodes, _) if nodes.len() > 1 => return Err(TranslationError::MultipleNodeDeletes),
            (_, edges) if edges.len() > 1 => return Err(TranslationError::MultipleEdgeDeletes),
            ([node], []) => (Identifier::new(*node), NODE_TABLE),
            ([], [edge]) => (Identifier::new(*edge), EDGE_TABLE),
            ([], []) => return Err(TranslationError::Unsupported("delete without a target")),
            _ => return Err(TranslationError::MixedDeletes),
        };

        let using = other_tables(patterns, &target)?;
        let where_clause = mutation_filter(where_clause, endpoint_constraints(patterns)?);

        Ok(Statement::Delete(crate::pgsql::ast::Delete {
            table: TableReference::new(table, Some(target)),
            using,
            where_clause,
            returning: self.returning(return_clause)?,
        }))
    }

    fn allocate(&mut self, value: Value) -> PgExpression {
        let symbol = self.expressions.binder_mut().new_parameter_symbol();
        let identifier = Identifier::new(symbol.as_str());

        self.parameters.insert(symbol, value);
        PgExpression::Parameter(identifier)
    }

    fn update_kind_ids(&self, kinds: &[Kind]) -> Result<Vec<KindId>, TranslationError> {
        if self.expressions.asserts_kinds() {
            return Ok(self.expressions.kind_mapper().assert_kinds(kinds)?);
        }

        let (ids, missing) = self.expressions.kind_mapper().map_kinds(kinds);

        if !missing.is_empty() {
            return Err(TranslationError::UnknownUpdateKinds(kind_names(&missing)));
        }

        Ok(ids)
    }

    fn update(
        &mut self,
        patterns: &[PatternPart],
        where_clause: Option<PgExpression>,
        mut mutations: Mutations,
        return_clause: Option<&Return>,
    ) -> Result<Statement, TranslationError> {
        let symbol = mutations
            .target
            .take()
            .ok_or(TranslationError::Unsupported("updates without a target"))?;

        let data_type = self
            .expressions
            .binder()
            .binding_type(&symbol)
            .ok_or_else(|| TranslationError::UnboundVariable(symbol.clone()))?;

        let table = match data_type {
            DataType::Node => NODE_TABLE,
            DataType::Edge if mutations.has_kind_changes() => {
                return Err(TranslationError::KindMutationType(DataType::Edge))
            }
            DataType::Edge => EDGE_TABLE,
            other => return Err(TranslationError::KindMutationType(other)),
        };

        // Parameter order: property additions, property removals, kind additions, kind removals
        let property_additions = if mutations.property_additions.is_empty() {
            None
        } else {
            let object = std::mem::take(&mut mutations.property_additions);
            Some(self.allocate(Value::Jsonb(serde_json::Value::Object(object))))
        };

        let property_removals = if mutations.property_removals.is_empty() {
            None
        } else {
            let keys = std::mem::take(&mut mutations.property_removals);
            Some(PgExpression::type_cast(
                self.allocate(Value::StringArray(keys)),
                DataType::TextArray,
            ))
        };

        let kind_additions = if mutations.kind_additions.is_empty() {
            None
        } else {
            let ids = self.update_kind_ids(&mutations.kind_additions)?;
            Some(self.allocate(Value::Int16Array(ids)))
        };

        let kind_removals = if mutations.kind_removals.is_empty() {
            None
        } else {
            let ids = self.update_kind_ids(&mutations.kind_removals)?;
            Some(self.allocate(Value::Int16Array(ids)))
        };

        let assignments = [
            merged_column(COLUMN_PROPERTIES, property_removals, property_additions),
            merged_column(COLUMN_KIND_IDS, kind_removals, kind_additions),
        ]
        .into_iter()
        .flatten()
        .collect();

        let target = Identifier::new(symbol.as_str());

        Ok(Statement::Update(Update {
            table: TableReference::new(table, Some(target.clone())),
            assignments,
            from: other_tables(patterns, &target)?,
            where_clause: mutation_filter(where_clause, endpoint_constraints(patterns)?),
            returning: self.returning(return_clause)?,
        }))
    }

    fn insert(
        &mut self,
        creates: &[&Create],
        return_clause: Option<&Return>,
    ) -> Result<Statement, TranslationError> {
        let elements: Vec<&PatternElement> = creates
            .iter()
            .flat_map(|create| create.pattern.iter())
            .flat_map(|part| part.elements.iter())
            .collect();

        if elements.iter().any(|element| element.as_relationship().is_some()) {
            return Err(TranslationError::Unsupported("relationship creation"));
        }

        let node = match elements.as_slice() {
            [PatternElement::Node(node)] => node,
            _ => {
                return Err(TranslationError::Unsupported(
                    "creating anything other than a single node",
                ))
            }
        };

        let binding = node
            .binding
            .as_ref()
            .map(|variable| Identifier::new(variable.symbol.as_str()))
            .ok_or(TranslationError::Unsupported("unbound pattern elements"))?;

        let mut properties = serde_json::Map::new();

        match &node.properties {
            None => {}
            Some(Properties::Map(map)) => {
                for (key, value) in &map.entries {
                    properties.insert(key.clone(), json_value(key, &constant_value(value)?)?);
                }
            }
            Some(Properties::Parameter(parameter)) => {
                match constant_value(&Expression::Parameter(parameter.clone()))? {
                    Value::Map(entries) => {
                        for (key, value) in &entries {
                            properties.insert(key.clone(), json_value(key, value)?);
                        }
                    }
                    Value::Jsonb(serde_json::Value::Object(object)) => properties = object,
                    _ => {
                        return Err(TranslationError::Unsupported(
                            "node properties that are not a map",
                        ))
                    }
                }
            }
        }

        let kind_ids = self.update_kind_ids(&node.kinds)?;
        let properties = self.allocate(Value::Jsonb(serde_json::Value::Object(properties)));
        let returning = self.returning(return_clause)?;

        // The alias is only needed when the returning list references the new row
        let alias = (!returning.is_empty()).then_some(binding);

        Ok(Statement::Insert(Insert {
            table: TableReference::new(NODE_TABLE, alias),
            columns: vec![Identifier::new(COLUMN_KIND_IDS), Identifier::new(COLUMN_PROPERTIES)],
            source: Query::values(vec![vec![
                PgExpression::type_cast(
                    PgExpression::Literal(Value::Int16Array(kind_ids)),
                    DataType::Int2Array,
                ),
                properties,
            ]]),
            returning,
        }))
    }
}
