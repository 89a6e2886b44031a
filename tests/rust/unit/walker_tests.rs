//! Unit tests for the shared tree walker over both syntax trees

use std::collections::{BTreeMap, BTreeSet};

use cypher_pgsql::cypher::{
    ArithmeticExpression, AssignmentOperator, Comparison, Create, CypherNode, Delete, Expression,
    ExpressionList, FunctionInvocation, KindMatcher, Limit, ListLiteral, MapLiteral, Match,
    MultiPartQuery, MultiPartQueryPart, NodePattern, Operator, Order, Parameter,
    PartialArithmetic, PatternElement, PatternPart, PatternPredicate, Projection, ProjectionItem,
    Properties, PropertyLookup, ReadingClause, RegularQuery, RelationshipPattern, Remove,
    RemoveItem, Return, Set, SetItem, SingleQuery, SinglePartQuery, Skip, SortItem, Unwind,
    UpdatingClause, Variable, Where, With,
};
use cypher_pgsql::pgsql::ast::{
    Assignment, CommonTableExpression, Delete as PgDelete, Expression as PgExpression,
    FromClause, Identifier, Insert, Join, JoinOperator, JoinType, MatchedAction, Merge,
    MergeAction, NotMatchedAction, Operator as PgOperator, OrderBy, Query, Select,
    SetExpression, SetOperation, SetOperator, Statement, TableAlias, TableReference, Update,
    With as PgWith,
};
use cypher_pgsql::pgsql::{DataType, Value};
use cypher_pgsql::translate::referenced_parameters;
use cypher_pgsql::walk::cypher::referenced_variables;
use cypher_pgsql::walk::{cypher_cursor, pgsql_cursor, walk, PgNode, Visitor, VisitorGroup, WalkError};
use cypher_pgsql::{translate, Kind, SchemaKindMapper, TranslatorConfig};

fn sample_query() -> RegularQuery {
    RegularQuery::single_part(SinglePartQuery {
        reading_clauses: vec![ReadingClause::Match(Match {
            optional: false,
            pattern: vec![PatternPart {
                elements: vec![PatternElement::Node(NodePattern {
                    binding: Some(Variable::new("s")),
                    ..Default::default()
                })],
                ..Default::default()
            }],
            where_clause: Some(Where::new(Expression::conjunction(vec![
                Comparison::new(
                    PropertyLookup::new("s", "name").into(),
                    Operator::Equals,
                    Parameter::new("name").into(),
                )
                .into(),
                Comparison::new(
                    PropertyLookup::new("s", "enabled").into(),
                    Operator::Equals,
                    Parameter::new("enabled").into(),
                )
                .into(),
            ]))),
        })],
        updating_clauses: Vec::new(),
        return_clause: Some(Return {
            projection: Projection {
                items: vec![ProjectionItem {
                    expression: Expression::variable("s"),
                    binding: None,
                }],
                ..Default::default()
            },
        }),
    })
}

/// Tracks walk depth and checks that every enter has a matching exit.
#[derive(Default)]
struct DepthTracker {
    depth: usize,
    deepest: usize,
    entered: usize,
}

impl<'a> Visitor<CypherNode<'a>> for DepthTracker {
    type Error = WalkError;

    fn enter(&mut self, _node: CypherNode<'a>) -> Result<(), WalkError> {
        self.depth += 1;
        self.entered += 1;
        self.deepest = self.deepest.max(self.depth);
        Ok(())
    }

    fn exit(&mut self, _node: CypherNode<'a>) -> Result<(), WalkError> {
        self.depth -= 1;
        Ok(())
    }
}

/// Stops after the first parameter it sees.
#[derive(Default)]
struct FirstParameter {
    symbol: Option<String>,
}

impl<'a> Visitor<CypherNode<'a>> for FirstParameter {
    type Error = WalkError;

    fn enter(&mut self, node: CypherNode<'a>) -> Result<(), WalkError> {
        if let CypherNode::Expression(Expression::Parameter(parameter)) = node {
            self.symbol = Some(parameter.symbol.clone());
        }

        Ok(())
    }

    fn done(&self) -> bool {
        self.symbol.is_some()
    }
}

#[test]
fn test_enter_and_exit_are_balanced() {
    let query = sample_query();
    let mut tracker = DepthTracker::default();

    walk(CypherNode::RegularQuery(&query), cypher_cursor, &mut tracker).expect("walks");

    assert_eq!(tracker.depth, 0);
    assert!(tracker.entered > 10);
    assert!(tracker.deepest > 3);
}

#[test]
fn test_visitor_can_stop_the_walk() {
    let query = sample_query();
    let mut first = FirstParameter::default();

    walk(CypherNode::RegularQuery(&query), cypher_cursor, &mut first).expect("walks");

    assert_eq!(first.symbol.as_deref(), Some("name"));
}

/// Records the node types it enters and fails on the first parameter.
struct Recording<'e> {
    entered: &'e mut Vec<&'static str>,
    fail_on_parameter: bool,
}

impl<'a, 'e> Visitor<CypherNode<'a>> for Recording<'e> {
    type Error = WalkError;

    fn enter(&mut self, node: CypherNode<'a>) -> Result<(), WalkError> {
        self.entered.push(node.node_type());

        if self.fail_on_parameter && node.node_type() == "Parameter" {
            return Err(WalkError::UnsupportedNodeType("parameter".to_string()));
        }

        Ok(())
    }
}

#[test]
fn test_visitor_group_keeps_walking_for_unfinished_members() {
    let query = sample_query();
    let mut entered = Vec::new();

    {
        let mut group: VisitorGroup<'_, CypherNode<'_>, WalkError> = VisitorGroup::new();
        group.add(FirstParameter::default()).add(Recording {
            entered: &mut entered,
            fail_on_parameter: false,
        });

        walk(CypherNode::RegularQuery(&query), cypher_cursor, &mut group).expect("walks");

        assert_eq!(group.len(), 2);
        assert!(!group.done());
    }

    // The recorder saw the whole tree even though the other member finished at the first parameter
    assert_eq!(entered.iter().filter(|node_type| **node_type == "Parameter").count(), 2);
    assert_eq!(entered.last(), Some(&"Variable"));
}

#[test]
fn test_visitor_group_stops_on_the_first_error() {
    let query = sample_query();
    let mut observer = Vec::new();
    let mut failing = Vec::new();

    {
        let mut group: VisitorGroup<'_, CypherNode<'_>, WalkError> = VisitorGroup::new();
        group
            .add(Recording {
                entered: &mut observer,
                fail_on_parameter: false,
            })
            .add(Recording {
                entered: &mut failing,
                fail_on_parameter: true,
            });

        let result = walk(CypherNode::RegularQuery(&query), cypher_cursor, &mut group);

        assert_eq!(
            result,
            Err(WalkError::UnsupportedNodeType("parameter".to_string()))
        );
        assert!(group.done());
    }

    assert_eq!(observer, failing);
    assert_eq!(observer.last(), Some(&"Parameter"));
    assert_eq!(observer.iter().filter(|node_type| **node_type == "Parameter").count(), 1);
}

#[test]
fn test_referenced_variables() {
    let query = sample_query();

    let symbols =
        referenced_variables(CypherNode::RegularQuery(&query), cypher_cursor).expect("walks");

    assert_eq!(symbols, BTreeSet::from(["s".to_string()]));
}

#[test]
fn test_referenced_parameters_of_a_translated_statement() {
    let parameters = BTreeMap::from([
        ("name".to_string(), Value::from("admin")),
        ("enabled".to_string(), Value::from(true)),
    ]);

    let translation = translate(
        &sample_query(),
        &parameters,
        &SchemaKindMapper::new(),
        &TranslatorConfig::default(),
    )
    .expect("translates");

    let referenced = referenced_parameters(&translation.statement).expect("walks");

    assert_eq!(referenced.len(), 2);
    assert_eq!(
        translation.parameters.keys().cloned().collect::<Vec<_>>(),
        vec!["p0".to_string(), "p1".to_string()]
    );
}

type NodeKey = (&'static str, usize);

/// Checks walk order against the cursor: every node is entered once and exited once, and a
/// node's branches are all entered while it is the innermost open node.
struct OrderAudit<N> {
    key: fn(&N) -> NodeKey,
    open: Vec<NodeKey>,
    parents: BTreeMap<NodeKey, Option<NodeKey>>,
    entered: Vec<N>,
    exited: usize,
}

impl<N> OrderAudit<N> {
    fn new(key: fn(&N) -> NodeKey) -> Self {
        OrderAudit {
            key,
            open: Vec::new(),
            parents: BTreeMap::new(),
            entered: Vec::new(),
            exited: 0,
        }
    }

    fn verify(&self, branches: impl Fn(N) -> Vec<N>) -> BTreeSet<&'static str>
    where
        N: Copy,
    {
        assert!(self.open.is_empty());
        assert_eq!(self.exited, self.entered.len());
        assert_eq!(self.parents.len(), self.entered.len());

        for node in &self.entered {
            let parent = (self.key)(node);

            for branch in branches(*node) {
                assert_eq!(self.parents.get(&(self.key)(&branch)), Some(&Some(parent)));
            }
        }

        self.parents.keys().map(|(variant, _)| *variant).collect()
    }
}

impl<N: Copy> Visitor<N> for OrderAudit<N> {
    type Error = WalkError;

    fn enter(&mut self, node: N) -> Result<(), WalkError> {
        let key = (self.key)(&node);
        let previous = self.parents.insert(key, self.open.last().copied());

        assert!(previous.is_none(), "{:?} entered twice", key);

        self.open.push(key);
        self.entered.push(node);
        Ok(())
    }

    fn exit(&mut self, node: N) -> Result<(), WalkError> {
        assert_eq!(self.open.pop(), Some((self.key)(&node)));
        self.exited += 1;
        Ok(())
    }
}

macro_rules! node_key {
    ($node:expr, $handle:ident: $($variant:ident),+ $(,)?) => {
        match *$node {
            $($handle::$variant(inner) => (stringify!($variant), inner as *const _ as usize),)+
        }
    };
}

const CYPHER_VARIANTS: [&str; 28] = [
    "RegularQuery",
    "SinglePartQuery",
    "MultiPartQuery",
    "MultiPartQueryPart",
    "Match",
    "Where",
    "Unwind",
    "Create",
    "Delete",
    "Set",
    "SetItem",
    "Remove",
    "RemoveItem",
    "With",
    "Return",
    "Projection",
    "ProjectionItem",
    "Order",
    "SortItem",
    "Skip",
    "Limit",
    "PatternPart",
    "NodePattern",
    "RelationshipPattern",
    "Properties",
    "Expression",
    "PartialComparison",
    "PartialArithmetic",
];

fn cypher_key(node: &CypherNode<'_>) -> NodeKey {
    node_key!(node, CypherNode:
        RegularQuery, SinglePartQuery, MultiPartQuery, MultiPartQueryPart, Match, Where, Unwind,
        Create, Delete, Set, SetItem, Remove, RemoveItem, With, Return, Projection,
        ProjectionItem, Order, SortItem, Skip, Limit, PatternPart, NodePattern,
        RelationshipPattern, Properties, Expression, PartialComparison, PartialArithmetic,
    )
}

const PG_VARIANTS: [&str; 11] = [
    "Statement",
    "Query",
    "CommonTableExpression",
    "SetExpression",
    "Select",
    "FromClause",
    "Join",
    "OrderBy",
    "Assignment",
    "MergeAction",
    "Expression",
];

fn pg_key(node: &PgNode<'_>) -> NodeKey {
    node_key!(node, PgNode:
        Statement, Query, CommonTableExpression, SetExpression, Select, FromClause, Join,
        OrderBy, Assignment, MergeAction, Expression,
    )
}

fn lookup(symbol: &str, property: &str) -> Expression {
    PropertyLookup::new(symbol, property).into()
}

fn bound_node(symbol: &str) -> PatternElement {
    PatternElement::Node(NodePattern {
        binding: Some(Variable::new(symbol)),
        ..Default::default()
    })
}

/// `unwind [1, 2] as x create (n:User {name: $name}) with n as m order by m.name skip 1
/// limit 10 where not m:Admin match p = (m)-[r $props]->(e) where ... set ... remove ...
/// detach delete r return m`
fn every_cypher_node() -> RegularQuery {
    let part = MultiPartQueryPart {
        reading_clauses: vec![ReadingClause::Unwind(Unwind {
            expression: Expression::List(ListLiteral {
                items: vec![Expression::literal(1i64), Expression::literal(2i64)],
                data_type: None,
            }),
            binding: Variable::new("x"),
        })],
        updating_clauses: vec![UpdatingClause::Create(Create {
            unique: false,
            pattern: vec![PatternPart {
                elements: vec![PatternElement::Node(NodePattern {
                    binding: Some(Variable::new("n")),
                    kinds: vec![Kind::from("User")],
                    properties: Some(Properties::Map(MapLiteral {
                        entries: BTreeMap::from([(
                            "name".to_string(),
                            Parameter::new("name").into(),
                        )]),
                    })),
                })],
                ..Default::default()
            }],
        })],
        with: With {
            projection: Projection {
                items: vec![ProjectionItem {
                    expression: Expression::variable("n"),
                    binding: Some(Variable::new("m")),
                }],
                order: Some(Order {
                    items: vec![SortItem {
                        ascending: true,
                        expression: lookup("m", "name"),
                    }],
                }),
                skip: Some(Skip {
                    value: Expression::literal(1i64),
                }),
                limit: Some(Limit {
                    value: Expression::literal(10i64),
                }),
                ..Default::default()
            },
            where_clause: Some(Where::new(Expression::negation(
                KindMatcher::new(Expression::variable("m"), vec![Kind::from("Admin")]).into(),
            ))),
        },
    };

    let arithmetic = Expression::Arithmetic(ArithmeticExpression {
        left: Box::new(lookup("m", "logins")),
        partials: vec![PartialArithmetic {
            operator: Operator::Add,
            right: Expression::literal(1i64),
        }],
    });

    let predicate = Expression::disjunction(vec![
        Comparison::new(arithmetic, Operator::GreaterThan, Expression::literal(2i64)).into(),
        Expression::parenthetical(
            FunctionInvocation::new("toLower", vec![lookup("m", "name")]).into(),
        ),
        Expression::ExclusiveDisjunction(ExpressionList::new(vec![
            Expression::conjunction(vec![Expression::variable("x")]),
            PatternPredicate {
                elements: vec![
                    bound_node("m"),
                    PatternElement::Relationship(RelationshipPattern::default()),
                    PatternElement::Node(NodePattern::default()),
                ],
            }
            .into(),
        ])),
    ]);

    let final_part = SinglePartQuery {
        reading_clauses: vec![ReadingClause::Match(Match {
            optional: false,
            pattern: vec![PatternPart {
                binding: Some(Variable::new("p")),
                elements: vec![
                    bound_node("m"),
                    PatternElement::Relationship(RelationshipPattern {
                        binding: Some(Variable::new("r")),
                        properties: Some(Properties::Parameter(Parameter::new("props"))),
                        ..Default::default()
                    }),
                    bound_node("e"),
                ],
                ..Default::default()
            }],
            where_clause: Some(Where::new(predicate)),
        })],
        updating_clauses: vec![
            UpdatingClause::Set(Set {
                items: vec![SetItem {
                    left: Expression::variable("m"),
                    operator: AssignmentOperator::AddAssign,
                    right: Expression::Map(MapLiteral {
                        entries: BTreeMap::from([(
                            "seen".to_string(),
                            Expression::literal(true),
                        )]),
                    }),
                }],
            }),
            UpdatingClause::Remove(Remove {
                items: vec![RemoveItem {
                    expression: lookup("m", "stale"),
                }],
            }),
            UpdatingClause::Delete(Delete {
                detach: true,
                expressions: vec![Expression::variable("r")],
            }),
        ],
        return_clause: Some(Return {
            projection: Projection {
                items: vec![ProjectionItem {
                    expression: Expression::variable("m"),
                    binding: None,
                }],
                ..Default::default()
            },
        }),
    };

    RegularQuery {
        single_query: SingleQuery::MultiPart(MultiPartQuery {
            parts: vec![part],
            single_part_query: final_part,
        }),
    }
}

fn table(name: &str, binding: &str) -> TableReference {
    TableReference::new(name, Some(binding.into()))
}

fn column(binding: &str, column: &str) -> PgExpression {
    PgExpression::column(&Identifier::new(binding), column)
}

fn every_pg_statement() -> Vec<Statement> {
    let exists = PgExpression::Exists(Box::new(Query::select(Select {
        projection: vec![PgExpression::Wildcard],
        from: vec![FromClause::new(table("edge", "e0"))],
        where_clause: Some(PgExpression::binary(
            column("e0", "start_id"),
            PgOperator::Equals,
            column("n", "id"),
        )),
        ..Default::default()
    })));

    let select = Select {
        distinct: false,
        projection: vec![
            PgExpression::aliased(
                PgExpression::Entity {
                    binding: "n".into(),
                    data_type: DataType::Node,
                },
                "n",
            ),
            PgExpression::CompositeValue {
                values: vec![column("n", "id"), column("n", "properties")],
                data_type: DataType::Node,
            },
            PgExpression::function("count", vec![PgExpression::identifier("n")]),
        ],
        from: vec![FromClause {
            source: table("node", "n"),
            joins: vec![Join {
                table: table("edge", "r"),
                operator: JoinOperator {
                    join_type: JoinType::Inner,
                    constraint: PgExpression::binary(
                        column("r", "start_id"),
                        PgOperator::Equals,
                        column("n", "id"),
                    ),
                },
            }],
        }],
        where_clause: Some(PgExpression::binary(
            exists,
            PgOperator::And,
            PgExpression::unary(
                PgOperator::Not,
                PgExpression::parenthetical(PgExpression::binary(
                    PgExpression::AnnotatedPropertyLookup {
                        reference: "n".into(),
                        key: "name".to_string(),
                        data_type: DataType::Text,
                    },
                    PgOperator::Equals,
                    PgExpression::Any(Box::new(PgExpression::AnnotatedParameter {
                        identifier: "p0".into(),
                        data_type: DataType::TextArray,
                    })),
                )),
            ),
        )),
        group_by: vec![column("n", "id")],
        having: Some(PgExpression::type_cast(
            PgExpression::ArrayLiteral(vec![PgExpression::Literal(Value::from(1i64))]),
            DataType::Int2Array,
        )),
    };

    let query = Query {
        with: Some(PgWith {
            recursive: false,
            expressions: vec![CommonTableExpression {
                alias: TableAlias {
                    name: "seed".into(),
                    shape: Some(vec!["id".into()]),
                },
                query: Query::values(vec![vec![PgExpression::Literal(Value::from(1i64))]]),
            }],
        }),
        body: SetExpression::SetOperation(SetOperation {
            operator: SetOperator::Union,
            all: false,
            lhs: Box::new(SetExpression::Select(Box::new(select))),
            rhs: Box::new(SetExpression::Query(Box::new(Query::select(Select {
                projection: vec![PgExpression::Wildcard],
                from: vec![FromClause::new(table("seed", "s"))],
                ..Default::default()
            })))),
        }),
        order_by: vec![OrderBy {
            expression: PgExpression::identifier("n"),
            ascending: true,
        }],
        offset: Some(PgExpression::Literal(Value::from(5i64))),
        limit: Some(PgExpression::Literal(Value::from(10i64))),
    };

    let assignment = Assignment {
        column: "properties".into(),
        value: PgExpression::binary(
            PgExpression::identifier("properties"),
            PgOperator::Concatenate,
            PgExpression::parameter("p1"),
        ),
    };

    vec![
        Statement::Query(query),
        Statement::Insert(Insert {
            table: table("node", "n"),
            columns: vec!["kind_ids".into(), "properties".into()],
            source: Query::values(vec![vec![
                PgExpression::parameter("p0"),
                PgExpression::parameter("p1"),
            ]]),
            returning: vec![PgExpression::Entity {
                binding: "n".into(),
                data_type: DataType::Node,
            }],
        }),
        Statement::Update(Update {
            table: table("node", "n"),
            assignments: vec![assignment.clone()],
            from: vec![FromClause::new(table("edge", "r"))],
            where_clause: Some(PgExpression::AnnotatedKindMatcher {
                reference: "n".into(),
                kind_ids: vec![1],
                data_type: DataType::Node,
            }),
            returning: Vec::new(),
        }),
        Statement::Delete(PgDelete {
            table: table("edge", "r"),
            using: vec![FromClause::new(table("node", "s"))],
            where_clause: Some(PgExpression::binary(
                PgExpression::KindReference {
                    binding: "r".into(),
                    data_type: DataType::Edge,
                },
                PgOperator::Equals,
                PgExpression::AnnotatedLiteral {
                    value: Value::from(100i16),
                    data_type: DataType::Int2,
                },
            )),
            returning: vec![column("r", "id")],
        }),
        Statement::Merge(Merge {
            target: table("node", "n"),
            source: table("seed", "s"),
            on: PgExpression::binary(column("n", "id"), PgOperator::Equals, column("s", "id")),
            actions: vec![
                MergeAction::Matched {
                    predicate: Some(PgExpression::PropertyLookup {
                        reference: "n".into(),
                        key: "name".to_string(),
                    }),
                    action: MatchedAction::Update(vec![assignment]),
                },
                MergeAction::NotMatched {
                    predicate: None,
                    action: NotMatchedAction::Insert {
                        columns: vec!["id".into()],
                        values: vec![column("s", "id")],
                    },
                },
            ],
        }),
    ]
}

#[test]
fn test_cypher_walk_enters_every_node_before_its_branches() {
    let query = every_cypher_node();
    let mut audit: OrderAudit<CypherNode<'_>> = OrderAudit::new(cypher_key);

    walk(CypherNode::RegularQuery(&query), cypher_cursor, &mut audit).expect("walks");

    let variants = audit.verify(|node| node.branches());
    assert_eq!(variants, BTreeSet::from(CYPHER_VARIANTS));
}

#[test]
fn test_pgsql_walk_enters_every_node_before_its_branches() {
    let statements = every_pg_statement();
    let mut variants = BTreeSet::new();

    for statement in &statements {
        let mut audit: OrderAudit<PgNode<'_>> = OrderAudit::new(pg_key);

        walk(PgNode::Statement(statement), pgsql_cursor, &mut audit).expect("walks");

        variants.extend(audit.verify(|node| {
            pgsql_cursor(node).map(|cursor| cursor.branches).unwrap_or_default()
        }));
    }

    assert_eq!(variants, BTreeSet::from(PG_VARIANTS));
}
