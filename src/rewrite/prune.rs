use crate::cypher::{Expression, ExpressionList};

enum Pruned {
    Keep,
    Remove,
    Replace(Expression),
}

fn classify(expression: &mut Expression) -> Pruned {
    match expression {
        Expression::Conjunction(list)
        | Expression::Disjunction(list)
        | Expression::ExclusiveDisjunction(list)
            if list.is_empty() =>
        {
            Pruned::Remove
        }
        Expression::Parenthetical(parenthetical) => {
            match parenthetical.expression.as_expression_list_mut() {
                Some(list) if list.is_empty() => Pruned::Remove,
                Some(list) if list.len() == 1 => match list.remove(0) {
                    Some(only) => Pruned::Replace(only),
                    None => Pruned::Keep,
                },
                _ => Pruned::Keep,
            }
        }
        _ => Pruned::Keep,
    }
}

/// Prune the direct children of `list`.
///
/// Empty expression lists are removed, as are parentheticals around them. A parenthetical around
/// a single-member list is replaced by that member.
pub fn prune_children(list: &mut ExpressionList) {
    let mut index = 0;

    while index < list.len() {
        let Some(child) = list.expressions.get_mut(index) else {
            break;
        };

        match classify(child) {
            Pruned::Keep => index += 1,
            Pruned::Remove => {
                list.remove(index);
            }
            Pruned::Replace(replacement) => {
                list.replace(index, replacement);
                index += 1;
            }
        }
    }
}

/// Prune every expression list under `expression`, innermost first.
pub fn prune(expression: &mut Expression) {
    match expression {
        Expression::Conjunction(list)
        | Expression::Disjunction(list)
        | Expression::ExclusiveDisjunction(list) => {
            for child in &mut list.expressions {
                prune(child);
            }

            prune_children(list);
        }
        Expression::Parenthetical(parenthetical) => prune(&mut parenthetical.expression),
        Expression::Negation(negation) => prune(&mut negation.expression),
        _ => {}
    }
}
