use {
    super::{error::RewriteError, op::Operator},
    frontend::ast::{Atom, Expr, Symbol},
};

type Folded = Result<Option<Expr>, RewriteError>;

fn arity_error(head: &Symbol, expected: &'static str, found: usize) -> RewriteError {
    RewriteError::Arity {
        operator: head.to_string(),
        expected,
        found,
    }
}

/// Rebuilds `(head operands...)`, or collapses it when at most one operand
/// is left.
fn collapse(head: &Expr, mut operands: Vec<Expr>, empty: Expr) -> Expr {
    match operands.len() {
        0 => empty,
        1 => operands.remove(0),
        _ => Expr::list(std::iter::once(head.clone()).chain(operands).collect()),
    }
}

fn as_int(n: f64) -> i64 {
    n as i64
}

fn combine(op: Operator, lhs: f64, rhs: f64) -> f64 {
    match op {
        Operator::Add => lhs + rhs,
        Operator::Sub => lhs - rhs,
        Operator::Mul => lhs * rhs,
        Operator::Div => lhs / rhs,
        Operator::BitAnd => (as_int(lhs) & as_int(rhs)) as f64,
        Operator::BitOr => (as_int(lhs) | as_int(rhs)) as f64,
        Operator::BitXor => (as_int(lhs) ^ as_int(rhs)) as f64,
        _ => unreachable!("`{op}` is not a combining operator"),
    }
}

// Literals are scanned only up to the first symbol or tree operand: an
// earlier operand could still fail at runtime.
fn literal_prefix(operands: &[Expr]) -> impl Iterator<Item = &Atom> {
    operands.iter().map_while(|operand| match operand {
        Expr::Atom(atom) if operand.is_literal() => Some(atom),
        _ => None,
    })
}

fn fold_and(head: &Expr, operands: &[Expr]) -> Option<Expr> {
    if literal_prefix(operands).any(|atom| atom.truthiness() == Some(false)) {
        return Some(Expr::from(false));
    }
    let kept = operands
        .iter()
        .filter(|operand| !matches!(operand, Expr::Atom(Atom::Bool(true))))
        .cloned()
        .collect();
    Some(collapse(head, kept, Expr::from(true)))
}

fn fold_or(head: &Expr, operands: &[Expr]) -> Option<Expr> {
    if let Some(atom) = literal_prefix(operands).find(|atom| atom.truthiness() == Some(true)) {
        return Some(Expr::Atom(atom.clone()));
    }
    let kept = operands
        .iter()
        .filter(|operand| !matches!(operand, Expr::Atom(Atom::Bool(false))))
        .cloned()
        .collect();
    Some(collapse(head, kept, Expr::from(false)))
}

fn fold_commutative(op: Operator, head: &Expr, operands: &[Expr]) -> Option<Expr> {
    let numbers = operands.iter().filter_map(Expr::as_number).collect::<Vec<_>>();
    if numbers.len() < 2 {
        return None;
    }
    let combined = numbers
        .into_iter()
        .reduce(|lhs, rhs| combine(op, lhs, rhs))?;
    let kept = operands
        .iter()
        .filter(|operand| operand.as_number().is_none())
        .cloned()
        .chain([Expr::from(combined)])
        .collect();
    Some(collapse(head, kept, Expr::from(combined)))
}

/// Folds the leading run of literals of `-` or `/`, keeping left association.
fn fold_leading(op: Operator, head: &Expr, operands: &[Expr]) -> Option<Expr> {
    let mut run = operands
        .iter()
        .take_while(|operand| operand.as_number().is_some())
        .count();
    if op == Operator::Div {
        // a literal zero divisor is left for runtime
        if let Some(zero) = operands[1..run.max(1)]
            .iter()
            .position(|operand| operand.as_number() == Some(0.0))
        {
            run = zero + 1;
        }
    }
    if run < 2 {
        return None;
    }
    let acc = operands[..run]
        .iter()
        .filter_map(Expr::as_number)
        .reduce(|lhs, rhs| combine(op, lhs, rhs))?;
    let kept = std::iter::once(Expr::from(acc))
        .chain(operands[run..].iter().cloned())
        .collect();
    Some(collapse(head, kept, Expr::from(acc)))
}

fn fold_binary(op: Operator, lhs: &Expr, rhs: &Expr) -> Option<Expr> {
    let (lhs, rhs) = (lhs.as_number()?, rhs.as_number()?);
    let value = match op {
        Operator::Shift => {
            let (value, count) = (as_int(lhs), as_int(rhs));
            let amount = u32::try_from(count.unsigned_abs()).ok()?;
            let shifted = match count.signum() {
                1 => value.checked_shl(amount)?,
                -1 => value.checked_shr(amount)?,
                _ => value,
            };
            shifted as f64
        }
        Operator::Rem if rhs == 0.0 => return None,
        // floored: the result takes the sign of the divisor
        Operator::Rem => lhs - rhs * (lhs / rhs).floor(),
        _ => return None,
    };
    Some(Expr::from(value))
}

fn fold_unary(op: Operator, operand: &Expr) -> Option<Expr> {
    match op {
        Operator::Not => {
            if !operand.is_literal() {
                return None;
            }
            let truthy = operand.as_atom()?.truthiness()?;
            Some(Expr::from(!truthy))
        }
        Operator::Sub => Some(Expr::from(-operand.as_number()?)),
        Operator::BitNot => Some(Expr::from(!as_int(operand.as_number()?) as f64)),
        _ => None,
    }
}

/// Simplifies an operator form whose operands allow it. Declines (returns
/// `None`) when nothing would change.
pub(super) fn fold_operators(expr: &Expr) -> Folded {
    let Some(items) = expr.list_items() else {
        return Ok(None);
    };
    let Some((head, operands)) = items.split_first() else {
        return Ok(None);
    };
    let Some(name) = head.as_symbol() else {
        return Ok(None);
    };
    let Some(op) = Operator::from_symbol(name.as_str()) else {
        return Ok(None);
    };

    let folded = match (op, operands) {
        (Operator::And, _) => fold_and(head, operands),
        (Operator::Or, _) => fold_or(head, operands),
        (Operator::Add, []) => Some(Expr::from(0.0)),
        (Operator::Mul, []) => Some(Expr::from(1.0)),
        (
            Operator::Sub | Operator::Div | Operator::BitAnd | Operator::BitOr | Operator::BitXor,
            [],
        ) => return Err(arity_error(name, "at least 1", 0)),
        (Operator::Sub, [operand]) => fold_unary(op, operand),
        (Operator::Sub | Operator::Div, _) => fold_leading(op, head, operands),
        _ if op.is_commutative() => fold_commutative(op, head, operands),
        _ if op.is_binary() && operands.len() != 2 => {
            return Err(arity_error(name, "exactly 2", operands.len()));
        }
        (Operator::Shift | Operator::Rem, [lhs, rhs]) => fold_binary(op, lhs, rhs),
        (_, [operand]) if op.is_unary() => fold_unary(op, operand),
        _ if op.is_unary() => return Err(arity_error(name, "exactly 1", operands.len())),
        // comparisons are left to the backend
        _ => None,
    };

    Ok(folded.filter(|folded| folded != expr))
}
