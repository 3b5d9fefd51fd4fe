use {
    super::error::RewriteError,
    frontend::ast::{keyword, Expr, Form, FuncLit, Node, Symbol, TypeDef},
    std::{collections::BTreeSet, rc::Rc},
    velcro::vec,
};

type Desugared = Result<Option<Expr>, RewriteError>;

fn is_nop(expr: &Expr) -> bool {
    expr.head_symbol().is_some_and(|head| head == keyword::NOP)
}

/// Drops `(nop ...)` forms from the list containing them. A `def-type`
/// keeps its items in place, since a nop there is the constructor body.
pub(super) fn eliminate_nops(expr: &Expr) -> Desugared {
    let Some(items) = expr.list_items() else {
        return Ok(None);
    };
    let is_type_def = items
        .first()
        .is_some_and(|head| head.is_symbol(keyword::DEF_TYPE));
    if is_nop(expr) || is_type_def || !items.iter().any(is_nop) {
        return Ok(None);
    }
    Ok(Some(Expr::list(
        items.into_iter().filter(|item| !is_nop(item)).collect(),
    )))
}

fn symbol_list(expr: &Expr) -> Option<Vec<Symbol>> {
    expr.list_items()?
        .iter()
        .map(|item| item.as_symbol().cloned())
        .collect()
}

fn first_duplicate<'a>(names: impl IntoIterator<Item = &'a Symbol>) -> Option<&'a Symbol> {
    let mut seen = BTreeSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}

/// Turns `(func (params...) body...)` into a function literal.
pub(super) fn recognize_func(expr: &Expr) -> Desugared {
    let Some(items) = expr.list_items() else {
        return Ok(None);
    };
    if !items.first().is_some_and(|head| head.is_symbol(keyword::FUNC)) {
        return Ok(None);
    }
    let Some(params) = items.get(1) else {
        return Err(RewriteError::malformed(expr, "func requires a parameter list"));
    };
    let Some(params) = symbol_list(params) else {
        return Err(RewriteError::malformed(
            expr,
            "func's first argument must be a list of parameter names",
        ));
    };
    if let Some(name) = first_duplicate(&params) {
        return Err(RewriteError::malformed(
            expr,
            format!("parameter `{name}` is declared more than once"),
        ));
    }
    Ok(Some(Expr::func(params, items[2..].to_vec())))
}

fn method_pair(pair: &Expr) -> Option<(Symbol, FuncLit)> {
    let items = pair.list_items()?;
    let [name, func] = items.as_slice() else {
        return None;
    };
    let name = name.as_symbol()?.clone();
    let func = match *func.as_node()?.form() {
        Form::Func(ref func) => func.clone(),
        _ => return None,
    };
    Some((name, func))
}

/// Expands `(def-type Name (fields...) ctor-body (method (func ...))...)`
/// into a constructor and methods taking an implicit receiver.
pub(super) fn desugar_type_def(expr: &Expr) -> Desugared {
    let Some(items) = expr.list_items() else {
        return Ok(None);
    };
    if !items
        .first()
        .is_some_and(|head| head.is_symbol(keyword::DEF_TYPE))
    {
        return Ok(None);
    }

    let [_, name, fields, ctor_body, methods @ ..] = items.as_slice() else {
        return Err(RewriteError::malformed(
            expr,
            "def-type takes at least three arguments (name, fields, ctor)",
        ));
    };
    let Some(name) = name.as_symbol().cloned() else {
        return Err(RewriteError::malformed(
            expr,
            "def-type's first argument must be a type name",
        ));
    };
    let Some(fields) = symbol_list(fields) else {
        return Err(RewriteError::malformed(
            expr,
            "def-type's second argument must be a list of names",
        ));
    };
    if let Some(field) = first_duplicate(&fields) {
        return Err(RewriteError::malformed(
            expr,
            format!("field `{field}` is declared more than once"),
        ));
    }
    let Some(methods) = methods.iter().map(method_pair).collect::<Option<Vec<_>>>() else {
        return Err(RewriteError::malformed(
            expr,
            "all further arguments to def-type must be name-function pairs",
        ));
    };

    let receiver = Symbol::new(keyword::THIS);
    if let Some((method, _)) = methods
        .iter()
        .find(|(_, func)| func.params.contains(&receiver))
    {
        return Err(RewriteError::malformed(
            expr,
            format!("method `{method}` must not declare `{receiver}` itself"),
        ));
    }

    let predicate = Symbol::new(&format!("{name}?"));
    let names = [&name, &predicate]
        .into_iter()
        .chain(methods.iter().map(|(method, _)| method));
    if let Some(duplicate) = first_duplicate(names) {
        return Err(RewriteError::DuplicateName {
            ty: name.to_string(),
            name: duplicate.to_string(),
        });
    }

    log::info!("desugaring type definition `{name}`");

    let ctor = Node::new(Form::Func(FuncLit {
        params: fields.clone(),
        body: vec![ctor_body.clone()],
    }));
    let methods = methods
        .into_iter()
        .map(|(method, func)| {
            let func = FuncLit {
                params: vec![receiver.clone(), ..func.params],
                body: func.body,
            };
            (method, Node::new(Form::Func(func)))
        })
        .collect::<Vec<(Symbol, Rc<Node>)>>();

    Ok(Some(Expr::Node(Node::new(Form::TypeDef(TypeDef {
        name,
        fields,
        ctor,
        methods,
    })))))
}
