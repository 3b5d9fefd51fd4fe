use {
    super::{desugar, error::RewriteError, fold},
    frontend::{
        ast::{Expr, Form, Node},
        indented_log,
    },
    log::Level,
    std::{
        collections::{HashMap, HashSet},
        rc::Rc,
    },
};

type Rule = fn(&Expr) -> Result<Option<Expr>, RewriteError>;

fn preserve(_: &Expr) -> Result<Option<Expr>, RewriteError> {
    Ok(None)
}

/// Applied in order to every node. Each rule sees the output of the ones
/// before it; a node is never handed back to a rule that already ran on it.
static RULES: &[(&str, Rule)] = &[
    ("nop", desugar::eliminate_nops),
    ("fold", fold::fold_operators),
    ("func", desugar::recognize_func),
    ("def-type", desugar::desugar_type_def),
    ("identity", preserve),
];

#[derive(Default)]
struct Rewriter {
    // Each node met to its rewrite, `None` while that rewrite is in progress.
    // Holding each node keeps its address from being reused by a node built
    // later in the same pass.
    visited: HashMap<*const Node, (Rc<Node>, Option<Expr>)>,
    depth: usize,
}

impl Rewriter {
    fn finish(&mut self, node: &Rc<Node>, rewritten: &Expr) {
        self.visited.insert(
            Rc::as_ptr(node),
            (Rc::clone(node), Some(rewritten.clone())),
        );
    }

    fn rewrite(&mut self, expr: Expr) -> Result<Expr, RewriteError> {
        // no rule matches an atom
        let Expr::Node(ref node) = expr else {
            return Ok(expr);
        };
        match self.visited.get(&Rc::as_ptr(node)) {
            Some((_, Some(rewritten))) => return Ok(rewritten.clone()),
            // reached again through a cycle
            Some((_, None)) => return Ok(expr),
            None => {}
        }
        let node = Rc::clone(node);
        self.visited.insert(Rc::as_ptr(&node), (Rc::clone(&node), None));
        self.depth += 1;
        let result = self.rewrite_unvisited(expr);
        self.depth -= 1;
        let rewritten = result?;
        self.finish(&node, &rewritten);
        Ok(rewritten)
    }

    fn rewrite_unvisited(&mut self, mut expr: Expr) -> Result<Expr, RewriteError> {
        self.rewrite_children(&expr)?;
        for &(name, rule) in RULES {
            let Some(replacement) = rule(&expr)? else {
                continue;
            };
            indented_log!(Level::Debug, self.depth, "{name}: {expr} => {replacement}");
            if let Expr::Node(ref node) = replacement {
                self.finish(node, &replacement);
            }
            self.rewrite_children(&replacement)?;
            expr = replacement;
        }
        Ok(expr)
    }

    fn rewrite_all(&mut self, exprs: &mut [Expr]) -> Result<(), RewriteError> {
        for expr in exprs {
            *expr = self.rewrite(expr.clone())?;
        }
        Ok(())
    }

    // Function literals come back from the pipeline as themselves, so a
    // rewritten child that is no longer a node leaves the slot untouched.
    fn rewrite_node(&mut self, node: &mut Rc<Node>) -> Result<(), RewriteError> {
        if let Expr::Node(rewritten) = self.rewrite(Expr::Node(Rc::clone(node)))? {
            *node = rewritten;
        }
        Ok(())
    }

    fn rewrite_children(&mut self, expr: &Expr) -> Result<(), RewriteError> {
        let Expr::Node(node) = expr else {
            return Ok(());
        };
        // work on a shallow copy so no borrow is held while descending
        let mut form = node.form().clone();
        match form {
            Form::List(ref mut items) => self.rewrite_all(items)?,
            // quoted data is kept verbatim
            Form::Quoted(_) => return Ok(()),
            Form::Func(ref mut func) => self.rewrite_all(&mut func.body)?,
            Form::TypeDef(ref mut def) => {
                self.rewrite_node(&mut def.ctor)?;
                for (_, method) in &mut def.methods {
                    self.rewrite_node(method)?;
                }
            }
        }
        *node.form_mut() = form;
        Ok(())
    }
}

/// Points every node's parent link at the node that holds it. Each node
/// lists its own children through [`Form::child_nodes`].
fn relink_parents(root: &Expr) {
    let Expr::Node(root) = root else {
        return;
    };
    root.set_parent(None);
    let mut linked = HashSet::from([Rc::as_ptr(root)]);
    let mut pending = vec![Rc::clone(root)];
    while let Some(node) = pending.pop() {
        for child in node.form().child_nodes() {
            child.set_parent(Some(&node));
            if linked.insert(Rc::as_ptr(&child)) {
                pending.push(child);
            }
        }
    }
}

/// Rewrites `expr` bottom-up until no rule applies, then relinks parents.
/// A node shared between several parents is rewritten once and every
/// parent receives the same result.
pub fn normalize(expr: Expr) -> Result<Expr, RewriteError> {
    let mut rewriter = Rewriter::default();
    let root = expr.clone();
    let expr = rewriter
        .rewrite(expr)
        .inspect_err(|err| log::error!("error with `{root}`: {err}"))?;
    relink_parents(&expr);
    Ok(expr)
}
