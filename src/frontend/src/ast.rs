use {
    derive_more::{Display, From},
    std::{
        cell::{Ref, RefCell, RefMut},
        fmt,
        rc::{Rc, Weak},
    },
};

/// Names the rewrite rules and the code generator give special meaning to.
pub mod keyword {
    pub const FUNC: &str = "func";
    pub const DEF_TYPE: &str = "def-type";
    pub const DEFINE: &str = "define";
    pub const NOP: &str = "nop";
    /// Implicit receiver parameter prepended to every method.
    pub const THIS: &str = "this";
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Self(Rc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

#[derive(Debug, Clone, PartialEq, From)]
pub enum Atom {
    Number(f64),
    Str(String),
    Bool(bool),
    Symbol(Symbol),
}

impl Atom {
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Atom::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Truthiness of a literal; symbols have none until they are evaluated.
    pub fn truthiness(&self) -> Option<bool> {
        match *self {
            Atom::Bool(b) => Some(b),
            Atom::Number(n) => Some(n != 0.0),
            Atom::Str(_) => Some(true),
            Atom::Symbol(_) => None,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Atom::Number(n) => write!(f, "{n}"),
            Atom::Str(ref s) => write!(f, "{s:?}"),
            Atom::Bool(b) => write!(f, "{b}"),
            Atom::Symbol(ref sym) => write!(f, "{sym}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    pub params: Vec<Symbol>,
    pub body: Vec<Expr>,
}

/// A desugared type definition. `ctor` and every method node hold a
/// [`Form::Func`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: Symbol,
    pub fields: Vec<Symbol>,
    pub ctor: Rc<Node>,
    pub methods: Vec<(Symbol, Rc<Node>)>,
}

impl TypeDef {
    pub fn predicate_name(&self) -> Symbol {
        Symbol::new(&format!("{}?", self.name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    List(Vec<Expr>),
    Quoted(Expr),
    Func(FuncLit),
    TypeDef(TypeDef),
}

impl Form {
    /// Children that are themselves nodes, in order. Each form lists its own
    /// layout so parent links can be rebuilt without knowing the variant.
    pub fn child_nodes(&self) -> Vec<Rc<Node>> {
        fn nodes<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> Vec<Rc<Node>> {
            exprs
                .into_iter()
                .filter_map(|expr| expr.as_node().cloned())
                .collect()
        }
        match *self {
            Form::List(ref items) => nodes(items),
            Form::Quoted(ref inner) => nodes([inner]),
            Form::Func(ref func) => nodes(&func.body),
            Form::TypeDef(ref def) => std::iter::once(def.ctor.clone())
                .chain(def.methods.iter().map(|(_, method)| method.clone()))
                .collect(),
        }
    }
}

#[derive(Debug)]
pub struct Node {
    form: RefCell<Form>,
    parent: RefCell<Weak<Node>>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        *self.form.borrow() == *other.form.borrow()
    }
}

impl Node {
    pub fn new(form: Form) -> Rc<Self> {
        Rc::new(Self {
            form: RefCell::new(form),
            parent: RefCell::new(Weak::new()),
        })
    }

    pub fn form(&self) -> Ref<'_, Form> {
        self.form.borrow()
    }

    pub fn form_mut(&self) -> RefMut<'_, Form> {
        self.form.borrow_mut()
    }

    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.borrow().upgrade()
    }

    pub fn set_parent(&self, parent: Option<&Rc<Node>>) {
        *self.parent.borrow_mut() = parent.map(Rc::downgrade).unwrap_or_default();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Atom(Atom),
    Node(Rc<Node>),
}

impl From<Atom> for Expr {
    fn from(atom: Atom) -> Self {
        Expr::Atom(atom)
    }
}

impl From<Rc<Node>> for Expr {
    fn from(node: Rc<Node>) -> Self {
        Expr::Node(node)
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::Atom(Atom::Number(n))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Atom(Atom::Bool(b))
    }
}

impl From<Symbol> for Expr {
    fn from(sym: Symbol) -> Self {
        Expr::Atom(Atom::Symbol(sym))
    }
}

impl Expr {
    pub fn symbol(name: &str) -> Self {
        Expr::Atom(Atom::Symbol(Symbol::new(name)))
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Expr::Node(Node::new(Form::List(items)))
    }

    pub fn quoted(inner: Expr) -> Self {
        Expr::Node(Node::new(Form::Quoted(inner)))
    }

    pub fn func(params: Vec<Symbol>, body: Vec<Expr>) -> Self {
        Expr::Node(Node::new(Form::Func(FuncLit { params, body })))
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Expr::Atom(atom) => Some(atom),
            Expr::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&Rc<Node>> {
        match self {
            Expr::Node(node) => Some(node),
            Expr::Atom(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Atom(Atom::Symbol(sym)) => Some(sym),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        self.as_atom().and_then(Atom::as_number)
    }

    /// A literal is any atom that is not a symbol.
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Atom(atom) if !matches!(atom, Atom::Symbol(_)))
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        self.as_symbol().is_some_and(|sym| *sym == name)
    }

    /// The items of a plain list, or `None` for atoms and specialised forms.
    pub fn list_items(&self) -> Option<Vec<Expr>> {
        match *self.as_node()?.form() {
            Form::List(ref items) => Some(items.clone()),
            _ => None,
        }
    }

    /// The symbol heading a plain list.
    pub fn head_symbol(&self) -> Option<Symbol> {
        match *self.as_node()?.form() {
            Form::List(ref items) => items.first()?.as_symbol().cloned(),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<Rc<Node>> {
        self.as_node()?.parent()
    }

    /// Index of this node among its parent's node children.
    pub fn position(&self) -> Option<usize> {
        let node = self.as_node()?;
        node.parent()?
            .form()
            .child_nodes()
            .iter()
            .position(|child| Rc::ptr_eq(child, node))
    }
}

fn write_joined(
    f: &mut fmt::Formatter,
    items: impl IntoIterator<Item = impl fmt::Display>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Form::List(ref items) => {
                write!(f, "(")?;
                write_joined(f, items)?;
                write!(f, ")")
            }
            Form::Quoted(ref inner) => write!(f, "'{inner}"),
            Form::Func(ref func) => {
                write!(f, "({} (", keyword::FUNC)?;
                write_joined(f, &func.params)?;
                write!(f, ")")?;
                for expr in &func.body {
                    write!(f, " {expr}")?;
                }
                write!(f, ")")
            }
            Form::TypeDef(ref def) => {
                write!(f, "({} {} (", keyword::DEF_TYPE, def.name)?;
                write_joined(f, &def.fields)?;
                write!(f, ") {}", def.ctor.form())?;
                for (name, method) in &def.methods {
                    write!(f, " ({name} {})", method.form())?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Atom(atom) => write!(f, "{atom}"),
            Expr::Node(node) => write!(f, "{}", node.form()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ast {
    pub forms: Vec<Expr>,
}
