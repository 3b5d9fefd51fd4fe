use {
    crate::{emit::Label, registers::Register},
    derive_more::{Display, From},
    frontend::ast::Symbol,
    std::collections::HashMap,
};

/// Where a generated value lives.
#[derive(Debug, Clone, PartialEq, Eq, Display, From)]
pub enum Value {
    #[display("{_0}")]
    Register(Register),
    #[display("{_0}")]
    Label(Label),
}

#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<Symbol, Value>,
    // lookups starting inside stop here instead of reaching enclosing scopes
    boundary: bool,
}

/// Chain of lexical scopes, innermost last. The root scope also owns the
/// table of global function labels, created on first use.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    globals: Option<HashMap<Symbol, Label>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            scopes: vec![Scope::default()],
            globals: None,
        }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn enter(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Enters a scope that hides every enclosing local binding.
    pub fn enter_boundary(&mut self) {
        self.scopes.push(Scope {
            boundary: true,
            ..Scope::default()
        });
    }

    /// Leaves the innermost scope. The root scope is never left.
    pub fn leave(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn bind(&mut self, symbol: Symbol, value: impl Into<Value>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(symbol, value.into());
        }
    }

    pub fn bind_global(&mut self, symbol: Symbol, label: Label) {
        self.globals
            .get_or_insert_with(HashMap::new)
            .insert(symbol, label);
    }

    pub fn global(&self, symbol: &Symbol) -> Option<&Label> {
        self.globals.as_ref()?.get(symbol)
    }

    pub fn lookup(&self, symbol: &Symbol, skip_boundary: bool) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.bindings.get(symbol) {
                return Some(value.clone());
            }
            if scope.boundary && !skip_boundary {
                break;
            }
        }
        self.global(symbol).cloned().map(Value::Label)
    }
}
