use {
    crate::{
        emit::{Emitter, Immediate, Label},
        env::{Environment, Value},
        error::CodegenError,
        registers::{
            reserve_call_args, with_scope, AllocError, Frames, Register, RegisterMask,
            RegisterStack, Reserve, ARGUMENT_COUNT, RETURN_REGISTER,
        },
    },
    derive_more::Display,
    frontend::ast::{keyword, Atom, Expr, Form, FuncLit, Node, Symbol, TypeDef},
    middle::op::Operator,
    std::io::Write,
};

type Generated<T = Value> = Result<T, CodegenError>;

/// A value as an instruction operand.
#[derive(Debug, Clone, Display)]
enum Operand {
    #[display("{_0}")]
    Immediate(Immediate),
    #[display("{_0}")]
    Register(Register),
    #[display("{_0}")]
    Label(Label),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        match value {
            Value::Register(register) => Operand::Register(register),
            Value::Label(label) => Operand::Label(label),
        }
    }
}

fn immediate(atom: &Atom) -> Option<Immediate> {
    Some(match *atom {
        Atom::Number(n) => Immediate::Number(n),
        Atom::Bool(b) => Immediate::Number(if b { 1.0 } else { 0.0 }),
        Atom::Str(ref s) => Immediate::Str(s.clone()),
        Atom::Symbol(_) => return None,
    })
}

fn mnemonic(op: Operator) -> &'static str {
    match op {
        Operator::Add => "add",
        Operator::Sub => "sub",
        Operator::Mul => "mul",
        Operator::Div => "div",
        Operator::Rem => "mod",
        Operator::And => "logand",
        Operator::Or => "logor",
        Operator::Not => "lognot",
        Operator::BitAnd => "and",
        Operator::BitOr => "or",
        Operator::BitXor => "xor",
        Operator::BitNot => "not",
        Operator::Shift => "shift",
        Operator::Gt => "gt",
        Operator::Ge => "gte",
        Operator::Lt => "lt",
        Operator::Le => "lte",
        Operator::Eq => "eq",
        Operator::Ne => "ne",
    }
}

fn arity_error(op: Operator, expected: &'static str, found: usize) -> CodegenError {
    CodegenError::Arity {
        operator: op,
        expected,
        found,
    }
}

fn unsupported(expr: &Expr) -> CodegenError {
    CodegenError::Unsupported(expr.to_string())
}

fn func_literal(node: &Node) -> Option<FuncLit> {
    match *node.form() {
        Form::Func(ref func) => Some(func.clone()),
        _ => None,
    }
}

/// Walks normalized trees and writes register-machine assembly.
pub struct Generator<W> {
    env: Environment,
    frames: RegisterStack,
    out: Emitter<W>,
}

impl<W> Frames for Generator<W> {
    fn frames(&mut self) -> &mut RegisterStack {
        &mut self.frames
    }
}

impl<W: Write> Generator<W> {
    pub fn new(out: W) -> Self {
        Self {
            env: Environment::new(),
            frames: RegisterStack::new(),
            out: Emitter::new(out),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn registers(&self) -> &RegisterStack {
        &self.frames
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    pub fn generate_program(&mut self, forms: &[Expr]) -> Generated<()> {
        for form in forms {
            self.out.comment(&form.to_string())?;
            self.generate(form)?;
        }
        Ok(())
    }

    pub fn generate(&mut self, expr: &Expr) -> Generated {
        match expr {
            Expr::Atom(Atom::Symbol(symbol)) => self
                .env
                .lookup(symbol, false)
                .ok_or_else(|| CodegenError::Unbound(symbol.to_string())),
            Expr::Atom(atom) => match immediate(atom) {
                Some(immediate) => self.load(immediate),
                None => Err(unsupported(expr)),
            },
            Expr::Node(node) => {
                // release the borrow before generating, which may revisit the node
                let form = node.form().clone();
                match form {
                    Form::List(ref items) => self.generate_list(expr, items),
                    Form::Func(ref func) => self.generate_func(func, None),
                    Form::TypeDef(ref def) => self.generate_type_def(def),
                    Form::Quoted(_) => Err(unsupported(expr)),
                }
            }
        }
    }

    fn load(&mut self, immediate: Immediate) -> Generated {
        with_scope(self, Reserve::temporaries(1), |gen, regs| -> Generated {
            gen.out.emit("load", &[&regs[0], &immediate])?;
            Ok(Value::Register(regs[0]))
        })
    }

    /// Literals stay inline; everything else is generated first.
    fn operand(&mut self, expr: &Expr) -> Generated<Operand> {
        if let Some(immediate) = expr.as_atom().and_then(immediate) {
            return Ok(Operand::Immediate(immediate));
        }
        Ok(self.generate(expr)?.into())
    }

    fn move_into(&mut self, out: Register, operand: Operand) -> Generated<()> {
        match operand {
            Operand::Register(register) if register == out => {}
            Operand::Register(register) => self.out.emit("mov", &[&out, &register])?,
            Operand::Immediate(immediate) => self.out.emit("load", &[&out, &immediate])?,
            Operand::Label(label) => self.out.emit("load", &[&out, &label])?,
        }
        Ok(())
    }

    fn generate_list(&mut self, expr: &Expr, items: &[Expr]) -> Generated {
        let Some((head, args)) = items.split_first() else {
            return Err(unsupported(expr));
        };
        if let Some(name) = head.as_symbol() {
            if *name == keyword::NOP {
                return Ok(Value::Register(RETURN_REGISTER));
            }
            if *name == keyword::DEFINE {
                return self.generate_define(expr, args);
            }
            if let Some(op) = Operator::from_symbol(name.as_str()) {
                return self.generate_operator(op, args);
            }
        }
        if head.is_literal() {
            return Err(unsupported(expr));
        }
        self.generate_call(head, args)
    }

    fn generate_define(&mut self, expr: &Expr, args: &[Expr]) -> Generated {
        let [name, value] = args else {
            return Err(unsupported(expr));
        };
        let (Some(name), Some(func)) = (
            name.as_symbol(),
            value.as_node().and_then(|node| func_literal(node)),
        ) else {
            return Err(unsupported(expr));
        };
        let label = Label::export(name.as_str());
        // bound before the body so the function can call itself
        self.env.bind_global(name.clone(), label.clone());
        self.generate_func(&func, Some(label))
    }

    fn generate_func(&mut self, func: &FuncLit, exported: Option<Label>) -> Generated {
        let (label, skip) = match exported {
            Some(label) => (label, None),
            None => {
                let label = self.out.fresh_label("anonfunc");
                let skip = self.out.fresh_label("skip");
                self.out.emit("jmpl", &[&skip])?;
                (label, Some(skip))
            }
        };
        self.out.label(&label)?;
        log::info!("generating function {label}/{}", func.params.len());

        self.out.indent();
        self.env.enter_boundary();
        let result = reserve_call_args(self, func.params.len(), |gen, args| -> Generated<()> {
            for (param, &register) in func.params.iter().zip(args) {
                gen.env.bind(param.clone(), register);
            }
            let mut result = Value::Register(RETURN_REGISTER);
            for expr in &func.body {
                result = gen.generate(expr)?;
            }
            gen.out.emit("return", &[&result])?;
            gen.out.comment(&format!("end of function {label}"))?;
            Ok(())
        });
        self.env.leave();
        self.out.unindent();
        result?;

        if let Some(skip) = skip {
            self.out.label(&skip)?;
        }
        Ok(Value::Label(label))
    }

    fn generate_type_def(&mut self, def: &TypeDef) -> Generated {
        let ctor_label = Label::export(def.name.as_str());
        self.env.bind_global(def.name.clone(), ctor_label.clone());
        let mut methods = Vec::with_capacity(def.methods.len());
        for (method, node) in &def.methods {
            let name = Symbol::new(&format!("{}.{method}", def.name));
            let label = Label::export(name.as_str());
            self.env.bind_global(name, label.clone());
            methods.push((label, node));
        }

        let Some(ctor) = func_literal(&def.ctor) else {
            return Err(CodegenError::Unsupported(def.ctor.form().to_string()));
        };
        self.generate_func(&ctor, Some(ctor_label.clone()))?;
        for (label, node) in methods {
            let Some(func) = func_literal(node) else {
                return Err(CodegenError::Unsupported(node.form().to_string()));
            };
            self.generate_func(&func, Some(label))?;
        }
        Ok(Value::Label(ctor_label))
    }

    fn generate_operator(&mut self, op: Operator, operands: &[Expr]) -> Generated {
        match (op, operands) {
            (Operator::And | Operator::Or, _) => self.short_circuit(op, operands),
            (Operator::Sub, [operand]) => self.unary("fneg", operand),
            (_, [operand]) if op.is_unary() => self.unary(mnemonic(op), operand),
            _ if op.is_unary() => Err(arity_error(op, "exactly 1", operands.len())),
            _ if op.is_binary() && operands.len() != 2 => {
                Err(arity_error(op, "exactly 2", operands.len()))
            }
            _ => self.accumulate(op, operands),
        }
    }

    fn unary(&mut self, mnemonic: &str, operand: &Expr) -> Generated {
        with_scope(self, Reserve::temporaries(1), |gen, regs| -> Generated {
            let out = regs[0];
            let operand = gen.operand(operand)?;
            gen.move_into(out, operand)?;
            gen.out.emit(mnemonic, &[&out])?;
            Ok(Value::Register(out))
        })
    }

    fn accumulate(&mut self, op: Operator, operands: &[Expr]) -> Generated {
        let Some((first, rest)) = operands.split_first() else {
            return Err(arity_error(op, "at least 1", 0));
        };
        let mnemonic = mnemonic(op);
        with_scope(self, Reserve::temporaries(1), |gen, regs| -> Generated {
            let out = regs[0];
            let first = gen.operand(first)?;
            gen.move_into(out, first)?;
            for operand in rest {
                match gen.operand(operand)? {
                    Operand::Immediate(immediate) => {
                        gen.out.emit(&format!("f{mnemonic}i"), &[&out, &immediate])?
                    }
                    Operand::Register(register) => {
                        gen.out.emit(&format!("f{mnemonic}"), &[&out, &register])?
                    }
                    Operand::Label(label) => {
                        return Err(CodegenError::Unsupported(format!("({op} ... {label})")));
                    }
                }
            }
            Ok(Value::Register(out))
        })
    }

    fn short_circuit(&mut self, op: Operator, operands: &[Expr]) -> Generated {
        if operands.is_empty() {
            return self.load(Immediate::Number(if op == Operator::And { 1.0 } else { 0.0 }));
        }
        with_scope(self, Reserve::temporaries(1), |gen, regs| -> Generated {
            let out = regs[0];
            let failure = gen.out.fresh_label("failure");
            let success = gen.out.fresh_label("success");
            for operand in operands {
                let operand = gen.operand(operand)?;
                // function labels are always truthy
                let is_label = matches!(operand, Operand::Label(_));
                gen.move_into(out, operand)?;
                match (op, is_label) {
                    (Operator::And, true) => {}
                    (Operator::And, false) => gen.out.emit("jezl", &[&out, &failure])?,
                    (_, true) => gen.out.emit("jmpl", &[&success])?,
                    (_, false) => gen.out.emit("jnzl", &[&out, &success])?,
                }
            }
            if op == Operator::And {
                gen.out.emit("jmpl", &[&success])?;
            }
            gen.out.label(&failure)?;
            gen.out.emit("load", &[&out, &Immediate::Number(0.0)])?;
            gen.out.label(&success)?;
            Ok(Value::Register(out))
        })
    }

    fn generate_call(&mut self, callee: &Expr, args: &[Expr]) -> Generated {
        if args.len() > ARGUMENT_COUNT {
            return Err(AllocError::TooManyArguments { argc: args.len() }.into());
        }
        // caller-saved registers in use here must survive the call
        let saved = self.frames.live() & RegisterMask::caller_saved();
        let callee = self.generate(callee)?;
        let callee_temps = usize::from(matches!(callee, Value::Register(_)));

        with_scope(
            self,
            Reserve::temporaries(callee_temps + args.len()),
            |gen, temps| -> Generated {
                let (target, arg_temps) = match callee {
                    Value::Label(label) => (Operand::Label(label), temps),
                    Value::Register(register) => {
                        gen.move_into(temps[0], Operand::Register(register))?;
                        (Operand::Register(temps[0]), &temps[1..])
                    }
                };
                for (arg, &temp) in args.iter().zip(arg_temps) {
                    let operand = gen.operand(arg)?;
                    gen.move_into(temp, operand)?;
                }
                if !saved.is_empty() {
                    gen.out.emit("push", &[&saved])?;
                }
                reserve_call_args(gen, args.len(), |gen, arg_regs| -> Generated<()> {
                    for (register, temp) in arg_regs.iter().zip(arg_temps) {
                        gen.out.emit("mov", &[register, temp])?;
                    }
                    gen.out.emit("call", &[&target])?;
                    Ok(())
                })?;
                if !saved.is_empty() {
                    gen.out.emit("pop", &[&saved])?;
                }
                Ok(Value::Register(RETURN_REGISTER))
            },
        )
    }
}
