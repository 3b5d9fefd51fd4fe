use derive_more::Display;

/// Operators with built-in meaning: folded at rewrite time where their
/// operands allow it, and lowered to single instructions by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Operator {
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
    #[display("/")]
    Div,
    #[display("remainder")]
    Rem,
    #[display("and")]
    And,
    #[display("or")]
    Or,
    #[display("not")]
    Not,
    #[display("bitwise-and")]
    BitAnd,
    #[display("bitwise-or")]
    BitOr,
    #[display("bitwise-xor")]
    BitXor,
    #[display("bitwise-not")]
    BitNot,
    #[display("bitwise-shift")]
    Shift,
    #[display(">")]
    Gt,
    #[display(">=")]
    Ge,
    #[display("<")]
    Lt,
    #[display("<=")]
    Le,
    #[display("eq")]
    Eq,
    #[display("ne")]
    Ne,
}

impl Operator {
    pub fn from_symbol(name: &str) -> Option<Self> {
        Some(match name {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "remainder" => Operator::Rem,
            "and" => Operator::And,
            "or" => Operator::Or,
            "not" => Operator::Not,
            "bitwise-and" => Operator::BitAnd,
            "bitwise-or" => Operator::BitOr,
            "bitwise-xor" => Operator::BitXor,
            "bitwise-not" => Operator::BitNot,
            "bitwise-shift" => Operator::Shift,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            _ => return None,
        })
    }

    /// Operators whose operands may be reordered when folding literals.
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            Operator::Add | Operator::Mul | Operator::BitAnd | Operator::BitOr | Operator::BitXor
        )
    }

    /// Operators that take exactly two operands.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Operator::Rem
                | Operator::Shift
                | Operator::Gt
                | Operator::Ge
                | Operator::Lt
                | Operator::Le
                | Operator::Eq
                | Operator::Ne
        )
    }

    /// Operators that take exactly one operand. `-` is also unary when it
    /// is given a single operand.
    pub fn is_unary(self) -> bool {
        matches!(self, Operator::Not | Operator::BitNot)
    }
}
