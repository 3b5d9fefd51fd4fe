use {
    derive_more::Display,
    std::{fmt, ops},
};

/*
register layout: [
    r0      instruction pointer     reserved
    r1      frame pointer           reserved
    r2      stack pointer           reserved
    r3      return value            reserved
    r4-r11  arguments               caller saved
    r12-r31 non-volatile            callee saved
    r32-    temporaries             caller saved
]
*/

pub const REGISTER_COUNT: usize = 256;
pub const RETURN_REGISTER: Register = Register(3);
pub const FIRST_ARGUMENT: u8 = 4;
pub const ARGUMENT_COUNT: usize = 8;
pub const FIRST_TEMPORARY: u8 = 32;
// end of the range scanned for non-volatile allocations
const NONVOLATILE_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("r{_0}")]
pub struct Register(pub u8);

impl Register {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterMask([u64; 4]);

impl RegisterMask {
    pub const EMPTY: Self = Self([0; 4]);
    pub const RESERVED: Self = Self([0xF, 0, 0, 0]);

    /// Every register in `start..end`.
    pub fn range(start: usize, end: usize) -> Self {
        (start..end.min(REGISTER_COUNT))
            .map(|index| Register(index as u8))
            .collect()
    }

    pub fn arguments(argc: usize) -> Self {
        let first = usize::from(FIRST_ARGUMENT);
        Self::range(first, first + argc)
    }

    /// Registers a caller must preserve across a call.
    pub fn caller_saved() -> Self {
        Self::arguments(ARGUMENT_COUNT) | Self::range(usize::from(FIRST_TEMPORARY), REGISTER_COUNT)
    }

    pub fn contains(&self, register: Register) -> bool {
        let index = register.index();
        self.0[index / 64] & (1 << (index % 64)) != 0
    }

    pub fn insert(&mut self, register: Register) {
        let index = register.index();
        self.0[index / 64] |= 1 << (index % 64);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn iter(&self) -> impl Iterator<Item = Register> + '_ {
        (0..REGISTER_COUNT)
            .map(|index| Register(index as u8))
            .filter(|&register| self.contains(register))
    }
}

impl FromIterator<Register> for RegisterMask {
    fn from_iter<T: IntoIterator<Item = Register>>(iter: T) -> Self {
        let mut mask = Self::EMPTY;
        for register in iter {
            mask.insert(register);
        }
        mask
    }
}

impl ops::BitOr for RegisterMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] | rhs.0[i]))
    }
}

impl ops::BitAnd for RegisterMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] & rhs.0[i]))
    }
}

impl fmt::Display for RegisterMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        for (i, register) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{register}")?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum AllocError {
    #[display("all valid registers are reserved: requested {requested}, {available} free")]
    Exhausted { requested: usize, available: usize },
    #[display("allocation cannot start at r{start}: the region ends at r{limit}")]
    InvalidStart { start: usize, limit: usize },
    #[display("{argc} arguments exceed the 8 argument registers")]
    TooManyArguments { argc: usize },
}

impl std::error::Error for AllocError {}

/// What a new register scope reserves on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reserve {
    Count {
        count: usize,
        start: Option<u8>,
        volatile: bool,
    },
    Mask(RegisterMask),
}

impl Reserve {
    pub fn temporaries(count: usize) -> Self {
        Reserve::Count {
            count,
            start: None,
            volatile: true,
        }
    }
}

/// Reservation state: the live mask plus the masks of every enclosing
/// scope. A scope can only be entered through [`with_scope`], so every
/// reservation made inside it is dropped when it ends.
#[derive(Debug, Clone)]
pub struct RegisterStack {
    live: RegisterMask,
    saved: Vec<RegisterMask>,
}

impl Default for RegisterStack {
    fn default() -> Self {
        Self {
            live: RegisterMask::RESERVED,
            saved: vec![],
        }
    }
}

impl RegisterStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> RegisterMask {
        self.live
    }

    pub fn is_reserved(&self, register: Register) -> bool {
        self.live.contains(register)
    }

    /// Number of scopes currently entered.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Reserves `count` free registers in the current scope, scanning up
    /// from `start`. Either all of them are reserved or none are.
    pub fn allocate(
        &mut self,
        count: usize,
        start: Option<u8>,
        volatile: bool,
    ) -> Result<Vec<Register>, AllocError> {
        let (default_start, limit) = if volatile {
            (FIRST_TEMPORARY, REGISTER_COUNT)
        } else {
            (FIRST_ARGUMENT, NONVOLATILE_LIMIT)
        };
        let start = usize::from(start.unwrap_or(default_start));
        if start < usize::from(FIRST_ARGUMENT) || start >= limit {
            return Err(AllocError::InvalidStart { start, limit });
        }
        let registers = (start..limit)
            .map(|index| Register(index as u8))
            .filter(|&register| !self.live.contains(register))
            .take(count)
            .collect::<Vec<_>>();
        if registers.len() < count {
            return Err(AllocError::Exhausted {
                requested: count,
                available: registers.len(),
            });
        }
        for &register in &registers {
            self.live.insert(register);
        }
        Ok(registers)
    }

    fn reserve(&mut self, reserve: Reserve) -> Result<Vec<Register>, AllocError> {
        match reserve {
            Reserve::Count {
                count,
                start,
                volatile,
            } => self.allocate(count, start, volatile),
            Reserve::Mask(mask) => {
                self.live = self.live | mask;
                Ok(mask.iter().collect())
            }
        }
    }

    fn push(&mut self) {
        self.saved.push(self.live);
    }

    fn pop(&mut self) {
        if let Some(live) = self.saved.pop() {
            self.live = live;
        }
    }
}

/// Anything that owns a [`RegisterStack`] and can run code in its scopes.
pub trait Frames {
    fn frames(&mut self) -> &mut RegisterStack;
}

impl Frames for RegisterStack {
    fn frames(&mut self) -> &mut RegisterStack {
        self
    }
}

/// Runs `body` in a new scope that inherits every outer reservation and
/// additionally reserves `reserve`. The scope is left, releasing everything
/// reserved in it, whether `body` succeeds or fails.
pub fn with_scope<C, T, E>(
    cx: &mut C,
    reserve: Reserve,
    body: impl FnOnce(&mut C, &[Register]) -> Result<T, E>,
) -> Result<T, E>
where
    C: Frames + ?Sized,
    E: From<AllocError>,
{
    cx.frames().push();
    let result = match cx.frames().reserve(reserve) {
        Ok(registers) => {
            log::trace!(
                "scope {}: reserved {:?}",
                cx.frames().depth(),
                registers.iter().map(ToString::to_string).collect::<Vec<_>>()
            );
            body(cx, &registers)
        }
        Err(err) => Err(E::from(err)),
    };
    cx.frames().pop();
    result
}

/// [`with_scope`] reserving the first `argc` argument registers, as a call
/// site does before setting up its outgoing arguments.
pub fn reserve_call_args<C, T, E>(
    cx: &mut C,
    argc: usize,
    body: impl FnOnce(&mut C, &[Register]) -> Result<T, E>,
) -> Result<T, E>
where
    C: Frames + ?Sized,
    E: From<AllocError>,
{
    if argc > ARGUMENT_COUNT {
        return Err(E::from(AllocError::TooManyArguments { argc }));
    }
    with_scope(cx, Reserve::Mask(RegisterMask::arguments(argc)), body)
}
