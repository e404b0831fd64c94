//! Closures: the unit of work of the event loop.
//!
//! A [`Closure`] is a small copyable record pairing a borrowed callable with
//! an optional destructor and the parameter/result words of its last
//! invocation. Callables capture their own context, so the loop only ever
//! hands them a [`Runtime`] and a [`Value`].

use core::any::Any;
use core::fmt;

use crate::runtime::Runtime;

/// Parameter and result word passed through closures.
#[derive(Debug, Clone, Copy, Default)]
pub enum Value<'a> {
    #[default]
    None,
    Bool(bool),
    Int(i32),
    Uint(u32),
    /// Borrowed application data.
    Ref(&'a dyn Any),
}

impl<'a> Value<'a> {
    pub const fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i32> {
        match *self {
            Value::Int(value) => Some(value),
            _ => None,
        }
    }

    pub const fn as_uint(&self) -> Option<u32> {
        match *self {
            Value::Uint(value) => Some(value),
            _ => None,
        }
    }

    /// Downcast borrowed data to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        match *self {
            Value::Ref(data) => data.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => {
                core::ptr::eq(a as *const dyn Any as *const u8, b as *const dyn Any as *const u8)
            }
            _ => false,
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value<'_> {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value<'_> {
    fn from(value: u32) -> Self {
        Value::Uint(value)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Value<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Value::None => defmt::write!(fmt, "None"),
            Value::Bool(value) => defmt::write!(fmt, "Bool({})", value),
            Value::Int(value) => defmt::write!(fmt, "Int({})", value),
            Value::Uint(value) => defmt::write!(fmt, "Uint({})", value),
            Value::Ref(_) => defmt::write!(fmt, "Ref(..)"),
        }
    }
}

/// Callable stored in a closure.
pub type ClosureFn<'a> = dyn Fn(&mut dyn Runtime<'a>, Value<'a>) -> Value<'a> + 'a;

/// Destructor run once the event owning a closure is retired.
pub type Destructor<'a> = dyn Fn(&Closure<'a>) + 'a;

/// Copyable invocation record.
///
/// Every copy shares the same callable. The destructor runs once per
/// [`destroy`](Self::destroy), so copies that must not own the closure are
/// produced with [`without_destructor`](Self::without_destructor).
#[derive(Clone, Copy)]
pub struct Closure<'a> {
    function: &'a ClosureFn<'a>,
    destructor: Option<&'a Destructor<'a>>,
    params: Value<'a>,
    result: Value<'a>,
}

impl<'a> Closure<'a> {
    pub fn new<F>(function: &'a F) -> Self
    where
        F: Fn(&mut dyn Runtime<'a>, Value<'a>) -> Value<'a> + 'a,
    {
        Self {
            function,
            destructor: None,
            params: Value::None,
            result: Value::None,
        }
    }

    pub fn with_destructor<D>(mut self, destructor: &'a D) -> Self
    where
        D: Fn(&Closure<'a>) + 'a,
    {
        self.destructor = Some(destructor);
        self
    }

    pub fn without_destructor(mut self) -> Self {
        self.destructor = None;
        self
    }

    pub fn has_destructor(&self) -> bool {
        self.destructor.is_some()
    }

    /// Invoke the callable, recording `params` and the returned result.
    pub fn invoke(&mut self, runtime: &mut dyn Runtime<'a>, params: Value<'a>) -> Value<'a> {
        self.params = params;
        self.result = (self.function)(runtime, params);
        self.result
    }

    /// Consume the closure, running its destructor if it has one.
    pub fn destroy(self) {
        if let Some(destructor) = self.destructor {
            destructor(&self);
        }
    }

    pub fn params(&self) -> Value<'a> {
        self.params
    }

    pub fn result(&self) -> Value<'a> {
        self.result
    }

    /// Whether both closures wrap the same callable.
    pub fn same_function(&self, other: &Closure<'a>) -> bool {
        core::ptr::eq(
            self.function as *const ClosureFn<'a> as *const u8,
            other.function as *const ClosureFn<'a> as *const u8,
        )
    }
}

impl fmt::Debug for Closure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("destructor", &self.destructor.is_some())
            .field("params", &self.params)
            .field("result", &self.result)
            .finish()
    }
}

/// Pin a Rust closure to the signature closures are invoked with.
///
/// ```ignore
/// let hits = Cell::new(0);
/// let count = handler(|_, _| {
///     hits.set(hits.get() + 1);
///     Value::None
/// });
/// app.enqueue_closure(Closure::new(&count))?;
/// ```
pub fn handler<'a, F>(function: F) -> F
where
    F: Fn(&mut dyn Runtime<'a>, Value<'a>) -> Value<'a> + 'a,
{
    function
}
