use crate::util::Env;

use super::{Index, Ty, Val};

/// The types of the variables currently in scope, innermost first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ctx {
    tys: Env<Ty>,
}

impl Ctx {
    pub fn len(&self) -> usize {
        self.tys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tys.is_empty()
    }

    /// Bind a new innermost variable.
    pub fn extend(&self, ty: Ty) -> Ctx {
        Ctx {
            tys: self.tys.with(ty),
        }
    }

    /// The type of the variable at `index`. Panics if the index is out of
    /// scope, which elaboration rules out.
    pub fn lookup(&self, index: Index) -> &Ty {
        self.tys.get_index(index)
    }

    /// An environment where every variable in the context stands for itself,
    /// so that open terms can be evaluated.
    pub fn identity_env(&self) -> Env<Val> {
        let len = self.len();

        (0..len).map(|level| Val::var(len - level - 1)).collect()
    }
}

impl FromIterator<Ty> for Ctx {
    // types are given outermost first
    fn from_iter<T: IntoIterator<Item = Ty>>(iter: T) -> Self {
        Ctx {
            tys: iter.into_iter().collect(),
        }
    }
}

/// Witnesses that a context embeds into a larger one, where `amount`
/// bindings have been inserted below the innermost `cutoff` bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weakening {
    cutoff: usize,
    amount: usize,
}

impl Weakening {
    /// The context embeds into itself.
    pub fn identity() -> Weakening {
        Weakening {
            cutoff: 0,
            amount: 0,
        }
    }

    /// `amount` fresh bindings are pushed on top of the context.
    pub fn shift(amount: usize) -> Weakening {
        Weakening { cutoff: 0, amount }
    }

    /// One more fresh binding is pushed on top of the larger context.
    /// Only meaningful before any `lift`.
    pub fn skip(self) -> Weakening {
        debug_assert_eq!(self.cutoff, 0, "cannot skip under a lifted binding");

        Weakening {
            amount: self.amount + 1,
            ..self
        }
    }

    /// Both contexts are extended with the same binding, as when going under
    /// a binder.
    pub fn lift(self) -> Weakening {
        Weakening {
            cutoff: self.cutoff + 1,
            ..self
        }
    }

    /// Re-index a variable of the smaller context into the larger one.
    pub fn embed(&self, index: Index) -> Index {
        if index < self.cutoff {
            index
        } else {
            index + self.amount
        }
    }
}
