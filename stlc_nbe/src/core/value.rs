use std::rc::Rc;

use crate::util::Env;

use super::{eval, Index, Tm, Ty};

/// Values: terms evaluated as far as they go. Everything but `Neutral` is an
/// introduction form.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Neutral { neutral: Rc<Neutral> },
    FunLit { body: FunData },
    Zero,
    Succ { pred: Rc<Val> },
    Pair { fst: Rc<Val>, snd: Rc<Val> },
    Nil,
    ListCons { head: Rc<Val>, tail: Rc<Val> },
    Atom { atom: Rc<str> },
}

/// A function body that explicitly captures the environment it was
/// defined in.
#[derive(Debug, Clone, PartialEq)]
pub struct FunData {
    pub env: Env<Val>,
    pub param_ty: Ty,
    pub body: Rc<Tm>,
}

impl FunData {
    pub fn apply(&self, arg: &Val) -> Val {
        eval(&self.env.with(arg.clone()), &self.body)
    }
}

/// Neutral values: eliminations that cannot reduce because the thing being
/// eliminated is, ultimately, a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Neutral {
    Var {
        index: Index,
    },
    FunApp {
        head: Rc<Neutral>,
        arg: Val,
    },
    RecNat {
        motive: Ty,
        target: Rc<Neutral>,
        base: Val,
        step: Val,
    },
    Car {
        pair: Rc<Neutral>,
    },
    Cdr {
        pair: Rc<Neutral>,
    },
    RecList {
        motive: Ty,
        target: Rc<Neutral>,
        base: Val,
        step: Val,
    },
}

impl Val {
    pub fn neutral(neutral: Neutral) -> Val {
        Val::Neutral {
            neutral: Rc::new(neutral),
        }
    }

    // the variable at `index`, as a stuck value
    pub fn var(index: Index) -> Val {
        Val::neutral(Neutral::Var { index })
    }

    // the next link of a chain of successors or list cells
    fn link_mut(&mut self) -> Option<&mut Rc<Val>> {
        match self {
            Val::Succ { pred } => Some(pred),
            Val::ListCons { tail, .. } => Some(tail),
            _ => None,
        }
    }
}

thread_local! {
    // shared stand-in for a link that has been detached from its chain
    static DETACHED: Rc<Val> = Rc::new(Val::Zero);
}

fn detach(link: &mut Rc<Val>) -> Option<Rc<Val>> {
    DETACHED
        .try_with(|detached| std::mem::replace(link, detached.clone()))
        .ok()
}

// Long numerals and lists are dismantled one link at a time, rather than by
// the recursive drop of each `Rc` in the chain.
impl Drop for Val {
    fn drop(&mut self) {
        let mut next = match self.link_mut().and_then(detach) {
            Some(next) => next,
            None => return,
        };
        while let Ok(mut val) = Rc::try_unwrap(next) {
            next = match val.link_mut().and_then(detach) {
                Some(next) => next,
                None => return,
            };
        }
    }
}
