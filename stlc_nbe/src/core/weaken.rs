// Weakening moves a structure built over a context into a larger context,
// re-indexing its variables so that they keep referring to the same bindings.

use std::rc::Rc;

use crate::util::Env;

use super::{eval::grow_stack, FunData, Neutral, Tm, Val, Weakening};

pub trait Weaken {
    fn weaken(&self, wk: &Weakening) -> Self;
}

impl Weaken for Val {
    fn weaken(&self, wk: &Weakening) -> Val {
        grow_stack(|| weaken_val(self, wk))
    }
}

// Successors and list cells are peeled off first, so that long numerals and
// lists are rebuilt in a loop.
fn weaken_val(val: &Val, wk: &Weakening) -> Val {
    // `None` for a successor, the weakened head for a list cell
    let mut layers: Vec<Option<Val>> = vec![];
    let mut val = val;
    loop {
        match val {
            Val::Succ { pred } => {
                layers.push(None);
                val = pred.as_ref();
            }
            Val::ListCons { head, tail } => {
                layers.push(Some(head.weaken(wk)));
                val = tail.as_ref();
            }
            _ => break,
        }
    }

    let last = match val {
        Val::Neutral { neutral } => Val::neutral(neutral.weaken(wk)),
        // the body is relative to the captured environment, so only the
        // environment needs to move
        Val::FunLit { body } => Val::FunLit {
            body: FunData {
                env: body.env.weaken(wk),
                param_ty: body.param_ty.clone(),
                body: body.body.clone(),
            },
        },
        Val::Pair { fst, snd } => Val::Pair {
            fst: Rc::new(fst.weaken(wk)),
            snd: Rc::new(snd.weaken(wk)),
        },
        Val::Atom { atom } => Val::Atom { atom: atom.clone() },
        Val::Zero => Val::Zero,
        Val::Nil => Val::Nil,
        Val::Succ { .. } | Val::ListCons { .. } => unreachable!("chain was not fully peeled"),
    };

    layers.into_iter().rev().fold(last, |acc, layer| match layer {
        None => Val::Succ { pred: Rc::new(acc) },
        Some(head) => Val::ListCons {
            head: Rc::new(head),
            tail: Rc::new(acc),
        },
    })
}

impl Weaken for Neutral {
    fn weaken(&self, wk: &Weakening) -> Neutral {
        match self {
            Neutral::Var { index } => Neutral::Var {
                index: wk.embed(*index),
            },
            Neutral::FunApp { head, arg } => Neutral::FunApp {
                head: Rc::new(head.weaken(wk)),
                arg: arg.weaken(wk),
            },
            Neutral::RecNat {
                motive,
                target,
                base,
                step,
            } => Neutral::RecNat {
                motive: motive.clone(),
                target: Rc::new(target.weaken(wk)),
                base: base.weaken(wk),
                step: step.weaken(wk),
            },
            Neutral::Car { pair } => Neutral::Car {
                pair: Rc::new(pair.weaken(wk)),
            },
            Neutral::Cdr { pair } => Neutral::Cdr {
                pair: Rc::new(pair.weaken(wk)),
            },
            Neutral::RecList {
                motive,
                target,
                base,
                step,
            } => Neutral::RecList {
                motive: motive.clone(),
                target: Rc::new(target.weaken(wk)),
                base: base.weaken(wk),
                step: step.weaken(wk),
            },
        }
    }
}

impl Weaken for Env<Val> {
    fn weaken(&self, wk: &Weakening) -> Env<Val> {
        self.map(|val| val.weaken(wk))
    }
}

impl Weaken for Tm {
    fn weaken(&self, wk: &Weakening) -> Tm {
        grow_stack(|| weaken_tm(self, wk))
    }
}

fn weaken_tm(tm: &Tm, wk: &Weakening) -> Tm {
    let go = |tm: &Rc<Tm>| Rc::new(tm.weaken(wk));

    match tm {
        Tm::Var { index } => Tm::Var {
            index: wk.embed(*index),
        },
        Tm::FunLit { param_ty, body } => Tm::FunLit {
            param_ty: param_ty.clone(),
            body: Rc::new(body.weaken(&wk.lift())),
        },
        Tm::FunApp { head, arg } => Tm::FunApp {
            head: go(head),
            arg: go(arg),
        },
        Tm::Quote { atom } => Tm::Quote { atom: atom.clone() },
        Tm::Zero => Tm::Zero,
        Tm::Succ { tm } => Tm::Succ { tm: go(tm) },
        Tm::RecNat {
            motive,
            target,
            base,
            step,
        } => Tm::RecNat {
            motive: motive.clone(),
            target: go(target),
            base: go(base),
            step: go(step),
        },
        Tm::Cons { fst, snd } => Tm::Cons {
            fst: go(fst),
            snd: go(snd),
        },
        Tm::Car { tm } => Tm::Car { tm: go(tm) },
        Tm::Cdr { tm } => Tm::Cdr { tm: go(tm) },
        Tm::Nil { elem } => Tm::Nil { elem: elem.clone() },
        Tm::ListCons { head, tail } => Tm::ListCons {
            head: go(head),
            tail: go(tail),
        },
        Tm::RecList {
            motive,
            target,
            base,
            step,
        } => Tm::RecList {
            motive: motive.clone(),
            target: go(target),
            base: go(base),
            step: go(step),
        },
        Tm::Ann { ty, tm } => Tm::Ann {
            ty: ty.clone(),
            tm: go(tm),
        },
    }
}
