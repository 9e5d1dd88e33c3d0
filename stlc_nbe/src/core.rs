// The core language: a simply typed lambda calculus with naturals, atoms,
// pairs and lists, plus structural recursion over naturals and lists.
//
// Core terms are only ever produced by the elaborator, which checks every
// typing rule once, up front. Everything downstream (evaluation, weakening,
// readback) assumes its input is well-typed and never reports errors.

use std::{fmt::Display, rc::Rc};

use itertools::Itertools;

mod check;
mod context;
mod eval;
mod quote;
mod value;
mod weaken;

pub use check::synth;
pub use context::{Ctx, Weakening};
pub use eval::{eval, fun_app};
pub use quote::{normalize, quote, quote_neutral};
pub use value::{FunData, Neutral, Val};
pub use weaken::Weaken;

// De Bruijn index, represents a variable occurrence by the number of
// binders between the occurrence and the binder it refers to.
pub type Index = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    Nat,
    Atom,
    Fun { dom: Rc<Ty>, cod: Rc<Ty> },
    Pair { fst: Rc<Ty>, snd: Rc<Ty> },
    List { elem: Rc<Ty> },
}

impl Ty {
    pub fn fun(dom: Ty, cod: Ty) -> Ty {
        Ty::Fun {
            dom: Rc::new(dom),
            cod: Rc::new(cod),
        }
    }

    pub fn pair(fst: Ty, snd: Ty) -> Ty {
        Ty::Pair {
            fst: Rc::new(fst),
            snd: Rc::new(snd),
        }
    }

    pub fn list(elem: Ty) -> Ty {
        Ty::List {
            elem: Rc::new(elem),
        }
    }

    /// The number of arguments a value of this type can be applied to.
    pub fn arity(&self) -> usize {
        match self {
            Ty::Fun { cod, .. } => 1 + cod.arity(),
            _ => 0,
        }
    }
}

/// Core terms. Binders carry the type of the bound variable, `nil` its
/// element type, and both recursors their result type, so every term can
/// have its type recovered without an external typing derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tm {
    Var {
        index: Index,
    },
    FunLit {
        param_ty: Ty,
        body: Rc<Tm>,
    },
    FunApp {
        head: Rc<Tm>,
        arg: Rc<Tm>,
    },
    Quote {
        atom: String,
    },
    Zero,
    Succ {
        tm: Rc<Tm>,
    },
    RecNat {
        motive: Ty,
        target: Rc<Tm>,
        base: Rc<Tm>,
        step: Rc<Tm>,
    },
    Cons {
        fst: Rc<Tm>,
        snd: Rc<Tm>,
    },
    Car {
        tm: Rc<Tm>,
    },
    Cdr {
        tm: Rc<Tm>,
    },
    Nil {
        elem: Ty,
    },
    ListCons {
        head: Rc<Tm>,
        tail: Rc<Tm>,
    },
    RecList {
        motive: Ty,
        target: Rc<Tm>,
        base: Rc<Tm>,
        step: Rc<Tm>,
    },
    Ann {
        ty: Ty,
        tm: Rc<Tm>,
    },
}

impl Tm {
    pub fn var(index: Index) -> Tm {
        Tm::Var { index }
    }

    pub fn fun_lit(param_ty: Ty, body: Tm) -> Tm {
        Tm::FunLit {
            param_ty,
            body: Rc::new(body),
        }
    }

    pub fn fun_app(head: Tm, arg: Tm) -> Tm {
        Tm::FunApp {
            head: Rc::new(head),
            arg: Rc::new(arg),
        }
    }

    pub fn succ(tm: Tm) -> Tm {
        Tm::Succ { tm: Rc::new(tm) }
    }

    /// `n` applications of `add1` to `zero`.
    pub fn numeral(n: usize) -> Tm {
        (0..n).fold(Tm::Zero, |tm, _| Tm::succ(tm))
    }

    pub fn cons(fst: Tm, snd: Tm) -> Tm {
        Tm::Cons {
            fst: Rc::new(fst),
            snd: Rc::new(snd),
        }
    }

    pub fn list_cons(head: Tm, tail: Tm) -> Tm {
        Tm::ListCons {
            head: Rc::new(head),
            tail: Rc::new(tail),
        }
    }

    // Render the term in surface syntax, under `depth` enclosing binders.
    // Bound variables are named after the depth of their binder; variables
    // free in the term are shown as `#i`.
    fn display(&self, depth: usize) -> String {
        eval::grow_stack(|| self.display_impl(depth))
    }

    fn display_impl(&self, depth: usize) -> String {
        match self {
            Tm::Var { index } if *index < depth => format!("x{}", depth - index - 1),
            Tm::Var { index } => format!("#{}", index - depth),
            Tm::FunLit { .. } => {
                let mut names = vec![];
                let mut body = self;
                while let Tm::FunLit { body: body1, .. } = body {
                    names.push(format!("x{}", depth + names.len()));
                    body = body1.as_ref();
                }
                let body = body.display(depth + names.len());

                format!("(lambda ({}) {})", names.join(" "), body)
            }
            Tm::FunApp { .. } => {
                let mut args = vec![];
                let mut head = self;
                while let Tm::FunApp { head: head1, arg } = head {
                    args.push(arg.display(depth));
                    head = head1.as_ref();
                }

                format!(
                    "({} {})",
                    head.display(depth),
                    args.iter().rev().join(" ")
                )
            }
            Tm::Quote { atom } => format!("'{}", atom),
            Tm::Zero => "zero".to_string(),
            Tm::Succ { .. } => {
                let mut count = 0;
                let mut tm = self;
                while let Tm::Succ { tm: pred } = tm {
                    count += 1;
                    tm = pred.as_ref();
                }

                format!(
                    "{}{}{}",
                    "(add1 ".repeat(count),
                    tm.display(depth),
                    ")".repeat(count)
                )
            }
            Tm::RecNat {
                target, base, step, ..
            } => format!(
                "(rec-nat {} {} {})",
                target.display(depth),
                base.display(depth),
                step.display(depth)
            ),
            Tm::Cons { fst, snd } => {
                format!("(cons {} {})", fst.display(depth), snd.display(depth))
            }
            Tm::Car { tm } => format!("(car {})", tm.display(depth)),
            Tm::Cdr { tm } => format!("(cdr {})", tm.display(depth)),
            Tm::Nil { .. } => "nil".to_string(),
            Tm::ListCons { .. } => {
                let mut heads = vec![];
                let mut tm = self;
                while let Tm::ListCons { head, tail } = tm {
                    heads.push(format!("(:: {} ", head.display(depth)));
                    tm = tail.as_ref();
                }

                format!(
                    "{}{}{}",
                    heads.concat(),
                    tm.display(depth),
                    ")".repeat(heads.len())
                )
            }
            Tm::RecList {
                target, base, step, ..
            } => format!(
                "(rec-list {} {} {})",
                target.display(depth),
                base.display(depth),
                step.display(depth)
            ),
            Tm::Ann { ty, tm } => format!("(the {} {})", ty, tm.display(depth)),
        }
    }
}

impl Tm {
    // the next link of a chain of successors or list cells
    fn link_mut(&mut self) -> Option<&mut Rc<Tm>> {
        match self {
            Tm::Succ { tm } => Some(tm),
            Tm::ListCons { tail, .. } => Some(tail),
            _ => None,
        }
    }
}

thread_local! {
    // shared stand-in for a link that has been detached from its chain
    static DETACHED: Rc<Tm> = Rc::new(Tm::Zero);
}

fn detach(link: &mut Rc<Tm>) -> Option<Rc<Tm>> {
    DETACHED
        .try_with(|detached| std::mem::replace(link, detached.clone()))
        .ok()
}

// Normal forms of large numerals and lists are long chains, dropped one link
// at a time.
impl Drop for Tm {
    fn drop(&mut self) {
        let mut next = match self.link_mut().and_then(detach) {
            Some(next) => next,
            None => return,
        };
        while let Ok(mut tm) = Rc::try_unwrap(next) {
            next = match tm.link_mut().and_then(detach) {
                Some(next) => next,
                None => return,
            };
        }
    }
}

impl Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Nat => "Nat".fmt(f),
            Ty::Atom => "Atom".fmt(f),
            Ty::Fun { dom, cod } => {
                // right-nested arrows are shown as one n-ary arrow
                let mut tys = vec![dom.to_string()];
                let mut cod = cod;
                while let Ty::Fun { dom, cod: cod1 } = cod.as_ref() {
                    tys.push(dom.to_string());
                    cod = cod1;
                }
                tys.push(cod.to_string());

                format!("(-> {})", tys.join(" ")).fmt(f)
            }
            Ty::Pair { fst, snd } => format!("(Pair {} {})", fst, snd).fmt(f),
            Ty::List { elem } => format!("(List {})", elem).fmt(f),
        }
    }
}

impl Display for Tm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.display(0).fmt(f)
    }
}
