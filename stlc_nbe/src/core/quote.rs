// Quotation
//
// Convert values from the semantic domain back into syntax. Quotation is
// type-directed: every value of function type, whether it is a closure or a
// stuck application, is read back as a lambda applied to a fresh variable, so
// the terms it produces are beta-normal and eta-long.

use std::rc::Rc;

use super::eval::grow_stack;
use super::{eval, fun_app, Ctx, Neutral, Tm, Ty, Val, Weaken, Weakening};

pub fn quote(ctx: &Ctx, ty: &Ty, val: &Val) -> Tm {
    grow_stack(|| quote_impl(ctx, ty, val))
}

fn quote_impl(ctx: &Ctx, ty: &Ty, val: &Val) -> Tm {
    match (ty, val) {
        (Ty::Fun { dom, cod }, _) => {
            // move the function under one more binder, and apply it to
            // the variable that binder introduces
            let ctx1 = ctx.extend(dom.as_ref().clone());
            let val1 = val.weaken(&Weakening::identity().skip());
            let body = fun_app(&val1, &Val::var(0));

            Tm::FunLit {
                param_ty: dom.as_ref().clone(),
                body: Rc::new(quote(&ctx1, cod, &body)),
            }
        }
        (_, Val::Neutral { neutral }) => quote_neutral(ctx, neutral).0,

        (Ty::Nat, Val::Zero) => Tm::Zero,
        (Ty::Nat, Val::Succ { .. }) => {
            let mut count = 0;
            let mut val = val;
            while let Val::Succ { pred } = val {
                count += 1;
                val = pred.as_ref();
            }

            (0..count).fold(quote(ctx, ty, val), |tm, _| Tm::succ(tm))
        }
        (Ty::Pair { fst, snd }, Val::Pair { fst: val1, snd: val2 }) => Tm::Cons {
            fst: Rc::new(quote(ctx, fst, val1)),
            snd: Rc::new(quote(ctx, snd, val2)),
        },
        (Ty::List { elem }, Val::Nil) => Tm::Nil {
            elem: elem.as_ref().clone(),
        },
        (Ty::List { elem }, Val::ListCons { .. }) => {
            let mut heads = vec![];
            let mut val = val;
            while let Val::ListCons { head, tail } = val {
                heads.push(quote(ctx, elem, head));
                val = tail.as_ref();
            }

            heads
                .into_iter()
                .rev()
                .fold(quote(ctx, ty, val), |tail, head| Tm::list_cons(head, tail))
        }
        (Ty::Atom, Val::Atom { atom }) => Tm::Quote {
            atom: atom.to_string(),
        },

        (ty, _) => unreachable!("value does not have type {}", ty),
    }
}

/// Quote a neutral value, also returning its type. The type of a neutral is
/// determined by the variable at its head and the eliminations applied to
/// it, and is needed to quote the arguments of those eliminations.
pub fn quote_neutral(ctx: &Ctx, neutral: &Neutral) -> (Tm, Ty) {
    grow_stack(|| quote_neutral_impl(ctx, neutral))
}

fn quote_neutral_impl(ctx: &Ctx, neutral: &Neutral) -> (Tm, Ty) {
    match neutral {
        Neutral::Var { index } => (Tm::Var { index: *index }, ctx.lookup(*index).clone()),
        Neutral::FunApp { head, arg } => match quote_neutral(ctx, head) {
            (head_tm, Ty::Fun { dom, cod }) => (
                Tm::FunApp {
                    head: Rc::new(head_tm),
                    arg: Rc::new(quote(ctx, &dom, arg)),
                },
                cod.as_ref().clone(),
            ),
            (_, ty) => unreachable!("applied a neutral of type {}", ty),
        },
        Neutral::RecNat {
            motive,
            target,
            base,
            step,
        } => {
            let (target_tm, _) = quote_neutral(ctx, target);
            let step_ty = Ty::fun(Ty::Nat, Ty::fun(motive.clone(), motive.clone()));

            (
                Tm::RecNat {
                    motive: motive.clone(),
                    target: Rc::new(target_tm),
                    base: Rc::new(quote(ctx, motive, base)),
                    step: Rc::new(quote(ctx, &step_ty, step)),
                },
                motive.clone(),
            )
        }
        Neutral::Car { pair } => match quote_neutral(ctx, pair) {
            (pair_tm, Ty::Pair { fst, .. }) => (
                Tm::Car {
                    tm: Rc::new(pair_tm),
                },
                fst.as_ref().clone(),
            ),
            (_, ty) => unreachable!("projected from a neutral of type {}", ty),
        },
        Neutral::Cdr { pair } => match quote_neutral(ctx, pair) {
            (pair_tm, Ty::Pair { snd, .. }) => (
                Tm::Cdr {
                    tm: Rc::new(pair_tm),
                },
                snd.as_ref().clone(),
            ),
            (_, ty) => unreachable!("projected from a neutral of type {}", ty),
        },
        Neutral::RecList {
            motive,
            target,
            base,
            step,
        } => match quote_neutral(ctx, target) {
            (target_tm, Ty::List { elem }) => {
                let elem = elem.as_ref().clone();
                let step_ty = Ty::fun(
                    elem.clone(),
                    Ty::fun(
                        Ty::list(elem),
                        Ty::fun(motive.clone(), motive.clone()),
                    ),
                );

                (
                    Tm::RecList {
                        motive: motive.clone(),
                        target: Rc::new(target_tm),
                        base: Rc::new(quote(ctx, motive, base)),
                        step: Rc::new(quote(ctx, &step_ty, step)),
                    },
                    motive.clone(),
                )
            }
            (_, ty) => unreachable!("recursed over a neutral of type {}", ty),
        },
    }
}

// Normalisation
//
// By evaluating a term then quoting the result, we can produce a term that
// is reduced as much as possible in the current context. Each free variable
// of the context is evaluated to itself.
pub fn normalize(ctx: &Ctx, ty: &Ty, tm: &Tm) -> Tm {
    quote(ctx, ty, &eval(&ctx.identity_env(), tm))
}
