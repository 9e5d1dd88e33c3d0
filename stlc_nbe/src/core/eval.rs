use std::rc::Rc;

use crate::util::Env;

use super::{FunData, Neutral, Tm, Ty, Val};

// When fewer than RED_ZONE bytes of stack remain, recursion continues on a
// freshly allocated segment of STACK_SIZE bytes.
const RED_ZONE: usize = 512 * 1024;
const STACK_SIZE: usize = 4 * 1024 * 1024;

pub(super) fn grow_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SIZE, f)
}

// eliminators

pub fn fun_app(head: &Val, arg: &Val) -> Val {
    match head {
        // if the function is neutral, nothing we can do
        Val::Neutral { neutral } => Val::neutral(Neutral::FunApp {
            head: neutral.clone(),
            arg: arg.clone(),
        }),

        // if it is a function literal, we can apply it
        Val::FunLit { body } => body.apply(arg),

        _ => unreachable!("expected function"),
    }
}

fn car(pair: &Val) -> Val {
    match pair {
        Val::Neutral { neutral } => Val::neutral(Neutral::Car {
            pair: neutral.clone(),
        }),
        Val::Pair { fst, .. } => fst.as_ref().clone(),
        _ => unreachable!("expected pair"),
    }
}

fn cdr(pair: &Val) -> Val {
    match pair {
        Val::Neutral { neutral } => Val::neutral(Neutral::Cdr {
            pair: neutral.clone(),
        }),
        Val::Pair { snd, .. } => snd.as_ref().clone(),
        _ => unreachable!("expected pair"),
    }
}

// rec-nat n base step, where
//   rec-nat zero base step     = base
//   rec-nat (add1 n) base step = step n (rec-nat n base step)
//
// Rather than recursing once per add1, the chain of predecessors is collected
// first and the step is then folded from the innermost predecessor outwards.
fn rec_nat(motive: &Ty, target: &Val, base: Val, step: &Val) -> Val {
    let mut preds: Vec<&Val> = vec![];
    let mut target = target;
    while let Val::Succ { pred } = target {
        target = pred.as_ref();
        preds.push(target);
    }

    let init = match target {
        Val::Zero => base,
        Val::Neutral { neutral } => Val::neutral(Neutral::RecNat {
            motive: motive.clone(),
            target: neutral.clone(),
            base,
            step: step.clone(),
        }),
        _ => unreachable!("expected natural number"),
    };

    preds
        .iter()
        .rev()
        .fold(init, |acc, pred| fun_app(&fun_app(step, pred), &acc))
}

// rec-list l base step, where
//   rec-list nil base step       = base
//   rec-list (:: x xs) base step = step x xs (rec-list xs base step)
fn rec_list(motive: &Ty, target: &Val, base: Val, step: &Val) -> Val {
    let mut conses: Vec<(&Val, &Val)> = vec![];
    let mut target = target;
    while let Val::ListCons { head, tail } = target {
        conses.push((head.as_ref(), tail.as_ref()));
        target = tail.as_ref();
    }

    let init = match target {
        Val::Nil => base,
        Val::Neutral { neutral } => Val::neutral(Neutral::RecList {
            motive: motive.clone(),
            target: neutral.clone(),
            base,
            step: step.clone(),
        }),
        _ => unreachable!("expected list"),
    };

    conses.iter().rev().fold(init, |acc, (head, tail)| {
        fun_app(&fun_app(&fun_app(step, head), tail), &acc)
    })
}

/// Evaluate a term in an environment that has a value for each of its free
/// variables. The term must be well-typed.
pub fn eval(env: &Env<Val>, tm: &Tm) -> Val {
    grow_stack(|| eval_impl(env, tm))
}

fn eval_impl(env: &Env<Val>, tm: &Tm) -> Val {
    match tm {
        Tm::Var { index } => env.get_index(*index).clone(),
        Tm::FunLit { param_ty, body } => Val::FunLit {
            body: FunData {
                env: env.clone(),
                param_ty: param_ty.clone(),
                body: body.clone(),
            },
        },
        Tm::FunApp { head, arg } => {
            let head_val = eval(env, head);
            let arg_val = eval(env, arg);

            fun_app(&head_val, &arg_val)
        }
        Tm::Quote { atom } => Val::Atom {
            atom: Rc::from(atom.as_str()),
        },
        Tm::Zero => Val::Zero,
        Tm::Succ { tm } => Val::Succ {
            pred: Rc::new(eval(env, tm)),
        },
        Tm::RecNat {
            motive,
            target,
            base,
            step,
        } => rec_nat(
            motive,
            &eval(env, target),
            eval(env, base),
            &eval(env, step),
        ),
        Tm::Cons { fst, snd } => Val::Pair {
            fst: Rc::new(eval(env, fst)),
            snd: Rc::new(eval(env, snd)),
        },
        Tm::Car { tm } => car(&eval(env, tm)),
        Tm::Cdr { tm } => cdr(&eval(env, tm)),
        Tm::Nil { .. } => Val::Nil,
        Tm::ListCons { head, tail } => Val::ListCons {
            head: Rc::new(eval(env, head)),
            tail: Rc::new(eval(env, tail)),
        },
        Tm::RecList {
            motive,
            target,
            base,
            step,
        } => rec_list(
            motive,
            &eval(env, target),
            eval(env, base),
            &eval(env, step),
        ),

        // annotations only matter to the elaborator
        Tm::Ann { tm, .. } => eval(env, tm),
    }
}
