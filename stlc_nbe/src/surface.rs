use std::rc::Rc;

use thiserror::Error;

use crate::{
    core,
    util::{Env, Located, Location},
};

// types in the surface language
pub type Ty = Located<TyData>;
#[derive(Debug, Clone)]
pub enum TyData {
    Nat,
    Atom,
    // [ (-> A B C) ], with at least one parameter type
    Fun { params: Vec<Ty>, body: Rc<Ty> },
    Pair { fst: Rc<Ty>, snd: Rc<Ty> },
    List { elem: Rc<Ty> },
}

// names that bind parameters or top-level definitions
pub type Binder = Located<String>;

// terms in the surface language
pub type Tm = Located<TmData>;
#[derive(Debug, Clone)]
pub enum TmData {
    Name {
        name: String,
    },
    // [ (lambda (x y) body) ]
    FunLit {
        params: Vec<Binder>,
        body: Rc<Tm>,
    },
    // [ (f x y) ]
    App {
        head: Rc<Tm>,
        args: Vec<Tm>,
    },
    // [ 'atom ]
    Quote {
        atom: String,
    },
    Zero,
    Add1 {
        tm: Rc<Tm>,
    },
    RecNat {
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
    Nil,
    // [ (:: x xs) ]
    ListCons {
        head: Rc<Tm>,
        tail: Rc<Tm>,
    },
    RecList {
        target: Rc<Tm>,
        base: Rc<Tm>,
        step: Rc<Tm>,
    },
    // [ (the A tm) ]
    The {
        ty: Ty,
        tm: Rc<Tm>,
    },
    // [ (, a b c) ], sugar for nested conses
    Tuple {
        tms: Vec<Tm>,
    },
    // [ [a b c] ], sugar for a list ending in nil
    ListLit {
        tms: Vec<Tm>,
    },
}

// top-level declarations
pub type Decl = Located<DeclData>;
#[derive(Debug, Clone)]
pub enum DeclData {
    Claim { name: Binder, ty: Ty },
    Define { name: Binder, tm: Tm },
    Eval { tm: Tm },
}

/// An error that will be raised if there was a problem in the surface syntax,
/// usually as a result of type errors. This is normal, and should be rendered
/// nicely to the programmer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElabError {
    #[error("unbound variable: {name}")]
    UnboundVariable { location: Location, name: String },

    #[error("mismatched types in {rule}: expected {expected}, found {found}")]
    TypeMismatch {
        location: Location,
        rule: &'static str,
        expected: String,
        found: String,
    },

    #[error("too many arguments: expected at most {expected}, found {found}")]
    ArityMismatch {
        location: Location,
        expected: usize,
        found: usize,
    },

    #[error("cannot infer the type of this expression, try annotating it with `the`")]
    CannotInfer { location: Location },

    #[error("{name} has already been declared")]
    Redeclared { location: Location, name: String },
}

impl ElabError {
    pub fn location(&self) -> &Location {
        match self {
            ElabError::UnboundVariable { location, .. }
            | ElabError::TypeMismatch { location, .. }
            | ElabError::ArityMismatch { location, .. }
            | ElabError::CannotInfer { location }
            | ElabError::Redeclared { location, .. } => location,
        }
    }

    fn mismatch(location: &Location, rule: &'static str, expected: impl ToString, found: impl ToString) -> ElabError {
        ElabError::TypeMismatch {
            location: location.clone(),
            rule,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// The elaboration context: the names and types of the variables in scope,
/// aligned so that a name's position gives its De Bruijn index.
#[derive(Debug, Clone, Default)]
pub struct Context {
    names: Env<String>,
    tys: core::Ctx,
}

impl Context {
    /// Binds a variable in the context
    pub fn bind(&self, name: &str, ty: core::Ty) -> Context {
        Context {
            names: self.names.with(name.to_string()),
            tys: self.tys.extend(ty),
        }
    }

    /// Looks up the most recent binding of a name
    pub fn lookup(&self, name: &str) -> Option<(core::Index, &core::Ty)> {
        let index = self.names.find_index(&name.to_string())?;

        Some((index, self.tys.lookup(index)))
    }

    pub fn tys(&self) -> &core::Ctx {
        &self.tys
    }
}

fn equate_ty(location: &Location, rule: &'static str, expected: &core::Ty, found: &core::Ty) -> Result<(), ElabError> {
    if expected == found {
        Ok(())
    } else {
        Err(ElabError::mismatch(location, rule, expected, found))
    }
}

// elaborate a type
pub fn elab_ty(ty: &Ty) -> core::Ty {
    match &ty.data {
        TyData::Nat => core::Ty::Nat,
        TyData::Atom => core::Ty::Atom,
        TyData::Fun { params, body } => params
            .iter()
            .rev()
            .fold(elab_ty(body), |cod, param| core::Ty::fun(elab_ty(param), cod)),
        TyData::Pair { fst, snd } => core::Ty::pair(elab_ty(fst), elab_ty(snd)),
        TyData::List { elem } => core::Ty::list(elab_ty(elem)),
    }
}

// [ (, a b c) ] is [ (cons a (cons b c)) ]
fn desugar_tuple(location: &Location, tms: &[Tm]) -> Tm {
    match tms {
        [last] => last.clone(),
        [fst, rest @ ..] => Tm::new(
            location.clone(),
            TmData::Cons {
                fst: Rc::new(fst.clone()),
                snd: Rc::new(desugar_tuple(location, rest)),
            },
        ),
        // the parser never produces empty tuples
        [] => unreachable!("empty tuple"),
    }
}

// [ [a b c] ] is [ (:: a (:: b (:: c nil))) ]
fn desugar_list_lit(location: &Location, tms: &[Tm]) -> Tm {
    match tms {
        [] => Tm::new(location.clone(), TmData::Nil),
        [head, rest @ ..] => Tm::new(
            location.clone(),
            TmData::ListCons {
                head: Rc::new(head.clone()),
                tail: Rc::new(desugar_list_lit(location, rest)),
            },
        ),
    }
}

/// Check a term against an expected type, producing a core term of that type.
pub fn check(ctx: &Context, tm: &Tm, ty: &core::Ty) -> Result<core::Tm, ElabError> {
    match (&tm.data, ty) {
        (TmData::FunLit { params, body }, _) => {
            check_fun_lit(ctx, params, body, ty, &tm.location)
        }
        (TmData::Nil, core::Ty::List { elem }) => Ok(core::Tm::Nil {
            elem: elem.as_ref().clone(),
        }),
        (TmData::Nil, _) => Err(ElabError::mismatch(&tm.location, "nil", ty, "(List _)")),
        (TmData::Cons { fst, snd }, core::Ty::Pair { fst: fst_ty, snd: snd_ty }) => {
            Ok(core::Tm::Cons {
                fst: Rc::new(check(ctx, fst, fst_ty)?),
                snd: Rc::new(check(ctx, snd, snd_ty)?),
            })
        }
        (TmData::ListCons { head, tail }, core::Ty::List { elem }) => Ok(core::Tm::ListCons {
            head: Rc::new(check(ctx, head, elem)?),
            tail: Rc::new(check(ctx, tail, ty)?),
        }),
        (TmData::RecNat { target, base, step }, _) => {
            let base_tm = check(ctx, base, ty)?;
            elab_rec_nat(ctx, target, base_tm, step, ty)
        }
        (TmData::RecList { target, base, step }, _) => {
            let base_tm = check(ctx, base, ty)?;
            elab_rec_list(ctx, target, base_tm, step, ty)
        }
        (TmData::Tuple { tms }, _) => check(ctx, &desugar_tuple(&tm.location, tms), ty),
        (TmData::ListLit { tms }, _) => check(ctx, &desugar_list_lit(&tm.location, tms), ty),

        // fall back to type inference
        _ => {
            let (ctm, found) = infer(ctx, tm)?;
            equate_ty(&tm.location, "annotation", ty, &found)?;

            Ok(ctm)
        }
    }
}

/// Infer the type of a term, producing a core term of that type.
pub fn infer(ctx: &Context, tm: &Tm) -> Result<(core::Tm, core::Ty), ElabError> {
    match &tm.data {
        TmData::Name { name } => match ctx.lookup(name) {
            Some((index, ty)) => Ok((core::Tm::Var { index }, ty.clone())),
            None => Err(ElabError::UnboundVariable {
                location: tm.location.clone(),
                name: name.clone(),
            }),
        },
        TmData::FunLit { .. } | TmData::Nil => Err(ElabError::CannotInfer {
            location: tm.location.clone(),
        }),
        TmData::App { head, args } => {
            let (head_tm, head_ty) = infer(ctx, head)?;

            match head_ty.arity() {
                0 => Err(ElabError::mismatch(&head.location, "application", "(-> _ _)", &head_ty)),
                arity if arity < args.len() => Err(ElabError::ArityMismatch {
                    location: tm.location.clone(),
                    expected: arity,
                    found: args.len(),
                }),
                _ => {
                    let (mut head_tm, mut head_ty) = (head_tm, head_ty);
                    for arg in args {
                        let (dom, cod) = match head_ty {
                            core::Ty::Fun { dom, cod } => (dom, cod),
                            // ruled out by the arity check above
                            _ => unreachable!("applied a non-function"),
                        };
                        head_tm = core::Tm::fun_app(head_tm, check(ctx, arg, &dom)?);
                        head_ty = cod.as_ref().clone();
                    }

                    Ok((head_tm, head_ty))
                }
            }
        }
        TmData::Quote { atom } => Ok((core::Tm::Quote { atom: atom.clone() }, core::Ty::Atom)),
        TmData::Zero => Ok((core::Tm::Zero, core::Ty::Nat)),
        TmData::Add1 { tm } => {
            let ctm = check(ctx, tm, &core::Ty::Nat)?;
            Ok((core::Tm::succ(ctm), core::Ty::Nat))
        }
        TmData::RecNat { target, base, step } => {
            // the type of the base determines the type of the whole recursion
            let (base_tm, motive) = infer(ctx, base)?;
            let ctm = elab_rec_nat(ctx, target, base_tm, step, &motive)?;
            Ok((ctm, motive))
        }
        TmData::Cons { fst, snd } => {
            let (fst_tm, fst_ty) = infer(ctx, fst)?;
            let (snd_tm, snd_ty) = infer(ctx, snd)?;

            Ok((core::Tm::cons(fst_tm, snd_tm), core::Ty::pair(fst_ty, snd_ty)))
        }
        TmData::Car { tm: pair } => match infer(ctx, pair)? {
            (pair_tm, core::Ty::Pair { fst, .. }) => Ok((
                core::Tm::Car {
                    tm: Rc::new(pair_tm),
                },
                fst.as_ref().clone(),
            )),
            (_, ty) => Err(ElabError::mismatch(&pair.location, "car", "(Pair _ _)", ty)),
        },
        TmData::Cdr { tm: pair } => match infer(ctx, pair)? {
            (pair_tm, core::Ty::Pair { snd, .. }) => Ok((
                core::Tm::Cdr {
                    tm: Rc::new(pair_tm),
                },
                snd.as_ref().clone(),
            )),
            (_, ty) => Err(ElabError::mismatch(&pair.location, "cdr", "(Pair _ _)", ty)),
        },
        TmData::ListCons { head, tail } => {
            let (head_tm, elem) = infer(ctx, head)?;
            let list_ty = core::Ty::list(elem);
            let tail_tm = check(ctx, tail, &list_ty)?;

            Ok((core::Tm::list_cons(head_tm, tail_tm), list_ty))
        }
        TmData::RecList { target, base, step } => {
            let (base_tm, motive) = infer(ctx, base)?;
            let ctm = elab_rec_list(ctx, target, base_tm, step, &motive)?;
            Ok((ctm, motive))
        }
        TmData::The { ty, tm } => {
            let cty = elab_ty(ty);
            let ctm = check(ctx, tm, &cty)?;

            Ok((
                core::Tm::Ann {
                    ty: cty.clone(),
                    tm: Rc::new(ctm),
                },
                cty,
            ))
        }
        TmData::Tuple { tms } => infer(ctx, &desugar_tuple(&tm.location, tms)),
        TmData::ListLit { tms } if tms.is_empty() => Err(ElabError::CannotInfer {
            location: tm.location.clone(),
        }),
        TmData::ListLit { tms } => infer(ctx, &desugar_list_lit(&tm.location, tms)),
    }
}

// check a function literal, one parameter per arrow in the expected type
fn check_fun_lit(
    ctx: &Context,
    params: &[Binder],
    body: &Tm,
    ty: &core::Ty,
    location: &Location,
) -> Result<core::Tm, ElabError> {
    match ty.arity() {
        0 => Err(ElabError::mismatch(location, "lambda", ty, "(-> _ _)")),
        arity if arity < params.len() => Err(ElabError::ArityMismatch {
            location: location.clone(),
            expected: arity,
            found: params.len(),
        }),
        _ => check_params(ctx, params, body, ty),
    }
}

fn check_params(ctx: &Context, params: &[Binder], body: &Tm, ty: &core::Ty) -> Result<core::Tm, ElabError> {
    match (params, ty) {
        ([], ty) => check(ctx, body, ty),
        ([name, rest @ ..], core::Ty::Fun { dom, cod }) => {
            let body_tm = check_params(&ctx.bind(&name.data, dom.as_ref().clone()), rest, body, cod)?;

            Ok(core::Tm::FunLit {
                param_ty: dom.as_ref().clone(),
                body: Rc::new(body_tm),
            })
        }
        // ruled out by the arity check in check_fun_lit
        _ => unreachable!("more parameters than arrows"),
    }
}

fn elab_rec_nat(
    ctx: &Context,
    target: &Tm,
    base_tm: core::Tm,
    step: &Tm,
    motive: &core::Ty,
) -> Result<core::Tm, ElabError> {
    let target_tm = check(ctx, target, &core::Ty::Nat)?;
    let step_ty = core::Ty::fun(core::Ty::Nat, core::Ty::fun(motive.clone(), motive.clone()));
    let step_tm = check_step(ctx, step, &step_ty, "rec-nat step")?;

    Ok(core::Tm::RecNat {
        motive: motive.clone(),
        target: Rc::new(target_tm),
        base: Rc::new(base_tm),
        step: Rc::new(step_tm),
    })
}

fn elab_rec_list(
    ctx: &Context,
    target: &Tm,
    base_tm: core::Tm,
    step: &Tm,
    motive: &core::Ty,
) -> Result<core::Tm, ElabError> {
    let (target_tm, elem) = match infer(ctx, target)? {
        (target_tm, core::Ty::List { elem }) => (target_tm, elem.as_ref().clone()),
        (_, ty) => {
            return Err(ElabError::mismatch(&target.location, "rec-list target", "(List _)", ty))
        }
    };
    let step_ty = core::Ty::fun(
        elem.clone(),
        core::Ty::fun(core::Ty::list(elem), core::Ty::fun(motive.clone(), motive.clone())),
    );
    let step_tm = check_step(ctx, step, &step_ty, "rec-list step")?;

    Ok(core::Tm::RecList {
        motive: motive.clone(),
        target: Rc::new(target_tm),
        base: Rc::new(base_tm),
        step: Rc::new(step_tm),
    })
}

// a step that is not a lambda has its whole type compared, under the
// recursor's name
fn check_step(ctx: &Context, step: &Tm, step_ty: &core::Ty, rule: &'static str) -> Result<core::Tm, ElabError> {
    match &step.data {
        TmData::FunLit { .. } => check(ctx, step, step_ty),
        _ => {
            let (step_tm, found) = infer(ctx, step)?;
            equate_ty(&step.location, rule, step_ty, &found)?;

            Ok(step_tm)
        }
    }
}
