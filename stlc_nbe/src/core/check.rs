use super::{eval::grow_stack, Ctx, Tm, Ty};

/// Recover the type of a core term, or `None` if the term is ill-typed.
///
/// The elaborator only produces well-typed terms, so this exists to check
/// that claim: on elaborated terms and on the output of normalization.
pub fn synth(ctx: &Ctx, tm: &Tm) -> Option<Ty> {
    grow_stack(|| synth_impl(ctx, tm))
}

fn synth_impl(ctx: &Ctx, tm: &Tm) -> Option<Ty> {
    match tm {
        Tm::Var { index } if *index < ctx.len() => Some(ctx.lookup(*index).clone()),
        Tm::Var { .. } => None,
        Tm::FunLit { param_ty, body } => {
            let body_ty = synth(&ctx.extend(param_ty.clone()), body)?;
            Some(Ty::fun(param_ty.clone(), body_ty))
        }
        Tm::FunApp { head, arg } => match synth(ctx, head)? {
            Ty::Fun { dom, cod } => {
                expect(ctx, arg, &dom)?;
                Some(cod.as_ref().clone())
            }
            _ => None,
        },
        Tm::Quote { .. } => Some(Ty::Atom),
        Tm::Zero => Some(Ty::Nat),
        Tm::Succ { .. } => {
            let mut tm = tm;
            while let Tm::Succ { tm: pred } = tm {
                tm = pred.as_ref();
            }
            expect(ctx, tm, &Ty::Nat)?;
            Some(Ty::Nat)
        }
        Tm::RecNat {
            motive,
            target,
            base,
            step,
        } => {
            expect(ctx, target, &Ty::Nat)?;
            expect(ctx, base, motive)?;
            expect(
                ctx,
                step,
                &Ty::fun(Ty::Nat, Ty::fun(motive.clone(), motive.clone())),
            )?;
            Some(motive.clone())
        }
        Tm::Cons { fst, snd } => Some(Ty::pair(synth(ctx, fst)?, synth(ctx, snd)?)),
        Tm::Car { tm } => match synth(ctx, tm)? {
            Ty::Pair { fst, .. } => Some(fst.as_ref().clone()),
            _ => None,
        },
        Tm::Cdr { tm } => match synth(ctx, tm)? {
            Ty::Pair { snd, .. } => Some(snd.as_ref().clone()),
            _ => None,
        },
        Tm::Nil { elem } => Some(Ty::list(elem.clone())),
        Tm::ListCons { head, tail } => {
            let elem = synth(ctx, head)?;
            let mut tail = tail.as_ref();
            while let Tm::ListCons { head, tail: tail1 } = tail {
                expect(ctx, head, &elem)?;
                tail = tail1.as_ref();
            }
            let list_ty = Ty::list(elem);
            expect(ctx, tail, &list_ty)?;
            Some(list_ty)
        }
        Tm::RecList {
            motive,
            target,
            base,
            step,
        } => match synth(ctx, target)? {
            Ty::List { elem } => {
                let elem = elem.as_ref().clone();
                expect(ctx, base, motive)?;
                expect(
                    ctx,
                    step,
                    &Ty::fun(
                        elem.clone(),
                        Ty::fun(Ty::list(elem), Ty::fun(motive.clone(), motive.clone())),
                    ),
                )?;
                Some(motive.clone())
            }
            _ => None,
        },
        Tm::Ann { ty, tm } => {
            expect(ctx, tm, ty)?;
            Some(ty.clone())
        }
    }
}

fn expect(ctx: &Ctx, tm: &Tm, ty: &Ty) -> Option<()> {
    (synth(ctx, tm)? == *ty).then_some(())
}
