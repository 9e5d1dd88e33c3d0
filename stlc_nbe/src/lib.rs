// A simply typed lambda calculus with naturals, atoms, pairs and lists,
// normalized by evaluation.
//
// Programs are parsed into a located surface syntax, elaborated with
// bidirectional type checking into a well-typed core language, and then
// evaluated into semantic values which are read back as eta-long,
// beta-normal terms.

pub mod core;
pub mod parse;
pub mod surface;
pub mod util;

#[cfg(test)]
mod test;

use std::fmt::Display;

use log::{debug, trace, warn};
use thiserror::Error;

use crate::{
    core::{Ctx, Val},
    parse::ParseError,
    surface::{Context, Decl, DeclData, ElabError},
    util::{Env, Location},
};

/// Anything that can go wrong before evaluation starts. Once a program has
/// been elaborated, evaluating and normalizing it cannot fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Elab(#[from] ElabError),
}

impl Error {
    pub fn location(&self) -> &Location {
        match self {
            Error::Parse(e) => &e.location,
            Error::Elab(e) => e.location(),
        }
    }
}

/// The result of a top-level definition or expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub name: Option<String>,
    pub ty: core::Ty,
    pub normal: core::Tm,
}

impl Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => format!("{} : {} = {}", name, self.ty, self.normal).fmt(f),
            None => format!("(the {} {})", self.ty, self.normal).fmt(f),
        }
    }
}

/// The state carried from one top-level declaration to the next. Globals are
/// bound in the elaboration context like any other variable, and their values
/// are kept in a matching environment.
///
/// A claim waits for the `define` of the same name. One that never gets it is
/// not an error, since nothing can refer to an undefined name, but it stays
/// listed in `unmatched_claims`.
#[derive(Debug, Default)]
pub struct Session {
    ctx: Context,
    env: Env<Val>,
    claims: Vec<(String, core::Ty)>,
}

impl Session {
    pub fn decl(&mut self, decl: &Decl) -> Result<Option<Output>, ElabError> {
        match &decl.data {
            DeclData::Claim { name, ty } => {
                if self.is_declared(&name.data) {
                    return Err(ElabError::Redeclared {
                        location: name.location.clone(),
                        name: name.data.clone(),
                    });
                }
                let ty = surface::elab_ty(ty);
                debug!("claimed {} : {}", name.data, ty);
                self.claims.push((name.data.clone(), ty));

                Ok(None)
            }
            DeclData::Define { name, tm } => {
                if self.ctx.lookup(&name.data).is_some() {
                    return Err(ElabError::Redeclared {
                        location: name.location.clone(),
                        name: name.data.clone(),
                    });
                }
                let (ctm, ty) = match self.take_claim(&name.data) {
                    Some(ty) => (surface::check(&self.ctx, tm, &ty)?, ty),
                    None => surface::infer(&self.ctx, tm)?,
                };
                debug!("defined {} : {}", name.data, ty);

                let val = self.eval(&ctm, &ty);
                let output = self.output(Some(name.data.clone()), ty.clone(), &val);
                self.ctx = self.ctx.bind(&name.data, ty);
                self.env = self.env.with(val);

                Ok(Some(output))
            }
            DeclData::Eval { tm } => {
                let (ctm, ty) = surface::infer(&self.ctx, tm)?;
                debug!("evaluating expression of type {}", ty);

                let val = self.eval(&ctm, &ty);
                Ok(Some(self.output(None, ty, &val)))
            }
        }
    }

    pub fn unmatched_claims(&self) -> impl Iterator<Item = &str> {
        self.claims.iter().map(|(name, _)| name.as_str())
    }

    fn is_declared(&self, name: &str) -> bool {
        self.ctx.lookup(name).is_some() || self.claims.iter().any(|(claimed, _)| claimed == name)
    }

    fn take_claim(&mut self, name: &str) -> Option<core::Ty> {
        let position = self.claims.iter().position(|(claimed, _)| claimed == name)?;
        Some(self.claims.remove(position).1)
    }

    fn eval(&self, ctm: &core::Tm, ty: &core::Ty) -> Val {
        debug_assert_eq!(core::synth(self.ctx.tys(), ctm).as_ref(), Some(ty));

        core::eval(&self.env, ctm)
    }

    // globals have values, so outputs are read back in the empty context
    fn output(&self, name: Option<String>, ty: core::Ty, val: &Val) -> Output {
        let normal = core::quote(&Ctx::default(), &ty, val);
        debug_assert_eq!(core::synth(&Ctx::default(), &normal).as_ref(), Some(&ty));
        trace!("normal form: {}", normal);

        Output { name, ty, normal }
    }
}

/// Parse, elaborate and normalize a whole program, stopping at the first
/// error.
pub fn run(code: &str) -> Result<Vec<Output>, Error> {
    let decls = parse::parse_program(code)?;
    let mut session = Session::default();

    let mut outputs = vec![];
    for decl in &decls {
        if let Some(output) = session.decl(decl)? {
            outputs.push(output);
        }
    }

    for name in session.unmatched_claims() {
        warn!("{} was claimed but never defined", name);
    }

    Ok(outputs)
}
