use std::rc::Rc;

use thiserror::Error;

use crate::{
    surface::{Binder, Decl, DeclData, Tm, TmData, Ty, TyData},
    util::{Located, Location},
};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    pub location: Location,
    pub message: String,
}

impl From<peg::error::ParseError<peg::str::LineCol>> for ParseError {
    fn from(e: peg::error::ParseError<peg::str::LineCol>) -> Self {
        ParseError {
            location: Location::new(e.location.offset, e.location.offset),
            message: format!("unexpected syntax, expected {}", e.expected),
        }
    }
}

/// Parse a whole program: a sequence of claims, definitions and expressions.
pub fn parse_program(code: &str) -> Result<Vec<Decl>, ParseError> {
    Ok(parser::program(code)?)
}

/// Parse a single expression.
pub fn parse_tm(code: &str) -> Result<Tm, ParseError> {
    Ok(parser::single_tm(code)?)
}

const KEYWORDS: &[&str] = &[
    "lambda", "zero", "add1", "rec-nat", "cons", "car", "cdr", "nil", "rec-list", "the", "claim",
    "define", "Nat", "Atom", "Pair", "List",
];

peg::parser! {
    grammar parser() for str {

        pub rule program() -> Vec<Decl> = _ decls:(decl() ** _) _ { decls }

        pub rule single_tm() -> Tm = _ tm:tm() _ { tm }

        rule decl() -> Decl = spanned(<decl_data()>)
        rule decl_data() -> DeclData =
            "(" _ kw("claim") _ name:binder() _ ty:ty() _ ")" {
                DeclData::Claim { name, ty }
            } /
            "(" _ kw("define") _ name:binder() _ tm:tm() _ ")" {
                DeclData::Define { name, tm }
            } /
            tm:tm() { DeclData::Eval { tm } }

        //

        rule tm() -> Tm = spanned(<tm_data()>)
        rule tm_data() -> TmData =
            "(" _ kw("lambda") _ "(" _ params:(binder() ++ _) _ ")" _ body:tm() _ ")" {
                TmData::FunLit { params, body: Rc::new(body) }
            } /
            "(" _ kw("add1") _ tm:tm() _ ")" { TmData::Add1 { tm: Rc::new(tm) } } /
            "(" _ kw("rec-nat") _ target:tm() _ base:tm() _ step:tm() _ ")" {
                TmData::RecNat { target: Rc::new(target), base: Rc::new(base), step: Rc::new(step) }
            } /
            "(" _ kw("cons") _ fst:tm() _ snd:tm() _ ")" {
                TmData::Cons { fst: Rc::new(fst), snd: Rc::new(snd) }
            } /
            "(" _ kw("car") _ tm:tm() _ ")" { TmData::Car { tm: Rc::new(tm) } } /
            "(" _ kw("cdr") _ tm:tm() _ ")" { TmData::Cdr { tm: Rc::new(tm) } } /
            "(" _ "::" _ head:tm() _ tail:tm() _ ")" {
                TmData::ListCons { head: Rc::new(head), tail: Rc::new(tail) }
            } /
            "(" _ kw("rec-list") _ target:tm() _ base:tm() _ step:tm() _ ")" {
                TmData::RecList { target: Rc::new(target), base: Rc::new(base), step: Rc::new(step) }
            } /
            "(" _ kw("the") _ ty:ty() _ tm:tm() _ ")" { TmData::The { ty, tm: Rc::new(tm) } } /
            "(" _ "," _ tms:(tm() **<2,> _) _ ")" { TmData::Tuple { tms } } /
            "(" _ head:tm() _ args:(tm() ++ _) _ ")" { TmData::App { head: Rc::new(head), args } } /
            "[" _ tms:(tm() ** _) _ "]" { TmData::ListLit { tms } } /
            "'" atom:word() { TmData::Quote { atom: atom.to_string() } } /
            kw("zero") { TmData::Zero } /
            kw("nil") { TmData::Nil } /
            name:name() { TmData::Name { name } }

        rule ty() -> Ty = spanned(<ty_data()>)
        rule ty_data() -> TyData =
            kw("Nat") { TyData::Nat } /
            kw("Atom") { TyData::Atom } /
            // every parameter type is followed by at least one more type
            "(" _ "->" _ params:(param:ty() _ &ty() { param })+ body:ty() _ ")" {
                TyData::Fun { params, body: Rc::new(body) }
            } /
            "(" _ kw("Pair") _ fst:ty() _ snd:ty() _ ")" {
                TyData::Pair { fst: Rc::new(fst), snd: Rc::new(snd) }
            } /
            "(" _ kw("List") _ elem:ty() _ ")" { TyData::List { elem: Rc::new(elem) } }

        //

        rule binder() -> Binder = spanned(<name()>)

        rule word() -> &'input str
            = quiet!{ $(['a'..='z' | 'A'..='Z' | '_']['a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '?' | '!' | '*']*) }
            / expected!("identifier")

        rule name() -> String
            = w:word() {? if KEYWORDS.contains(&w) { Err("identifier") } else { Ok(w.to_string()) } }

        rule kw(k: &'static str)
            = w:word() {? if w == k { Ok(()) } else { Err(k) } }

        //

        rule spanned<T>(tr: rule<T>) -> Located<T> =
            start:position!() t:tr() end:position!() {
                Located::new(Location::new(start, end), t)
            }

        //

        rule whitespace() = quiet!{[' ' | '\n' | '\t' | '\r']*}
        rule _
            = whitespace() ";" [c if c != '\n']* _()
            / whitespace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::elab_ty;

    #[test]
    fn parses_multi_parameter_lambdas() {
        let tm = parse_tm("(lambda (x y) (f x y))").unwrap();

        match tm.data {
            TmData::FunLit { params, body } => {
                let names: Vec<_> = params.iter().map(|p| p.data.as_str()).collect();
                assert_eq!(names, ["x", "y"]);
                assert!(matches!(&body.data, TmData::App { args, .. } if args.len() == 2));
            }
            _ => panic!("expected a lambda"),
        }
    }

    #[test]
    fn arrows_take_several_parameter_types() {
        let tm = parse_tm("(the (-> Nat (List Atom) (Pair Nat Nat)) f)").unwrap();

        match tm.data {
            TmData::The { ty, .. } => insta::assert_snapshot!(
                elab_ty(&ty),
                @"(-> Nat (List Atom) (Pair Nat Nat))"
            ),
            _ => panic!("expected an annotation"),
        }
    }

    #[test]
    fn keywords_are_not_names() {
        assert!(matches!(parse_tm("zero").unwrap().data, TmData::Zero));
        assert!(matches!(parse_tm("zeroes").unwrap().data, TmData::Name { .. }));
        assert!(parse_tm("(lambda (car) car)").is_err());
    }

    #[test]
    fn comments_and_locations() {
        let decls = parse_program(
            "; a comment\n(claim two Nat) ; trailing\n(define two (add1 (add1 zero)))\n'hi",
        )
        .unwrap();

        assert_eq!(decls.len(), 3);
        assert!(matches!(decls[0].data, DeclData::Claim { .. }));
        assert!(matches!(decls[1].data, DeclData::Define { .. }));
        assert!(
            matches!(&decls[2].data, DeclData::Eval { tm } if matches!(&tm.data, TmData::Quote { atom } if atom == "hi"))
        );
        assert_eq!(decls[0].location, Location::new(12, 27));
    }

    #[test]
    fn tuples_and_list_literals() {
        assert!(matches!(
            parse_tm("(, zero 'a nil)").unwrap().data,
            TmData::Tuple { tms } if tms.len() == 3
        ));
        assert!(matches!(
            parse_tm("[]").unwrap().data,
            TmData::ListLit { tms } if tms.is_empty()
        ));
        assert!(parse_tm("(, zero)").is_err());
    }

    #[test]
    fn reports_the_offset_of_malformed_syntax() {
        let e = parse_program("(add1 zero").unwrap_err();

        assert_eq!(e.location, Location::new(10, 10));
    }
}
