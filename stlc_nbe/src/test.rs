use itertools::Itertools;
use proptest::prelude::*;

use crate::{
    core::{normalize, synth, Ctx, Tm, Ty},
    parse::parse_program,
    run,
    surface::ElabError,
    Error, Session,
};

// every output on its own line, or the first error with its location
fn fully_eval(code: &str) -> String {
    match run(code) {
        Ok(outputs) => outputs.iter().join("\n"),
        Err(e) => format!("error at {}: {}", e.location(), e),
    }
}

#[test]
fn plus() {
    let code = "
        (claim plus (-> Nat Nat Nat))
        (define plus
          (lambda (n m)
            (rec-nat n m (lambda (k acc) (add1 acc)))))

        (plus (add1 (add1 zero)) (add1 (add1 (add1 zero))))
    ";

    insta::assert_snapshot!(fully_eval(code), @r"
    plus : (-> Nat Nat Nat) = (lambda (x0 x1) (rec-nat x0 x1 (lambda (x2 x3) (add1 x3))))
    (the Nat (add1 (add1 (add1 (add1 (add1 zero))))))
    ");
}

#[test]
fn globals_refer_to_earlier_definitions() {
    let code = "
        (define two (add1 (add1 zero)))
        (claim double (-> Nat Nat))
        (define double (lambda (n) (rec-nat n zero (lambda (k acc) (add1 (add1 acc))))))
        (define four (double two))
    ";

    insta::assert_snapshot!(fully_eval(code), @r"
    two : Nat = (add1 (add1 zero))
    double : (-> Nat Nat) = (lambda (x0) (rec-nat x0 zero (lambda (x1 x2) (add1 (add1 x2)))))
    four : Nat = (add1 (add1 (add1 (add1 zero))))
    ");
}

#[test]
fn list_length() {
    let code = "
        ; counts the elements of a list of atoms
        (claim length (-> (List Atom) Nat))
        (define length
          (lambda (xs)
            (rec-list xs zero (lambda (x rest n) (add1 n)))))

        (length ['a 'b 'c])
    ";

    insta::assert_snapshot!(fully_eval(code), @r"
    length : (-> (List Atom) Nat) = (lambda (x0) (rec-list x0 zero (lambda (x1 x2 x3) (add1 x3))))
    (the Nat (add1 (add1 (add1 zero))))
    ");
}

#[test]
fn stuck_projections() {
    insta::assert_snapshot!(
        fully_eval("(the (-> (Pair Nat Atom) Nat) (lambda (p) (car p)))"),
        @"(the (-> (Pair Nat Atom) Nat) (lambda (x0) (car x0)))"
    );
    insta::assert_snapshot!(
        fully_eval("(the (-> (Pair Nat Atom) Atom) (lambda (p) (cdr p)))"),
        @"(the (-> (Pair Nat Atom) Atom) (lambda (x0) (cdr x0)))"
    );
}

#[test]
fn canonical_forms_read_back_as_themselves() {
    insta::assert_snapshot!(
        fully_eval("(the (Pair Nat (Pair Atom (List Nat))) (, zero 'a [(add1 zero)]))"),
        @"(the (Pair Nat (Pair Atom (List Nat))) (cons zero (cons 'a (:: (add1 zero) nil))))"
    );
    insta::assert_snapshot!(fully_eval("'hello"), @"(the Atom 'hello)");
    insta::assert_snapshot!(fully_eval("(the (List Nat) [])"), @"(the (List Nat) nil)");
}

#[test]
fn functions_are_eta_expanded() {
    insta::assert_snapshot!(
        fully_eval("(the (-> (-> Nat Nat) (-> Nat Nat)) (lambda (f) f))"),
        @"(the (-> (-> Nat Nat) Nat Nat) (lambda (x0 x1) (x0 x1)))"
    );
}

#[test]
fn function_valued_recursion() {
    // plus, with the second argument taken after the recursion
    let code = "
        (the (-> Nat Nat Nat)
          (lambda (n)
            (rec-nat n (lambda (m) m) (lambda (k rec m) (add1 (rec m))))))
    ";

    insta::assert_snapshot!(
        fully_eval(code),
        @"(the (-> Nat Nat Nat) (lambda (x0 x1) ((rec-nat x0 (lambda (x2) x2) (lambda (x2 x3 x4) (add1 (x3 x4)))) x1)))"
    );
}

#[test]
fn recursor_results_are_eta_expanded() {
    let code = "
        (the (-> Nat Nat Nat)
          (lambda (n) (rec-nat n (lambda (m) m) (lambda (k rec) rec))))
    ";

    insta::assert_snapshot!(
        fully_eval(code),
        @"(the (-> Nat Nat Nat) (lambda (x0 x1) ((rec-nat x0 (lambda (x2) x2) (lambda (x2 x3 x4) (x3 x4))) x1)))"
    );
}

#[test]
fn add1_of_a_function() {
    insta::assert_snapshot!(
        fully_eval("(add1 (lambda (x) x))"),
        @"error at [6-20]: mismatched types in lambda: expected Nat, found (-> _ _)"
    );
    assert!(matches!(
        run("(add1 (lambda (x) x))"),
        Err(Error::Elab(ElabError::TypeMismatch { .. }))
    ));
}

#[test]
fn mismatched_types() {
    insta::assert_snapshot!(
        fully_eval("(car zero)"),
        @"error at [5-9]: mismatched types in car: expected (Pair _ _), found Nat"
    );
    insta::assert_snapshot!(
        fully_eval("(zero zero)"),
        @"error at [1-5]: mismatched types in application: expected (-> _ _), found Nat"
    );
    insta::assert_snapshot!(
        fully_eval("(rec-nat zero zero (the (-> Nat Nat) (lambda (x) x)))"),
        @"error at [19-52]: mismatched types in rec-nat step: expected (-> Nat Nat Nat), found (-> Nat Nat)"
    );
}

#[test]
fn arity_mismatch() {
    insta::assert_snapshot!(
        fully_eval("(the (-> Nat Nat) (lambda (x y) x))"),
        @"error at [18-34]: too many arguments: expected at most 1, found 2"
    );
    assert!(matches!(
        run("(define id (the (-> Nat Nat) (lambda (x) x))) (id zero zero)"),
        Err(Error::Elab(ElabError::ArityMismatch {
            expected: 1,
            found: 2,
            ..
        }))
    ));
}

#[test]
fn unbound_variable() {
    insta::assert_snapshot!(
        fully_eval("(add1 y)"),
        @"error at [6-7]: unbound variable: y"
    );
    // a definition cannot refer to itself
    assert!(matches!(
        run("(claim loop Nat) (define loop (add1 loop))"),
        Err(Error::Elab(ElabError::UnboundVariable { .. }))
    ));
}

#[test]
fn cannot_infer() {
    insta::assert_snapshot!(
        fully_eval("(lambda (x) x)"),
        @"error at [0-14]: cannot infer the type of this expression, try annotating it with `the`"
    );
    assert!(matches!(
        run("[]"),
        Err(Error::Elab(ElabError::CannotInfer { .. }))
    ));
}

#[test]
fn redeclared() {
    insta::assert_snapshot!(
        fully_eval("(claim x Nat) (claim x Nat)"),
        @"error at [21-22]: x has already been declared"
    );
    assert!(matches!(
        run("(define x zero) (define x zero)"),
        Err(Error::Elab(ElabError::Redeclared { .. }))
    ));
    assert!(matches!(
        run("(define x zero) (claim x Nat)"),
        Err(Error::Elab(ElabError::Redeclared { .. }))
    ));
}

#[test]
fn malformed_syntax() {
    assert!(matches!(run("(add1 zero"), Err(Error::Parse(_))));
    assert!(matches!(run("(cons zero)"), Err(Error::Parse(_))));
}

#[test]
fn no_partial_output() {
    // the first error aborts the whole program
    assert!(run("(define x zero) (add1 'a)").is_err());
}

#[test]
fn normal_forms_are_idempotent() {
    let code = "
        (claim compose (-> (-> Nat Nat) (-> Nat Nat) Nat Nat))
        (define compose (lambda (f g x) (f (g x))))
        (claim sum (-> (List Nat) Nat))
        (define sum (lambda (xs) (rec-list xs zero (lambda (x rest acc) (rec-nat x acc (lambda (k n) (add1 n)))))))
    ";

    for output in run(code).unwrap() {
        assert_eq!(synth(&Ctx::default(), &output.normal), Some(output.ty.clone()));
        assert_eq!(
            normalize(&Ctx::default(), &output.ty, &output.normal),
            output.normal
        );
    }
}

#[test]
fn unmatched_claims_are_kept_aside() {
    let decls = parse_program("(claim x Nat) (claim y Atom) (define y 'b)").unwrap();
    let mut session = Session::default();
    for decl in &decls {
        session.decl(decl).unwrap();
    }

    assert_eq!(session.unmatched_claims().collect::<Vec<_>>(), ["x"]);
    insta::assert_snapshot!(
        fully_eval("(claim x Nat) (claim y Atom) (define y 'b)"),
        @"y : Atom = 'b"
    );
}

// the normal form of the last output of a program
fn normal_form(code: &str) -> Tm {
    run(code).unwrap().pop().unwrap().normal
}

#[test]
fn extensionally_equal_functions_share_a_normal_form() {
    let pairs = [
        (
            "(the (-> (-> Nat Nat) Nat Nat) (lambda (f) f))",
            "(the (-> (-> Nat Nat) Nat Nat) (lambda (f x) (f x)))",
        ),
        (
            "(the (-> Nat Nat) (lambda (n) n))",
            "(the (-> Nat Nat) (lambda (n) ((the (-> Nat Nat) (lambda (m) m)) n)))",
        ),
        (
            "(the (-> Nat Nat Nat)
               (lambda (n) (rec-nat n (lambda (m) m) (lambda (k rec) rec))))",
            "(the (-> Nat Nat Nat)
               (lambda (n m)
                 ((the (-> Nat Nat) (rec-nat n (lambda (m) m) (lambda (k rec m) (rec m)))) m)))",
        ),
    ];

    for (tm1, tm2) in pairs {
        assert_eq!(normal_form(tm1), normal_form(tm2), "{tm1} and {tm2}");
    }
}

// the stack size the main thread gets
const MAIN_STACK_SIZE: usize = 8 * 1024 * 1024;

#[test]
fn large_numerals_fit_on_the_main_thread_stack() {
    let twenty = format!("{}zero{}", "(add1 ".repeat(20), ")".repeat(20));
    let code = format!(
        "
        (claim plus (-> Nat Nat Nat))
        (define plus (lambda (n m) (rec-nat n m (lambda (k acc) (add1 acc)))))
        (claim times (-> Nat Nat Nat))
        (define times (lambda (n m) (rec-nat n zero (lambda (k acc) (plus m acc)))))
        (define twenty {twenty})
        (define four-hundred (times twenty twenty))
        (define big (times four-hundred four-hundred))
        (define atoms (rec-nat big (the (List Atom) nil) (lambda (k acc) (:: 'a acc))))
        (define k (the (-> Atom Atom) (lambda (x) (car (cons x big)))))
        "
    );

    let result = std::thread::Builder::new()
        .name("large-numerals".to_string())
        .stack_size(MAIN_STACK_SIZE)
        .spawn(move || fully_eval(&code))
        .unwrap()
        .join()
        .unwrap();
    let lines: Vec<&str> = result.lines().collect();

    assert_eq!(lines.len(), 7);
    assert!(lines[4].starts_with("big : Nat = (add1 (add1 "));
    assert_eq!(lines[4].matches("add1").count(), 160_000);
    assert!(lines[5].starts_with("atoms : (List Atom) = (:: 'a (:: 'a "));
    assert_eq!(lines[5].matches("'a").count(), 160_000);
    insta::assert_snapshot!(lines[6], @"k : (-> Atom Atom) = (lambda (x0) x0)");
}

// closed terms of type Nat, with the number they compute
fn arb_nat() -> impl Strategy<Value = (Tm, usize)> {
    let leaf = (0..8usize).prop_map(|n| (Tm::numeral(n), n));

    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|(tm, n)| (Tm::succ(tm), n + 1)),
            (inner.clone(), inner.clone()).prop_map(|((tm1, n1), (tm2, n2))| {
                (plus_tm(tm1, tm2), n1 + n2)
            }),
            inner.clone().prop_map(|(tm, n)| {
                (Tm::fun_app(Tm::fun_lit(Ty::Nat, Tm::var(0)), tm), n)
            }),
            (inner.clone(), inner).prop_map(|((tm1, n1), (tm2, _))| {
                (
                    Tm::Car {
                        tm: std::rc::Rc::new(Tm::cons(tm1, tm2)),
                    },
                    n1,
                )
            }),
        ]
    })
}

fn plus_tm(tm1: Tm, tm2: Tm) -> Tm {
    Tm::RecNat {
        motive: Ty::Nat,
        target: std::rc::Rc::new(tm1),
        base: std::rc::Rc::new(tm2),
        step: std::rc::Rc::new(Tm::fun_lit(
            Ty::Nat,
            Tm::fun_lit(Ty::Nat, Tm::succ(Tm::var(0))),
        )),
    }
}

proptest! {
    #[test]
    fn normalization_computes_numerals((tm, n) in arb_nat()) {
        prop_assert_eq!(synth(&Ctx::default(), &tm), Some(Ty::Nat));
        prop_assert_eq!(normalize(&Ctx::default(), &Ty::Nat, &tm), Tm::numeral(n));
    }

    #[test]
    fn normalization_under_binders_is_idempotent((tm, _) in arb_nat()) {
        // \x. plus x tm, which gets stuck on x
        let ty = Ty::fun(Ty::Nat, Ty::Nat);
        let fun = Tm::fun_lit(Ty::Nat, plus_tm(Tm::var(0), tm));
        let normal = normalize(&Ctx::default(), &ty, &fun);

        prop_assert_eq!(synth(&Ctx::default(), &normal), Some(ty.clone()));
        prop_assert_eq!(normalize(&Ctx::default(), &ty, &normal), normal);
    }
}
