mod common;

#[cfg(test)]
mod parser_tests {
    use std::collections::HashSet;

    use crate::common;

    use yajs::ast::{Expr, Stmt};
    use yajs::ast_printer::AstPrinter;
    use yajs::error::YajsError;
    use yajs::parser::Parser;

    fn printed(source: &str) -> Vec<String> {
        let statements = yajs::parse(source).expect("program should parse");
        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn expression(source: &str) -> String {
        let tokens = yajs::scan(source).expect("source should scan");
        let expr = Parser::new(&tokens)
            .parse_expression()
            .expect("expression should parse");
        AstPrinter::print(&expr)
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(expression("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(expression("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
        assert_eq!(expression("8 - 4 - 2"), "(- (- 8.0 4.0) 2.0)");
        assert_eq!(expression("7 mod 2 % 3"), "(% (mod 7.0 2.0) 3.0)");
    }

    #[test]
    fn coalesce_binds_looser_than_or() {
        assert_eq!(expression("a ?? b or c"), "(?? a (or b c))");
        assert_eq!(expression("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn unary_operators() {
        assert_eq!(expression("!!x"), "(!! x)");
        assert_eq!(expression("-!x"), "(- (! x))");
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(expression("a = b = 1"), "(= a (= b 1.0))");
        assert_eq!(expression("p.x = 2"), "(= (. p x) 2.0)");
    }

    #[test]
    fn calls_and_properties_chain() {
        assert_eq!(expression("a.b(1, 2).c"), "(. (call (. a b) 1.0 2.0) c)");
    }

    #[test]
    fn for_loop_desugars_to_while() {
        assert_eq!(
            printed("for (let i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (let i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );
    }

    #[test]
    fn for_loop_without_clauses_loops_forever() {
        assert_eq!(printed("for (;;) print 1;"), vec!["(while true (print 1.0))"]);
    }

    #[test]
    fn declarations() {
        assert_eq!(
            printed("let a; let b = 1; const c = \"s\";"),
            vec!["(let a)", "(let b 1.0)", "(const c s)"]
        );

        assert_eq!(
            printed("function add(a, b) { return a + b; }"),
            vec!["(function add (a b) (return (+ a b)))"]
        );
    }

    #[test]
    fn class_declaration_shape() {
        let statements = yajs::parse(
            "class B extends A { constructor(x) { this.x = x; } static make() { return super.make(); } }",
        )
        .expect("class should parse");

        let Stmt::Class {
            name,
            superclass,
            methods,
            static_methods,
        } = &statements[0]
        else {
            panic!("expected a class statement");
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name.lexeme, "constructor");
        assert_eq!(methods[0].params.len(), 1);
        assert_eq!(static_methods.len(), 1);
        assert_eq!(static_methods[0].name.lexeme, "make");

        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(class B (extends A) (method constructor (x) (; (= (. this x) x))) (static make () (return (call (. super make)))))"
        );
    }

    #[test]
    fn every_reference_gets_a_distinct_id() {
        let statements = yajs::parse(
            "let a = 1; { let a = 2; print a; } print a; a = a + 1; class C { m() { return this; } }",
        )
        .expect("program should parse");

        let ids: Vec<_> = common::references(&statements)
            .into_iter()
            .map(|(_, id)| id)
            .collect();
        let unique: HashSet<_> = ids.iter().copied().collect();

        assert_eq!(ids.len(), 5);
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn errors_are_collected_after_synchronizing() {
        let errors = yajs::parse("let = 1; print ; let x = 2;").unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, YajsError::Parse { .. })));
    }

    #[test]
    fn invalid_assignment_target() {
        let errors = yajs::parse("1 = 2;").unwrap_err();
        assert_eq!(errors[0].to_string(), "[line 1] Error: Invalid assignment target");
    }

    #[test]
    fn super_requires_a_method_name() {
        assert!(yajs::parse("super;").is_err());
    }

    #[test]
    fn const_requires_initializer() {
        assert!(yajs::parse("const x;").is_err());
    }

    #[test]
    fn too_many_arguments() {
        let arguments: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", arguments.join(", "));

        let errors = yajs::parse(&source).unwrap_err();
        assert!(errors[0].to_string().contains("255 arguments"));
    }
}
