mod common;

#[cfg(test)]
mod class_tests {
    use crate::common::{lines_of, output_of, runtime_failure};

    use yajs::error::RuntimeError;

    #[test]
    fn static_factory_returns_the_class_itself() {
        let source = "
            class A { static make() { return A; } }
            print A.make() == A;
            print A.make();
        ";
        assert_eq!(lines_of(source), vec!["true", "\"<class A>\""]);
    }

    #[test]
    fn super_call_reaches_the_base_method() {
        let source = "
            class Base { greet() { return \"base\"; } }
            class Sub extends Base { greet() { return super.greet() + \"+sub\"; } }
            print Sub().greet();
        ";
        assert_eq!(output_of(source), "\"base+sub\"\n");
    }

    #[test]
    fn super_targets_the_defining_class() {
        let source = "
            class A { m() { return \"A\"; } }
            class B extends A { m() { return \"B\" + super.m(); } }
            class C extends B { m() { return \"C\" + super.m(); } }
            class D extends C {}
            print C().m();
            print D().m();
        ";
        assert_eq!(lines_of(source), vec!["\"CBA\"", "\"CBA\""]);
    }

    #[test]
    fn constructor_initializes_fields() {
        let source = "
            class Point {
                constructor(x, y) { this.x = x; this.y = y; }
                sum() { return this.x + this.y; }
            }
            let p = Point(3, 4);
            print p.x;
            print p.sum();
        ";
        assert_eq!(lines_of(source), vec!["3", "7"]);
    }

    #[test]
    fn constructor_is_inherited() {
        let source = "
            class A { constructor(v) { this.v = v; } }
            class B extends A {}
            print B(7).v;
        ";
        assert_eq!(output_of(source), "7\n");
    }

    #[test]
    fn super_constructor_runs_on_the_new_instance() {
        let source = "
            class A { constructor() { this.tag = \"a\"; } }
            class B extends A { constructor() { super.constructor(); this.tag = this.tag + \"b\"; } }
            print B().tag;
        ";
        assert_eq!(output_of(source), "\"ab\"\n");
    }

    #[test]
    fn class_without_constructor_takes_no_arguments() {
        let (_, err) = runtime_failure("class E {}\nE(1);");

        assert!(matches!(
            err,
            RuntimeError::ArityMismatch { ref callee, expected: 0, got: 1, line: 2 } if callee == "E"
        ));
    }

    #[test]
    fn constructor_arity_is_checked() {
        let (_, err) = runtime_failure("class P { constructor(a, b) {} }\nP(1);");
        assert!(matches!(err, RuntimeError::ArityMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn methods_stay_bound_when_detached() {
        let source = "
            class Counter {
                constructor() { this.n = 0; }
                inc() { this.n = this.n + 1; return this.n; }
            }
            let c = Counter();
            let f = c.inc;
            f();
            print f();
            print c.n;
        ";
        assert_eq!(lines_of(source), vec!["2", "2"]);
    }

    #[test]
    fn this_reaches_nested_functions() {
        let source = "
            class A {
                m() { function g() { return this; } return g(); }
            }
            let a = A();
            print a.m() == a;
        ";
        assert_eq!(output_of(source), "true\n");
    }

    #[test]
    fn fields_shadow_methods() {
        let source = "
            class A { m() { return 1; } }
            let a = A();
            print a.m();
            a.m = \"field\";
            print a.m;
        ";
        assert_eq!(lines_of(source), vec!["1", "\"field\""]);
    }

    #[test]
    fn property_assignment_yields_the_value() {
        let source = "class A {} let a = A(); print a.x = 5; print a.x;";
        assert_eq!(lines_of(source), vec!["5", "5"]);
    }

    #[test]
    fn instances_compare_by_identity() {
        let source = "class A {} let a = A(); let b = A(); print a == b; print a == a;";
        assert_eq!(lines_of(source), vec!["false", "true"]);
    }

    #[test]
    fn static_methods_are_inherited_and_bind_the_receiver_class() {
        let source = "
            class A { static create() { return this; } }
            class B extends A {}
            print B.create() == B;
            print A.create() == A;
        ";
        assert_eq!(lines_of(source), vec!["true", "true"]);
    }

    #[test]
    fn static_super_uses_the_static_table() {
        let source = "
            class A { static id() { return \"A\"; } }
            class B extends A { static id() { return \"B\" + super.id(); } }
            print B.id();
        ";
        assert_eq!(output_of(source), "\"BA\"\n");
    }

    #[test]
    fn static_methods_are_not_instance_methods() {
        let (_, err) = runtime_failure("class A { static s() { return 1; } }\nA().s();");
        assert!(matches!(err, RuntimeError::UndefinedProperty { ref name, line: 2, .. } if name == "s"));
    }

    #[test]
    fn undefined_property() {
        let (_, err) = runtime_failure("class A {}\nprint A().missing;");
        assert!(matches!(err, RuntimeError::UndefinedProperty { ref name, .. } if name == "missing"));
    }

    #[test]
    fn undefined_super_method() {
        let (_, err) =
            runtime_failure("class A {}\nclass B extends A { m() { return super.nope(); } }\nB().m();");
        assert!(matches!(err, RuntimeError::UndefinedProperty { ref target, .. } if target == "A"));
    }

    #[test]
    fn properties_need_an_instance() {
        let (_, err) = runtime_failure("let x = 1; print x.y;");
        assert!(matches!(err, RuntimeError::InvalidPropertyTarget { .. }));

        let (_, err) = runtime_failure("let x = \"s\"; x.y = 2;");
        assert!(matches!(err, RuntimeError::InvalidPropertyTarget { .. }));

        let (_, err) = runtime_failure("class A {} A.y = 2;");
        assert!(matches!(err, RuntimeError::InvalidPropertyTarget { .. }));
    }

    #[test]
    fn property_target_errors_name_the_value() {
        let (_, err) = runtime_failure("let n = 3;\nn.x = 1;");
        assert_eq!(
            err.to_string(),
            "[line 2] Runtime error: 3 is not a class instance"
        );

        let (_, err) = runtime_failure("let s = \"text\"; s.x = 1;");
        assert!(matches!(err, RuntimeError::InvalidPropertyTarget { ref target, .. } if target == "text"));
    }

    #[test]
    fn superclass_must_be_a_class() {
        let (_, err) = runtime_failure("let NotClass = 1;\nclass B extends NotClass {}");
        assert!(matches!(
            err,
            RuntimeError::NotAClass { ref name, line: 2 } if name == "NotClass"
        ));
    }

    #[test]
    fn instances_are_not_callable() {
        let (_, err) = runtime_failure("class A {} let a = A(); a();");
        assert!(matches!(err, RuntimeError::NotCallable { ref value, .. } if value == "<A instance>"));
    }

    #[test]
    fn local_classes_close_over_their_scope() {
        let source = "
            function make(greeting) {
                class Greeter { hi(name) { return greeting + \", \" + name; } }
                return Greeter();
            }
            print make(\"hello\").hi(\"yajs\");
        ";
        assert_eq!(output_of(source), "\"hello, yajs\"\n");
    }
}
