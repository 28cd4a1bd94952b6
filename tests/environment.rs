#[cfg(test)]
mod environment_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use yajs::environment::Environment;
    use yajs::error::RuntimeError;
    use yajs::value::Value;

    fn root() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::new()))
    }

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("a", num(1.0), false, 1).unwrap();

        assert_eq!(env.get("a", 1).unwrap(), num(1.0));
    }

    #[test]
    fn define_twice_in_one_scope_fails() {
        let mut env = Environment::new();
        env.define("a", num(1.0), false, 1).unwrap();

        let err = env.define("a", num(2.0), false, 2).unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateDeclaration { ref name, line: 2 } if name == "a"));

        // Constants and mutables share one namespace per scope.
        let err = env.define("a", num(3.0), true, 3).unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateDeclaration { .. }));
        assert_eq!(env.get("a", 3).unwrap(), num(1.0));
    }

    #[test]
    fn get_searches_ancestors() {
        let globals = root();
        globals.borrow_mut().define("g", num(7.0), false, 1).unwrap();

        let middle = Environment::child_of(&globals);
        let leaf = Environment::child_of(&middle);

        assert_eq!(leaf.borrow().get("g", 1).unwrap(), num(7.0));
    }

    #[test]
    fn get_undefined_fails() {
        let leaf = Environment::child_of(&root());
        let err = leaf.borrow().get("missing", 4).unwrap_err();

        assert!(matches!(err, RuntimeError::UndefinedVariable { ref name, line: 4 } if name == "missing"));
    }

    #[test]
    fn assign_updates_nearest_binding() {
        let globals = root();
        globals.borrow_mut().define("x", num(1.0), false, 1).unwrap();
        let leaf = Environment::child_of(&globals);

        leaf.borrow_mut().assign("x", num(2.0), 1).unwrap();

        assert_eq!(globals.borrow().get("x", 1).unwrap(), num(2.0));
    }

    #[test]
    fn assign_to_shadowing_binding_leaves_outer_alone() {
        let globals = root();
        globals.borrow_mut().define("x", num(1.0), true, 1).unwrap();
        let leaf = Environment::child_of(&globals);
        leaf.borrow_mut().define("x", num(2.0), false, 2).unwrap();

        leaf.borrow_mut().assign("x", num(3.0), 3).unwrap();

        assert_eq!(leaf.borrow().get("x", 3).unwrap(), num(3.0));
        assert_eq!(globals.borrow().get("x", 3).unwrap(), num(1.0));
    }

    #[test]
    fn assign_to_constant_fails_and_keeps_value() {
        let globals = root();
        globals.borrow_mut().define("x", num(1.0), true, 1).unwrap();
        let leaf = Environment::child_of(&globals);

        let err = leaf.borrow_mut().assign("x", num(2.0), 2).unwrap_err();

        assert!(matches!(err, RuntimeError::AssignToConst { ref name, line: 2 } if name == "x"));
        assert_eq!(globals.borrow().get("x", 2).unwrap(), num(1.0));
    }

    #[test]
    fn assign_to_undeclared_fails() {
        let leaf = Environment::child_of(&root());
        let err = leaf.borrow_mut().assign("ghost", Value::Null, 5).unwrap_err();

        assert!(matches!(err, RuntimeError::UndefinedVariable { .. }));
    }

    #[test]
    fn get_at_scope_jumps_exactly() {
        let globals = root();
        globals.borrow_mut().define("a", num(1.0), false, 1).unwrap();

        let middle = Environment::child_of(&globals);
        middle.borrow_mut().define("a", num(2.0), false, 1).unwrap();

        let leaf = Environment::child_of(&middle);

        assert_eq!(Environment::get_at_scope(&leaf, 1, "a", 1).unwrap(), num(2.0));
        assert_eq!(Environment::get_at_scope(&leaf, 2, "a", 1).unwrap(), num(1.0));

        // No fallback search from the target scope.
        let err = Environment::get_at_scope(&leaf, 0, "a", 9).unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable { line: 9, .. }));
    }

    #[test]
    fn assign_at_scope_touches_only_the_target() {
        let globals = root();
        globals.borrow_mut().define("a", num(1.0), false, 1).unwrap();

        let middle = Environment::child_of(&globals);
        middle.borrow_mut().define("a", num(2.0), false, 1).unwrap();

        let leaf = Environment::child_of(&middle);

        Environment::assign_at_scope(&leaf, 2, "a", num(10.0), 1).unwrap();

        assert_eq!(globals.borrow().get("a", 1).unwrap(), num(10.0));
        assert_eq!(middle.borrow().get("a", 1).unwrap(), num(2.0));
    }

    #[test]
    fn assign_at_scope_respects_constants() {
        let globals = root();
        globals.borrow_mut().define("k", num(1.0), true, 1).unwrap();
        let leaf = Environment::child_of(&globals);

        let err = Environment::assign_at_scope(&leaf, 1, "k", num(2.0), 3).unwrap_err();
        assert!(matches!(err, RuntimeError::AssignToConst { .. }));
    }

    #[test]
    fn ancestor_past_the_root_is_none() {
        let globals = root();
        let leaf = Environment::child_of(&globals);

        assert!(Environment::ancestor(&leaf, 0).is_some_and(|e| Rc::ptr_eq(&e, &leaf)));
        assert!(Environment::ancestor(&leaf, 1).is_some_and(|e| Rc::ptr_eq(&e, &globals)));
        assert!(Environment::ancestor(&leaf, 2).is_none());
    }

    #[test]
    fn enclosing_link_points_at_parent() {
        let globals = root();
        let leaf = Environment::child_of(&globals);

        let borrowed = leaf.borrow();
        let parent = borrowed.enclosing().expect("child has a parent");
        assert!(Rc::ptr_eq(parent, &globals));
        assert!(globals.borrow().enclosing().is_none());
    }
}
