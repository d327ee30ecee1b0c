//! Edge case tests for ternc-sem

#[cfg(test)]
mod tests {
    use crate::compat::{match_types, optional_chain_return};
    use crate::context::Context;
    use crate::decl::DeclaredType;
    use crate::error::SemErrorKind;
    use crate::generics::{extract_generics, GenericBinding};
    use crate::resolve::resolve;
    use crate::types::{
        dealias, BasicKind, DataType, GenericDecl, InterfaceMethod, StructField, Ty, TypeKind,
        VariantParameter,
    };
    use std::rc::Rc;
    use ternc_util::{Handler, Span, Symbol};

    fn sp() -> Span {
        Span::DUMMY
    }

    fn root() -> Context {
        Context::new("main", Rc::new(Handler::new()))
    }

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    fn basic(kind: BasicKind) -> Ty {
        DataType::basic(kind, sp())
    }

    // ==================== NUMERIC WIDENING ====================

    /// EDGE CASE: the four canonical widening probes.
    #[test]
    fn test_edge_numeric_widening_scenarios() {
        let ctx = root();
        assert!(match_types(&ctx, &basic(BasicKind::U64), &basic(BasicKind::U8), false).is_ok());
        assert!(match_types(&ctx, &basic(BasicKind::U8), &basic(BasicKind::U64), false).is_err());
        assert!(match_types(&ctx, &basic(BasicKind::I32), &basic(BasicKind::U16), false).is_ok());
        assert!(match_types(&ctx, &basic(BasicKind::I32), &basic(BasicKind::U32), false).is_err());
    }

    /// EDGE CASE: same-width signed/unsigned never widen into each other.
    #[test]
    fn test_edge_same_width_cross_family() {
        let ctx = root();
        assert!(match_types(&ctx, &basic(BasicKind::I8), &basic(BasicKind::U8), false).is_err());
        assert!(match_types(&ctx, &basic(BasicKind::U8), &basic(BasicKind::I8), false).is_err());
    }

    // ==================== INTERFACE WIDTH SUBTYPING ====================

    /// EDGE CASE: expected interface with fewer methods accepts a wider
    /// actual non-strictly, rejects it strictly.
    #[test]
    fn test_edge_interface_width_scenario() {
        let ctx = root();
        let narrow = DataType::interface(
            vec![InterfaceMethod::new(sym("f"), vec![], DataType::void(sp()))],
            vec![],
            sp(),
        );
        let wide = DataType::interface(
            vec![
                InterfaceMethod::new(sym("f"), vec![], DataType::void(sp())),
                InterfaceMethod::new(
                    sym("g"),
                    vec![crate::types::FunctionArgument::new(
                        sym("x"),
                        basic(BasicKind::U32),
                    )],
                    basic(BasicKind::U32),
                ),
            ],
            vec![],
            sp(),
        );
        assert!(match_types(&ctx, &narrow, &wide, false).is_ok());
        assert!(match_types(&ctx, &narrow, &wide, true).is_err());
    }

    // ==================== GENERIC INSTANTIATION CACHE ====================

    /// EDGE CASE: Vec<T> resolved twice shares one cached body, observed
    /// through pointer equality.
    #[test]
    fn test_edge_generic_cache_pointer_equality() {
        let ctx = root();
        ctx.declare_type(DeclaredType::new(
            sym("VecE"),
            sp(),
            vec![GenericDecl::new(sym("T"))],
            DataType::struct_type(
                vec![StructField {
                    name: sym("items"),
                    ty: DataType::array(DataType::reference(vec![sym("T")], vec![], sp()), sp()),
                }],
                sp(),
            ),
        ));

        let first = DataType::reference(vec![sym("VecE")], vec![basic(BasicKind::U32)], sp());
        let second = DataType::reference(vec![sym("VecE")], vec![basic(BasicKind::U32)], sp());
        resolve(&ctx, &first).unwrap();
        resolve(&ctx, &second).unwrap();
        assert!(Rc::ptr_eq(&dealias(&first), &dealias(&second)));
    }

    // ==================== VARIANT CONSTRUCTOR MATCHING ====================

    /// EDGE CASE: Tree<u32>'s Node constructor subsumes into Tree<u32>.
    #[test]
    fn test_edge_tree_constructor_subsumption() {
        let ctx = root();
        let leaf = DataType::variant_constructor(sym("Leaf"), vec![], sp());
        let node = DataType::variant_constructor(
            sym("Node"),
            vec![
                VariantParameter {
                    name: sym("l"),
                    ty: DataType::reference(vec![sym("TreeE")], vec![
                        DataType::reference(vec![sym("T")], vec![], sp()),
                    ], sp()),
                },
                VariantParameter {
                    name: sym("r"),
                    ty: DataType::reference(vec![sym("TreeE")], vec![
                        DataType::reference(vec![sym("T")], vec![], sp()),
                    ], sp()),
                },
            ],
            sp(),
        );
        ctx.declare_type(DeclaredType::new(
            sym("TreeE"),
            sp(),
            vec![GenericDecl::new(sym("T"))],
            DataType::variant(vec![leaf, node], sp()),
        ));

        let tree = DataType::reference(vec![sym("TreeE")], vec![basic(BasicKind::U32)], sp());
        let node_ctor = DataType::reference(
            vec![sym("TreeE"), sym("Node")],
            vec![basic(BasicKind::U32)],
            sp(),
        );
        resolve(&ctx, &tree).unwrap();
        resolve(&ctx, &node_ctor).unwrap();

        assert!(match_types(&ctx, &tree, &node_ctor, false).is_ok());
        // The reverse direction never holds.
        assert!(match_types(&ctx, &node_ctor, &tree, false).is_err());
    }

    // ==================== JOIN FLATTENING ====================

    /// EDGE CASE: nested joins flatten to {f, g, h}; a duplicate
    /// signature across operands is an overload collision.
    #[test]
    fn test_edge_join_flattening_scenario() {
        let ctx = root();
        let join = DataType::join(
            DataType::interface(
                vec![InterfaceMethod::new(sym("f"), vec![], DataType::void(sp()))],
                vec![],
                sp(),
            ),
            DataType::join(
                DataType::interface(
                    vec![InterfaceMethod::new(sym("g"), vec![], DataType::void(sp()))],
                    vec![],
                    sp(),
                ),
                DataType::interface(
                    vec![InterfaceMethod::new(sym("h"), vec![], DataType::void(sp()))],
                    vec![],
                    sp(),
                ),
                sp(),
            ),
            sp(),
        );
        resolve(&ctx, &join).unwrap();
        let TypeKind::Join(j) = &join.kind else { panic!() };
        let flat = j.flattened().unwrap();
        let TypeKind::Interface(i) = &flat.kind else { panic!() };
        assert_eq!(i.methods.len(), 3);

        // A join behaves as its flat interface in matching.
        let wants_f = DataType::interface(
            vec![InterfaceMethod::new(sym("f"), vec![], DataType::void(sp()))],
            vec![],
            sp(),
        );
        assert!(match_types(&ctx, &wants_f, &join, false).is_ok());
    }

    /// EDGE CASE: identical signatures for one name across operands.
    #[test]
    fn test_edge_join_duplicate_across_operands() {
        let ctx = root();
        let join = DataType::join(
            DataType::interface(
                vec![InterfaceMethod::new(sym("dup"), vec![], DataType::void(sp()))],
                vec![],
                sp(),
            ),
            DataType::interface(
                vec![InterfaceMethod::new(sym("dup"), vec![], DataType::void(sp()))],
                vec![],
                sp(),
            ),
            sp(),
        );
        let err = resolve(&ctx, &join).unwrap_err();
        assert!(matches!(err.kind, SemErrorKind::DuplicateOverload { .. }));
    }

    // ==================== NULLABLE CALL POLICY ====================

    /// EDGE CASE: `x?.m()` result policy — void passes, a bare scalar
    /// return is rejected, a reference-shaped return passes.
    #[test]
    fn test_edge_optional_call_policy() {
        let ctx = root();
        assert!(optional_chain_return(&ctx, &DataType::void(sp()), sp()).is_ok());

        let err = optional_chain_return(&ctx, &basic(BasicKind::U32), sp()).unwrap_err();
        assert!(matches!(err.kind, SemErrorKind::NullabilityViolation { .. }));

        let iface = DataType::interface(vec![], vec![], sp());
        assert!(optional_chain_return(&ctx, &iface, sp()).is_ok());
    }

    // ==================== RESOLUTION & CYCLES ====================

    /// EDGE CASE: resolving and matching a self-referential struct
    /// completes in bounded time.
    #[test]
    fn test_edge_cycle_termination() {
        let ctx = root();
        let body = DataType::struct_type(
            vec![StructField {
                name: sym("next"),
                ty: DataType::nullable(
                    DataType::reference(vec![sym("LinkE")], vec![], sp()),
                    sp(),
                ),
            }],
            sp(),
        );
        ctx.declare_type(DeclaredType::new(sym("LinkE"), sp(), vec![], body.clone()));

        let reference = DataType::reference(vec![sym("LinkE")], vec![], sp());
        resolve(&ctx, &reference).unwrap();
        assert!(match_types(&ctx, &reference, &reference, true).is_ok());
    }

    /// EDGE CASE: a generic self-referential variant instantiates
    /// without recursing forever.
    #[test]
    fn test_edge_recursive_generic_variant() {
        let ctx = root();
        let nil = DataType::variant_constructor(sym("Nil"), vec![], sp());
        let cons = DataType::variant_constructor(
            sym("Cons"),
            vec![
                VariantParameter {
                    name: sym("head"),
                    ty: DataType::reference(vec![sym("T")], vec![], sp()),
                },
                VariantParameter {
                    name: sym("tail"),
                    ty: DataType::nullable(
                        DataType::reference(
                            vec![sym("ListE")],
                            vec![DataType::reference(vec![sym("T")], vec![], sp())],
                            sp(),
                        ),
                        sp(),
                    ),
                },
            ],
            sp(),
        );
        ctx.declare_type(DeclaredType::new(
            sym("ListE"),
            sp(),
            vec![GenericDecl::new(sym("T"))],
            DataType::variant(vec![nil, cons], sp()),
        ));

        let list = DataType::reference(vec![sym("ListE")], vec![basic(BasicKind::U8)], sp());
        resolve(&ctx, &list).unwrap();

        let body = dealias(&list);
        let TypeKind::Variant(v) = &body.kind else { panic!() };
        assert_eq!(v.constructors.len(), 2);
    }

    /// EDGE CASE: resolve is idempotent across repeated calls and the
    /// hash stays stable.
    #[test]
    fn test_edge_resolution_idempotence() {
        let ctx = root();
        let t = DataType::struct_type(
            vec![StructField {
                name: sym("x"),
                ty: basic(BasicKind::U8),
            }],
            sp(),
        );
        resolve(&ctx, &t).unwrap();
        let h = t.structural_hash();
        resolve(&ctx, &t).unwrap();
        resolve(&ctx, &t).unwrap();
        assert_eq!(t.structural_hash(), h);
    }

    // ==================== CLONE / SUBSTITUTE ====================

    /// EDGE CASE: clone with the empty substitution preserves the hash;
    /// clone with {T -> u32} replaces exactly the T references.
    #[test]
    fn test_edge_clone_substitute_round_trip() {
        let empty = crate::types::substitute::Substitution::default();
        let t = DataType::tuple(
            vec![
                DataType::reference(vec![sym("T")], vec![], sp()),
                DataType::reference(vec![sym("Keep")], vec![], sp()),
            ],
            sp(),
        );
        assert_eq!(
            t.clone_with(&empty).structural_hash(),
            t.structural_hash()
        );

        let mut subst = crate::types::substitute::Substitution::default();
        subst.insert(sym("T"), basic(BasicKind::U32));
        let swapped = t.clone_with(&subst);
        assert_eq!(swapped.serialize(false), "tuple<u32,ref(Keep)>");
    }

    // ==================== GENERIC EXTRACTION ====================

    /// EDGE CASE: extraction through a nested generic structure agrees
    /// with substitution.
    #[test]
    fn test_edge_extraction_soundness() {
        let ctx = root();
        let declared = vec![GenericDecl::new(sym("T"))];
        let pattern = DataType::array(
            DataType::tuple(
                vec![
                    DataType::reference(vec![sym("T")], vec![], sp()),
                    basic(BasicKind::U8),
                ],
                sp(),
            ),
            sp(),
        );
        let concrete = DataType::array(
            DataType::tuple(vec![DataType::bool_type(sp()), basic(BasicKind::U8)], sp()),
            sp(),
        );
        let mut out = GenericBinding::default();
        extract_generics(&ctx, &pattern, &concrete, &declared, &mut out).unwrap();
        let rebuilt = pattern.clone_with(&out);
        assert_eq!(rebuilt.structural_hash(), concrete.structural_hash());
    }

    // ==================== MEMOIZATION ====================

    /// EDGE CASE: the memo never changes an answer, only its latency.
    #[test]
    fn test_edge_memo_stability() {
        let ctx = root();
        let e = basic(BasicKind::U64);
        let a = basic(BasicKind::U8);
        let first = match_types(&ctx, &e, &a, false);
        let second = match_types(&ctx, &e, &a, false);
        assert_eq!(first, second);

        let bad = match_types(&ctx, &a, &e, false);
        let bad_again = match_types(&ctx, &a, &e, false);
        assert_eq!(bad, bad_again);
    }

    // ==================== STRICTNESS KEYING ====================

    /// EDGE CASE: strict and non-strict results for the same pair are
    /// memoized independently.
    #[test]
    fn test_edge_strictness_keys_memo_independently() {
        let ctx = root();
        let e = basic(BasicKind::U64);
        let a = basic(BasicKind::U8);
        assert!(match_types(&ctx, &e, &a, false).is_ok());
        assert!(match_types(&ctx, &e, &a, true).is_err());
        // Re-query both; the answers must not bleed into each other.
        assert!(match_types(&ctx, &e, &a, false).is_ok());
        assert!(match_types(&ctx, &e, &a, true).is_err());
    }
}
