//! Type resolution: invariant validation and reference binding.
//!
//! `resolve` walks a type bottom-up, validates the per-kind invariants,
//! and binds every [`crate::types::ReferenceType`] to the instantiated
//! body of the declaration it names. Resolution is idempotent and
//! recursion-guarded: re-entering a type already on the resolve stack
//! returns early, which is what lets self-referential declarations
//! (`struct Node { next: Node? }`, mutually recursive classes, linked
//! variants) terminate.
//!
//! Generic declarations cache their instantiations per argument
//! signature on the declaration itself, so two uses of `Vec<u32>` share
//! one body.

use ternc_util::{field_id, Span, Symbol};

use crate::compat::{match_types, params_identical};
use crate::context::Context;
use crate::decl::{DeclaredType, SymbolEntry};
use crate::error::{SemErrorKind, SemResult};
use crate::guards;
use crate::types::substitute::Substitution;
use crate::types::{
    dealias, allowed_nullable, DataType, InterfaceMethod, ReferenceType, Ty, TypeKind,
};

/// Resolve a type in place.
///
/// Idempotent: the second call on a resolved type is a no-op. A type
/// currently being resolved further up the stack is treated as in
/// progress and returns `Ok` to break the cycle.
pub fn resolve(ctx: &Context, ty: &Ty) -> SemResult<()> {
    if ty.is_resolved() {
        return Ok(());
    }
    let _guard = match guards::enter_resolve(ty.structural_hash()) {
        Some(guard) => guard,
        None => return Ok(()),
    };
    resolve_kind(ctx, ty)?;
    ty.mark_resolved();
    Ok(())
}

/// Bind a reference to its declaration's raw body without instantiating
/// generics. Used by the generic extractor; the binding is completed by
/// a later full `resolve`.
pub(crate) fn resolve_partial(ctx: &Context, ty: &Ty) -> SemResult<()> {
    let TypeKind::Reference(r) = &ty.kind else {
        return Ok(());
    };
    let _guard = match guards::enter_resolve(ty.structural_hash()) {
        Some(guard) => guard,
        None => return Ok(()),
    };
    resolve_reference(ctx, ty, r, RefMode::Partial)
}

fn resolve_kind(ctx: &Context, ty: &Ty) -> SemResult<()> {
    match &ty.kind {
        TypeKind::Basic(_)
        | TypeKind::LiteralInt(_)
        | TypeKind::Bool
        | TypeKind::Null
        | TypeKind::Void
        | TypeKind::Unreachable
        | TypeKind::StringEnum(_)
        | TypeKind::Namespace(_)
        | TypeKind::FfiNamespace(_) => Ok(()),

        TypeKind::Unset => Err(ctx.raise(
            SemErrorKind::CyclicOrUnset {
                detail: "unset type reached resolution before inference filled it in".to_string(),
            },
            ty.span,
        )),

        TypeKind::Generic(g) => Err(ctx.raise(
            SemErrorKind::UnresolvedGeneric {
                name: g.name.as_str().to_string(),
            },
            ty.span,
        )),

        TypeKind::Array(a) => resolve(ctx, &a.element),

        TypeKind::Tuple(t) => {
            if t.elements.len() < 2 {
                return Err(ctx.raise(
                    SemErrorKind::ShapeMismatch {
                        detail: format!(
                            "tuple requires at least 2 elements, got {}",
                            t.elements.len()
                        ),
                    },
                    ty.span,
                ));
            }
            for element in &t.elements {
                resolve(ctx, element)?;
            }
            Ok(())
        }

        TypeKind::Struct(s) => {
            for (i, field) in s.fields.iter().enumerate() {
                if s.fields[..i].iter().any(|f| f.name == field.name) {
                    return Err(ctx.raise(
                        SemErrorKind::ShapeMismatch {
                            detail: format!("duplicate struct field `{}`", field.name),
                        },
                        ty.span,
                    ));
                }
                field_id(field.name);
                resolve(ctx, &field.ty)?;
            }
            Ok(())
        }

        TypeKind::PartialStruct(p) => {
            resolve(ctx, &p.inner)?;
            let target = dealias(&p.inner);
            match &target.kind {
                TypeKind::Struct(_) => Ok(()),
                // A reference still in flight resolves later.
                TypeKind::Reference(r) if r.base().is_none() => Ok(()),
                _ => Err(ctx.raise(
                    SemErrorKind::ShapeMismatch {
                        detail: format!(
                            "partial view requires a struct, got `{}`",
                            p.inner.shortname()
                        ),
                    },
                    ty.span,
                )),
            }
        }

        TypeKind::Enum(e) => {
            if !e.repr.is_integer() {
                return Err(ctx.raise(
                    SemErrorKind::ShapeMismatch {
                        detail: format!("enum representation `{}` is not an integer", e.repr.name()),
                    },
                    ty.span,
                ));
            }
            for (i, field) in e.fields.iter().enumerate() {
                if e.fields[..i].iter().any(|f| f.name == field.name) {
                    return Err(ctx.raise(
                        SemErrorKind::ShapeMismatch {
                            detail: format!("duplicate enum member `{}`", field.name),
                        },
                        ty.span,
                    ));
                }
            }
            Ok(())
        }

        TypeKind::Class(c) => {
            for (i, attr) in c.attributes.iter().enumerate() {
                if c.attributes[..i].iter().any(|a| a.name == attr.name) {
                    return Err(ctx.raise(
                        SemErrorKind::ShapeMismatch {
                            detail: format!("duplicate class attribute `{}`", attr.name),
                        },
                        ty.span,
                    ));
                }
                field_id(attr.name);
                resolve(ctx, &attr.ty)?;
            }
            validate_methods(ctx, &c.methods, ty.span)?;
            for sup in &c.supers {
                resolve(ctx, sup)?;
                require_interface_operand(ctx, sup, "class supertype", ty.span)?;
            }
            Ok(())
        }

        TypeKind::Interface(i) => {
            for method in &i.methods {
                if !method.generics.is_empty() {
                    return Err(ctx.raise(
                        SemErrorKind::ShapeMismatch {
                            detail: format!("interface method `{}` cannot be generic", method.name),
                        },
                        ty.span,
                    ));
                }
            }
            validate_methods(ctx, &i.methods, ty.span)?;
            for sup in &i.supers {
                resolve(ctx, sup)?;
                require_interface_operand(ctx, sup, "interface supertype", ty.span)?;
            }
            Ok(())
        }

        TypeKind::Join(j) => resolve_join(ctx, ty),

        TypeKind::Variant(v) => {
            DataType::rewire_constructors(ty);
            for (i, ctor) in v.constructors.iter().enumerate() {
                let TypeKind::VariantConstructor(vc) = &ctor.kind else {
                    return Err(ctx.raise(
                        SemErrorKind::ShapeMismatch {
                            detail: "variant case is not a constructor".to_string(),
                        },
                        ty.span,
                    ));
                };
                let duplicate = v.constructors[..i].iter().any(|other| match &other.kind {
                    TypeKind::VariantConstructor(o) => o.name == vc.name,
                    _ => false,
                });
                if duplicate {
                    return Err(ctx.raise(
                        SemErrorKind::ShapeMismatch {
                            detail: format!("duplicate variant constructor `{}`", vc.name),
                        },
                        ty.span,
                    ));
                }
                for param in &vc.params {
                    field_id(param.name);
                    resolve(ctx, &param.ty)?;
                }
            }
            Ok(())
        }

        TypeKind::VariantConstructor(vc) => {
            for param in &vc.params {
                field_id(param.name);
                resolve(ctx, &param.ty)?;
            }
            Ok(())
        }

        TypeKind::Function(f) => {
            for param in &f.params {
                resolve(ctx, &param.ty)?;
            }
            // An unset return is the inference sink; it resolves once
            // the body's type is known.
            if !matches!(f.ret.kind, TypeKind::Unset) {
                resolve(ctx, &f.ret)?;
            }
            Ok(())
        }

        TypeKind::Coroutine(c) => {
            let target = dealias(&c.fn_type);
            match &target.kind {
                TypeKind::Function(f) if f.is_coroutine => resolve(ctx, &c.fn_type),
                _ => Err(ctx.raise(
                    SemErrorKind::ShapeMismatch {
                        detail: format!(
                            "coroutine requires a coroutine function type, got `{}`",
                            c.fn_type.shortname()
                        ),
                    },
                    ty.span,
                )),
            }
        }

        TypeKind::Nullable(n) => {
            if matches!(dealias(&n.inner).kind, TypeKind::Nullable(_)) {
                return Err(ctx.raise(
                    SemErrorKind::NullabilityViolation {
                        detail: "type is already nullable".to_string(),
                    },
                    ty.span,
                ));
            }
            resolve(ctx, &n.inner)?;
            if !nullable_admissible(&n.inner) {
                return Err(ctx.raise(
                    SemErrorKind::NullabilityViolation {
                        detail: format!("type `{}` cannot be nullable", n.inner.shortname()),
                    },
                    ty.span,
                ));
            }
            Ok(())
        }

        TypeKind::Reference(r) => resolve_reference(ctx, ty, r, RefMode::Full),

        TypeKind::Union(u) => {
            for member in &u.members {
                resolve(ctx, member)?;
            }
            Ok(())
        }

        TypeKind::Lock(l) => {
            if matches!(l.ret.kind, TypeKind::Unset) {
                return Err(ctx.raise(
                    SemErrorKind::CyclicOrUnset {
                        detail: "lock over an unset return type".to_string(),
                    },
                    ty.span,
                ));
            }
            resolve(ctx, &l.ret)
        }

        TypeKind::FfiMethod(m) => {
            for param in &m.method.params {
                resolve(ctx, &param.ty)?;
            }
            resolve(ctx, &m.method.ret)
        }

        TypeKind::MetaClass(m) => {
            for arg in &m.type_args {
                resolve(ctx, arg)?;
            }
            resolve(ctx, &m.class)
        }
        TypeKind::MetaInterface(m) => resolve(ctx, &m.interface),
        TypeKind::MetaVariant(m) => {
            for arg in &m.type_args {
                resolve(ctx, arg)?;
            }
            resolve(ctx, &m.variant)
        }
        TypeKind::MetaVariantConstructor(m) => {
            for arg in &m.type_args {
                resolve(ctx, arg)?;
            }
            resolve(ctx, &m.constructor)
        }
        TypeKind::MetaEnum(m) => resolve(ctx, &m.enum_type),
    }
}

/// Nullable admissibility, conservative for references still in flight.
fn nullable_admissible(inner: &Ty) -> bool {
    let target = dealias(inner);
    if let TypeKind::Reference(r) = &target.kind {
        if r.base().is_none() {
            return true;
        }
    }
    allowed_nullable(inner)
}

/// Arity rules for operator-named methods.
enum OperatorArity {
    Exact(usize),
    AtLeast(usize),
}

fn operator_arity(name: &str) -> Option<OperatorArity> {
    match name {
        "__add__" | "__sub__" | "__mul__" | "__div__" | "__mod__" | "__lshift__"
        | "__rshift__" | "__band__" | "__bor__" | "__bxor__" | "__eq__" | "__neq__" | "__lt__"
        | "__le__" | "__gt__" | "__ge__" => Some(OperatorArity::Exact(1)),
        "__neg__" | "__not__" | "__bnot__" | "__inc__" | "__dec__" => Some(OperatorArity::Exact(0)),
        "__index__" => Some(OperatorArity::AtLeast(1)),
        "__index_set__" => Some(OperatorArity::AtLeast(2)),
        _ => None,
    }
}

/// Resolve method signatures, enforce operator arities, reject duplicate
/// overloads, and assign method UIDs.
fn validate_methods(
    ctx: &Context,
    methods: &[std::rc::Rc<InterfaceMethod>],
    span: Span,
) -> SemResult<()> {
    for method in methods {
        for param in &method.params {
            resolve(ctx, &param.ty)?;
        }
        if !matches!(method.ret.kind, TypeKind::Unset) {
            resolve(ctx, &method.ret)?;
        }
        match operator_arity(method.name.as_str()) {
            Some(OperatorArity::Exact(n)) if method.params.len() != n => {
                return Err(ctx.raise(
                    SemErrorKind::OperatorShapeViolation {
                        name: method.name.as_str().to_string(),
                        expected: format!("exactly {}", n),
                        found: method.params.len(),
                    },
                    span,
                ));
            }
            Some(OperatorArity::AtLeast(n)) if method.params.len() < n => {
                return Err(ctx.raise(
                    SemErrorKind::OperatorShapeViolation {
                        name: method.name.as_str().to_string(),
                        expected: format!("at least {}", n),
                        found: method.params.len(),
                    },
                    span,
                ));
            }
            _ => {}
        }
    }
    for (i, a) in methods.iter().enumerate() {
        for b in &methods[i + 1..] {
            if a.name == b.name
                && a.is_static == b.is_static
                && params_identical(ctx, &a.params, &b.params)
            {
                return Err(ctx.raise(
                    SemErrorKind::DuplicateOverload {
                        name: a.name.as_str().to_string(),
                    },
                    span,
                ));
            }
        }
    }
    for method in methods {
        method.uid();
    }
    Ok(())
}

fn require_interface_operand(ctx: &Context, side: &Ty, role: &str, span: Span) -> SemResult<()> {
    let target = dealias(side);
    match &target.kind {
        TypeKind::Interface(_) | TypeKind::Join(_) => Ok(()),
        TypeKind::Reference(r) if r.base().is_none() => Ok(()),
        _ => Err(ctx.raise(
            SemErrorKind::ShapeMismatch {
                detail: format!("{} `{}` is not an interface", role, side.shortname()),
            },
            span,
        )),
    }
}

fn resolve_join(ctx: &Context, ty: &Ty) -> SemResult<()> {
    let TypeKind::Join(j) = &ty.kind else {
        unreachable!("resolve_join on non-join");
    };
    resolve(ctx, &j.left)?;
    resolve(ctx, &j.right)?;
    require_interface_operand(ctx, &j.left, "join operand", ty.span)?;
    require_interface_operand(ctx, &j.right, "join operand", ty.span)?;

    let mut methods = Vec::new();
    collect_join_methods(&j.left, &mut methods);
    collect_join_methods(&j.right, &mut methods);

    for (i, a) in methods.iter().enumerate() {
        for b in &methods[i + 1..] {
            if a.name == b.name
                && a.is_static == b.is_static
                && params_identical(ctx, &a.params, &b.params)
            {
                return Err(ctx.raise(
                    SemErrorKind::DuplicateOverload {
                        name: a.name.as_str().to_string(),
                    },
                    ty.span,
                ));
            }
        }
    }

    let flat = DataType::interface(methods, Vec::new(), ty.span);
    flat.mark_resolved();
    *j.flat.borrow_mut() = Some(flat);
    Ok(())
}

fn collect_join_methods(side: &Ty, out: &mut Vec<std::rc::Rc<InterfaceMethod>>) {
    let target = dealias(side);
    match &target.kind {
        TypeKind::Interface(i) => out.extend(i.methods.iter().cloned()),
        TypeKind::Join(j) => match j.flattened() {
            Some(flat) => collect_join_methods(&flat, out),
            None => {
                collect_join_methods(&j.left, out);
                collect_join_methods(&j.right, out);
            }
        },
        _ => {}
    }
}

/// Reference resolution mode: full instantiates generics and fills the
/// declaration cache; partial binds the raw body for the extractor.
#[derive(Clone, Copy)]
enum RefMode {
    Full,
    Partial,
}

fn resolve_reference(ctx: &Context, ty: &Ty, r: &ReferenceType, mode: RefMode) -> SemResult<()> {
    if r.base().is_some() {
        match mode {
            RefMode::Partial => return Ok(()),
            RefMode::Full => {
                if !r.is_partial() {
                    return Ok(());
                }
                // Complete a partial binding below.
            }
        }
    }

    let Some(&first) = r.path.first() else {
        return Err(ctx.raise(
            SemErrorKind::ShapeMismatch {
                detail: "reference with an empty path".to_string(),
            },
            ty.span,
        ));
    };

    // Lookup happens in the usage context when it belongs to the ambient
    // package; cross-package references go through the ambient context.
    let lookup_ctx = match r.usage_context() {
        Some(usage) if usage.package() == ctx.package() => usage,
        _ => ctx.clone(),
    };

    let mut entry = lookup_ctx.lookup(first).ok_or_else(|| {
        ctx.raise(
            SemErrorKind::UnknownName {
                name: first.as_str().to_string(),
            },
            ty.span,
        )
    })?;

    // Namespace unwrap: shift segments until a declared type appears.
    let mut consumed = 1;
    loop {
        match &entry {
            SymbolEntry::Namespace(ns) => {
                if consumed >= r.path.len() {
                    return Err(ctx.raise(
                        SemErrorKind::NotADeclaredType {
                            name: r.path_string(),
                        },
                        ty.span,
                    ));
                }
                let segment = r.path[consumed];
                let next = ns.ctx.lookup(segment).ok_or_else(|| {
                    ctx.raise(
                        SemErrorKind::UnknownName {
                            name: segment.as_str().to_string(),
                        },
                        ty.span,
                    )
                })?;
                entry = next;
                consumed += 1;
            }
            _ => break,
        }
    }

    let decl = match entry {
        SymbolEntry::Type(decl) => decl,
        other => {
            return Err(ctx.raise(
                SemErrorKind::NotADeclaredType {
                    name: other.name().as_str().to_string(),
                },
                ty.span,
            ))
        }
    };
    *r.base_decl.borrow_mut() = Some(decl.clone());

    let selector = &r.path[consumed..];
    if selector.len() > 1 {
        return Err(ctx.raise(
            SemErrorKind::ShapeMismatch {
                detail: format!("path `{}` navigates past a constructor", r.path_string()),
            },
            ty.span,
        ));
    }

    if r.type_args.len() != decl.generic_params.len() {
        return Err(ctx.raise(
            SemErrorKind::TypeArgumentArityMismatch {
                name: decl.name.as_str().to_string(),
                expected: decl.generic_params.len(),
                found: r.type_args.len(),
            },
            ty.span,
        ));
    }

    let body = if !decl.is_generic() {
        let body = decl.body.clone();
        if matches!(mode, RefMode::Full) {
            resolve(ctx, &body)?;
            decl.cache_insert(String::new(), body.clone());
        }
        body
    } else {
        match mode {
            RefMode::Partial => decl.body.clone(),
            RefMode::Full => instantiate(ctx, ty, r, &decl)?,
        }
    };

    let bound = match selector.first() {
        Some(&ctor_name) => select_constructor(ctx, ty, &decl, &body, ctor_name)?,
        None => body,
    };

    match mode {
        RefMode::Full => {
            r.partial.set(false);
            bound.set_original(ty.clone());
        }
        RefMode::Partial => r.partial.set(true),
    }
    *r.base.borrow_mut() = Some(bound);
    Ok(())
}

/// Instantiate a generic declaration for the reference's arguments,
/// consulting and filling the per-declaration cache.
fn instantiate(
    ctx: &Context,
    ty: &Ty,
    r: &ReferenceType,
    decl: &std::rc::Rc<DeclaredType>,
) -> SemResult<Ty> {
    for (param, arg) in decl.generic_params.iter().zip(&r.type_args) {
        resolve(ctx, arg)?;
        if let Some(constraint) = &param.constraint {
            check_constraint(ctx, constraint, arg, param.name, ty.span)?;
        }
    }

    let signature = DeclaredType::signature_of(&r.type_args);
    if let Some(cached) = decl.cached(&signature) {
        return Ok(cached);
    }

    let mut subst = Substitution::default();
    for (param, arg) in decl.generic_params.iter().zip(&r.type_args) {
        subst.insert(param.name, arg.clone());
    }
    let instance = decl.body.clone_with(&subst);
    // Cache before resolving so a self-referential instantiation finds
    // itself instead of recursing.
    decl.cache_insert(signature, instance.clone());
    resolve(ctx, &instance)?;
    Ok(instance)
}

/// A constraint is either a union of acceptable shapes or a single type
/// the argument must be assignable to.
fn check_constraint(
    ctx: &Context,
    constraint: &Ty,
    arg: &Ty,
    param: Symbol,
    span: Span,
) -> SemResult<()> {
    let satisfied = match &dealias(constraint).kind {
        TypeKind::Union(u) => u
            .members
            .iter()
            .any(|member| match_types(ctx, member, arg, false).is_ok()),
        _ => match_types(ctx, constraint, arg, false).is_ok(),
    };
    if satisfied {
        Ok(())
    } else {
        Err(ctx.raise(
            SemErrorKind::ShapeMismatch {
                detail: format!(
                    "type argument `{}` does not satisfy the constraint on `{}`",
                    arg.shortname(),
                    param
                ),
            },
            span,
        ))
    }
}

fn select_constructor(
    ctx: &Context,
    ty: &Ty,
    decl: &std::rc::Rc<DeclaredType>,
    body: &Ty,
    ctor_name: Symbol,
) -> SemResult<Ty> {
    let target = dealias(body);
    match &target.kind {
        TypeKind::Variant(v) => v.constructor(ctor_name).ok_or_else(|| {
            ctx.raise(
                SemErrorKind::VariantConstructorNotFound {
                    name: ctor_name.as_str().to_string(),
                },
                ty.span,
            )
        }),
        _ => Err(ctx.raise(
            SemErrorKind::ShapeMismatch {
                detail: format!(
                    "`{}` is not a variant; cannot select constructor `{}`",
                    decl.name, ctor_name
                ),
            },
            ty.span,
        )),
    }
}
