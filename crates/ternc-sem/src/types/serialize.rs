//! Canonical structural serialization and the 32-bit content hash.
//!
//! `serialize(false)` renders a reference as its path and is the basis
//! of structural identity: `structural_hash` is an `FxHasher` digest of
//! that text, folded to 32 bits and memoized on the type. `serialize
//! (true)` inlines resolved reference bases instead, which cache keys
//! never use but debugging output does.
//!
//! Function parameter *names* are excluded everywhere: two function
//! types that differ only in parameter naming are the same type. Field
//! names, enum values and constructor names are included because they
//! participate in matching.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use super::{DataType, FunctionArgument, InterfaceMethod, TypeKind};

fn serialize_args(params: &[FunctionArgument], unpack: bool) -> String {
    params
        .iter()
        .map(|p| {
            if p.is_mut {
                format!("mut {}", p.ty.serialize(unpack))
            } else {
                p.ty.serialize(unpack)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

impl InterfaceMethod {
    /// Canonical signature text; the method-UID registry keys on this.
    pub fn serialize_signature(&self) -> String {
        let mut out = String::new();
        if self.is_static {
            out.push_str("static ");
        }
        out.push_str(self.name.as_str());
        if !self.generics.is_empty() {
            out.push('<');
            let names = self
                .generics
                .iter()
                .map(|g| g.name.as_str())
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&names);
            out.push('>');
        }
        out.push('(');
        out.push_str(&serialize_args(&self.params, false));
        out.push_str(")->");
        out.push_str(&self.ret.serialize(false));
        out
    }
}

impl DataType {
    /// Canonical structural text of this type.
    ///
    /// With `unpack` a resolved reference inlines its base; without, it
    /// emits its path and type arguments. Identity uses `unpack = false`.
    pub fn serialize(&self, unpack: bool) -> String {
        match &self.kind {
            TypeKind::Basic(k) => k.name().to_string(),
            TypeKind::LiteralInt(_) => "lit_int".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Null => "null".to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::Unreachable => "unreachable".to_string(),
            TypeKind::Unset => "unset".to_string(),
            TypeKind::Array(a) => format!("array<{}>", a.element.serialize(unpack)),
            TypeKind::Tuple(t) => {
                let elems = t
                    .elements
                    .iter()
                    .map(|e| e.serialize(unpack))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("tuple<{}>", elems)
            }
            TypeKind::Struct(s) => {
                let fields = s
                    .fields
                    .iter()
                    .map(|f| format!("{}:{}", f.name, f.ty.serialize(unpack)))
                    .collect::<Vec<_>>()
                    .join(",");
                if s.is_strict {
                    format!("strict struct{{{}}}", fields)
                } else {
                    format!("struct{{{}}}", fields)
                }
            }
            TypeKind::PartialStruct(p) => format!("partial<{}>", p.inner.serialize(unpack)),
            TypeKind::Enum(e) => {
                let fields = e
                    .fields
                    .iter()
                    .map(|f| format!("{}={}", f.name, f.value))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("enum:{}{{{}}}", e.repr.name(), fields)
            }
            TypeKind::StringEnum(s) => {
                let values = s
                    .values
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("stringenum{{{}}}", values)
            }
            TypeKind::Class(c) => {
                let attrs = c
                    .attributes
                    .iter()
                    .map(|a| {
                        if a.is_static {
                            format!("static {}:{}", a.name, a.ty.serialize(unpack))
                        } else {
                            format!("{}:{}", a.name, a.ty.serialize(unpack))
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                let methods = c
                    .methods
                    .iter()
                    .map(|m| m.serialize_signature())
                    .collect::<Vec<_>>()
                    .join(",");
                let supers = c
                    .supers
                    .iter()
                    .map(|s| s.serialize(unpack))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("class{{{}}}{{{}}}impl{{{}}}", attrs, methods, supers)
            }
            TypeKind::Interface(i) => {
                let methods = i
                    .methods
                    .iter()
                    .map(|m| m.serialize_signature())
                    .collect::<Vec<_>>()
                    .join(",");
                let supers = i
                    .supers
                    .iter()
                    .map(|s| s.serialize(unpack))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("interface{{{}}}impl{{{}}}", methods, supers)
            }
            TypeKind::Join(j) => format!(
                "join({},{})",
                j.left.serialize(unpack),
                j.right.serialize(unpack)
            ),
            TypeKind::Variant(v) => {
                let ctors = v
                    .constructors
                    .iter()
                    .map(|c| c.serialize(unpack))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("variant{{{}}}", ctors)
            }
            TypeKind::VariantConstructor(vc) => {
                // The parent link is deliberately not serialized; cycles
                // through it must not reach the hasher.
                let params = vc
                    .params
                    .iter()
                    .map(|p| format!("{}:{}", p.name, p.ty.serialize(unpack)))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("ctor:{}({})", vc.name, params)
            }
            TypeKind::Function(f) => {
                let head = if f.is_coroutine { "cfn" } else { "fn" };
                format!(
                    "{}({})->{}",
                    head,
                    serialize_args(&f.params, unpack),
                    f.ret.serialize(unpack)
                )
            }
            TypeKind::Coroutine(c) => format!("coroutine<{}>", c.fn_type.serialize(unpack)),
            TypeKind::Nullable(n) => format!("nullable<{}>", n.inner.serialize(unpack)),
            TypeKind::Reference(r) => {
                if unpack {
                    if let Some(base) = r.base() {
                        return base.serialize(unpack);
                    }
                }
                if r.type_args.is_empty() {
                    format!("ref({})", r.path_string())
                } else {
                    let args = r
                        .type_args
                        .iter()
                        .map(|a| a.serialize(unpack))
                        .collect::<Vec<_>>()
                        .join(",");
                    format!("ref({}<{}>)", r.path_string(), args)
                }
            }
            TypeKind::Generic(g) => match &g.constraint {
                Some(c) => format!("generic({}:{})", g.name, c.serialize(unpack)),
                None => format!("generic({})", g.name),
            },
            TypeKind::Union(u) => {
                let members = u
                    .members
                    .iter()
                    .map(|m| m.serialize(unpack))
                    .collect::<Vec<_>>()
                    .join("|");
                format!("union({})", members)
            }
            TypeKind::Lock(l) => format!("lock<{}>", l.ret.serialize(unpack)),
            TypeKind::Namespace(ns) => format!("namespace({})", ns.decl.name),
            TypeKind::FfiNamespace(ns) => format!("ffi({})", ns.decl.name),
            TypeKind::FfiMethod(m) => {
                format!("ffimethod({}.{})", m.parent, m.method.serialize_signature())
            }
            TypeKind::MetaClass(m) => {
                let args = m
                    .type_args
                    .iter()
                    .map(|a| a.serialize(unpack))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("meta.class({}<{}>)", m.class.serialize(unpack), args)
            }
            TypeKind::MetaInterface(m) => {
                format!("meta.interface({})", m.interface.serialize(unpack))
            }
            TypeKind::MetaVariant(m) => {
                let args = m
                    .type_args
                    .iter()
                    .map(|a| a.serialize(unpack))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("meta.variant({}<{}>)", m.variant.serialize(unpack), args)
            }
            TypeKind::MetaVariantConstructor(m) => {
                let args = m
                    .type_args
                    .iter()
                    .map(|a| a.serialize(unpack))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("meta.ctor({}<{}>)", m.constructor.serialize(unpack), args)
            }
            TypeKind::MetaEnum(m) => format!("meta.enum({})", m.enum_type.serialize(unpack)),
        }
    }

    /// The memoized 32-bit content hash of the canonical serialization.
    pub fn structural_hash(&self) -> u32 {
        if let Some(hash) = self.hash.get() {
            return hash;
        }
        let mut hasher = FxHasher::default();
        self.serialize(false).hash(&mut hasher);
        let wide = hasher.finish();
        let hash = (wide as u32) ^ ((wide >> 32) as u32);
        self.hash.set(Some(hash));
        hash
    }
}
