//! Textual descriptors for types and callable members.
//!
//! A type is written `{Namespace.Name<args>, Module}`, an open method
//! parameter `{!!N}` and an open type parameter `{!N}`. A member is written
//! `Name<N>@{Declaring}(P0,P1)`, where `<N>` is the generic arity and is
//! omitted for non-generic members.
//!
//! Text is first parsed into a [`TypeSignature`] / [`MemberSignature`]
//! syntax tree, then resolved against a [`TypeRegistry`]. Both trees print
//! back to the canonical text through `Display`.

use std::fmt;

use tracing::{debug, warn};
use treewire_core::{MethodRef, TypeId, TypeRef, TypeRegistry};

use crate::error::CodecError;

/// Modules whose types may be located without an exact module match.
pub const CORE_MODULES: [&str; 4] = [
    "System.Private.CoreLib",
    "mscorlib",
    "System.Runtime",
    "netstandard",
];

/// Maximum nesting of generic arguments accepted by the parser.
const MAX_NESTING: usize = 64;

pub fn is_core_module(module: &str) -> bool {
    CORE_MODULES.contains(&module)
}

// ---------------------------------------------------------------------------
// Syntax
// ---------------------------------------------------------------------------

/// A parsed, unresolved type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    Named {
        /// Qualified name, e.g. ``System.Collections.Generic.List`1``.
        name: String,
        args: Vec<TypeSignature>,
        module: Option<String>,
    },
    MethodParam(u32),
    TypeParam(u32),
}

/// A parsed, unresolved member descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSignature {
    pub name: String,
    pub generic_arity: u32,
    pub declaring: TypeSignature,
    pub params: Vec<TypeSignature>,
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::MethodParam(n) => write!(f, "{{!!{}}}", n),
            TypeSignature::TypeParam(n) => write!(f, "{{!{}}}", n),
            TypeSignature::Named { name, args, module } => {
                write!(f, "{{{}", name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, args)?;
                    f.write_str(">")?;
                }
                if let Some(module) = module {
                    write!(f, ", {}", module)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.generic_arity > 0 {
            write!(f, "<{}>", self.generic_arity)?;
        }
        write!(f, "@{}(", self.declaring)?;
        write_list(f, &self.params)?;
        f.write_str(")")
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeSignature]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Parses a single type descriptor. The whole input must be consumed.
pub fn parse_type(text: &str) -> Result<TypeSignature, CodecError> {
    let mut p = Parser::new(text);
    let sig = p.type_sig()?;
    p.finish()?;
    Ok(sig)
}

/// Parses a member descriptor. The whole input must be consumed.
pub fn parse_member(text: &str) -> Result<MemberSignature, CodecError> {
    let mut p = Parser::new(text);
    let sig = p.member_sig()?;
    p.finish()?;
    Ok(sig)
}

/// Parses a comma-joined type list. Blank input is the empty list.
pub fn parse_type_list(text: &str) -> Result<Vec<TypeSignature>, CodecError> {
    let mut p = Parser::new(text);
    p.skip_ws();
    if p.at_end() {
        return Ok(Vec::new());
    }
    let list = p.list_until(None)?;
    p.finish()?;
    Ok(list)
}

/// Recursive descent over the descriptor grammar.
struct Parser<'s> {
    src: &'s str,
    pos: usize,
    nesting: usize,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str) -> Self {
        Parser {
            src,
            pos: 0,
            nesting: 0,
        }
    }

    fn error(&self, reason: impl fmt::Display) -> CodecError {
        CodecError::SignatureInvalid {
            signature: self.src.to_string(),
            reason: format!("{} at offset {}", reason, self.pos),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, b: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), CodecError> {
        if self.eat(b) {
            return Ok(());
        }
        match self.peek() {
            Some(found) => Err(self.error(format_args!(
                "expected '{}', found '{}'",
                b as char, found as char
            ))),
            None => Err(self.error(format_args!("expected '{}', found end of input", b as char))),
        }
    }

    fn finish(&mut self) -> Result<(), CodecError> {
        self.skip_ws();
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing input"))
        }
    }

    /// A run of non-delimiter characters, trimmed. Never empty.
    fn name(&mut self) -> Result<&'s str, CodecError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'<' | b'>' | b'(' | b')' | b'{' | b'}' | b'@' | b',') {
                break;
            }
            self.pos += 1;
        }
        // Delimiters are ASCII, so both ends sit on char boundaries.
        let run = self.src[start..self.pos].trim();
        if run.is_empty() {
            return Err(self.error("expected a name"));
        }
        Ok(run)
    }

    fn integer(&mut self) -> Result<u32, CodecError> {
        let text = self.name()?;
        text.parse()
            .map_err(|_| self.error(format_args!("'{}' is not an integer", text)))
    }

    fn type_sig(&mut self) -> Result<TypeSignature, CodecError> {
        self.expect(b'{')?;
        self.skip_ws();
        let rest = &self.src[self.pos..];
        if rest.starts_with("!!") {
            self.pos += 2;
            let n = self.integer()?;
            self.expect(b'}')?;
            return Ok(TypeSignature::MethodParam(n));
        }
        if rest.starts_with('!') {
            self.pos += 1;
            let n = self.integer()?;
            self.expect(b'}')?;
            return Ok(TypeSignature::TypeParam(n));
        }

        let name = self.name()?.to_string();
        let args = if self.eat(b'<') {
            self.nesting += 1;
            if self.nesting > MAX_NESTING {
                return Err(self.error("generic arguments nested too deeply"));
            }
            let args = self.list_until(Some(b'>'))?;
            self.expect(b'>')?;
            self.nesting -= 1;
            args
        } else {
            Vec::new()
        };
        let module = if self.eat(b',') {
            Some(self.name()?.to_string())
        } else {
            None
        };
        self.expect(b'}')?;
        Ok(TypeSignature::Named { name, args, module })
    }

    /// One or more comma-separated types. With a `close` byte, an
    /// immediately following close yields the empty list.
    fn list_until(&mut self, close: Option<u8>) -> Result<Vec<TypeSignature>, CodecError> {
        let mut items = Vec::new();
        self.skip_ws();
        if close.is_some() && self.peek() == close {
            return Ok(items);
        }
        loop {
            items.push(self.type_sig()?);
            if !self.eat(b',') {
                return Ok(items);
            }
        }
    }

    fn member_sig(&mut self) -> Result<MemberSignature, CodecError> {
        let name = self.name()?.to_string();
        let generic_arity = if self.eat(b'<') {
            let n = self.integer()?;
            self.expect(b'>')?;
            n
        } else {
            0
        };
        self.expect(b'@')?;
        let declaring = self.type_sig()?;
        self.expect(b'(')?;
        let params = self.list_until(Some(b')'))?;
        self.expect(b')')?;
        Ok(MemberSignature {
            name,
            generic_arity,
            declaring,
            params,
        })
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Encodes and resolves descriptors against a type registry.
#[derive(Debug, Clone, Copy)]
pub struct SignatureCodec<'a> {
    types: &'a TypeRegistry,
}

impl<'a> SignatureCodec<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        SignatureCodec { types }
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.types
    }

    /// Syntax tree for `ty`. Anonymous types have no descriptor.
    pub fn type_signature(&self, ty: &TypeRef) -> Result<TypeSignature, CodecError> {
        match ty {
            TypeRef::MethodParam(n) => Ok(TypeSignature::MethodParam(*n)),
            TypeRef::TypeParam(n) => Ok(TypeSignature::TypeParam(*n)),
            TypeRef::Named { def, args } => {
                let def = self.types.def(*def)?;
                if def.anonymous {
                    return Err(CodecError::AnonymousType {
                        type_name: def.name.clone(),
                    });
                }
                Ok(TypeSignature::Named {
                    name: def.qualified_name(),
                    args: args
                        .iter()
                        .map(|a| self.type_signature(a))
                        .collect::<Result<_, _>>()?,
                    module: Some(def.module.clone()),
                })
            }
        }
    }

    pub fn encode_type(&self, ty: &TypeRef) -> Result<String, CodecError> {
        Ok(self.type_signature(ty)?.to_string())
    }

    /// Comma-joined descriptors, the form read back by [`decode_types`](Self::decode_types).
    pub fn encode_types(&self, types: &[TypeRef]) -> Result<String, CodecError> {
        let parts = types
            .iter()
            .map(|t| self.encode_type(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(","))
    }

    /// Descriptor of `m`'s generic definition.
    ///
    /// Parameter types are taken from the declaring type as closed, with
    /// the method's own generic parameters left as `{!!N}`.
    pub fn encode_member(&self, m: &MethodRef) -> Result<String, CodecError> {
        let definition = m.generic_definition();
        let def = self.types.method(m.method)?;
        let params = self
            .types
            .method_parameter_types(&definition)?
            .iter()
            .map(|p| self.type_signature(p))
            .collect::<Result<Vec<_>, _>>()?;
        let sig = MemberSignature {
            name: def.name.clone(),
            generic_arity: def.generic_arity(),
            declaring: self.type_signature(&m.declaring)?,
            params,
        };
        Ok(sig.to_string())
    }

    pub fn decode_type(&self, text: &str) -> Result<TypeRef, CodecError> {
        self.resolve_type(&parse_type(text)?)
    }

    pub fn decode_types(&self, text: &str) -> Result<Vec<TypeRef>, CodecError> {
        parse_type_list(text)?
            .iter()
            .map(|sig| self.resolve_type(sig))
            .collect()
    }

    /// Resolves to the unique member the descriptor names, as a generic
    /// definition when the member is generic.
    pub fn decode_member(&self, text: &str) -> Result<MethodRef, CodecError> {
        let sig = parse_member(text)?;
        self.resolve_member(&sig, text)
    }

    pub fn resolve_type(&self, sig: &TypeSignature) -> Result<TypeRef, CodecError> {
        let (name, args, module) = match sig {
            TypeSignature::MethodParam(n) => return Ok(TypeRef::MethodParam(*n)),
            TypeSignature::TypeParam(n) => return Ok(TypeRef::TypeParam(*n)),
            TypeSignature::Named { name, args, module } => (name, args, module),
        };
        let id = self.locate(name, module.as_deref())?;
        let def = self.types.def(id)?;
        // Empty args name the open definition.
        if !args.is_empty() && args.len() != def.generic_arity as usize {
            return Err(CodecError::TypeNotFound {
                name: format!("{} with {} generic argument(s)", name, args.len()),
            });
        }
        let args = args
            .iter()
            .map(|a| self.resolve_type(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypeRef::generic(id, args))
    }

    /// Finds a type by qualified name, using the module hint first.
    fn locate(&self, name: &str, module: Option<&str>) -> Result<TypeId, CodecError> {
        if let Some(module) = module {
            if let Some(id) = self.types.lookup(name, module) {
                return Ok(id);
            }
        }
        if module.map_or(true, is_core_module) {
            if let Some(id) = self.types.lookup_in_modules(name, is_core_module) {
                debug!(name, ?module, "resolved type in core modules");
                return Ok(id);
            }
        }
        match self.types.find_all(name) {
            [] => Err(CodecError::TypeNotFound {
                name: name.to_string(),
            }),
            [only] => {
                debug!(name, ?module, "resolved type outside its module hint");
                Ok(*only)
            }
            [first, ..] => {
                warn!(name, ?module, candidates = self.types.find_all(name).len(),
                    "type name is ambiguous across modules, using the first match");
                Ok(*first)
            }
        }
    }

    pub fn resolve_member(&self, sig: &MemberSignature, text: &str) -> Result<MethodRef, CodecError> {
        let declaring = self.resolve_type(&sig.declaring)?;
        let params = sig
            .params
            .iter()
            .map(|p| self.resolve_type(p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut survivors = Vec::new();
        for candidate in self.types.methods_of(&declaring) {
            let Some(def) = self.types.get_method(candidate.method) else {
                continue;
            };
            if def.name != sig.name
                || def.generic_arity() != sig.generic_arity
                || def.params.len() != params.len()
            {
                continue;
            }
            let candidate_params = self.types.method_parameter_types(&candidate)?;
            if candidate_params
                .iter()
                .zip(&params)
                .all(|(a, b)| equivalent(a, b))
            {
                survivors.push(candidate);
            }
        }

        match survivors.len() {
            1 => Ok(survivors.remove(0)),
            0 => Err(CodecError::MemberNotFound {
                signature: text.to_string(),
                reason: "no member matches".to_string(),
            }),
            n => Err(CodecError::MemberNotFound {
                signature: text.to_string(),
                reason: format!("ambiguous: {} members match", n),
            }),
        }
    }
}

/// Structural equality for parameter matching.
fn equivalent(a: &TypeRef, b: &TypeRef) -> bool {
    match (a, b) {
        (TypeRef::MethodParam(x), TypeRef::MethodParam(y)) => x == y,
        (TypeRef::TypeParam(x), TypeRef::TypeParam(y)) => x == y,
        (
            TypeRef::Named { def: d1, args: a1 },
            TypeRef::Named { def: d2, args: a2 },
        ) if !a1.is_empty() => {
            d1 == d2 && a1.len() == a2.len() && a1.iter().zip(a2).all(|(x, y)| equivalent(x, y))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use treewire_core::{MethodDef, TypeRef, CORE_MODULE};

    fn named(name: &str, args: Vec<TypeSignature>, module: Option<&str>) -> TypeSignature {
        TypeSignature::Named {
            name: name.to_string(),
            args,
            module: module.map(str::to_string),
        }
    }

    #[test]
    fn parses_nested_generic_type() {
        let sig = parse_type(
            "{System.Collections.Generic.List`1<{System.Int32, System.Private.CoreLib}>, System.Private.CoreLib}",
        )
        .unwrap();
        assert_eq!(
            sig,
            named(
                "System.Collections.Generic.List`1",
                vec![named("System.Int32", vec![], Some("System.Private.CoreLib"))],
                Some("System.Private.CoreLib"),
            )
        );
    }

    #[test]
    fn parses_open_parameters() {
        assert_eq!(parse_type("{!!2}").unwrap(), TypeSignature::MethodParam(2));
        assert_eq!(parse_type(" { !1 } ").unwrap(), TypeSignature::TypeParam(1));
    }

    #[test]
    fn module_hint_is_trimmed_and_optional() {
        let sig = parse_type("{System.Int32,   mscorlib  }").unwrap();
        assert_eq!(sig, named("System.Int32", vec![], Some("mscorlib")));
        let sig = parse_type("{System.Int32}").unwrap();
        assert_eq!(sig, named("System.Int32", vec![], None));
    }

    #[test]
    fn parses_member() {
        let sig = parse_member("Count<1>@{System.Linq.Enumerable, System.Linq}({System.Collections.Generic.IEnumerable`1<{!!0}>, System.Private.CoreLib})").unwrap();
        assert_eq!(sig.name, "Count");
        assert_eq!(sig.generic_arity, 1);
        assert_eq!(sig.declaring, named("System.Linq.Enumerable", vec![], Some("System.Linq")));
        assert_eq!(sig.params.len(), 1);

        let sig = parse_member("ToUpper@{System.String, System.Private.CoreLib}()").unwrap();
        assert_eq!(sig.generic_arity, 0);
        assert!(sig.params.is_empty());
    }

    #[test]
    fn display_is_canonical() {
        let text = "Sum<1>@{System.Linq.Enumerable, System.Linq}({System.Collections.Generic.IEnumerable`1<{!!0}>, System.Private.CoreLib},{System.Func`2<{!!0},{System.Int32, System.Private.CoreLib}>, System.Private.CoreLib})";
        assert_eq!(parse_member(text).unwrap().to_string(), text);
    }

    #[test]
    fn grammar_violations_are_invalid() {
        for bad in [
            "",
            "   ",
            "{System.Int32, mscorlib",
            "System.Int32",
            "{}",
            "{, mscorlib}",
            "{System.Int32, mscorlib}}",
            "{!!x}",
            "{List`1<{System.Int32}}",
        ] {
            assert!(
                matches!(parse_type(bad), Err(CodecError::SignatureInvalid { .. })),
                "accepted {:?}",
                bad
            );
        }
        for bad in [
            "",
            "Foo@{System.Int32}(",
            "Foo{System.Int32}()",
            "Foo<x>@{System.Int32}()",
            "Foo@{System.Int32}() trailing",
        ] {
            assert!(
                matches!(parse_member(bad), Err(CodecError::SignatureInvalid { .. })),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn error_reports_offending_text() {
        let err = parse_type("{System.Int32").unwrap_err();
        match err {
            CodecError::SignatureInvalid { signature, reason } => {
                assert_eq!(signature, "{System.Int32");
                assert!(reason.contains("expected '}'"), "{}", reason);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let depth = MAX_NESTING + 1;
        let text = format!("{}{{X}}{}", "{X<".repeat(depth), ">}".repeat(depth));
        assert!(matches!(parse_type(&text), Err(CodecError::SignatureInvalid { .. })));
    }

    #[test]
    fn type_list_allows_empty_input() {
        assert!(parse_type_list("").unwrap().is_empty());
        assert_eq!(parse_type_list("{!!0},{!!1}").unwrap().len(), 2);
    }

    // -- resolution --

    #[test]
    fn encodes_and_resolves_closed_generic() {
        let types = TypeRegistry::with_std();
        let codec = SignatureCodec::new(&types);
        let list = types.list_of(TypeRef::INT32).unwrap();
        let text = codec.encode_type(&list).unwrap();
        assert_eq!(
            text,
            "{System.Collections.Generic.List`1<{System.Int32, System.Private.CoreLib}>, System.Private.CoreLib}"
        );
        assert_eq!(codec.decode_type(&text).unwrap(), list);
    }

    #[test]
    fn core_hint_falls_back_to_core_modules() {
        let types = TypeRegistry::with_std();
        let codec = SignatureCodec::new(&types);
        assert_eq!(codec.decode_type("{System.Int32, mscorlib}").unwrap(), TypeRef::INT32);
        assert_eq!(codec.decode_type("{System.String, netstandard}").unwrap(), TypeRef::STRING);
        assert_eq!(codec.decode_type("{System.Int32}").unwrap(), TypeRef::INT32);
    }

    #[test]
    fn unknown_module_falls_back_to_all_modules() {
        let mut types = TypeRegistry::with_std();
        let id = types.define_class("Shop", "Order", "Shop.Core").unwrap();
        let codec = SignatureCodec::new(&types);
        assert_eq!(
            codec.decode_type("{Shop.Order, Shop.Core.Renamed}").unwrap(),
            TypeRef::simple(id)
        );
    }

    #[test]
    fn ambiguous_fallback_takes_first_registration() {
        let mut types = TypeRegistry::new();
        let first = types.define_class("Shop", "Order", "A").unwrap();
        types.define_class("Shop", "Order", "B").unwrap();
        let codec = SignatureCodec::new(&types);
        assert_eq!(codec.decode_type("{Shop.Order, C}").unwrap(), TypeRef::simple(first));
    }

    #[test]
    fn exact_module_wins_over_fallback() {
        let mut types = TypeRegistry::new();
        types.define_class("Shop", "Order", "A").unwrap();
        let second = types.define_class("Shop", "Order", "B").unwrap();
        let codec = SignatureCodec::new(&types);
        assert_eq!(codec.decode_type("{Shop.Order, B}").unwrap(), TypeRef::simple(second));
    }

    #[test]
    fn unknown_type_and_arity_mismatch_are_not_found() {
        let types = TypeRegistry::with_std();
        let codec = SignatureCodec::new(&types);
        assert!(matches!(
            codec.decode_type("{No.Such.Type, Nowhere}"),
            Err(CodecError::TypeNotFound { .. })
        ));
        assert!(matches!(
            codec.decode_type("{System.Nullable`1<{System.Int32},{System.Int64}>, System.Private.CoreLib}"),
            Err(CodecError::TypeNotFound { .. })
        ));
    }

    #[test]
    fn anonymous_types_cannot_be_encoded() {
        let mut types = TypeRegistry::new();
        let anon = types.define_anonymous("<>f__AnonymousType0", "Tests").unwrap();
        let codec = SignatureCodec::new(&types);
        assert!(matches!(
            codec.encode_type(&TypeRef::simple(anon)),
            Err(CodecError::AnonymousType { .. })
        ));
    }

    #[test]
    fn member_roundtrip_for_generic_definition() {
        let types = TypeRegistry::with_std();
        let codec = SignatureCodec::new(&types);
        let enumerable = types.lookup("System.Linq.Enumerable", "System.Linq").unwrap();
        for m in types.methods_of(&TypeRef::simple(enumerable)) {
            let text = codec.encode_member(&m).unwrap();
            let back = codec.decode_member(&text).unwrap();
            assert_eq!(back, m, "{}", text);
        }
    }

    #[test]
    fn member_of_closed_generic_type() {
        let types = TypeRegistry::with_std();
        let codec = SignatureCodec::new(&types);
        let list = types.list_of(TypeRef::STRING).unwrap();
        let add = types
            .methods_of(&list)
            .into_iter()
            .find(|m| types.get_method(m.method).unwrap().name == "Add")
            .unwrap();
        let text = codec.encode_member(&add).unwrap();
        assert!(text.starts_with("Add@{System.Collections.Generic.List`1<{System.String"), "{}", text);
        assert_eq!(codec.decode_member(&text).unwrap(), add);
    }

    #[test]
    fn closed_generic_method_encodes_its_definition() {
        let types = TypeRegistry::with_std();
        let codec = SignatureCodec::new(&types);
        let enumerable = TypeRef::simple(types.lookup("System.Linq.Enumerable", "System.Linq").unwrap());
        let count = types
            .methods_of(&enumerable)
            .into_iter()
            .find(|m| {
                let def = types.get_method(m.method).unwrap();
                def.name == "Count" && def.params.len() == 1
            })
            .unwrap();
        let closed = types.make_generic_method(&count, &[TypeRef::INT32]).unwrap();
        assert_eq!(
            codec.encode_member(&closed).unwrap(),
            codec.encode_member(&count).unwrap()
        );
    }

    #[test]
    fn member_resolution_failures() {
        let types = TypeRegistry::with_std();
        let codec = SignatureCodec::new(&types);
        let err = codec
            .decode_member("Nope@{System.String, System.Private.CoreLib}()")
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::MemberNotFound {
                signature: "Nope@{System.String, System.Private.CoreLib}()".into(),
                reason: "no member matches".into(),
            }
        );
        // Right name, wrong arity.
        assert!(matches!(
            codec.decode_member("ToUpper<1>@{System.String, System.Private.CoreLib}()"),
            Err(CodecError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn duplicate_members_are_ambiguous() {
        let mut types = TypeRegistry::new();
        let shop = types.define_class("Shop", "Tools", "Shop").unwrap();
        for _ in 0..2 {
            types
                .add_method(MethodDef {
                    name: "Twice".into(),
                    declaring: shop,
                    generic_params: vec![],
                    is_static: true,
                    params: [TypeRef::INT32].into_iter().collect(),
                    return_type: TypeRef::INT32,
                })
                .unwrap();
        }
        let codec = SignatureCodec::new(&types);
        let err = codec
            .decode_member("Twice@{Shop.Tools, Shop}({System.Int32, System.Private.CoreLib})")
            .unwrap_err();
        match err {
            CodecError::MemberNotFound { reason, .. } => assert!(reason.starts_with("ambiguous")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn type_list_resolution() {
        let types = TypeRegistry::with_std();
        let codec = SignatureCodec::new(&types);
        let list = vec![TypeRef::INT32, TypeRef::nullable(TypeRef::DOUBLE)];
        let text = codec.encode_types(&list).unwrap();
        assert_eq!(codec.decode_types(&text).unwrap(), list);
        assert!(codec.decode_types("").unwrap().is_empty());
        assert!(is_core_module(CORE_MODULE));
    }

    fn arb_name() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_.`]{0,12}"
    }

    fn arb_signature() -> impl Strategy<Value = TypeSignature> {
        let leaf = prop_oneof![
            (0u32..8).prop_map(TypeSignature::MethodParam),
            (0u32..8).prop_map(TypeSignature::TypeParam),
            (arb_name(), proptest::option::of(arb_name()))
                .prop_map(|(name, module)| TypeSignature::Named { name, args: vec![], module }),
        ];
        leaf.prop_recursive(4, 24, 3, |inner| {
            (arb_name(), prop::collection::vec(inner, 1..3), proptest::option::of(arb_name()))
                .prop_map(|(name, args, module)| TypeSignature::Named { name, args, module })
        })
    }

    proptest! {
        #[test]
        fn parser_never_panics(text in "\\PC{0,64}") {
            let _ = parse_type(&text);
            let _ = parse_member(&text);
            let _ = parse_type_list(&text);
        }

        #[test]
        fn parser_never_panics_on_grammar_soup(text in "[{}<>(),@!0-9a-zA-Z. ]{0,48}") {
            let _ = parse_type(&text);
            let _ = parse_member(&text);
        }

        #[test]
        fn printed_signature_parses_back(sig in arb_signature()) {
            let text = sig.to_string();
            prop_assert_eq!(parse_type(&text).unwrap(), sig);
        }
    }
}
