//! The standard library surface of the host.
//!
//! [`TypeRegistry::with_std`] registers the collection, delegate, and helper
//! types that expression trees commonly reference, including a large static
//! `System.Linq.Enumerable` class whose overload set exercises plain, generic,
//! and multi-parameter generic members.

use crate::type_id::{TypeId, TypeRegistry, CORE_MODULE};
use crate::types::{MethodDef, TypeDef, TypeKind, TypeRef};
use crate::id::MethodId;

/// Module holding `System.Linq.Enumerable`.
pub const LINQ_MODULE: &str = "System.Linq";

/// Highest `Func` arity registered (`Func`5`).
const MAX_FUNC_ARITY: u32 = 5;

/// Highest `Action` arity registered (`Action`3`).
const MAX_ACTION_ARITY: u32 = 3;

impl TypeRegistry {
    /// A registry with the standard library registered on top of the built-ins.
    pub fn with_std() -> Self {
        let mut reg = TypeRegistry::new();
        StdBuilder::new(&mut reg).build();
        reg
    }

    /// `Func`N` with the given arguments (the last one is the result).
    pub fn func_type(&self, args: Vec<TypeRef>) -> Option<TypeRef> {
        let id = self.lookup(&format!("System.Func`{}", args.len()), CORE_MODULE)?;
        Some(TypeRef::generic(id, args))
    }

    /// `IEnumerable<element>`.
    pub fn enumerable_of(&self, element: TypeRef) -> Option<TypeRef> {
        let id = self.lookup("System.Collections.Generic.IEnumerable`1", CORE_MODULE)?;
        Some(TypeRef::generic(id, vec![element]))
    }

    /// `List<element>`.
    pub fn list_of(&self, element: TypeRef) -> Option<TypeRef> {
        let id = self.lookup("System.Collections.Generic.List`1", CORE_MODULE)?;
        Some(TypeRef::generic(id, vec![element]))
    }
}

struct StdBuilder<'a> {
    reg: &'a mut TypeRegistry,
    ienumerable: TypeId,
    funcs: Vec<TypeId>,
}

impl<'a> StdBuilder<'a> {
    fn new(reg: &'a mut TypeRegistry) -> Self {
        StdBuilder {
            reg,
            ienumerable: TypeId::OBJECT,
            funcs: Vec::new(),
        }
    }

    fn build(mut self) {
        self.delegates();
        self.collections();
        self.math();
        self.strings();
        self.enumerable();
    }

    fn method(
        &mut self,
        declaring: TypeId,
        name: &str,
        generics: &[&str],
        is_static: bool,
        params: Vec<TypeRef>,
        return_type: TypeRef,
    ) -> MethodId {
        self.reg.insert_method(MethodDef {
            name: name.to_string(),
            declaring,
            generic_params: generics.iter().map(|g| g.to_string()).collect(),
            is_static,
            params: params.into_iter().collect(),
            return_type,
        })
    }

    fn seq(&self, element: TypeRef) -> TypeRef {
        TypeRef::generic(self.ienumerable, vec![element])
    }

    /// `Func` over `args`, the last of which is the result.
    fn func(&self, args: Vec<TypeRef>) -> TypeRef {
        let id = self.funcs[args.len() - 1];
        TypeRef::generic(id, args)
    }

    fn delegates(&mut self) {
        for arity in 1..=MAX_FUNC_ARITY {
            let def = TypeDef::new("System", &format!("Func`{}", arity), CORE_MODULE, TypeKind::Delegate)
                .with_arity(arity);
            let id = self.reg.insert(def);
            self.funcs.push(id);
        }
        self.reg.insert(TypeDef::new("System", "Action", CORE_MODULE, TypeKind::Delegate));
        for arity in 1..=MAX_ACTION_ARITY {
            let def = TypeDef::new("System", &format!("Action`{}", arity), CORE_MODULE, TypeKind::Delegate)
                .with_arity(arity);
            self.reg.insert(def);
        }
    }

    fn collections(&mut self) {
        let ns = "System.Collections.Generic";
        self.ienumerable = self.reg.insert(
            TypeDef::new(ns, "IEnumerable`1", CORE_MODULE, TypeKind::Interface).with_arity(1),
        );

        let mut list = TypeDef::new(ns, "List`1", CORE_MODULE, TypeKind::Class).with_arity(1);
        list.interfaces.push(self.seq(TypeRef::TypeParam(0)));
        let list = self.reg.insert(list);
        let t = TypeRef::TypeParam(0);
        let _ = self.reg.add_property(list, "Count", TypeRef::INT32, false);
        self.method(list, "Add", &[], false, vec![t.clone()], TypeRef::VOID);
        self.method(list, "Clear", &[], false, vec![], TypeRef::VOID);
        self.method(list, "Contains", &[], false, vec![t.clone()], TypeRef::BOOLEAN);
        self.method(list, "IndexOf", &[], false, vec![t.clone()], TypeRef::INT32);
        self.method(list, "Insert", &[], false, vec![TypeRef::INT32, t], TypeRef::VOID);
    }

    fn math(&mut self) {
        let math = self.reg.insert(TypeDef::new("System", "Math", CORE_MODULE, TypeKind::Class));
        let (i32_, i64_, f64_) = (TypeRef::INT32, TypeRef::INT64, TypeRef::DOUBLE);
        self.method(math, "Abs", &[], true, vec![i32_.clone()], i32_.clone());
        self.method(math, "Abs", &[], true, vec![i64_.clone()], i64_.clone());
        self.method(math, "Abs", &[], true, vec![f64_.clone()], f64_.clone());
        self.method(math, "Max", &[], true, vec![i32_.clone(), i32_.clone()], i32_.clone());
        self.method(math, "Max", &[], true, vec![f64_.clone(), f64_.clone()], f64_.clone());
        self.method(math, "Min", &[], true, vec![i32_.clone(), i32_.clone()], i32_);
        self.method(math, "Pow", &[], true, vec![f64_.clone(), f64_.clone()], f64_.clone());
        self.method(math, "Sqrt", &[], true, vec![f64_.clone()], f64_);
    }

    fn strings(&mut self) {
        let s = TypeId::STRING;
        let string = TypeRef::STRING;
        let _ = self.reg.add_property(s, "Length", TypeRef::INT32, false);
        self.method(s, "Contains", &[], false, vec![string.clone()], TypeRef::BOOLEAN);
        self.method(s, "ToUpper", &[], false, vec![], string.clone());
        self.method(s, "ToLower", &[], false, vec![], string.clone());
        self.method(s, "Substring", &[], false, vec![TypeRef::INT32], string.clone());
        self.method(s, "Substring", &[], false, vec![TypeRef::INT32, TypeRef::INT32], string.clone());
        self.method(s, "Concat", &[], true, vec![string.clone(), string.clone()], string.clone());
        self.method(s, "IsNullOrEmpty", &[], true, vec![string], TypeRef::BOOLEAN);
        self.method(TypeId::OBJECT, "ToString", &[], false, vec![], TypeRef::STRING);
    }

    fn enumerable(&mut self) {
        let e = self.reg.insert(TypeDef::new("System.Linq", "Enumerable", LINQ_MODULE, TypeKind::Class));
        let t = TypeRef::MethodParam(0);
        let r = TypeRef::MethodParam(1);
        let (i32_, i64_, f32_, f64_, bool_) = (
            TypeRef::INT32,
            TypeRef::INT64,
            TypeRef::primitive(crate::types::PrimitiveType::Single),
            TypeRef::DOUBLE,
            TypeRef::BOOLEAN,
        );
        let seq_t = self.seq(t.clone());
        let pred = self.func(vec![t.clone(), bool_.clone()]);
        let ts = &["TSource"];
        let tr = &["TSource", "TResult"];

        // Counting
        self.method(e, "Count", ts, true, vec![seq_t.clone()], i32_.clone());
        self.method(e, "Count", ts, true, vec![seq_t.clone(), pred.clone()], i32_.clone());
        self.method(e, "LongCount", ts, true, vec![seq_t.clone()], i64_.clone());
        self.method(e, "LongCount", ts, true, vec![seq_t.clone(), pred.clone()], i64_.clone());

        // Aggregates over closed element types
        for name in ["Sum", "Min", "Max"] {
            for elem in [i32_.clone(), i64_.clone(), f64_.clone()] {
                let seq = self.seq(elem.clone());
                self.method(e, name, &[], true, vec![seq], elem);
            }
        }
        let seq_f32 = self.seq(f32_.clone());
        self.method(e, "Sum", &[], true, vec![seq_f32], f32_);
        let nullable_i32 = TypeRef::nullable(i32_.clone());
        let seq_nullable = self.seq(nullable_i32.clone());
        self.method(e, "Sum", &[], true, vec![seq_nullable], nullable_i32);
        for elem in [i32_.clone(), f64_.clone()] {
            let seq = self.seq(elem);
            self.method(e, "Average", &[], true, vec![seq], f64_.clone());
        }

        // Aggregates with selectors
        for ret in [i32_.clone(), i64_.clone(), f64_.clone()] {
            let sel = self.func(vec![t.clone(), ret.clone()]);
            self.method(e, "Sum", ts, true, vec![seq_t.clone(), sel], ret);
        }
        let sel_i32 = self.func(vec![t.clone(), i32_.clone()]);
        self.method(e, "Min", ts, true, vec![seq_t.clone()], t.clone());
        self.method(e, "Min", ts, true, vec![seq_t.clone(), sel_i32.clone()], i32_.clone());
        self.method(e, "Max", ts, true, vec![seq_t.clone()], t.clone());
        self.method(e, "Max", ts, true, vec![seq_t.clone(), sel_i32.clone()], i32_.clone());
        self.method(e, "Average", ts, true, vec![seq_t.clone(), sel_i32], f64_);

        // Filtering and projection
        let pred_indexed = self.func(vec![t.clone(), i32_.clone(), bool_.clone()]);
        self.method(e, "Where", ts, true, vec![seq_t.clone(), pred.clone()], seq_t.clone());
        self.method(e, "Where", ts, true, vec![seq_t.clone(), pred_indexed], seq_t.clone());
        let seq_r = self.seq(r.clone());
        let proj = self.func(vec![t.clone(), r.clone()]);
        let proj_indexed = self.func(vec![t.clone(), i32_.clone(), r.clone()]);
        let proj_many = self.func(vec![t.clone(), seq_r.clone()]);
        self.method(e, "Select", tr, true, vec![seq_t.clone(), proj], seq_r.clone());
        self.method(e, "Select", tr, true, vec![seq_t.clone(), proj_indexed], seq_r.clone());
        self.method(e, "SelectMany", tr, true, vec![seq_t.clone(), proj_many], seq_r.clone());

        // Quantifiers and element access
        self.method(e, "Any", ts, true, vec![seq_t.clone()], bool_.clone());
        self.method(e, "Any", ts, true, vec![seq_t.clone(), pred.clone()], bool_.clone());
        self.method(e, "All", ts, true, vec![seq_t.clone(), pred.clone()], bool_.clone());
        self.method(e, "Contains", ts, true, vec![seq_t.clone(), t.clone()], bool_.clone());
        for name in ["First", "FirstOrDefault", "Last", "LastOrDefault", "Single"] {
            self.method(e, name, ts, true, vec![seq_t.clone()], t.clone());
            self.method(e, name, ts, true, vec![seq_t.clone(), pred.clone()], t.clone());
        }
        self.method(e, "ElementAt", ts, true, vec![seq_t.clone(), i32_.clone()], t.clone());
        self.method(e, "DefaultIfEmpty", ts, true, vec![seq_t.clone()], seq_t.clone());
        self.method(e, "DefaultIfEmpty", ts, true, vec![seq_t.clone(), t.clone()], seq_t.clone());

        // Set and sequence operators
        for name in ["Concat", "Union", "Intersect", "Except"] {
            self.method(e, name, ts, true, vec![seq_t.clone(), seq_t.clone()], seq_t.clone());
        }
        self.method(e, "SequenceEqual", ts, true, vec![seq_t.clone(), seq_t.clone()], bool_.clone());
        self.method(e, "Distinct", ts, true, vec![seq_t.clone()], seq_t.clone());
        self.method(e, "Reverse", ts, true, vec![seq_t.clone()], seq_t.clone());
        self.method(e, "Skip", ts, true, vec![seq_t.clone(), i32_.clone()], seq_t.clone());
        self.method(e, "Take", ts, true, vec![seq_t.clone(), i32_.clone()], seq_t.clone());
        self.method(e, "SkipWhile", ts, true, vec![seq_t.clone(), pred.clone()], seq_t.clone());
        self.method(e, "TakeWhile", ts, true, vec![seq_t.clone(), pred], seq_t.clone());
        self.method(e, "Append", ts, true, vec![seq_t.clone(), t.clone()], seq_t.clone());
        self.method(e, "Prepend", ts, true, vec![seq_t.clone(), t.clone()], seq_t.clone());
        let list_t = self
            .reg
            .list_of(t.clone())
            .unwrap_or_else(|| seq_t.clone());
        self.method(e, "ToList", ts, true, vec![seq_t.clone()], list_t);

        // Ordering
        let key = self.func(vec![t.clone(), r.clone()]);
        let tk = &["TSource", "TKey"];
        self.method(e, "OrderBy", tk, true, vec![seq_t.clone(), key.clone()], seq_t.clone());
        self.method(e, "OrderByDescending", tk, true, vec![seq_t.clone(), key], seq_t.clone());

        // Folds
        let fold_same = self.func(vec![t.clone(), t.clone(), t.clone()]);
        self.method(e, "Aggregate", ts, true, vec![seq_t.clone(), fold_same], t.clone());
        let fold_acc = self.func(vec![r.clone(), t.clone(), r.clone()]);
        let ta = &["TSource", "TAccumulate"];
        self.method(e, "Aggregate", ta, true, vec![seq_t.clone(), r.clone(), fold_acc.clone()], r.clone());
        let res = TypeRef::MethodParam(2);
        let finish = self.func(vec![r.clone(), res.clone()]);
        let tar = &["TSource", "TAccumulate", "TResult"];
        self.method(e, "Aggregate", tar, true, vec![seq_t.clone(), r.clone(), fold_acc, finish], res.clone());

        // Zip
        let seq_second = self.seq(r.clone());
        let zipper = self.func(vec![t.clone(), r.clone(), res.clone()]);
        let seq_res = self.seq(res);
        let tsr = &["TFirst", "TSecond", "TResult"];
        self.method(e, "Zip", tsr, true, vec![seq_t, seq_second, zipper], seq_res);

        // Generators
        let seq_i32 = self.seq(i32_.clone());
        self.method(e, "Range", &[], true, vec![i32_.clone(), i32_.clone()], seq_i32);
        let seq_r0 = self.seq(TypeRef::MethodParam(0));
        self.method(e, "Repeat", &["TResult"], true, vec![t, i32_], seq_r0.clone());
        self.method(e, "Empty", &["TResult"], true, vec![], seq_r0);
    }
}
