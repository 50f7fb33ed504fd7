//! End-to-end scenarios: compute, apply and codec round-trips over a
//! hand-registered schema type.

use std::collections::HashMap;

use deep_delta_core::apply;
use deep_delta_core::delta::{self, DeltaElement};
use deep_delta_core::document::{DeltaReader, DeltaWriter};
use deep_delta_core::registry::{self, RegisterHelpers};
use deep_delta_core::types::context::ComparisonContext;
use deep_delta_core::types::delta::{DeltaDocument, DeltaKind};
use deep_delta_core::types::value::Value;
use deep_delta_core::{decode, encode, CodecOptions};

/// Member indices for [`Gadget`], as a generator would assign them.
mod gadget_members {
    pub const NAME: i32 = 0;
    pub const COUNT: i32 = 1;
    pub const TAGS: i32 = 2;
}

/// A schema type with hand-written helpers standing in for the
/// generated ones.
#[derive(Debug, Clone, PartialEq)]
struct Gadget {
    name: String,
    count: i32,
    tags: Vec<String>,
}

impl Gadget {
    fn new(name: &str, count: i32, tags: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            count,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

fn gadget_equals(left: &Gadget, right: &Gadget, ctx: &mut ComparisonContext) -> bool {
    left.name.element_eq(&right.name, ctx)
        && left.count.element_eq(&right.count, ctx)
        && left.tags.len() == right.tags.len()
        && left
            .tags
            .iter()
            .zip(right.tags.iter())
            .all(|(a, b)| a.element_eq(b, ctx))
}

fn gadget_compute(left: &Gadget, right: &Gadget, ctx: &mut ComparisonContext, writer: &mut DeltaWriter) {
    delta::compute_member(writer, gadget_members::NAME, &left.name, &right.name, ctx);
    delta::compute_member(writer, gadget_members::COUNT, &left.count, &right.count, ctx);
    delta::compute_list_member(
        writer,
        gadget_members::TAGS,
        Some(&left.tags),
        Some(&right.tags),
        ctx,
    );
}

fn gadget_apply(target: &mut Gadget, reader: &mut DeltaReader<'_>) {
    if let Some(replacement) = apply::take_replace_object::<Gadget>(reader) {
        *target = replacement;
        return;
    }
    let mut ctx = ComparisonContext::no_tracking(Default::default());
    for op in reader.enumerate_member(gadget_members::NAME) {
        apply::apply_member(&mut target.name, op);
    }
    for op in reader.enumerate_member(gadget_members::COUNT) {
        apply::apply_member(&mut target.count, op);
    }
    let _ = apply::apply_list_delta(
        &mut target.tags,
        reader.enumerate_member(gadget_members::TAGS),
        &mut ctx,
    );
}

fn gadget_diff(
    left: &Gadget,
    right: &Gadget,
    ctx: &mut ComparisonContext,
) -> Option<registry::Diff> {
    let mut diff = registry::Diff::default();
    if !left.name.element_eq(&right.name, ctx) {
        diff.entries.push(registry::DiffEntry {
            path: "name".to_string(),
            left: Some(Value::from(left.name.as_str())),
            right: Some(Value::from(right.name.as_str())),
        });
    }
    if !left.count.element_eq(&right.count, ctx) {
        diff.entries.push(registry::DiffEntry {
            path: "count".to_string(),
            left: Some(Value::I32(left.count)),
            right: Some(Value::I32(right.count)),
        });
    }
    Some(diff)
}

impl RegisterHelpers for Gadget {
    fn register() {
        registry::register_comparer::<Gadget>(gadget_equals);
        registry::register_delta::<Gadget>(gadget_compute, gadget_apply);
        registry::register_diff::<Gadget>(gadget_diff);
    }
}

impl DeltaElement for Gadget {
    fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
        gadget_equals(self, other, ctx)
    }

    fn to_payload(&self) -> Value {
        Value::object(self.clone())
    }

    fn from_payload(value: &Value) -> Option<Self> {
        value.as_object()?.downcast_ref::<Gadget>().cloned()
    }

    fn compute_nested(
        &self,
        other: &Self,
        ctx: &mut ComparisonContext,
        writer: &mut DeltaWriter,
    ) -> bool {
        registry::compute_delta_same_type(self, other, ctx, writer)
    }

    fn apply_nested(&mut self, reader: &mut DeltaReader<'_>) -> bool {
        registry::try_apply_delta_same_type(self, reader)
    }
}

fn setup() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    registry::warm_up::<Gadget>();
}

fn compute(left: &Gadget, right: &Gadget) -> DeltaDocument {
    let mut writer = DeltaWriter::new();
    let mut ctx = ComparisonContext::with_defaults();
    assert!(delta::compute_delta(left, right, &mut ctx, &mut writer));
    writer.finish()
}

fn apply_doc(target: &mut Gadget, doc: &DeltaDocument) {
    let mut reader = DeltaReader::new(doc);
    assert!(apply::apply_delta(target, &mut reader));
}

#[test]
fn compute_of_identical_values_is_empty() {
    // Goal: compute(L, L) emits nothing
    setup();
    let gadget = Gadget::new("widget", 3, &["a", "b"]);
    assert!(compute(&gadget, &gadget.clone()).is_empty());
}

#[test]
fn apply_of_empty_document_is_a_no_op() {
    // Goal: apply(L, empty) == L
    setup();
    let mut gadget = Gadget::new("widget", 3, &["a"]);
    let before = gadget.clone();
    apply_doc(&mut gadget, &DeltaDocument::new());
    assert_eq!(gadget, before);
}

#[test]
fn structured_diff_reports_differing_members() {
    // Goal: a registered diff helper surfaces member paths
    setup();
    let left = Gadget::new("widget", 3, &[]);
    let right = Gadget::new("gizmo", 5, &[]);
    let mut ctx = ComparisonContext::with_defaults();
    let diff = registry::try_get_diff(&left, &right, &mut ctx).unwrap();
    let paths: Vec<&str> = diff.entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["name", "count"]);

    let same = registry::try_get_diff(&left, &left.clone(), &mut ctx).unwrap();
    assert!(same.entries.is_empty());
}

#[test]
fn null_transitions_round_trip_through_set_member() {
    // Goal: optional members cross null boundaries via SetMember
    let mut writer = DeltaWriter::new();
    let mut ctx = ComparisonContext::with_defaults();
    let some: Option<i32> = Some(4);
    let none: Option<i32> = None;
    delta::compute_member(&mut writer, 0, &some, &none, &mut ctx);
    delta::compute_member(&mut writer, 1, &none, &some, &mut ctx);
    let doc = writer.finish();
    assert_eq!(doc.len(), 2);
    assert!(doc.iter().all(|op| op.kind == DeltaKind::SetMember));
    assert_eq!(doc.as_ops()[0].value, Some(Value::Null));

    let mut cleared: Option<i32> = Some(4);
    apply::apply_member(&mut cleared, &doc.as_ops()[0]);
    assert_eq!(cleared, None);

    let mut filled: Option<i32> = None;
    apply::apply_member(&mut filled, &doc.as_ops()[1]);
    assert_eq!(filled, Some(4));

    // equal optionals emit nothing
    let mut writer = DeltaWriter::new();
    delta::compute_member(&mut writer, 0, &none, &None::<i32>, &mut ctx);
    assert!(writer.is_empty());
}

#[test]
fn compute_then_apply_reproduces_the_right_side() {
    // Goal: round-trip across members, lists included
    setup();
    let left = Gadget::new("widget", 3, &["alpha", "beta", "gamma"]);
    let right = Gadget::new("gizmo", 3, &["alpha", "delta", "gamma", "omega"]);
    let doc = compute(&left, &right);
    assert!(!doc.is_empty());

    let mut target = left.clone();
    apply_doc(&mut target, &doc);
    assert_eq!(target, right);

    // replay safety: applying the same patch again changes nothing
    apply_doc(&mut target, &doc);
    assert_eq!(target, right);
}

mod list_scenarios {
    use super::*;

    /// Plain record elements without nested support: replaces stay
    /// whole-element.
    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        name: &'static str,
        v: i32,
    }

    impl DeltaElement for Entry {
        fn element_eq(&self, other: &Self, _ctx: &mut ComparisonContext) -> bool {
            self == other
        }

        fn to_payload(&self) -> Value {
            Value::object(self.clone())
        }

        fn from_payload(value: &Value) -> Option<Self> {
            value.as_object()?.downcast_ref::<Entry>().cloned()
        }
    }

    fn e(name: &'static str, v: i32) -> Entry {
        Entry { name, v }
    }

    const ITEMS: i32 = 0;

    fn list_diff(left: &[Entry], right: &[Entry]) -> DeltaDocument {
        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        delta::compute_list_delta(&mut writer, ITEMS, left, right, &mut ctx);
        writer.finish()
    }

    fn apply_list(target: &mut Vec<Entry>, doc: &DeltaDocument) {
        let mut ctx = ComparisonContext::with_defaults();
        apply::apply_list_delta(target, doc.iter(), &mut ctx).unwrap();
    }

    #[test]
    fn middle_replace() {
        // Goal: [X:3,Y:1,Z:2] -> [X:3,Y:2,Z:2] is one SeqReplaceAt at 1
        let a = vec![e("X", 3), e("Y", 1), e("Z", 2)];
        let b = vec![e("X", 3), e("Y", 2), e("Z", 2)];
        let doc = list_diff(&a, &b);
        assert_eq!(doc.len(), 1);
        let op = &doc.as_ops()[0];
        assert_eq!(op.kind, DeltaKind::SeqReplaceAt);
        assert_eq!(op.member_index, ITEMS);
        assert_eq!(op.index, 1);

        let mut target = a.clone();
        apply_list(&mut target, &doc);
        assert_eq!(target, b);
    }

    #[test]
    fn single_insert_at_head() {
        // Goal: [A:1,B:2] -> [H:7,A:1,B:2] is one add at 0; apply yields B
        let a = vec![e("A", 1), e("B", 2)];
        let b = vec![e("H", 7), e("A", 1), e("B", 2)];
        let doc = list_diff(&a, &b);
        assert_eq!(doc.len(), 1);
        let op = &doc.as_ops()[0];
        assert_eq!(op.kind, DeltaKind::SeqAddAt);
        assert_eq!(op.index, 0);

        let mut target = a.clone();
        apply_list(&mut target, &doc);
        assert_eq!(target, b);
    }

    #[test]
    fn single_insert_after_duplicates_targets_post_equal_slot() {
        // Goal: [X,X,X] -> [X,X,X,X] emits SeqAddAt(3, X)
        let x = || e("X", 0);
        let a = vec![x(), x(), x()];
        let b = vec![x(), x(), x(), x()];
        let doc = list_diff(&a, &b);
        assert_eq!(doc.len(), 1);
        let op = &doc.as_ops()[0];
        assert_eq!(op.kind, DeltaKind::SeqAddAt);
        assert_eq!(op.index, 3);
    }

    #[test]
    fn registered_elements_recurse_instead_of_replacing() {
        // Goal: element edits on registered types become SeqNestedAt
        setup();
        let a = vec![
            Gadget::new("one", 1, &[]),
            Gadget::new("two", 2, &[]),
        ];
        let mut b = a.clone();
        b[1].count = 9;

        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        delta::compute_list_delta(&mut writer, ITEMS, &a, &b, &mut ctx);
        let doc = writer.finish();
        assert_eq!(doc.len(), 1);
        let op = &doc.as_ops()[0];
        assert_eq!(op.kind, DeltaKind::SeqNestedAt);
        assert_eq!(op.index, 1);

        let mut target = a.clone();
        let mut ctx = ComparisonContext::with_defaults();
        apply::apply_list_delta(&mut target, doc.iter(), &mut ctx).unwrap();
        assert_eq!(target, b);
    }
}

mod map_scenarios {
    use super::*;

    #[test]
    fn update_add_remove_mix() {
        // Goal: {env:test, who:user} -> {who:z, new:v} removes env and
        // sets who and new; apply yields the right side
        let a: HashMap<String, String> = [
            ("env".to_string(), "test".to_string()),
            ("who".to_string(), "user".to_string()),
        ]
        .into();
        let b: HashMap<String, String> = [
            ("who".to_string(), "z".to_string()),
            ("new".to_string(), "v".to_string()),
        ]
        .into();

        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        delta::compute_map_delta(&mut writer, 0, &a, &b, &mut ctx, false);
        let doc = writer.finish();
        assert_eq!(doc.len(), 3);
        assert!(doc
            .iter()
            .any(|op| op.kind == DeltaKind::DictRemove && op.key == Some(Value::from("env"))));

        let mut target = a.clone();
        let mut ctx = ComparisonContext::with_defaults();
        apply::apply_map_delta(&mut target, doc.iter(), &mut ctx).unwrap();
        assert_eq!(target, b);
    }

    #[test]
    fn nested_polymorphic_map_value_mutates_in_place() {
        // Goal: {d: Dog{bones:1}} -> {d: Dog{bones:2}} is a DictNested
        // carrying a SetMember; apply edits the existing entry
        #[derive(Debug, Clone, PartialEq)]
        struct Dog {
            bones: i32,
        }
        const BONES: i32 = 0;

        fn dog_equals(l: &Dog, r: &Dog, _ctx: &mut ComparisonContext) -> bool {
            l == r
        }
        fn dog_compute(l: &Dog, r: &Dog, ctx: &mut ComparisonContext, w: &mut DeltaWriter) {
            delta::compute_member(w, BONES, &l.bones, &r.bones, ctx);
        }
        fn dog_apply(target: &mut Dog, reader: &mut DeltaReader<'_>) {
            for op in reader.enumerate_member(BONES) {
                apply::apply_member(&mut target.bones, op);
            }
        }
        impl RegisterHelpers for Dog {
            fn register() {
                registry::register_comparer::<Dog>(dog_equals);
                registry::register_delta::<Dog>(dog_compute, dog_apply);
            }
        }
        impl DeltaElement for Dog {
            fn element_eq(&self, other: &Self, ctx: &mut ComparisonContext) -> bool {
                dog_equals(self, other, ctx)
            }
            fn to_payload(&self) -> Value {
                Value::object(self.clone())
            }
            fn from_payload(value: &Value) -> Option<Self> {
                value.as_object()?.downcast_ref::<Dog>().cloned()
            }
            fn compute_nested(
                &self,
                other: &Self,
                ctx: &mut ComparisonContext,
                writer: &mut DeltaWriter,
            ) -> bool {
                registry::compute_delta_same_type(self, other, ctx, writer)
            }
            fn apply_nested(&mut self, reader: &mut DeltaReader<'_>) -> bool {
                registry::try_apply_delta_same_type(self, reader)
            }
        }

        registry::warm_up::<Dog>();

        let a: HashMap<String, Dog> = [("d".to_string(), Dog { bones: 1 })].into();
        let b: HashMap<String, Dog> = [("d".to_string(), Dog { bones: 2 })].into();

        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        delta::compute_map_delta(&mut writer, 0, &a, &b, &mut ctx, true);
        let doc = writer.finish();

        assert_eq!(doc.len(), 1);
        let op = &doc.as_ops()[0];
        assert_eq!(op.kind, DeltaKind::DictNested);
        assert_eq!(op.key, Some(Value::from("d")));
        let nested = op.nested.as_ref().unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested.as_ops()[0].kind, DeltaKind::SetMember);
        assert_eq!(nested.as_ops()[0].value, Some(Value::I32(2)));

        let mut target = a.clone();
        let mut ctx = ComparisonContext::with_defaults();
        apply::apply_map_delta(&mut target, doc.iter(), &mut ctx).unwrap();
        assert_eq!(target, b);
    }

    #[test]
    fn dict_nested_never_materializes_missing_keys() {
        // Goal: nested ops addressing absent keys leave the map alone
        let mut target: HashMap<String, Value> = HashMap::new();
        let mut nested = DeltaDocument::new();
        nested.push(deep_delta_core::types::delta::DeltaOp::dict_set(
            -1,
            Value::from("inner"),
            Value::I32(1),
        ));
        let op = deep_delta_core::types::delta::DeltaOp::dict_nested(
            0,
            Value::from("ghost"),
            nested,
        );
        let mut ctx = ComparisonContext::with_defaults();
        apply::apply_map_delta(&mut target, [&op], &mut ctx).unwrap();
        assert!(target.is_empty());
    }
}

mod expando_scenarios {
    use super::*;

    fn bag(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn open_bag_roundtrip_preserves_identity() {
        // Goal: expando edits mutate the bag in place, never rebuild it
        let left = bag(&[
            ("env", Value::from("test")),
            ("retries", Value::I32(3)),
            ("stale", Value::Bool(true)),
        ]);
        let right = bag(&[
            ("env", Value::from("prod")),
            ("retries", Value::I32(3)),
            ("owner", Value::from("ops")),
        ]);

        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        delta::compute_expando_member(&mut writer, 0, Some(&left), Some(&right), &mut ctx);
        let doc = writer.finish();

        let mut target = left.clone();
        let mut ctx = ComparisonContext::with_defaults();
        apply::apply_expando_delta(&mut target, doc.iter(), &mut ctx).unwrap();
        assert_eq!(target, right);

        // replaying the same document is harmless
        let mut ctx = ComparisonContext::with_defaults();
        apply::apply_expando_delta(&mut target, doc.iter(), &mut ctx).unwrap();
        assert_eq!(target, right);
    }

    #[test]
    fn shared_map_member_computes_full_delta_and_applies_by_clone() {
        // Goal: read-only maps diff entry-wise and apply copy-on-write
        use std::sync::Arc;

        let left: Arc<HashMap<String, i32>> =
            Arc::new([("a".to_string(), 1), ("b".to_string(), 2)].into());
        let right: Arc<HashMap<String, i32>> =
            Arc::new([("a".to_string(), 1), ("b".to_string(), 5)].into());

        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        delta::compute_shared_map_delta(&mut writer, 0, &left, &right, &mut ctx, false);
        let doc = writer.finish();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.as_ops()[0].kind, DeltaKind::DictSet);

        let mut target = Arc::clone(&left);
        let mut ctx = ComparisonContext::with_defaults();
        apply::apply_shared_map_delta(&mut target, doc.iter(), &mut ctx).unwrap();
        assert_eq!(*target, *right);
        assert_eq!(left.get("b"), Some(&2));
    }
}

mod boundary_scenarios {
    use super::*;
    use deep_delta_core::types::value::ObjectHandle;

    #[test]
    fn polymorphic_type_change_emits_set_member() {
        // Goal: differing runtime types never recurse
        setup();
        let left = ObjectHandle::new(Gadget::new("w", 1, &[]));
        let right = ObjectHandle::new(String::from("replaced"));

        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        delta::compute_member(&mut writer, 5, &left, &right, &mut ctx);
        let doc = writer.finish();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.as_ops()[0].kind, DeltaKind::SetMember);
    }

    #[test]
    fn cyclic_graphs_terminate_under_cycle_tracking() {
        // Goal: a two-node ring compares equal without looping
        use std::cell::RefCell;
        use std::rc::Rc;

        #[derive(Debug, Clone)]
        struct Ring {
            id: i32,
            next: Option<Rc<RefCell<Ring>>>,
        }

        fn ring_equals(l: &Ring, r: &Ring, ctx: &mut ComparisonContext) -> bool {
            if l.id != r.id {
                return false;
            }
            match (&l.next, &r.next) {
                (None, None) => true,
                (Some(a), Some(b)) => {
                    let (a, b) = (a.borrow(), b.borrow());
                    if !ctx.enter_refs(&*a, &*b) {
                        return true;
                    }
                    let equal = ring_equals(&a, &b, ctx);
                    ctx.exit_refs(&*a, &*b);
                    equal
                }
                _ => false,
            }
        }

        let ring = |id_a: i32, id_b: i32| {
            let first = Rc::new(RefCell::new(Ring {
                id: id_a,
                next: None,
            }));
            let second = Rc::new(RefCell::new(Ring {
                id: id_b,
                next: Some(Rc::clone(&first)),
            }));
            first.borrow_mut().next = Some(Rc::clone(&second));
            first
        };

        let left = ring(1, 2);
        let right = ring(1, 2);
        let mut ctx = ComparisonContext::with_defaults();
        let (l, r) = (left.borrow(), right.borrow());
        assert!(ctx.enter_refs(&*l, &*r));
        assert!(ring_equals(&l, &r, &mut ctx));
        ctx.exit_refs(&*l, &*r);

        let differing = ring(1, 3);
        let d = differing.borrow();
        let mut ctx = ComparisonContext::with_defaults();
        assert!(ctx.enter_refs(&*l, &*d));
        assert!(!ring_equals(&l, &d, &mut ctx));
    }
}

mod codec_scenarios {
    use super::*;

    #[test]
    fn headerless_roundtrip_then_apply() {
        // Goal: a document with sequence, map and nested member ops
        // survives the headerless wire and still applies
        setup();
        let left = Gadget::new("widget", 1, &["a", "b", "c"]);
        let right = Gadget::new("widget", 1, &["a", "B", "c"]);
        let mut writer = DeltaWriter::new();
        let mut ctx = ComparisonContext::with_defaults();
        delta::compute_list_member(
            &mut writer,
            gadget_members::TAGS,
            Some(&left.tags),
            Some(&right.tags),
            &mut ctx,
        );
        writer.write_dict_set(7, Value::from("score"), Value::I32(10));
        {
            let mut scope = writer.begin_nested_member(8);
            scope.write_set_member(0, Value::from("renamed"));
        }
        let doc = writer.finish();

        let bytes = encode(&doc, &CodecOptions::headerless()).unwrap();
        let decoded = decode(&bytes, &CodecOptions::headerless()).unwrap();
        assert_eq!(decoded, doc);

        // the sequence portion applies to a matching source
        let mut target = left.clone();
        let mut ctx = ComparisonContext::with_defaults();
        apply::apply_list_delta(
            &mut target.tags,
            decoded.as_ops().iter().filter(|op| op.member_index == gadget_members::TAGS),
            &mut ctx,
        )
        .unwrap();
        assert_eq!(target.tags, right.tags);
    }

    #[test]
    fn headerful_roundtrip_preserves_interned_strings() {
        // Goal: table-backed strings decode to the same document
        let mut writer = DeltaWriter::new();
        for member in 0..4 {
            writer.write_set_member(member, Value::from("shared-category-name"));
        }
        writer.write_set_member(9, Value::from("solo"));
        let doc = writer.finish();
        let bytes = encode(&doc, &CodecOptions::default()).unwrap();
        let decoded = decode(&bytes, &CodecOptions::default()).unwrap();
        assert_eq!(decoded, doc);
    }
}
