use std::rc::{Rc, Weak};

use datainfo::{
    AttrValue, DataInfo, DataObject, Error, InfoAccess, InfoOwner,
    context::{SerializeContext, serialize_context, serialize_context_as},
    info::{InfoSnapshot, Meta, class::PARENT_DTYPE_INFO},
    memory::{MemColumn, MemIndex, MemQuantity, MemTable},
    parent::{IndexEngine, ParentTable},
    types::DataType,
};
use serde_json::json;

#[test]
fn binds_lazily_on_first_access() {
    let col = MemColumn::new([1, 2, 3]).into_rc();
    assert!(!col.info_cell().is_bound());
    assert_eq!(col.info().name().unwrap(), None);
    assert!(col.info_cell().is_bound());
    assert!(col.info().is_bound());
}

#[test]
fn type_level_info_is_unbound() {
    let mut info = MemColumn::type_info();
    assert!(!info.is_bound());
    assert!(matches!(info.get("name"), Err(Error::AttributeNotFound { .. })));
    assert!(matches!(
        info.set("name", "a"),
        Err(Error::UnboundWrite { owner: "MemColumn" })
    ));
}

#[test]
fn set_then_get_round_trips() {
    let col = MemColumn::new([1.0, 2.0]).into_rc();
    let mut meta = Meta::new();
    meta.insert("source".to_string(), json!("survey"));
    {
        let mut info = col.info_mut();
        info.set("name", "flux").unwrap();
        info.set("unit", "Jy").unwrap();
        info.set("format", "%.2f").unwrap();
        info.set("description", "measured flux").unwrap();
        info.set("meta", meta.clone()).unwrap();
    }
    let info = col.info();
    assert_eq!(info.get("name").unwrap(), AttrValue::from("flux"));
    assert_eq!(info.unit().unwrap().as_deref(), Some("Jy"));
    assert_eq!(info.format().unwrap().as_deref(), Some("%.2f"));
    assert_eq!(info.description().unwrap().as_deref(), Some("measured flux"));
    assert_eq!(info.meta().unwrap(), Some(meta));
}

#[test]
fn dtype_reads_and_writes_through_to_parent() {
    let col = MemColumn::new([1, 2]).into_rc();
    assert_eq!(col.info().dtype().unwrap(), DataType::Int64);

    col.info_mut().set("dtype", DataType::Int32).unwrap();
    assert_eq!(col.dtype(), DataType::Int32);
    col.info_mut().set("dtype", "<f8").unwrap();
    assert_eq!(col.dtype(), DataType::Float64);
    assert_eq!(col.info().dtype().unwrap(), DataType::Float64);
}

#[test]
fn unset_dtype_reads_as_object() {
    let info = DataInfo::bound(&PARENT_DTYPE_INFO, None);
    assert!(matches!(info.get("dtype"), Err(Error::DetachedParent)));

    let info = DataInfo::bound(&datainfo::info::class::MIXIN_INFO, None);
    assert_eq!(info.dtype().unwrap(), DataType::Object);
}

#[test]
fn parent_is_held_weakly() {
    let col = MemColumn::new([1, 2]).into_rc();
    let weak: Weak<dyn DataObject> = {
        let as_dyn: Rc<dyn DataObject> = col.clone();
        Rc::downgrade(&as_dyn)
    };
    let info = DataInfo::bound(&datainfo::memory::MEM_COLUMN_INFO, Some(weak));
    assert_eq!(info.dtype().unwrap(), DataType::Int64);
    drop(col);
    assert!(matches!(info.parent(), Err(Error::DetachedParent)));
    assert!(info.dtype().is_err());
}

#[test]
fn parent_table_is_the_same_table_and_weak() {
    let table = MemTable::new();
    let col = MemColumn::new([1, 2]).into_rc();
    table.add_column("a", col.clone()).unwrap();

    let got = col.info().parent_table().unwrap().unwrap();
    let expected: Rc<dyn ParentTable> = table.clone();
    assert!(Rc::ptr_eq(&got, &expected));
    assert_eq!(col.info().name().unwrap().as_deref(), Some("a"));
    drop(got);
    drop(expected);

    drop(table);
    assert!(col.info().parent_table().unwrap().is_none());
    assert!(col.info().get("parent_table").unwrap().is_none());
}

#[test]
fn assignment_copies_everything_but_delegated_and_no_copy() {
    let table = MemTable::new();
    let source = MemColumn::new([3, 1, 2]).with_dtype(DataType::Int16).into_rc();
    table.add_column("src", source.clone()).unwrap();
    let index = MemIndex::build(&*source, "src", IndexEngine::Tree).into_ref();
    {
        let mut info = source.info_mut();
        info.set("unit", "m").unwrap();
        let mut meta = Meta::new();
        meta.insert("tags".to_string(), json!(["a"]));
        info.set("meta", meta).unwrap();
        info.set_indices(vec![index.clone()]).unwrap();
    }

    let target = MemColumn::new([0, 0, 0]).into_rc();
    target.set_info(&source.info()).unwrap();

    let info = target.info();
    assert_eq!(info.name().unwrap().as_deref(), Some("src"));
    assert_eq!(info.unit().unwrap().as_deref(), Some("m"));
    assert!(info.parent_table().unwrap().is_none());
    assert_eq!(info.dtype().unwrap(), DataType::Int64);
    let copied = info.indices().unwrap();
    assert_eq!(copied.len(), 1);
    assert!(!Rc::ptr_eq(&copied[0], &index));
    drop(info);

    source.info_mut().set("unit", "km").unwrap();
    assert_eq!(target.info().unit().unwrap().as_deref(), Some("m"));
}

#[test]
fn assigning_type_level_info_fails_and_keeps_attributes() {
    let col = MemColumn::new([1]).into_rc();
    col.info_mut().set_name("keep").unwrap();
    let err = col.set_info(&MemColumn::type_info()).unwrap_err();
    assert!(matches!(err, Error::AttributeNotFound { .. }));
    assert_eq!(col.info().name().unwrap().as_deref(), Some("keep"));
}

#[test]
fn assigning_own_info_while_borrowed_fails() {
    let col = MemColumn::new([1]).into_rc();
    let info = col.info();
    assert!(matches!(col.set_info(&info), Err(Error::Whatever { .. })));
}

#[test]
fn attribute_outside_vocabulary_is_rejected() {
    let col = MemColumn::new([1]).into_rc();
    let err = col.info_mut().set("colour", "red").unwrap_err();
    assert_eq!(
        err.to_string(),
        "attribute 'colour' must be one of name, unit, dtype, format, description, meta, \
         parent_table, indices"
    );
}

#[test]
fn renaming_a_mixin_renames_its_table_column() {
    let table = MemTable::new();
    table.add_column("a", MemColumn::new([1, 2]).into_rc()).unwrap();
    let speed = Rc::new(MemQuantity::new(vec![1.0, 2.0], Some("m/s")));
    table.add_column("v", speed.clone()).unwrap();
    table.add_column("c", MemColumn::new([3, 4]).into_rc()).unwrap();

    speed.info_mut().set_name("speed").unwrap();
    assert_eq!(table.column_names(), vec!["a", "speed", "c"]);
    assert_eq!(speed.info().name().unwrap().as_deref(), Some("speed"));

    assert!(matches!(
        speed.info_mut().set_name("a"),
        Err(Error::InvalidColumnName { .. })
    ));
    assert!(matches!(
        speed.info_mut().set("name", 4i64),
        Err(Error::TypeMismatch { .. })
    ));
    assert_eq!(speed.info().name().unwrap().as_deref(), Some("speed"));
    assert_eq!(table.column_names(), vec!["a", "speed", "c"]);
}

#[test]
fn renaming_a_plain_column_leaves_the_table_alone() {
    let table = MemTable::new();
    let col = MemColumn::new([1]).into_rc();
    table.add_column("a", col.clone()).unwrap();
    col.info_mut().set_name("b").unwrap();
    assert_eq!(table.column_names(), vec!["a"]);
}

#[test]
fn quantity_unit_lives_on_the_quantity() {
    let q = Rc::new(MemQuantity::new(vec![1.0], None));
    q.info_mut().set("unit", "K").unwrap();
    assert_eq!(q.unit().as_deref(), Some("K"));
    assert_eq!(q.info().dtype().unwrap(), DataType::Float64);
    assert!(matches!(
        q.info_mut().set("dtype", DataType::Int8),
        Err(Error::ReadOnlyAttribute { .. })
    ));
}

#[test]
fn dict_representation_round_trips() {
    let q = Rc::new(MemQuantity::new(vec![1.5, 2.5], Some("m")));
    let map = q.info().represent_as_dict().unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["value", "unit"]);
    assert_eq!(map["unit"], AttrValue::from("m"));

    let rebuilt: MemQuantity = q.info().construct_from_dict(map).unwrap();
    assert_eq!(rebuilt.values(), &[1.5, 2.5]);
    assert_eq!(rebuilt.unit().as_deref(), Some("m"));

    let bare = Rc::new(MemQuantity::new(vec![1.0], None));
    let map = bare.info().represent_as_dict().unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["value"]);
}

#[test]
fn snapshot_survives_serialization() {
    let col = MemColumn::new([1.0]).into_rc();
    col.info_mut().set("name", "x").unwrap();
    col.info_mut().set("description", "a value").unwrap();
    let text = serde_json::to_string(&col.info().snapshot().unwrap()).unwrap();

    let snapshot: InfoSnapshot = serde_json::from_str(&text).unwrap();
    let other = MemColumn::new([2.0]).into_rc();
    other.info_mut().restore(snapshot).unwrap();
    assert_eq!(other.info().name().unwrap().as_deref(), Some("x"));
    assert_eq!(other.info().description().unwrap().as_deref(), Some("a value"));
}

#[test]
fn serialize_context_is_scoped() {
    assert_eq!(serialize_context(), None);
    let write = || -> datainfo::Result<()> {
        let _guard = serialize_context_as("fits");
        assert_eq!(serialize_context(), Some(SerializeContext::Fits));
        Err(Error::DetachedParent)
    };
    assert!(write().is_err());
    assert_eq!(serialize_context(), None);

    {
        let _outer = serialize_context_as("ecsv");
        {
            let _inner = serialize_context_as("hdf5");
            assert_eq!(serialize_context(), Some(SerializeContext::Hdf5));
        }
        assert_eq!(serialize_context(), Some(SerializeContext::Ecsv));
    }
    assert_eq!(serialize_context(), None);
}
