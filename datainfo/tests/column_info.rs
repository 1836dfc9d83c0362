use std::{cell::RefCell, rc::Rc};

use datainfo::{
    DataInfo, DataObject, Error, InfoAccess,
    format::DefaultFormatter,
    info::AttrValue,
    memory::{MemColumn, MemIndex, MemQuantity, MemTable},
    merge::MergeConflicts,
    parent::{ColumnFormatter, IndexEngine, IndexRef, RowIndex},
    selector::{RowSelector, RowSlice},
    types::{DataType, value::ScalarValue},
    warnings,
};
use test_case::test_case;

type Calls = Rc<RefCell<Vec<String>>>;

/// Records every call made on it.
struct MockIndex {
    engine: IndexEngine,
    calls: Calls,
}

impl MockIndex {
    fn new_ref(engine: IndexEngine, calls: &Calls) -> IndexRef {
        Rc::new(RefCell::new(MockIndex {
            engine,
            calls: calls.clone(),
        }))
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl RowIndex for MockIndex {
    fn engine(&self) -> IndexEngine {
        self.engine
    }

    fn replace(&mut self, row: usize, column: &str, value: &ScalarValue) -> datainfo::Result<()> {
        self.record(format!("replace {row} {column} {value}"));
        Ok(())
    }

    fn get_slice(&self, _column: &dyn DataObject, rows: &[usize]) -> datainfo::Result<IndexRef> {
        self.record(format!("get_slice {rows:?}"));
        Ok(MockIndex::new_ref(self.engine, &self.calls))
    }

    fn replace_rows(&mut self, rows: &[usize]) -> datainfo::Result<()> {
        self.record(format!("replace_rows {rows:?}"));
        Ok(())
    }

    fn slice(&self, slice: &RowSlice) -> datainfo::Result<IndexRef> {
        self.record(format!("slice {:?}..{:?}", slice.start, slice.stop));
        Ok(MockIndex::new_ref(self.engine, &self.calls))
    }

    fn deep_copy(&self) -> IndexRef {
        self.record("deep_copy".to_string());
        MockIndex::new_ref(self.engine, &self.calls)
    }
}

fn indexed_column(len: i64, engine: IndexEngine) -> (Rc<MemColumn>, Calls) {
    let calls = Calls::default();
    let col = MemColumn::new(0..len).into_rc();
    let mut info = col.info_mut();
    info.set_name("a").unwrap();
    info.set_indices(vec![MockIndex::new_ref(engine, &calls)]).unwrap();
    drop(info);
    (col, calls)
}

fn take_calls(calls: &Calls) -> Vec<String> {
    std::mem::take(&mut *calls.borrow_mut())
}

#[test]
fn adjust_without_indices_calls_nothing() {
    let calls = Calls::default();
    let _unattached = MockIndex::new_ref(IndexEngine::Tree, &calls);
    let col = MemColumn::new([1, 2, 3]).into_rc();
    col.info()
        .adjust_indices(RowSelector::from(0..3), &[ScalarValue::from(7)], 3)
        .unwrap();
    assert!(calls.borrow().is_empty());
}

#[test]
fn adjust_broadcasts_a_single_value_over_a_slice() {
    let (col, calls) = indexed_column(5, IndexEngine::Tree);
    col.info()
        .adjust_indices(RowSlice::new(Some(1), Some(5), Some(2)), &[ScalarValue::from(9)], 5)
        .unwrap();
    assert_eq!(take_calls(&calls), vec!["replace 1 a 9", "replace 3 a 9"]);
}

#[test]
fn adjust_pairs_rows_with_values() {
    let (col, calls) = indexed_column(4, IndexEngine::Tree);
    col.info()
        .adjust_indices(
            vec![false, true, false, true],
            &[ScalarValue::from(10), ScalarValue::from(30)],
            4,
        )
        .unwrap();
    assert_eq!(take_calls(&calls), vec!["replace 1 a 10", "replace 3 a 30"]);

    col.info()
        .adjust_indices(2usize, &[ScalarValue::from(5)], 4)
        .unwrap();
    assert_eq!(take_calls(&calls), vec!["replace 2 a 5"]);
}

#[test_case(IndexEngine::Tree, vec![1, 5], "get_slice [1, 5]" ; "few rows rebuild")]
#[test_case(IndexEngine::Tree, vec![0, 1, 2, 3, 4, 5], "get_slice [0, 1, 2, 3, 4, 5]" ; "threshold is inclusive")]
#[test_case(IndexEngine::Tree, vec![0, 1, 2, 3, 4, 5, 6], "deep_copy" ; "many rows relabel")]
#[test_case(IndexEngine::SortedArray, vec![0, 1, 2, 3, 4, 5, 6, 7], "get_slice [0, 1, 2, 3, 4, 5, 6, 7]" ; "sorted array always rebuilds")]
fn slice_indices_rebuild_or_relabel(engine: IndexEngine, rows: Vec<usize>, first_call: &str) {
    let (col, calls) = indexed_column(10, engine);
    let sliced = MemColumn::new(rows.iter().map(|r| *r as i64)).into_rc();
    let item = RowSelector::from(rows.clone());
    col.info().slice_indices(&sliced, &item, 10).unwrap();

    let made = take_calls(&calls);
    assert_eq!(made[0], first_call);
    if first_call == "deep_copy" {
        assert_eq!(made[1], format!("replace_rows {rows:?}"));
    }
    assert_eq!(made.len(), if first_call == "deep_copy" { 2 } else { 1 });
    assert_eq!(sliced.info().indices().unwrap().len(), 1);
}

#[test]
fn slice_indices_with_mask_uses_positions() {
    let (col, calls) = indexed_column(4, IndexEngine::Tree);
    let sliced = MemColumn::new([1, 3]).into_rc();
    let item = RowSelector::from(vec![false, true, false, true]);
    col.info().slice_indices(&sliced, &item, 4).unwrap();
    assert_eq!(take_calls(&calls), vec!["get_slice [1, 3]"]);
}

#[test]
fn slice_indices_with_contiguous_slice_slices_each_index() {
    let (col, calls) = indexed_column(10, IndexEngine::SortedArray);
    let sliced = MemColumn::new(2..8i64).into_rc();
    let item = RowSelector::from(2..8);
    col.info().slice_indices(&sliced, &item, 10).unwrap();
    assert_eq!(take_calls(&calls), vec!["slice Some(2)..Some(8)"]);
}

#[test]
fn slice_indices_when_copy_disabled() {
    let (col, calls) = indexed_column(10, IndexEngine::Tree);
    col.info_mut().set_copy_indices(false).unwrap();
    let sliced = MemColumn::new([1]).into_rc();
    sliced
        .info_mut()
        .set_indices(vec![MockIndex::new_ref(IndexEngine::Tree, &calls)])
        .unwrap();
    col.info()
        .slice_indices(&sliced, &RowSelector::from(vec![1usize]), 10)
        .unwrap();
    assert!(sliced.info().indices().unwrap().is_empty());
    assert!(take_calls(&calls).is_empty());
}

#[test]
fn column_slicing_keeps_a_working_index() {
    let col = MemColumn::new([5, 1, 3, 2]).into_rc();
    col.info_mut().set_name("k").unwrap();
    let index = MemIndex::build(&*col, "k", IndexEngine::Tree).into_ref();
    col.info_mut().set_indices(vec![index]).unwrap();

    let sliced = col.slice(vec![3usize, 0]).unwrap();
    assert_eq!(sliced.values(), vec![ScalarValue::from(2), ScalarValue::from(5)]);
    assert_eq!(sliced.info().name().unwrap().as_deref(), Some("k"));
    let indices = sliced.info().indices().unwrap();
    assert_eq!(indices.len(), 1);

    sliced.set_values(1usize, vec![ScalarValue::from(0)]).unwrap();
    assert_eq!(sliced.values()[1], ScalarValue::from(0));
    assert_eq!(indices[0].borrow().engine(), IndexEngine::Tree);
}

#[test]
fn set_values_updates_the_index() {
    let col = MemColumn::new([4, 3, 2, 1]).into_rc();
    col.info_mut().set_name("k").unwrap();
    let index = MemIndex::build(&*col, "k", IndexEngine::SortedArray);
    let shared = Rc::new(RefCell::new(index));
    let as_ref: IndexRef = shared.clone();
    col.info_mut().set_indices(vec![as_ref]).unwrap();

    col.set_values(1..3, vec![ScalarValue::from(10), ScalarValue::from(0)])
        .unwrap();
    assert_eq!(shared.borrow().find(&ScalarValue::from(10)), vec![1]);
    assert_eq!(shared.borrow().sorted_rows(), vec![2, 3, 0, 1]);
}

#[test]
fn string_values_use_the_column_format() {
    let col = MemColumn::new([1.0, 2.26]).into_rc();
    col.info_mut().set("format", "%.1f").unwrap();
    let vals = col.info().iter_str_vals().unwrap();
    assert_eq!(vals.len(), 2);
    assert_eq!(vals.collect::<Vec<_>>(), vec!["1.0", "2.3"]);
    // A fresh iterator starts over.
    assert_eq!(col.info().iter_str_vals().unwrap().count(), 2);
}

#[test]
fn string_values_through_a_mutable_borrow() {
    let col = MemColumn::new([1.0, 2.26]).into_rc();
    let mut info = col.info_mut();
    info.set("format", "%.1f").unwrap();
    let vals: Vec<String> = info.iter_str_vals().unwrap().collect();
    assert_eq!(vals, vec!["1.0", "2.26"]);
}

#[test]
fn masked_rows_render_as_dashes() {
    let col = MemColumn::new([1, 2, 3])
        .with_mask(vec![false, true, false])
        .into_rc();
    let vals: Vec<String> = col.info().iter_str_vals().unwrap().collect();
    assert_eq!(vals, vec!["1", "--", "3"]);
    assert_eq!(DefaultFormatter.format_row(&*col, 1), "--");
}

struct Bracketed;

impl ColumnFormatter for Bracketed {
    fn format_row(&self, column: &dyn DataObject, row: usize) -> String {
        format!("[{}]", column.value_at(row).unwrap_or(ScalarValue::Null))
    }
}

#[test]
fn string_values_use_the_table_formatter() {
    let table = MemTable::with_formatter(Rc::new(Bracketed));
    let q = Rc::new(MemQuantity::new(vec![1.5, 2.0], Some("m")));
    table.add_column("q", q.clone()).unwrap();
    let vals: Vec<String> = q.info().iter_str_vals().unwrap().collect();
    assert_eq!(vals, vec!["[1.5]", "[2.0]"]);
}

fn described(values: &[i64], dtype: DataType, unit: &str, description: &str) -> Rc<dyn DataObject> {
    let col: Rc<dyn DataObject> = MemColumn::new(values.iter().copied())
        .with_dtype(dtype)
        .into_rc();
    {
        let mut info = col.info_mut();
        info.set("unit", unit).unwrap();
        info.set("description", description).unwrap();
    }
    col
}

#[test]
fn merged_attributes_keep_matching_values() {
    let cols = vec![
        described(&[1], DataType::Int32, "m", "length"),
        described(&[2], DataType::Float64, "m", "length"),
    ];
    let out = DataInfo::merge_cols_attributes(
        &cols,
        MergeConflicts::Error,
        "joined",
        &["unit", "description", "format"],
    )
    .unwrap();
    assert_eq!(
        out.keys().collect::<Vec<_>>(),
        vec!["unit", "description", "dtype", "shape"]
    );
    assert_eq!(out["unit"], AttrValue::from("m"));
    assert_eq!(out["dtype"], AttrValue::Dtype(DataType::Float64));
    assert_eq!(out["shape"], AttrValue::Shape(vec![]));
}

#[test]
fn merged_attribute_conflicts_follow_the_policy() {
    let cols = vec![
        described(&[1], DataType::Int64, "m", "x"),
        described(&[2], DataType::Int64, "s", "x"),
    ];
    let (out, warned) = warnings::record(|| {
        DataInfo::merge_cols_attributes(&cols, MergeConflicts::Warn, "joined", &["unit"])
    });
    assert_eq!(out.unwrap()["unit"], AttrValue::from("s"));
    assert_eq!(warned.len(), 1);
    assert_eq!(
        warned[0].to_string(),
        "In merged column 'joined' the 'unit' attribute does not match (m != s).  \
         Using s for merged output"
    );

    let err = DataInfo::merge_cols_attributes(&cols, MergeConflicts::Error, "joined", &["unit"])
        .unwrap_err();
    assert!(matches!(err, Error::MergeConflict { .. }));
}

#[test]
fn merged_columns_must_agree_on_shape_and_kind() {
    let flat: Rc<dyn DataObject> = MemColumn::new([1, 2, 3, 4]).into_rc();
    let rows: Rc<dyn DataObject> = MemColumn::new([1, 2, 3, 4]).with_row_shape(vec![2]).into_rc();
    assert!(matches!(
        DataInfo::merge_cols_attributes(&[flat.clone(), rows.clone()], MergeConflicts::Silent, "x", &[]),
        Err(Error::MergeShapeMismatch)
    ));
    let out = DataInfo::merge_cols_attributes(&[rows.clone(), rows], MergeConflicts::Silent, "x", &[])
        .unwrap();
    assert_eq!(out["shape"], AttrValue::Shape(vec![2]));

    let text: Rc<dyn DataObject> = MemColumn::new(["a", "b"]).into_rc();
    assert!(matches!(
        DataInfo::merge_cols_attributes(&[flat, text], MergeConflicts::Silent, "x", &[]),
        Err(Error::IncompatibleTypes { .. })
    ));
    assert!(matches!(
        DataInfo::merge_cols_attributes(&[], MergeConflicts::Silent, "x", &[]),
        Err(Error::EmptyMerge)
    ));
}
