//! Graph construction properties over relationship tables.

use dealgraph_core::{
    entity::{EntityColumns, EntityIndex},
    filter,
    graph::{DegreeMode, DuplicateEdges, GraphBuilder, Resolution},
    table::{RecordTable, Value},
};
use std::collections::HashSet;

// ── Helpers ──────────────────────────────────────────────────────────────────

const HEADER: &str = "acquired_object_id,acquiring_object_id,price_amount,price_currency_code,acquired_at\n";

fn relationships(rows: &str) -> RecordTable {
    RecordTable::from_reader("acquisitions", format!("{HEADER}{rows}").as_bytes(), None).unwrap()
}

fn builder(directed: bool) -> GraphBuilder {
    GraphBuilder::new("acquired_object_id", "acquiring_object_id")
        .attributes(["price_amount", "price_currency_code", "acquired_at"])
        .directed(directed)
}

fn three_deals() -> RecordTable {
    relationships(
        "A,B,10,USD,2001-01-01\n\
         B,C,20,USD,2002-01-01\n\
         A,C,5,USD,2003-01-01\n",
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn three_row_table_directed() {
    let g = builder(true).build(&three_deals()).unwrap();
    assert_eq!(g.node_count(), 3);
    assert_eq!(g.edge_count(), 3);
    for id in ["A", "B", "C"] {
        assert!(g.contains(id), "missing node {id}");
    }
    assert_eq!(g.degree("B", DegreeMode::In), Some(1));
    assert_eq!(g.degree("B", DegreeMode::Out), Some(1));
    assert_eq!(g.degree("B", DegreeMode::Total), Some(2));
}

#[test]
fn three_row_table_undirected() {
    let g = builder(false).build(&three_deals()).unwrap();
    assert_eq!(g.edge_count(), 3);
    // Undirected graphs count every incident edge whatever the mode.
    assert_eq!(g.degree("B", DegreeMode::Out), Some(2));
    assert_eq!(g.degree("B", DegreeMode::Total), Some(2));
}

#[test]
fn node_count_equals_distinct_endpoint_ids() {
    let table = relationships(
        "a,b,1,USD,2001-01-01\n\
         b,c,1,USD,2001-01-01\n\
         d,a,1,USD,2001-01-01\n\
         a,b,2,USD,2002-01-01\n\
         e,e,3,USD,2003-01-01\n",
    );
    let g = builder(true).build(&table).unwrap();

    let distinct: HashSet<String> = table
        .rows()
        .flat_map(|r| [r.key("acquired_object_id"), r.key("acquiring_object_id")])
        .flatten()
        .collect();
    assert_eq!(g.node_count(), distinct.len());
    // (a,b) appears twice and collapses to one edge.
    assert_eq!(g.edge_count(), 4);
}

#[test]
fn numeric_looking_ids_stay_distinct() {
    let table = RecordTable::from_reader(
        "pairs",
        "src,dst\n007,7\n9007199254740993,9007199254740992\n1.0,1\n".as_bytes(),
        None,
    )
    .unwrap();
    let g = GraphBuilder::new("src", "dst").build(&table).unwrap();
    assert_eq!(g.node_count(), 6);
    assert_eq!(g.edge_count(), 3);
    for id in ["007", "7", "9007199254740993", "9007199254740992", "1.0", "1"] {
        assert!(g.contains(id), "missing node {id}");
    }
}

#[test]
fn numeric_looking_ids_join_entities_exactly() {
    let objects = RecordTable::from_reader("objects", "id,name\n007,Bond\n7,Seven\n".as_bytes(), None).unwrap();
    let index = EntityIndex::from_table(&objects, &EntityColumns::default()).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.get("007").unwrap().name, "Bond");
    assert_eq!(index.get("7").unwrap().name, "Seven");

    let table = relationships("007,70,1,USD,2001-01-01\n7,007,2,USD,2002-01-01\n");
    let cleaned = filter::drop_unknown_ids(&table, "acquired_object_id", "acquiring_object_id", &index)
        .unwrap();
    assert_eq!(cleaned.len(), 1);
    assert_eq!(cleaned.row(0).unwrap().key("acquired_object_id").as_deref(), Some("7"));
}

#[test]
fn every_edge_endpoint_is_a_node() {
    let g = builder(true).build(&three_deals()).unwrap();
    for edge in g.edges() {
        assert!(g.contains(&edge.source.id));
        assert!(g.contains(&edge.target.id));
    }
}

#[test]
fn edge_lookup_returns_the_source_row_bundle() {
    let table = relationships(
        "A,B,10,USD,2001-01-01\n\
         A,B,99,EUR,2009-09-09\n",
    );
    let g = builder(true).build(&table).unwrap();
    let attrs = g.edge("A", "B").expect("edge A→B");
    assert_eq!(attrs["price_amount"].value(), &Value::Number(99.0));
    assert_eq!(attrs["price_currency_code"].value(), &Value::Text("EUR".into()));
    assert_eq!(attrs["acquired_at"].to_string(), "2009-09-09");
}

#[test]
fn parallel_duplicates_keep_every_row() {
    let table = relationships(
        "A,B,10,USD,2001-01-01\n\
         A,B,99,EUR,2009-09-09\n",
    );
    let g = builder(true).duplicates(DuplicateEdges::Parallel).build(&table).unwrap();
    assert_eq!(g.edge_count(), 2);
    assert_eq!(g.edge("A", "B").unwrap()["price_amount"].value(), &Value::Number(99.0));
}

#[test]
fn rows_with_missing_ids_are_skipped() {
    let table = relationships("A,,10,USD,2001-01-01\nA,B,10,USD,2001-01-01\n");
    let g = builder(true).build(&table).unwrap();
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn unknown_attribute_column_is_an_error() {
    let err = GraphBuilder::new("acquired_object_id", "acquiring_object_id")
        .attributes(["price"])
        .build(&three_deals())
        .unwrap_err();
    assert!(err.to_string().contains("price"), "{err}");
}

#[test]
fn unknown_entity_is_cleaned_out_before_building() {
    let objects = RecordTable::from_reader(
        "objects",
        "id,entity_type,name,category_code\nA,Company,Alpha,web\nB,Company,Beta,web\nC,Company,Gamma,web\n"
            .as_bytes(),
        None,
    )
    .unwrap();
    let index = EntityIndex::from_table(&objects, &EntityColumns::default()).unwrap();
    let table = relationships("A,B,1,USD,2001-01-01\nZ,C,2,USD,2002-01-01\n");

    let cleaned = filter::drop_unknown_ids(&table, "acquired_object_id", "acquiring_object_id", &index)
        .unwrap();
    let g = builder(true).build(&cleaned).unwrap();
    assert!(!g.contains("Z"));
    assert!(g.nodes().all(|n| n.id != "Z"));
}

#[test]
fn drop_unresolved_removes_nodes_and_their_edges() {
    let objects = RecordTable::from_reader("objects", "id,name\nA,Alpha\nB,Beta\n".as_bytes(), None).unwrap();
    let index = EntityIndex::from_table(&objects, &EntityColumns::default()).unwrap();

    let mut keep = builder(true).build(&three_deals()).unwrap();
    assert_eq!(keep.resolve(&index, Resolution::KeepRawId), 2);
    assert_eq!(keep.node_count(), 3);
    assert_eq!(keep.node("C").unwrap().label(), "C");
    assert_eq!(keep.node("A").unwrap().label(), "Alpha");

    let mut drop = builder(true).build(&three_deals()).unwrap();
    drop.resolve(&index, Resolution::DropUnresolved);
    assert_eq!(drop.node_count(), 2);
    assert_eq!(drop.edge_count(), 1);
    assert!(drop.edge("A", "B").is_some());
    for edge in drop.edges() {
        assert!(drop.contains(&edge.source.id) && drop.contains(&edge.target.id));
    }
    assert_eq!(drop.degree("A", DegreeMode::Out), Some(1));
}
