use flatsheet_core::model::DumpResponse;
use flatsheet_core::{Request, Response, SortOrder, StoreConfig, Workspace};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn workspace(dir: &tempfile::TempDir) -> Workspace {
    Workspace::new(StoreConfig::new(dir.path()))
}

fn snapshot(response: Response) -> flatsheet_core::model::ViewResponse {
    match response {
        Response::View(view) => view,
        other => panic!("expected a snapshot, got {other:?}"),
    }
}

fn ingest(ws: &Workspace, instance: &str, csv: &str) -> flatsheet_core::model::ViewResponse {
    snapshot(
        ws.dispatch(
            instance,
            Request::Ingest {
                file: None,
                csv: Some(csv.to_string()),
            },
        )
        .unwrap(),
    )
}

fn dump(ws: &Workspace, instance: &str) -> String {
    match ws.dispatch(instance, Request::Dump { file: None }).unwrap() {
        Response::Dump(DumpResponse::Csv { csv }) => csv,
        other => panic!("expected csv, got {other:?}"),
    }
}

#[test]
fn test_sum_scenario_through_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(&dir);
    for (cell, value) in [("A1", "10"), ("A2", "20"), ("A3", "=SUM(A1:A2)")] {
        ws.dispatch(
            "default",
            Request::Set {
                cell: cell.into(),
                value: value.into(),
            },
        )
        .unwrap();
    }
    match ws
        .dispatch("default", Request::Get { cell: "A3".into() })
        .unwrap()
    {
        Response::Get(got) => {
            assert_eq!(got.value, "30");
            assert_eq!(got.formula.as_deref(), Some("=SUM(A1:A2)"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_ingest_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(&dir);
    let view = ingest(&ws, "people", "Name,Age\nAlice,30\nBob,25");
    assert_eq!(view.headers, ["Name", "Age"]);
    assert_eq!(view.rows, 2);
    assert_eq!(view.data.len(), 2);
}

#[test]
fn test_query_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(&dir);
    // Dan has a name but no age; an empty cell never satisfies `>`.
    ingest(&ws, "people", "Name,Age\nAlice,30\nBob,25\nDan,\nCarol,41");
    let response = ws
        .dispatch(
            "people",
            Request::Query {
                condition: "B > 25".into(),
                limit: None,
            },
        )
        .unwrap();
    let Response::Query(result) = response else {
        panic!("expected query response");
    };
    assert_eq!(result.match_count, 2);
    let names: Vec<&str> = result.data.iter().map(|row| row[0].as_str()).collect();
    assert_eq!(names, ["Alice", "Carol"]);
    assert_eq!(result.rows, [1, 4]);
    assert!(!names.contains(&"Dan"));
}

#[test]
fn test_fill_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(&dir);
    ws.dispatch(
        "default",
        Request::Set {
            cell: "A2".into(),
            value: "=1+1".into(),
        },
    )
    .unwrap();
    let view = snapshot(
        ws.dispatch(
            "default",
            Request::Fill {
                range: "A1:A4".into(),
                pattern: "1,2".into(),
            },
        )
        .unwrap(),
    );
    let column: Vec<&str> = view.data[..4].iter().map(|row| row[0].as_str()).collect();
    assert_eq!(column, ["1", "2", "1", "2"]);
    assert!(!dir.path().join("default.formulas.json").exists());
}

#[test]
fn test_sort_stability_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(&dir);
    ingest(&ws, "s", "k,v\nb,2\na,");
    for order in [SortOrder::Asc, SortOrder::Desc] {
        let view = snapshot(
            ws.dispatch(
                "s",
                Request::Sort {
                    column: "B".into(),
                    order,
                },
            )
            .unwrap(),
        );
        assert_eq!(view.data[1][0], "a", "{order:?}");
    }
}

#[test]
fn test_dump_then_ingest_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(&dir);
    ingest(
        &ws,
        "source",
        "Item,Note,Total\npen,\"blue, fine\",=2*3\n\"say \"\"hi\"\"\",,4",
    );
    let exported = dump(&ws, "source");

    let copy = ingest(&ws, "copy", &exported);
    let original = snapshot(ws.dispatch("source", Request::View { range: None }).unwrap());
    assert_eq!(copy.headers, original.headers);
    assert_eq!(copy.data, original.data);
    assert_eq!(dump(&ws, "copy"), exported);
}

#[test]
fn test_state_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ws = workspace(&dir);
        ingest(&ws, "ledger", "Amount,Double\n5,=A1*2\n7,");
        let mut values = BTreeMap::new();
        values.insert("Amount".to_string(), "9".to_string());
        ws.dispatch("ledger", Request::Add { values }).unwrap();
    }

    let ws = workspace(&dir);
    let view = snapshot(ws.dispatch("ledger", Request::View { range: None }).unwrap());
    assert_eq!(view.headers, ["Amount", "Double"]);
    assert_eq!(
        view.data,
        vec![
            vec!["5".to_string(), "10".to_string()],
            vec!["7".to_string(), String::new()],
            vec!["9".to_string(), String::new()],
        ]
    );

    // Clearing the only formula removes the sidecar.
    let sidecar = dir.path().join("ledger.formulas.json");
    assert!(sidecar.exists());
    ws.dispatch(
        "ledger",
        Request::Clear {
            range: Some("B:B".into()),
        },
    )
    .unwrap();
    assert!(!sidecar.exists());
}

#[test]
fn test_failed_operation_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(&dir);
    let err = ws
        .dispatch(
            "default",
            Request::Update {
                row: 50,
                values: BTreeMap::new(),
            },
        )
        .unwrap_err();
    assert!(err.to_string().contains("Row 50 not found"));
    assert!(!dir.path().join("default.csv").exists());
}
