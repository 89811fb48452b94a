use std::fs;
use std::io::Cursor;

use serde_json::{Value, json};
use tempfile::tempdir;
use treepick_core::{Session, serve};

fn run(session: &mut Session, requests: &[Value]) -> Vec<Value> {
    let input = requests
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    let mut output = Vec::new();
    serve(session, Cursor::new(input), &mut output).unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn full_request_cycle() {
    let root = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::create_dir_all(root.path().join("src")).unwrap();
    fs::create_dir_all(root.path().join("node_modules/pkg")).unwrap();
    fs::write(root.path().join("src/a.js"), "x").unwrap();
    fs::write(root.path().join("node_modules/pkg/index.js"), "y").unwrap();

    let mut session = Session::new(out.path().join("exports"));
    let responses = run(
        &mut session,
        &[
            json!({"op": "export"}),
            json!({"op": "load", "root": root.path(), "exclusions": ["node_modules"]}),
            json!({"op": "setSelection", "path": "src", "selected": true}),
            json!({"op": "count"}),
            json!({"op": "getFileContent", "path": "src/a.js"}),
            json!({"op": "getFileContent", "path": "../../etc/passwd"}),
            json!({"op": "export", "fileName": "picked.txt"}),
        ],
    );

    assert_eq!(responses.len(), 7);

    assert_eq!(responses[0]["ok"], json!(false));
    assert_eq!(responses[0]["error"]["kind"], json!("EmptySelection"));

    let tree = &responses[1]["data"];
    assert_eq!(tree["path"], json!(""));
    assert_eq!(tree["type"], json!("directory"));
    assert_eq!(tree["formattedSize"], json!("1 B"));
    let children = tree["children"].as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["name"], json!("src"));
    assert!(children[0]["children"][0].get("children").is_none());

    assert_eq!(responses[2]["data"]["selectedFileCount"], json!(1));
    assert_eq!(responses[3]["data"]["count"], json!(1));
    assert_eq!(responses[4]["data"]["content"], json!("x"));
    assert_eq!(responses[5]["error"]["kind"], json!("PathOutsideRoot"));

    let export = &responses[6]["data"];
    assert_eq!(export["fileCount"], json!(1));
    let written = export["path"].as_str().unwrap();
    assert!(written.ends_with("picked.txt"));
    assert!(fs::read_to_string(written).unwrap().contains("--- File: src/a.js ---\nx\n"));
}

#[test]
fn bad_lines_do_not_stop_the_loop() {
    let mut session = Session::default();
    let mut output = Vec::new();
    let input = "not json\n\n{\"op\":\"count\"}\n";

    serve(&mut session, Cursor::new(input), &mut output).unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["kind"], json!("InvalidRequest"));
    assert_eq!(responses[1]["data"]["count"], json!(0));
}

#[test]
fn load_of_missing_root_reports_invalid_path() {
    let mut session = Session::default();
    let responses = run(
        &mut session,
        &[json!({"op": "load", "root": "/definitely/not/here/treepick"})],
    );

    assert_eq!(responses[0]["ok"], json!(false));
    assert_eq!(responses[0]["error"]["kind"], json!("InvalidPath"));
}
