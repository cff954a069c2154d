use serde_json::Value;
use std::path::Path;
use std::process::Command;

fn write_file(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn run_json(args: &[&str], envs: &[(&str, &str)]) -> anyhow::Result<Value> {
    let bin = env!("CARGO_BIN_EXE_class-catalog");
    let mut cmd = Command::new(bin);
    cmd.args(args)
        .env_remove("CLASS_CATALOG_OUTPUT")
        .env_remove("CLASS_CATALOG_KEYWORDS")
        .env_remove("RUST_LOG");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let out = cmd.output()?;
    if !out.status.success() {
        return Err(anyhow::anyhow!(
            "command failed: status={:?}, stderr={}",
            out.status.code(),
            String::from_utf8_lossy(&out.stderr)
        ));
    }
    Ok(serde_json::from_slice(&out.stdout)?)
}

const ITEM_CONTROLLER: &str = r#"package com.shop.controller;

import org.springframework.web.bind.annotation.*;

/**
 * Item catalogue endpoints
 */
@RestController
@RequestMapping("/api")
public class ItemController {

    /**
     * Lists items
     * @param page page index
     */
    @GetMapping("/items")
    public List<Item> list(int page) {
        return service.list(page);
    }

    /** Removes an item that is no longer sold anywhere */
    @RequestMapping(value = "/items/{id}", method = RequestMethod.DELETE)
    public void remove(@PathVariable Long id) {
        service.remove(id);
    }
}
"#;

const ITEM_SERVICE: &str = r#"package com.shop.bc;

/** Item business logic */
public class ItemBc {
    /** Finds items */
    public List<Item> find(Query q) {
        return dao.find(q);
    }

    private void audit() {
    }
}
"#;

#[test]
fn scan_produces_separate_category_files() -> anyhow::Result<()> {
    let base = tempfile::tempdir()?;
    let src = base.path().join("src");
    let out = base.path().join("out");
    write_file(&src.join("shop/controller/ItemController.java"), ITEM_CONTROLLER)?;
    write_file(&src.join("shop/bc/ItemBc.java"), ITEM_SERVICE)?;
    write_file(&src.join("shop/util/Dates.java"), ITEM_SERVICE)?;

    let report = run_json(
        &[
            "-q",
            "scan",
            src.to_string_lossy().as_ref(),
            "--output",
            out.to_string_lossy().as_ref(),
            "--jobs",
            "1",
        ],
        &[],
    )?;
    assert_eq!(report["files_seen"], Value::from(3));
    assert_eq!(report["files_processed"], Value::from(2));
    assert_eq!(report["files_failed"], Value::from(0));
    assert_eq!(report["records_written"], Value::from(4));

    let controller = std::fs::read_to_string(out.join("controller.csv"))?;
    let lines: Vec<&str> = controller.lines().collect();
    assert_eq!(
        lines,
        vec![
            "ItemController|Item catalogue endpoints|/api|/items|list|Lists items",
            "ItemController|Item catalogue endpoints|/api|/items/{id}|remove|Removes an item that is no lon...",
        ]
    );

    let service = std::fs::read_to_string(out.join("bc.csv"))?;
    assert_eq!(
        service,
        "ItemBc.find|ItemBc|Item business logic|find|Finds items\n\
         ItemBc.audit|ItemBc|Item business logic|audit|no comment\n"
    );
    assert!(!service.contains("ItemController"));
    assert!(!controller.contains("ItemBc"));

    let categories = report["writer"]["categories"].as_array().unwrap();
    let bc = categories
        .iter()
        .find(|c| c["stem"] == Value::from("bc"))
        .unwrap();
    assert_eq!(bc["files"][0]["name"], Value::from("bc.csv"));
    assert_eq!(bc["files"][0]["bytes"], Value::from(service.len() as u64));
    Ok(())
}

#[test]
fn scan_rotates_small_files_and_cleans_up_on_rerun() -> anyhow::Result<()> {
    let base = tempfile::tempdir()?;
    let src = base.path().join("src");
    let out = base.path().join("out");

    // 400 methods of ~70 output bytes per file, 60 files: about 1.6 MB in total
    let mut body = String::from("public class Bulk {\n");
    for i in 0..400 {
        body.push_str(&format!(
            "    /** Method number {i} does things */\n    public void method{i}() {{\n    }}\n"
        ));
    }
    body.push_str("}\n");
    for n in 0..60 {
        write_file(&src.join(format!("qc/Bulk{n}.java")), &body)?;
    }

    let args = [
        "-q",
        "scan",
        src.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--buffer-kb",
        "8",
        "--file-mb",
        "1",
    ];
    let report = run_json(&args, &[])?;

    let categories = report["writer"]["categories"].as_array().unwrap();
    let qc = categories
        .iter()
        .find(|c| c["stem"] == Value::from("qc"))
        .unwrap();
    let files = qc["files"].as_array().unwrap();
    assert!(files.len() >= 2, "expected rotation, got {files:?}");
    assert_eq!(files[1]["name"], Value::from("qc_2.csv"));
    for f in files {
        let name = f["name"].as_str().unwrap();
        let size = std::fs::metadata(out.join(name))?.len();
        assert!(size <= 1024 * 1024, "{name} is {size} bytes");
    }

    std::fs::remove_dir_all(&src)?;
    write_file(&src.join("qc/Small.java"), "public class Small {\n public void one() {\n }\n}\n")?;
    run_json(&args, &[])?;
    assert!(out.join("qc.csv").exists());
    assert!(!out.join("qc_2.csv").exists());
    assert_eq!(
        std::fs::read_to_string(out.join("qc.csv"))?,
        "Small.one|Small|no comment|one|no comment\n"
    );
    Ok(())
}

#[test]
fn keyword_table_from_environment_changes_routing() -> anyhow::Result<()> {
    let base = tempfile::tempdir()?;
    let src = base.path().join("src");
    let out = base.path().join("out");
    let keywords = base.path().join("keywords.json");
    write_file(&keywords, r#"{"controller": "web", "service_a": "logic"}"#)?;
    write_file(&src.join("app/web/ItemController.java"), ITEM_CONTROLLER)?;
    write_file(&src.join("app/logic/ItemBc.java"), ITEM_SERVICE)?;

    let report = run_json(
        &["-q", "scan", src.to_str().unwrap(), "-o", out.to_str().unwrap()],
        &[("CLASS_CATALOG_KEYWORDS", keywords.to_str().unwrap())],
    )?;
    assert_eq!(report["files_processed"], Value::from(2));
    assert!(out.join("web.csv").exists());
    assert!(out.join("logic.csv").exists());
    assert!(!out.join("controller.csv").exists());
    Ok(())
}

#[test]
fn extract_prints_record_with_routes() -> anyhow::Result<()> {
    let base = tempfile::tempdir()?;
    let file = base.path().join("ItemController.java");
    write_file(&file, ITEM_CONTROLLER)?;

    let out = run_json(&["-q", "extract", file.to_str().unwrap()], &[])?;
    assert_eq!(out["category"], Value::from("controller"));
    assert_eq!(out["record"]["name"], Value::from("ItemController"));
    assert_eq!(out["record"]["common_url_prefix"], Value::from("/api"));
    let methods = out["record"]["methods"].as_array().unwrap();
    assert_eq!(methods[0]["route"]["verb"], Value::from("GET"));
    assert_eq!(methods[1]["route"]["verb"], Value::from("DELETE"));
    assert_eq!(out["issues"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[test]
fn missing_root_fails_the_scan() -> anyhow::Result<()> {
    let base = tempfile::tempdir()?;
    let result = run_json(
        &[
            "-q",
            "scan",
            base.path().join("nope").to_str().unwrap(),
            "-o",
            base.path().join("out").to_str().unwrap(),
        ],
        &[],
    );
    assert!(result.is_err());
    Ok(())
}
