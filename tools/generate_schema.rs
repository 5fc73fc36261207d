//! JSON Schema + Markdown生成ツール
//!
//! src/domain/config.rsの設定構造から以下を自動生成します：
//! 1. JSON Schema (schema/config.json)
//! 2. Markdownドキュメント (CONFIGURATION.md)
//!
//! 実行方法:
//! ```
//! cargo run --bin generate_schema
//! ```

use schemars::schema_for;
use serde_json::{Map, Value};
use std::fs;

use snaplabel::domain::config::AppConfig;

fn main() {
    println!("JSON Schema + Markdown生成中...");

    // AppConfigからJSON Schemaを生成
    let schema = schema_for!(AppConfig);
    let json = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema to JSON");

    fs::create_dir_all("schema").expect("Failed to create schema/ directory");
    fs::write("schema/config.json", &json).expect("Failed to write schema/config.json");
    println!("  ✓ schema/config.json");

    let schema_value: Value = serde_json::from_str(&json).expect("Failed to parse generated schema");
    let markdown = generate_markdown(&schema_value);

    fs::write("CONFIGURATION.md", markdown).expect("Failed to write CONFIGURATION.md");
    println!("  ✓ CONFIGURATION.md");

    println!("生成完了: schema/config.json + CONFIGURATION.md");
}

/// JSON Schemaからマークダウンドキュメントを生成
fn generate_markdown(schema: &Value) -> String {
    let mut md = String::new();

    md.push_str("# 設定リファレンス (Configuration Reference)\n\n");
    md.push_str("`config.toml`は、snaplabelの動作を制御する設定ファイルです。\n");
    md.push_str("ファイルが存在しない場合はデフォルト値が使われます（警告ログ出力）。\n\n");
    md.push_str("このドキュメントは `cargo run --bin generate_schema` で自動生成されます。\n");
    md.push_str("説明を変更する場合は `src/domain/config.rs` のdoc commentsを編集してください。\n\n");

    let defs = schema
        .get("$defs")
        .and_then(|d| d.as_object())
        .cloned()
        .unwrap_or_default();

    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, prop) in props {
            md.push_str(&format!("## [{}]\n\n", key));
            if let Some(desc) = description(prop) {
                md.push_str(&format!("{}\n\n", desc));
            }
            if let Some(section) = resolve(prop, &defs) {
                push_table(&mut md, section, &defs);
            }
        }
    }

    md
}

/// $ref参照を解決してプロパティ定義を取得
fn resolve<'a>(schema: &'a Value, defs: &'a Map<String, Value>) -> Option<&'a Value> {
    if let Some(ref_str) = schema.get("$ref").and_then(|r| r.as_str()) {
        return defs.get(ref_str.strip_prefix("#/$defs/")?);
    }
    schema.get("properties").map(|_| schema)
}

/// セクションのプロパティテーブルを出力
fn push_table(md: &mut String, section: &Value, defs: &Map<String, Value>) {
    let Some(props) = section.get("properties").and_then(|p| p.as_object()) else {
        return;
    };

    md.push_str("| 設定項目 | 型 | デフォルト | 説明 |\n");
    md.push_str("|---------|-----|---------|---------|\n");

    for (key, prop) in props {
        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            key,
            type_name(prop, defs),
            default_value(prop),
            description(prop).unwrap_or_else(|| "-".to_string()),
        ));
    }
    md.push('\n');
}

/// 型名を文字列で取得
fn type_name(schema: &Value, defs: &Map<String, Value>) -> String {
    if let Some(ref_str) = schema.get("$ref").and_then(|r| r.as_str()) {
        if let Some(def) = ref_str
            .strip_prefix("#/$defs/")
            .and_then(|name| defs.get(name))
        {
            if def.get("enum").is_some() || def.get("oneOf").is_some() {
                return "enum".to_string();
            }
        }
        return "object".to_string();
    }

    match schema.get("type") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" \\| "),
        _ => "unknown".to_string(),
    }
}

/// デフォルト値を取得
fn default_value(schema: &Value) -> String {
    match schema.get("default") {
        Some(Value::String(s)) => format!("`\"{}\"`", s),
        Some(Value::Number(n)) => format!("`{}`", n),
        Some(Value::Bool(b)) => format!("`{}`", b),
        Some(Value::Array(a)) => format!("`{:?}`", a),
        _ => "-".to_string(),
    }
}

/// 説明文を取得（改行・パイプをテーブル向けにエスケープ）
fn description(schema: &Value) -> Option<String> {
    let desc = schema.get("description")?.as_str()?;
    Some(
        desc.replace("\n\n", "<br>")
            .replace('\n', " ")
            .replace('|', "\\|"),
    )
}
